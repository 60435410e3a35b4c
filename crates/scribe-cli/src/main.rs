use anyhow::Result;
use clap::Parser;
use crossterm::tty::IsTty;
use scribe_agent_client::{AgentClientFactory, AgentOptions};
use scribe_cli::config::{Config, ThemeConfig};
use scribe_cli::input::LineEditor;
use scribe_cli::logging;
use scribe_cli::renderer::Renderer;
use scribe_cli::session::{ctrl_c_signal, resolve_working_dir, Session};
use scribe_cli::theme::Theme;
use std::io::{self, Stderr};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[clap(
    name = "scribe",
    author,
    version,
    about = "Talk to a writing agent about the files in a folder"
)]
struct Cli {
    /// Folder the agent works in. Defaults to the current directory.
    path: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Usage errors exit 1 like every other failure; --help and --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let mut errors = error_renderer(&ThemeConfig::default());

    match run(cli, &mut errors).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            let _ = errors.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn error_renderer(theme: &ThemeConfig) -> Renderer<Stderr> {
    Renderer::new(io::stderr(), Theme::from_config(theme, io::stderr().is_tty()))
}

async fn run(cli: Cli, errors: &mut Renderer<Stderr>) -> Result<()> {
    let cwd = resolve_working_dir(cli.path.as_deref())?;

    let config = Config::load()?;
    *errors = error_renderer(&config.theme);
    logging::init(&config)?;
    log::info!("Starting scribe in {}", cwd.display());

    let theme = Theme::from_config(&config.theme, io::stdout().is_tty());
    let mut renderer = Renderer::new(io::stdout(), theme);
    renderer.banner(&cwd)?;

    let input = LineEditor::new(config.multiline)?;
    let options = AgentOptions::new(config.system_prompt.clone(), cwd)
        .with_allowed_tools(config.allowed_tools.iter().cloned());

    let client =
        AgentClientFactory::create_http_client(config.agent_url.clone(), config.request_timeout());
    let interrupt = ctrl_c_signal();
    let connection = tokio::select! {
        connection = client.connect(options.clone()) => connection?,
        _ = interrupt() => {
            log::info!("Interrupted while connecting to {}", config.agent_url);
            renderer.interrupted()?;
            return Ok(());
        }
    };

    let mut session = Session::new(options, connection, input, renderer);
    let reason = session.run().await?;
    log::info!("Exiting ({:?})", reason);

    Ok(())
}
