//! Streaming terminal output for agent turns.
//!
//! Every write is flushed immediately so text shows up as the agent
//! produces it. The renderer owns the output sink; the session routes its
//! own banners and labels through it so the two never interleave.

use futures_util::{Stream, StreamExt};
use scribe_agent_client::{AgentClientError, ResponseEvent, TokenUsage};
use std::io::{self, Write};
use std::path::Path;

use crate::error::RenderError;
use crate::theme::{StyleToken, Theme};

/// What one rendered turn amounted to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnSummary {
    pub cost_usd: Option<f64>,
    pub usage: Option<TokenUsage>,
    pub fragments: usize,
    pub tool_calls: usize,
}

pub struct Renderer<W: Write> {
    out: W,
    theme: Theme,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self { out, theme }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Renders a single event.
    pub fn render(&mut self, event: &ResponseEvent) -> io::Result<()> {
        match event {
            ResponseEvent::TextFragment(text) => write!(self.out, "{}", text)?,
            ResponseEvent::ToolInvocationNotice {
                tool_name,
                tool_input,
            } => {
                let notice = format!("[{}: {}]", tool_name, tool_input);
                write!(
                    self.out,
                    "\n{}",
                    self.theme.paint(StyleToken::Tool, notice)
                )?;
            }
            ResponseEvent::TurnResult { cost_usd, .. } => match cost_usd {
                Some(cost) if *cost > 0.0 => {
                    let annotation = format!("(Cost: ${:.4})", cost);
                    writeln!(
                        self.out,
                        "\n{}",
                        self.theme.paint(StyleToken::Meta, annotation)
                    )?;
                }
                _ => writeln!(self.out)?,
            },
        }
        self.out.flush()
    }

    /// Drains `stream` until its `TurnResult`, rendering as it goes.
    pub async fn render_turn<S>(&mut self, mut stream: S) -> Result<TurnSummary, RenderError>
    where
        S: Stream<Item = Result<ResponseEvent, AgentClientError>> + Unpin,
    {
        let mut summary = TurnSummary::default();

        while let Some(event) = stream.next().await {
            let event = event?;
            self.render(&event)?;

            match event {
                ResponseEvent::TextFragment(_) => summary.fragments += 1,
                ResponseEvent::ToolInvocationNotice { .. } => summary.tool_calls += 1,
                ResponseEvent::TurnResult { cost_usd, usage } => {
                    summary.cost_usd = cost_usd;
                    summary.usage = usage;
                    return Ok(summary);
                }
            }
        }

        Err(AgentClientError::IncompleteTurn.into())
    }

    pub fn banner(&mut self, cwd: &Path) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            self.theme.paint(StyleToken::Banner, "Writing Agent starting...")
        )?;
        writeln!(
            self.out,
            "{} {}",
            self.theme.paint(StyleToken::Banner, "Working directory:"),
            self.theme.paint(StyleToken::Path, cwd.display())
        )?;
        writeln!(
            self.out,
            "{}",
            self.theme.paint(
                StyleToken::Banner,
                "Type 'quit' or 'exit' to stop, 'clear' to reset conversation"
            )
        )?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// The prompt label handed to the line editor.
    pub fn prompt(&self) -> String {
        format!("{} ", self.theme.paint(StyleToken::User, "You:"))
    }

    /// Blank separator line printed before each prompt.
    pub fn separator(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn assistant_label(&mut self) -> io::Result<()> {
        write!(
            self.out,
            "\n{} ",
            self.theme.paint(StyleToken::Assistant, "Assistant:")
        )?;
        self.out.flush()
    }

    /// A line in the `meta` style, e.g. `(Conversation cleared)`.
    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", self.theme.paint(StyleToken::Meta, text))?;
        self.out.flush()
    }

    /// Farewell line. `fresh_line` starts it on a new line, for exits that
    /// happen mid-prompt.
    pub fn farewell(&mut self, fresh_line: bool) -> io::Result<()> {
        if fresh_line {
            writeln!(self.out)?;
        }
        writeln!(self.out, "Goodbye!")?;
        self.out.flush()
    }

    pub fn interrupted(&mut self) -> io::Result<()> {
        writeln!(self.out, "\nInterrupted")?;
        self.out.flush()
    }

    /// `Error: <message>` in the `error` style.
    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            self.theme.paint(StyleToken::Error, format!("Error: {}", message))
        )?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use serde_json::json;

    fn renderer() -> Renderer<Vec<u8>> {
        Renderer::new(Vec::new(), Theme::plain())
    }

    fn output(renderer: Renderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn ok_stream(
        events: Vec<ResponseEvent>,
    ) -> impl Stream<Item = Result<ResponseEvent, AgentClientError>> + Unpin {
        stream::iter(events.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn test_fragments_concatenate_and_zero_cost_ends_line() {
        let mut r = renderer();
        let summary = r
            .render_turn(ok_stream(vec![
                ResponseEvent::text("Hello"),
                ResponseEvent::text(" world"),
                ResponseEvent::turn_result(Some(0.0)),
            ]))
            .await
            .unwrap();

        assert_eq!(summary.fragments, 2);
        assert_eq!(summary.cost_usd, Some(0.0));
        assert_eq!(output(r), "Hello world\n");
    }

    #[tokio::test]
    async fn test_missing_cost_ends_line() {
        let mut r = renderer();
        r.render_turn(ok_stream(vec![
            ResponseEvent::text("Hi"),
            ResponseEvent::turn_result(None),
        ]))
        .await
        .unwrap();

        assert_eq!(output(r), "Hi\n");
    }

    #[tokio::test]
    async fn test_positive_cost_is_annotated() {
        let mut r = renderer();
        r.render_turn(ok_stream(vec![
            ResponseEvent::text("Hi"),
            ResponseEvent::turn_result(Some(0.0023)),
        ]))
        .await
        .unwrap();

        let out = output(r);
        assert_eq!(out, "Hi\n(Cost: $0.0023)\n");
        assert!(out.lines().last().unwrap().contains("0.0023"));
    }

    #[tokio::test]
    async fn test_cost_is_rounded_to_four_places() {
        let mut r = renderer();
        r.render(&ResponseEvent::turn_result(Some(0.123456))).unwrap();
        assert_eq!(output(r), "\n(Cost: $0.1235)\n");
    }

    #[tokio::test]
    async fn test_tool_notice_sits_between_fragments() {
        let mut r = renderer();
        let summary = r
            .render_turn(ok_stream(vec![
                ResponseEvent::text("Checking."),
                ResponseEvent::tool("Read", json!({"file_path": "posts/a.md"})),
                ResponseEvent::text(" Done."),
                ResponseEvent::turn_result(None),
            ]))
            .await
            .unwrap();

        assert_eq!(summary.tool_calls, 1);
        assert_eq!(
            output(r),
            "Checking.\n[Read: {\"file_path\":\"posts/a.md\"}] Done.\n"
        );
    }

    #[tokio::test]
    async fn test_stops_at_turn_result() {
        let mut r = renderer();
        r.render_turn(ok_stream(vec![
            ResponseEvent::text("A"),
            ResponseEvent::turn_result(None),
            ResponseEvent::text("ignored"),
        ]))
        .await
        .unwrap();

        assert_eq!(output(r), "A\n");
    }

    #[tokio::test]
    async fn test_stream_without_result_is_incomplete() {
        let mut r = renderer();
        let err = r
            .render_turn(ok_stream(vec![ResponseEvent::text("Cut")]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RenderError::Agent(AgentClientError::IncompleteTurn)
        ));
    }

    #[tokio::test]
    async fn test_agent_errors_are_surfaced() {
        let mut r = renderer();
        let events = stream::iter(vec![
            Ok(ResponseEvent::text("Partial")),
            Err(AgentClientError::Run {
                message: "overloaded".to_string(),
                code: None,
            }),
        ]);

        let err = r.render_turn(events).await.unwrap_err();
        assert!(matches!(err, RenderError::Agent(AgentClientError::Run { .. })));
        assert_eq!(output(r), "Partial");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_write_failures_are_io_errors() {
        let mut r = Renderer::new(BrokenPipe, Theme::plain());
        let err = r
            .render_turn(ok_stream(vec![ResponseEvent::text("Hi")]))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::Io(_)));
    }

    #[test]
    fn test_error_line() {
        let mut r = renderer();
        r.error("Path does not exist: /tmp/nope").unwrap();
        assert_eq!(output(r), "Error: Path does not exist: /tmp/nope\n");

        let mut colored = Renderer::new(
            Vec::new(),
            Theme::from_config(&crate::config::ThemeConfig::default(), true),
        );
        colored.error("boom").unwrap();
        let out = output(colored);
        assert!(out.starts_with('\u{1b}'));
        assert!(out.contains("Error: boom"));
    }

    #[test]
    fn test_banner() {
        let mut r = renderer();
        r.banner(Path::new("/home/me/blog")).unwrap();
        assert_eq!(
            output(r),
            "Writing Agent starting...\n\
             Working directory: /home/me/blog\n\
             Type 'quit' or 'exit' to stop, 'clear' to reset conversation\n\n"
        );
    }

    #[test]
    fn test_labels() {
        let mut r = renderer();
        assert_eq!(r.prompt(), "You: ");
        r.assistant_label().unwrap();
        r.notice("(Conversation cleared)").unwrap();
        r.farewell(true).unwrap();
        assert_eq!(
            output(r),
            "\nAssistant: (Conversation cleared)\n\nGoodbye!\n"
        );
    }
}
