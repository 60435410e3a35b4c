use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::str::FromStr;

use crate::config::Config;
use crate::error::SessionError;

/// Sends logs to the configured file so they never mix with REPL output.
/// `RUST_LOG` overrides the configured level.
pub fn init(config: &Config) -> Result<(), SessionError> {
    let level = LevelFilter::from_str(&config.log_level).map_err(|_| {
        SessionError::Config(format!("invalid log_level '{}'", config.log_level))
    })?;

    let path = config.log_file_path();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let log_file = OpenOptions::new().create(true).append(true).open(&path)?;

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .try_init()
        .map_err(|e| SessionError::Config(e.to_string()))?;

    log::debug!("Logging to {}", path.display());
    Ok(())
}
