use scribe_agent_client::AgentClientError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("Input was interrupted")]
    InputInterrupted,
    #[error("Failed to read input: {0}")]
    Input(String),
    #[error(transparent)]
    Agent(#[from] AgentClientError),
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure while drawing one turn.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write response: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Agent(#[from] AgentClientError),
}

impl From<RenderError> for SessionError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Io(e) => SessionError::Io(e),
            RenderError::Agent(e) => SessionError::Agent(e),
        }
    }
}
