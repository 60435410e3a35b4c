//! Failures surfaced by the agent client.
//!
//! No retry policy exists at this layer: every variant is final for the
//! operation that produced it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentClientError {
    #[error("Agent service at {url} is unavailable: {reason}")]
    Unavailable { url: String, reason: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Agent service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Agent run failed: {message}")]
    Run {
        message: String,
        code: Option<String>,
    },
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Response stream ended before the turn completed")]
    IncompleteTurn,
    #[error("No query is awaiting a response")]
    NoPendingQuery,
    #[error("Connection is closed")]
    Closed,
    #[error("I/O error while reading the response stream: {0}")]
    Io(#[from] std::io::Error),
}

impl From<scribe_protocol::ProtocolError> for AgentClientError {
    fn from(err: scribe_protocol::ProtocolError) -> Self {
        AgentClientError::Protocol(err.to_string())
    }
}
