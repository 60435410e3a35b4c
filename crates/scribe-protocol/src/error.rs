//! Error types for protocol decoding.

use thiserror::Error;

/// Errors that can occur while decoding protocol frames.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The payload was not valid JSON for the named event.
    #[error("Malformed {event_type} event: {message}")]
    Malformed { event_type: String, message: String },

    /// The event type is not part of the protocol.
    #[error("Unknown event type: {event_type}")]
    UnknownEvent { event_type: String },
}

impl ProtocolError {
    pub fn malformed(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            event_type: event_type.into(),
            message: message.into(),
        }
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
