//! Client SDK for talking to a hosted writing agent
//!
//! A session acquires one [`AgentConnection`] through an [`AgentClient`],
//! submits each user turn with [`AgentConnection::query`] and then drains the
//! turn's [`ResponseEvent`]s from [`AgentConnection::receive_response`]. The
//! stream for a turn always ends with exactly one
//! [`ResponseEvent::TurnResult`]; anything else surfaces as an
//! [`AgentClientError`].
//!
//! The agent service performs all reasoning and tool execution. This crate
//! only moves text in and events out.

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;
use std::time::Duration;

pub mod error;
pub mod http_client;
pub mod translate;
pub mod types;

pub use error::AgentClientError;
pub use http_client::{HttpAgentClient, HttpConnection};
pub use types::*;

/// Lazy, single-pass sequence of events for one turn.
pub type ResponseStream<'a> =
    Pin<Box<dyn Stream<Item = Result<ResponseEvent, AgentClientError>> + Send + 'a>>;

/// Opens connections to an agent service.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Establishes a connection scoped to the given options.
    async fn connect(
        &self,
        options: AgentOptions,
    ) -> Result<Box<dyn AgentConnection>, AgentClientError>;
}

/// An open conversation with the agent.
///
/// Owned exclusively by one session. Callers must invoke
/// [`close`](AgentConnection::close) before dropping it.
#[async_trait]
pub trait AgentConnection: Send {
    /// Submits one user turn.
    async fn query(&mut self, text: &str) -> Result<(), AgentClientError>;

    /// Streams the response to the last query, ending with a `TurnResult`.
    fn receive_response(&mut self) -> ResponseStream<'_>;

    /// Discards the conversation so the next query starts fresh.
    async fn reset(&mut self) -> Result<(), AgentClientError>;

    /// Releases the connection. Further calls fail with `Closed`.
    async fn close(&mut self) -> Result<(), AgentClientError>;
}

/// Factory for creating AgentClient instances
pub struct AgentClientFactory;

impl AgentClientFactory {
    /// Create an HTTP client for a remote agent service
    pub fn create_http_client(base_url: String, timeout: Duration) -> Box<dyn AgentClient> {
        Box::new(HttpAgentClient::new(base_url).with_timeout(timeout))
    }
}
