use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::stream::{Stream, TryStreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use scribe_protocol::{new_thread_id, Context, Event, Message, RunAgentInput, SseDecoder, Tool};
use serde_json::json;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use uuid::Uuid;

use crate::{
    translate::TurnTranslator, AgentClient, AgentClientError, AgentConnection, AgentOptions,
    ResponseEvent, ResponseStream,
};

/// HTTP client for communicating with remote agent services
pub struct HttpAgentClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeouts bound connecting and each read, never a whole streamed response.
fn streaming_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to a default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

impl HttpAgentClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: streaming_client(DEFAULT_TIMEOUT),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the connect and idle-read timeout for streams, and the total
    /// timeout for the short health and memory requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = streaming_client(timeout);
        self.timeout = timeout;
        self
    }

    async fn health_check(&self) -> Result<(), AgentClientError> {
        let health_url = format!("{}/health", self.base_url);
        let unavailable = |reason: String| AgentClientError::Unavailable {
            url: self.base_url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&health_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("health check returned {}", response.status())));
        }

        Ok(())
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn connect(
        &self,
        options: AgentOptions,
    ) -> Result<Box<dyn AgentConnection>, AgentClientError> {
        self.health_check().await?;

        let connection = HttpConnection {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            timeout: self.timeout,
            options,
            thread_id: new_thread_id(),
            history: Vec::new(),
            pending: None,
            closed: false,
        };
        log::info!(
            "Connected to agent service at {} (thread {})",
            connection.base_url,
            connection.thread_id
        );

        Ok(Box::new(connection))
    }
}

/// A conversation thread held against a remote agent service.
///
/// The service is stateless per request, so the connection keeps the
/// message history and replays it with every run.
pub struct HttpConnection {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    options: AgentOptions,
    thread_id: String,
    history: Vec<Message>,
    pending: Option<reqwest::Response>,
    closed: bool,
}

impl HttpConnection {
    fn ensure_open(&self) -> Result<(), AgentClientError> {
        if self.closed {
            return Err(AgentClientError::Closed);
        }
        Ok(())
    }

    fn run_input(&self) -> RunAgentInput {
        let cwd = self.options.cwd.display().to_string();

        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(Message::new_system(
            Uuid::new_v4().to_string(),
            self.options.system_prompt.clone(),
        ));
        messages.extend(self.history.iter().cloned());

        let tools = self
            .options
            .allowed_tools
            .iter()
            .map(Tool::named)
            .collect();

        RunAgentInput::new(self.thread_id.clone(), messages)
            .with_tools(tools)
            .with_context(vec![Context {
                description: "Working directory".to_string(),
                value: cwd.clone(),
            }])
            .with_forwarded_props(json!({
                "cwd": cwd,
                "allowedTools": self.options.allowed_tools,
            }))
    }
}

#[async_trait]
impl AgentConnection for HttpConnection {
    async fn query(&mut self, text: &str) -> Result<(), AgentClientError> {
        self.ensure_open()?;

        if self.pending.take().is_some() {
            log::warn!("Discarding unread response from the previous turn");
        }

        self.history
            .push(Message::new_user(Uuid::new_v4().to_string(), text.to_string()));

        let stream_url = format!("{}/stream", self.base_url);
        let request_payload = self.run_input();
        log::debug!(
            "Starting run {} with {} message(s)",
            request_payload.run_id,
            request_payload.messages.len()
        );

        let response = self
            .client
            .post(&stream_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(&request_payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            log::error!("Stream request failed with {}: {}", status, body);
            return Err(AgentClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        self.pending = Some(response);
        Ok(())
    }

    fn receive_response(&mut self) -> ResponseStream<'_> {
        Box::pin(response_events(self))
    }

    async fn reset(&mut self) -> Result<(), AgentClientError> {
        self.ensure_open()?;

        self.history.clear();
        self.pending = None;
        self.thread_id = new_thread_id();
        log::info!("Conversation reset, new thread {}", self.thread_id);

        let clear_url = format!("{}/memory/clear", self.base_url);
        match self
            .client
            .delete(&clear_url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => log::warn!(
                "Agent service did not clear its memory: {}",
                response.status()
            ),
            Err(e) => log::warn!("Agent service memory clear failed: {}", e),
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), AgentClientError> {
        self.ensure_open()?;
        self.pending = None;
        self.closed = true;
        log::info!("Closed connection for thread {}", self.thread_id);
        Ok(())
    }
}

/// Drains the pending response of `conn` as a stream of turn events.
fn response_events(
    conn: &mut HttpConnection,
) -> impl Stream<Item = Result<ResponseEvent, AgentClientError>> + Send + '_ {
    try_stream! {
        conn.ensure_open()?;
        let response = conn.pending.take().ok_or(AgentClientError::NoPendingQuery)?;

        let body = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()));
        let mut lines_reader = StreamReader::new(body).lines();

        let mut decoder = SseDecoder::new();
        let mut translator = TurnTranslator::new();
        let mut finished = false;

        loop {
            let line = lines_reader.next_line().await?;
            let frame = match line.as_deref() {
                Some(line) => decoder.push_line(line),
                None => decoder.finish(),
            };

            if let Some(frame) = frame {
                match Event::from_sse(&frame.event, &frame.data) {
                    Ok(event) => {
                        if let Some(response_event) = translator.translate(event)? {
                            if response_event.is_turn_result() {
                                let text = translator.take_assistant_text();
                                if !text.is_empty() {
                                    conn.history
                                        .push(Message::new_assistant(Uuid::new_v4().to_string(), text));
                                }
                                finished = true;
                            }
                            yield response_event;
                        }
                    }
                    Err(e) => log::warn!("Skipping undecodable stream frame: {}", e),
                }
            }

            if finished || line.is_none() {
                break;
            }
        }

        if !finished {
            Err::<(), _>(AgentClientError::IncompleteTurn)?;
        }
    }
}

impl Drop for HttpConnection {
    fn drop(&mut self) {
        if !self.closed {
            log::debug!("Connection for thread {} dropped without close", self.thread_id);
        }
    }
}
