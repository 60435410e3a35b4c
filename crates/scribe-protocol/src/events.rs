//! Stream events of the agent-UI protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};

/// The type of event in the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    TextMessageStart,
    TextMessageContent,
    TextMessageEnd,
    TextMessageChunk,
    ToolCallStart,
    ToolCallArgs,
    ToolCallEnd,
    RunStarted,
    RunFinished,
    RunError,
    StepStarted,
    StepFinished,
    Custom,
}

impl EventType {
    /// Parses a wire name such as `TEXT_MESSAGE_CONTENT`.
    pub fn from_wire(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.to_string())).ok()
    }
}

/// Event indicating the start of a text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessageStartEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(default = "assistant_role")]
    pub role: String,
}

fn assistant_role() -> String {
    "assistant".to_string()
}

/// Event containing a piece of text message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessageContentEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub delta: String,
}

/// Event indicating the end of a text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessageEndEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "messageId")]
    pub message_id: String,
}

/// Self-contained chunk of text; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessageChunkEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

/// Event indicating the start of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallStartEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "toolCallId")]
    pub tool_call_id: String,
    #[serde(rename = "toolCallName")]
    pub tool_call_name: String,
    #[serde(rename = "parentMessageId", skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
}

/// Event carrying a fragment of a tool call's JSON arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallArgsEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "toolCallId")]
    pub tool_call_id: String,
    pub delta: String,
}

/// Event indicating the end of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallEndEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "toolCallId")]
    pub tool_call_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStartedEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    #[serde(rename = "runId")]
    pub run_id: String,
}

/// Token accounting reported by the service at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(rename = "inputTokens", default)]
    pub input_tokens: u64,
    #[serde(rename = "outputTokens", default)]
    pub output_tokens: u64,
    #[serde(rename = "cacheReadInputTokens", skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
    #[serde(
        rename = "cacheCreationInputTokens",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache_creation_input_tokens: Option<u64>,
}

/// Outcome metadata attached to `RUN_FINISHED`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(rename = "totalCostUsd", skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFinishedEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RunResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunErrorEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "stepName")]
    pub step_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

/// Union of all events, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    TextMessageStart(TextMessageStartEvent),
    TextMessageContent(TextMessageContentEvent),
    TextMessageEnd(TextMessageEndEvent),
    TextMessageChunk(TextMessageChunkEvent),
    ToolCallStart(ToolCallStartEvent),
    ToolCallArgs(ToolCallArgsEvent),
    ToolCallEnd(ToolCallEndEvent),
    RunStarted(RunStartedEvent),
    RunFinished(RunFinishedEvent),
    RunError(RunErrorEvent),
    StepStarted(StepEvent),
    StepFinished(StepEvent),
    Custom(CustomEvent),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::TextMessageStart(_) => EventType::TextMessageStart,
            Event::TextMessageContent(_) => EventType::TextMessageContent,
            Event::TextMessageEnd(_) => EventType::TextMessageEnd,
            Event::TextMessageChunk(_) => EventType::TextMessageChunk,
            Event::ToolCallStart(_) => EventType::ToolCallStart,
            Event::ToolCallArgs(_) => EventType::ToolCallArgs,
            Event::ToolCallEnd(_) => EventType::ToolCallEnd,
            Event::RunStarted(_) => EventType::RunStarted,
            Event::RunFinished(_) => EventType::RunFinished,
            Event::RunError(_) => EventType::RunError,
            Event::StepStarted(_) => EventType::StepStarted,
            Event::StepFinished(_) => EventType::StepFinished,
            Event::Custom(_) => EventType::Custom,
        }
    }

    /// Decodes one SSE frame.
    ///
    /// The type is taken from the payload's `type` field when present and
    /// from the SSE `event:` name otherwise (`message` is the SSE default and
    /// carries no type information).
    pub fn from_sse(event_name: &str, data: &str) -> ProtocolResult<Self> {
        let mut value: Value = serde_json::from_str(data)
            .map_err(|e| ProtocolError::malformed(event_name, e.to_string()))?;

        let event_type = match value.get("type").and_then(Value::as_str) {
            Some(tagged) => tagged.to_string(),
            None => event_name.to_string(),
        };

        if EventType::from_wire(&event_type).is_none() {
            return Err(ProtocolError::UnknownEvent { event_type });
        }

        if let Some(object) = value.as_object_mut() {
            object
                .entry("type")
                .or_insert_with(|| Value::String(event_type.clone()));
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::malformed(event_type, e.to_string()))
    }
}

impl TextMessageContentEvent {
    pub fn new(message_id: String, delta: String) -> Self {
        Self {
            timestamp: None,
            message_id,
            delta,
        }
    }
}

impl ToolCallStartEvent {
    pub fn new(tool_call_id: String, tool_call_name: String) -> Self {
        Self {
            timestamp: None,
            tool_call_id,
            tool_call_name,
            parent_message_id: None,
        }
    }
}

impl ToolCallArgsEvent {
    pub fn new(tool_call_id: String, delta: String) -> Self {
        Self {
            timestamp: None,
            tool_call_id,
            delta,
        }
    }
}

impl ToolCallEndEvent {
    pub fn new(tool_call_id: String) -> Self {
        Self {
            timestamp: None,
            tool_call_id,
        }
    }
}

impl RunFinishedEvent {
    pub fn new(thread_id: String, run_id: String) -> Self {
        Self {
            timestamp: None,
            thread_id,
            run_id,
            result: None,
        }
    }

    pub fn with_result(mut self, result: RunResult) -> Self {
        self.result = Some(result);
        self
    }
}

impl RunErrorEvent {
    pub fn new(message: String) -> Self {
        Self {
            timestamp: None,
            message,
            code: None,
        }
    }
}
