//! Request-side types of the agent-UI protocol.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User,
}

/// A conversation message, tagged by role on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        id: String,
        content: String,
    },
    Assistant {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    User {
        id: String,
        content: String,
    },
}

impl Message {
    pub fn id(&self) -> &str {
        match self {
            Message::System { id, .. } => id,
            Message::Assistant { id, .. } => id,
            Message::User { id, .. } => id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::Assistant { .. } => Role::Assistant,
            Message::User { .. } => Role::User,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Message::System { content, .. } => Some(content),
            Message::Assistant { content, .. } => content.as_deref(),
            Message::User { content, .. } => Some(content),
        }
    }

    pub fn new_system(id: String, content: String) -> Self {
        Message::System { id, content }
    }

    pub fn new_assistant(id: String, content: String) -> Self {
        Message::Assistant {
            id,
            content: Some(content),
        }
    }

    pub fn new_user(id: String, content: String) -> Self {
        Message::User { id, content }
    }
}

/// A piece of ambient context passed along with a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub description: String,
    pub value: String,
}

/// A tool the agent is permitted to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl Tool {
    /// A tool that the service resolves by name; the client supplies no schema.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Body of a `POST /stream` request: one run of the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAgentInput {
    #[serde(rename = "threadId")]
    pub thread_id: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    pub state: serde_json::Value,
    pub messages: Vec<Message>,
    pub tools: Vec<Tool>,
    pub context: Vec<Context>,
    #[serde(rename = "forwardedProps")]
    pub forwarded_props: serde_json::Value,
}

impl RunAgentInput {
    /// Creates a run with a fresh run id and empty tools, context and state.
    pub fn new(thread_id: String, messages: Vec<Message>) -> Self {
        Self {
            thread_id,
            run_id: Uuid::new_v4().to_string(),
            state: serde_json::Value::Object(serde_json::Map::new()),
            messages,
            tools: Vec::new(),
            context: Vec::new(),
            forwarded_props: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_context(mut self, context: Vec<Context>) -> Self {
        self.context = context;
        self
    }

    pub fn with_forwarded_props(mut self, props: serde_json::Value) -> Self {
        self.forwarded_props = props;
        self
    }
}

/// Generates a short thread identifier of the form `th_xxxxxxxx`.
pub fn new_thread_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("th_{}", &uuid[..8])
}
