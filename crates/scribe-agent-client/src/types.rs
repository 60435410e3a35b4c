use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Parameters fixed for the lifetime of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    pub system_prompt: String,
    pub allowed_tools: BTreeSet<String>,
    /// Directory the agent operates in.
    pub cwd: PathBuf,
}

impl AgentOptions {
    pub fn new(system_prompt: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            allowed_tools: BTreeSet::new(),
            cwd: cwd.into(),
        }
    }

    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }
}

/// Token counts for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_input_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
}

impl From<scribe_protocol::Usage> for TokenUsage {
    fn from(usage: scribe_protocol::Usage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cache_read_input_tokens: usage.cache_read_input_tokens,
            cache_creation_input_tokens: usage.cache_creation_input_tokens,
        }
    }
}

/// One unit of streamed agent output.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEvent {
    /// Assistant text, in emission order.
    TextFragment(String),
    /// The agent invoked a tool.
    ToolInvocationNotice { tool_name: String, tool_input: Value },
    /// End of the turn.
    TurnResult {
        cost_usd: Option<f64>,
        usage: Option<TokenUsage>,
    },
}

impl ResponseEvent {
    pub fn text(text: impl Into<String>) -> Self {
        ResponseEvent::TextFragment(text.into())
    }

    pub fn tool(name: impl Into<String>, input: Value) -> Self {
        ResponseEvent::ToolInvocationNotice {
            tool_name: name.into(),
            tool_input: input,
        }
    }

    pub fn turn_result(cost_usd: Option<f64>) -> Self {
        ResponseEvent::TurnResult {
            cost_usd,
            usage: None,
        }
    }

    pub fn is_turn_result(&self) -> bool {
        matches!(self, ResponseEvent::TurnResult { .. })
    }
}
