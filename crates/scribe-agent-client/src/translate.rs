//! Conversion of protocol events into [`ResponseEvent`]s.
//!
//! Tool calls arrive in pieces (`TOOL_CALL_START`, any number of
//! `TOOL_CALL_ARGS`, then `TOOL_CALL_END`); the translator buffers them and
//! emits a single notice once the arguments are complete.

use scribe_protocol::Event;
use serde_json::Value;
use std::collections::HashMap;

use crate::{AgentClientError, ResponseEvent, TokenUsage};

#[derive(Debug)]
struct PendingToolCall {
    name: String,
    arguments: String,
}

/// Per-turn translation state.
#[derive(Debug, Default)]
pub struct TurnTranslator {
    tool_calls: HashMap<String, PendingToolCall>,
    assistant_text: String,
}

impl TurnTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates one protocol event. Returns `Ok(None)` for events that have
    /// no visible counterpart.
    pub fn translate(&mut self, event: Event) -> Result<Option<ResponseEvent>, AgentClientError> {
        let translated = match event {
            Event::TextMessageContent(content) => self.text(content.delta),
            Event::TextMessageChunk(chunk) => chunk.delta.and_then(|delta| self.text(delta)),
            Event::ToolCallStart(start) => {
                self.tool_calls.insert(
                    start.tool_call_id,
                    PendingToolCall {
                        name: start.tool_call_name,
                        arguments: String::new(),
                    },
                );
                None
            }
            Event::ToolCallArgs(args) => {
                match self.tool_calls.get_mut(&args.tool_call_id) {
                    Some(call) => call.arguments.push_str(&args.delta),
                    None => log::warn!(
                        "Arguments for unknown tool call {} ignored",
                        args.tool_call_id
                    ),
                }
                None
            }
            Event::ToolCallEnd(end) => match self.tool_calls.remove(&end.tool_call_id) {
                Some(call) => Some(ResponseEvent::ToolInvocationNotice {
                    tool_input: parse_arguments(&call.arguments),
                    tool_name: call.name,
                }),
                None => {
                    log::warn!("End of unknown tool call {} ignored", end.tool_call_id);
                    None
                }
            },
            Event::RunFinished(finished) => {
                if !self.tool_calls.is_empty() {
                    log::debug!(
                        "Run finished with {} unterminated tool call(s)",
                        self.tool_calls.len()
                    );
                }
                let result = finished.result.unwrap_or_default();
                Some(ResponseEvent::TurnResult {
                    cost_usd: result.total_cost_usd,
                    usage: result.usage.map(TokenUsage::from),
                })
            }
            Event::RunError(error) => {
                return Err(AgentClientError::Run {
                    message: error.message,
                    code: error.code,
                });
            }
            other => {
                log::trace!("Ignoring {:?} event", other.event_type());
                None
            }
        };

        Ok(translated)
    }

    /// Text streamed so far in this turn, leaving the buffer empty.
    pub fn take_assistant_text(&mut self) -> String {
        std::mem::take(&mut self.assistant_text)
    }

    fn text(&mut self, delta: String) -> Option<ResponseEvent> {
        if delta.is_empty() {
            return None;
        }
        self.assistant_text.push_str(&delta);
        Some(ResponseEvent::TextFragment(delta))
    }
}

fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_protocol::{
        RunErrorEvent, RunFinishedEvent, RunResult, TextMessageContentEvent, ToolCallArgsEvent,
        ToolCallEndEvent, ToolCallStartEvent, Usage,
    };
    use serde_json::json;

    fn content(delta: &str) -> Event {
        Event::TextMessageContent(TextMessageContentEvent::new(
            "m1".to_string(),
            delta.to_string(),
        ))
    }

    #[test]
    fn test_text_content_becomes_fragment() {
        let mut translator = TurnTranslator::new();
        let event = translator.translate(content("Hello")).unwrap();
        assert_eq!(event, Some(ResponseEvent::text("Hello")));
        assert_eq!(translator.take_assistant_text(), "Hello");
        assert_eq!(translator.take_assistant_text(), "");
    }

    #[test]
    fn test_empty_delta_is_dropped() {
        let mut translator = TurnTranslator::new();
        assert_eq!(translator.translate(content("")).unwrap(), None);
    }

    #[test]
    fn test_tool_call_is_assembled_from_argument_deltas() {
        let mut translator = TurnTranslator::new();
        let start = Event::ToolCallStart(ToolCallStartEvent::new(
            "c1".to_string(),
            "Read".to_string(),
        ));
        assert_eq!(translator.translate(start).unwrap(), None);

        for delta in [r#"{"file_pa"#, r#"th":"posts/a.md"}"#] {
            let args = Event::ToolCallArgs(ToolCallArgsEvent::new(
                "c1".to_string(),
                delta.to_string(),
            ));
            assert_eq!(translator.translate(args).unwrap(), None);
        }

        let end = Event::ToolCallEnd(ToolCallEndEvent::new("c1".to_string()));
        assert_eq!(
            translator.translate(end).unwrap(),
            Some(ResponseEvent::tool("Read", json!({"file_path": "posts/a.md"})))
        );
    }

    #[test]
    fn test_tool_call_without_arguments() {
        let mut translator = TurnTranslator::new();
        translator
            .translate(Event::ToolCallStart(ToolCallStartEvent::new(
                "c1".to_string(),
                "Glob".to_string(),
            )))
            .unwrap();
        let notice = translator
            .translate(Event::ToolCallEnd(ToolCallEndEvent::new("c1".to_string())))
            .unwrap();
        assert_eq!(notice, Some(ResponseEvent::tool("Glob", json!({}))));
    }

    #[test]
    fn test_unparsable_arguments_are_kept_verbatim() {
        assert_eq!(parse_arguments("ls -la"), json!("ls -la"));
    }

    #[test]
    fn test_unknown_tool_call_end_is_ignored() {
        let mut translator = TurnTranslator::new();
        let end = Event::ToolCallEnd(ToolCallEndEvent::new("missing".to_string()));
        assert_eq!(translator.translate(end).unwrap(), None);
    }

    #[test]
    fn test_run_finished_carries_cost_and_usage() {
        let mut translator = TurnTranslator::new();
        let finished = RunFinishedEvent::new("t".to_string(), "r".to_string()).with_result(
            RunResult {
                total_cost_usd: Some(0.0023),
                usage: Some(Usage {
                    input_tokens: 10,
                    output_tokens: 5,
                    ..Default::default()
                }),
            },
        );

        let event = translator
            .translate(Event::RunFinished(finished))
            .unwrap()
            .unwrap();
        match event {
            ResponseEvent::TurnResult { cost_usd, usage } => {
                assert_eq!(cost_usd, Some(0.0023));
                let usage = usage.unwrap();
                assert_eq!(usage.input_tokens, 10);
                assert_eq!(usage.output_tokens, 5);
            }
            other => panic!("expected TurnResult, got {other:?}"),
        }
    }

    #[test]
    fn test_run_finished_without_result() {
        let mut translator = TurnTranslator::new();
        let finished = RunFinishedEvent::new("t".to_string(), "r".to_string());
        assert_eq!(
            translator.translate(Event::RunFinished(finished)).unwrap(),
            Some(ResponseEvent::TurnResult {
                cost_usd: None,
                usage: None
            })
        );
    }

    #[test]
    fn test_run_error_is_surfaced() {
        let mut translator = TurnTranslator::new();
        let err = translator
            .translate(Event::RunError(RunErrorEvent::new("rate limited".to_string())))
            .unwrap_err();
        assert!(matches!(err, AgentClientError::Run { ref message, .. } if message == "rate limited"));
    }
}
