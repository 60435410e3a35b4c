//! Wire types for the agent-UI streaming protocol
//!
//! The agent service accepts a [`RunAgentInput`] per turn and answers with a
//! server-sent event stream of [`Event`]s. This crate only describes that
//! contract: request payloads, stream events and the SSE framing needed to
//! decode them. It performs no I/O.
//!
//! ## Example
//!
//! ```rust
//! use scribe_protocol::{Event, SseDecoder};
//!
//! let mut decoder = SseDecoder::new();
//! assert!(decoder.push_line("event: TEXT_MESSAGE_CONTENT").is_none());
//! assert!(decoder.push_line(r#"data: {"messageId":"m1","delta":"Hi"}"#).is_none());
//! let frame = decoder.push_line("").unwrap();
//!
//! match Event::from_sse(&frame.event, &frame.data).unwrap() {
//!     Event::TextMessageContent(content) => assert_eq!(content.delta, "Hi"),
//!     other => panic!("unexpected event: {other:?}"),
//! }
//! ```

pub mod error;
pub mod events;
pub mod sse;
pub mod types;

pub use error::*;
pub use events::*;
pub use sse::*;
pub use types::*;
