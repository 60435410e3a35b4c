//! Line-oriented server-sent events framing.

/// One complete SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Accumulates `event:`/`data:` lines until a blank line closes the frame.
#[derive(Debug)]
pub struct SseDecoder {
    event: String,
    data: String,
}

const DEFAULT_EVENT: &str = "message";

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            event: DEFAULT_EVENT.to_string(),
            data: String::new(),
        }
    }

    /// Feeds one line (without its line terminator).
    ///
    /// Returns a frame when `line` is the blank separator and data was
    /// collected since the previous frame.
    pub fn push_line(&mut self, line: &str) -> Option<SseFrame> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.take_frame();
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = value.trim().to_string(),
            "data" => {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
            }
            _ => {}
        }

        None
    }

    /// Flushes a trailing frame that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        self.take_frame()
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        let event = std::mem::replace(&mut self.event, DEFAULT_EVENT.to_string());
        if self.data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event,
            data: std::mem::take(&mut self.data),
        })
    }
}
