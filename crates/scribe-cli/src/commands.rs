//! REPL command parsing
//!
//! Only three words are reserved; every other non-blank input goes to the
//! agent as-is.

/// Parsed REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the REPL (`quit` or `exit`)
    Quit,

    /// Start a fresh conversation
    Clear,

    /// Blank input, nothing to do
    Empty,

    /// Text for the agent, already trimmed
    Query(String),
}

impl Command {
    /// Parse one input block.
    ///
    /// Matching is exact after trimming and ignores case, so `quit now` is a
    /// query while ` EXIT ` is a command.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Command::Empty;
        }

        match trimmed.to_lowercase().as_str() {
            "quit" | "exit" => Command::Quit,
            "clear" => Command::Clear,
            _ => Command::Query(trimmed.to_string()),
        }
    }
}
