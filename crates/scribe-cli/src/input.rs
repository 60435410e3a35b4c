use rustyline::error::ReadlineError;
use rustyline::{Cmd, DefaultEditor, KeyCode, KeyEvent, Modifiers};

use crate::error::SessionError;

/// Source of user input blocks.
///
/// `read_input` blocks until a whole block is submitted. Ctrl-C and
/// end-of-input both surface as [`SessionError::InputInterrupted`].
pub trait InputSource {
    fn read_input(&mut self, prompt: &str) -> Result<String, SessionError>;
}

/// Key overrides for the editor. With `multiline`, Enter inserts a newline
/// and Alt+Enter (or Esc then Enter) submits; otherwise Enter submits.
pub fn key_bindings(multiline: bool) -> Vec<(KeyEvent, Cmd)> {
    if !multiline {
        return Vec::new();
    }
    vec![
        (KeyEvent(KeyCode::Enter, Modifiers::NONE), Cmd::Newline),
        (KeyEvent(KeyCode::Enter, Modifiers::ALT), Cmd::AcceptLine),
    ]
}

/// Terminal line editor with in-memory history.
pub struct LineEditor {
    editor: DefaultEditor,
}

impl LineEditor {
    pub fn new(multiline: bool) -> Result<Self, SessionError> {
        let mut editor = DefaultEditor::new().map_err(|e| SessionError::Input(e.to_string()))?;

        for (key, cmd) in key_bindings(multiline) {
            editor.bind_sequence(key, cmd);
        }

        Ok(Self { editor })
    }
}

impl InputSource for LineEditor {
    fn read_input(&mut self, prompt: &str) -> Result<String, SessionError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                Err(SessionError::InputInterrupted)
            }
            Err(e) => Err(SessionError::Input(e.to_string())),
        }
    }
}
