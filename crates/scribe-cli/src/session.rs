//! The REPL loop.
//!
//! A [`Session`] owns the agent connection for its whole lifetime. Each
//! iteration reads one input block, dispatches it as a [`Command`] and, for
//! queries, renders the streamed response to completion before prompting
//! again. [`Session::run`] closes the connection on every exit path.

use scribe_agent_client::{AgentConnection, AgentOptions};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::commands::Command;
use crate::error::SessionError;
use crate::input::InputSource;
use crate::renderer::Renderer;

/// Produces a future that resolves when the user asks to abort a turn.
/// Called once per turn.
pub type InterruptSignal = Box<dyn Fn() -> Pin<Box<dyn Future<Output = ()>>>>;

pub fn interrupt_on<F, Fut>(signal: F) -> InterruptSignal
where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Box::new(move || -> Pin<Box<dyn Future<Output = ()>>> { Box::pin(signal()) })
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
pub fn ctrl_c_signal() -> InterruptSignal {
    interrupt_on(|| async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
}

/// Resolves the directory the agent works in. Defaults to the current
/// directory; an explicit path must exist and is canonicalized.
pub fn resolve_working_dir(path: Option<&Path>) -> Result<PathBuf, SessionError> {
    let cwd = std::env::current_dir()?;
    let Some(path) = path else {
        return Ok(cwd);
    };

    let absolute = cwd.join(path);
    if !absolute.exists() {
        return Err(SessionError::PathNotFound(absolute));
    }
    Ok(absolute.canonicalize()?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    AwaitingInput,
    AwaitingResponse,
    Terminated,
}

/// Why a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `quit` or `exit`
    Quit,
    /// Ctrl-C or end-of-input at the prompt
    InputClosed,
    /// Ctrl-C while the agent was busy
    Interrupted,
}

pub struct Session<I: InputSource, W: Write> {
    options: AgentOptions,
    connection: Box<dyn AgentConnection>,
    input: I,
    renderer: Renderer<W>,
    interrupt: InterruptSignal,
    state: DriverState,
    turns: usize,
    total_cost_usd: f64,
}

impl<I: InputSource, W: Write> Session<I, W> {
    pub fn new(
        options: AgentOptions,
        connection: Box<dyn AgentConnection>,
        input: I,
        renderer: Renderer<W>,
    ) -> Self {
        Self {
            options,
            connection,
            input,
            renderer,
            interrupt: ctrl_c_signal(),
            state: DriverState::AwaitingInput,
            turns: 0,
            total_cost_usd: 0.0,
        }
    }

    pub fn with_interrupt(mut self, interrupt: InterruptSignal) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn cwd(&self) -> &Path {
        &self.options.cwd
    }

    pub fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }

    /// Runs the loop until the session terminates, then closes the
    /// connection whatever the outcome.
    pub async fn run(&mut self) -> Result<ExitReason, SessionError> {
        log::info!(
            "Session started in {} with tools [{}]",
            self.cwd().display(),
            self.options
                .allowed_tools
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );

        let outcome = self.drive().await;
        self.state = DriverState::Terminated;

        if let Err(e) = self.connection.close().await {
            log::warn!("Failed to close agent connection: {}", e);
        }

        match &outcome {
            Ok(reason) => log::info!(
                "Session ended ({:?}) after {} turn(s), total cost ${:.4}",
                reason,
                self.turns,
                self.total_cost_usd
            ),
            Err(e) => log::error!("Session failed after {} turn(s): {}", self.turns, e),
        }
        outcome
    }

    async fn drive(&mut self) -> Result<ExitReason, SessionError> {
        loop {
            if let Some(reason) = self.step().await? {
                return Ok(reason);
            }
        }
    }

    /// One prompt and its consequences. Returns the exit reason once the
    /// session is over.
    async fn step(&mut self) -> Result<Option<ExitReason>, SessionError> {
        self.state = DriverState::AwaitingInput;
        self.renderer.separator()?;

        let prompt = self.renderer.prompt();
        let line = match self.input.read_input(&prompt) {
            Ok(line) => line,
            Err(SessionError::InputInterrupted) => {
                self.renderer.farewell(true)?;
                return Ok(Some(self.terminate(ExitReason::InputClosed)));
            }
            Err(e) => return Err(e),
        };

        match Command::parse(&line) {
            Command::Empty => Ok(None),
            Command::Quit => {
                self.renderer.farewell(false)?;
                Ok(Some(self.terminate(ExitReason::Quit)))
            }
            Command::Clear => {
                let interrupt = (self.interrupt)();
                let reset = self.connection.reset();
                let cleared = tokio::select! {
                    result = reset => Some(result),
                    _ = interrupt => None,
                };
                if cleared.transpose()?.is_none() {
                    log::info!("Reset interrupted");
                    self.renderer.interrupted()?;
                    return Ok(Some(self.terminate(ExitReason::Interrupted)));
                }
                log::info!("Conversation cleared after {} turn(s)", self.turns);
                self.renderer.notice("(Conversation cleared)")?;
                Ok(None)
            }
            Command::Query(text) => self.submit(&text).await,
        }
    }

    async fn submit(&mut self, text: &str) -> Result<Option<ExitReason>, SessionError> {
        self.state = DriverState::AwaitingResponse;
        log::info!("Turn {}: sending {} chars", self.turns + 1, text.len());

        let interrupt = (self.interrupt)();
        let connection = &mut self.connection;
        let renderer = &mut self.renderer;
        let turn = async move {
            connection.query(text).await?;
            renderer.assistant_label()?;
            let summary = renderer.render_turn(connection.receive_response()).await?;
            Ok::<_, SessionError>(summary)
        };

        let rendered = tokio::select! {
            result = turn => Some(result),
            _ = interrupt => None,
        };

        let summary = match rendered {
            Some(result) => result?,
            None => {
                log::info!("Turn {} interrupted", self.turns + 1);
                self.renderer.interrupted()?;
                return Ok(Some(self.terminate(ExitReason::Interrupted)));
            }
        };

        self.turns += 1;
        self.total_cost_usd += summary.cost_usd.unwrap_or(0.0);
        log::info!(
            "Turn {} complete: {} fragment(s), {} tool call(s)",
            self.turns,
            summary.fragments,
            summary.tool_calls
        );
        if let Some(usage) = &summary.usage {
            log::debug!(
                "Turn {} usage: {} input, {} output tokens, cost {:?}",
                self.turns,
                usage.input_tokens,
                usage.output_tokens,
                summary.cost_usd
            );
        }

        self.state = DriverState::AwaitingInput;
        Ok(None)
    }

    fn terminate(&mut self, reason: ExitReason) -> ExitReason {
        self.state = DriverState::Terminated;
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures_util::stream;
    use scribe_agent_client::{AgentClientError, ResponseEvent, ResponseStream};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::theme::Theme;

    type Turn = Vec<Result<ResponseEvent, AgentClientError>>;

    #[derive(Debug, Default)]
    struct Calls {
        queries: Vec<String>,
        resets: usize,
        closed: bool,
    }

    /// Where the fake agent stops responding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Stall {
        Never,
        Query,
        Response,
        Reset,
    }

    struct FakeConnection {
        calls: Arc<Mutex<Calls>>,
        turns: VecDeque<Turn>,
        stall: Stall,
    }

    #[async_trait]
    impl AgentConnection for FakeConnection {
        async fn query(&mut self, text: &str) -> Result<(), AgentClientError> {
            self.calls.lock().unwrap().queries.push(text.to_string());
            if self.stall == Stall::Query {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        fn receive_response(&mut self) -> ResponseStream<'_> {
            if self.stall == Stall::Response {
                return Box::pin(stream::pending());
            }
            let turn = self.turns.pop_front().unwrap_or_default();
            Box::pin(stream::iter(turn))
        }

        async fn reset(&mut self) -> Result<(), AgentClientError> {
            self.calls.lock().unwrap().resets += 1;
            if self.stall == Stall::Reset {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<(), AgentClientError> {
            self.calls.lock().unwrap().closed = true;
            Ok(())
        }
    }

    /// Replays canned input; runs dry as if stdin were closed.
    struct ScriptedInput {
        lines: VecDeque<Result<String, SessionError>>,
    }

    impl ScriptedInput {
        fn lines(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| Ok(l.to_string())).collect(),
            }
        }
    }

    impl InputSource for ScriptedInput {
        fn read_input(&mut self, prompt: &str) -> Result<String, SessionError> {
            assert_eq!(prompt, "You: ");
            self.lines
                .pop_front()
                .unwrap_or(Err(SessionError::InputInterrupted))
        }
    }

    struct Harness {
        session: Session<ScriptedInput, Vec<u8>>,
        calls: Arc<Mutex<Calls>>,
    }

    impl Harness {
        fn new(input: ScriptedInput, turns: Vec<Turn>) -> Self {
            Self::build(input, turns, Stall::Never)
        }

        fn build(input: ScriptedInput, turns: Vec<Turn>, stall: Stall) -> Self {
            let calls = Arc::new(Mutex::new(Calls::default()));
            let connection = FakeConnection {
                calls: calls.clone(),
                turns: turns.into(),
                stall,
            };
            let session = Session::new(
                AgentOptions::new("Be helpful.", "/tmp/blog").with_allowed_tools(["Read"]),
                Box::new(connection),
                input,
                Renderer::new(Vec::new(), Theme::plain()),
            )
            .with_interrupt(interrupt_on(std::future::pending::<()>));
            Self { session, calls }
        }

        fn output(&self) -> String {
            String::from_utf8(self.session.renderer().get_ref().clone()).unwrap()
        }
    }

    #[test]
    fn test_resolve_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("posts");
        std::fs::create_dir(&posts).unwrap();

        let resolved = resolve_working_dir(Some(&posts.join("..").join("posts"))).unwrap();
        assert_eq!(resolved, posts.canonicalize().unwrap());

        assert_eq!(
            resolve_working_dir(None).unwrap(),
            std::env::current_dir().unwrap()
        );
    }

    #[test]
    fn test_resolve_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("drafts");

        match resolve_working_dir(Some(&missing)) {
            Err(SessionError::PathNotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected PathNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_quit_terminates_without_contacting_agent() {
        for word in ["quit", "exit", " QUIT "] {
            let mut h = Harness::new(ScriptedInput::lines(&[word]), vec![]);

            assert_eq!(h.session.run().await.unwrap(), ExitReason::Quit);
            assert_eq!(h.session.state(), DriverState::Terminated);
            assert_eq!(h.output(), "\nGoodbye!\n");

            let calls = h.calls.lock().unwrap();
            assert!(calls.queries.is_empty());
            assert!(calls.closed);
        }
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut h = Harness::new(ScriptedInput::lines(&["", "   ", "\n\n", "exit"]), vec![]);

        assert_eq!(h.session.run().await.unwrap(), ExitReason::Quit);
        assert!(h.calls.lock().unwrap().queries.is_empty());
    }

    #[tokio::test]
    async fn test_query_streams_response() {
        let mut h = Harness::new(
            ScriptedInput::lines(&["  Hello  ", "quit"]),
            vec![vec![
                Ok(ResponseEvent::text("Hello")),
                Ok(ResponseEvent::text(" world")),
                Ok(ResponseEvent::turn_result(Some(0.0))),
            ]],
        );

        assert_eq!(h.session.run().await.unwrap(), ExitReason::Quit);
        assert_eq!(h.calls.lock().unwrap().queries, vec!["Hello"]);
        assert_eq!(h.output(), "\n\nAssistant: Hello world\n\nGoodbye!\n");
    }

    #[tokio::test]
    async fn test_multiline_input_is_sent_verbatim() {
        let mut h = Harness::new(
            ScriptedInput::lines(&["Tighten this:\n\nFirst draft.", "quit"]),
            vec![vec![Ok(ResponseEvent::turn_result(None))]],
        );

        h.session.run().await.unwrap();
        assert_eq!(
            h.calls.lock().unwrap().queries,
            vec!["Tighten this:\n\nFirst draft."]
        );
    }

    #[tokio::test]
    async fn test_cost_is_shown_after_turn() {
        let mut h = Harness::new(
            ScriptedInput::lines(&["Hi", "quit"]),
            vec![vec![
                Ok(ResponseEvent::text("Hi")),
                Ok(ResponseEvent::turn_result(Some(0.0023))),
            ]],
        );

        h.session.run().await.unwrap();
        assert!(h.output().contains("Hi\n(Cost: $0.0023)\n"));
    }

    #[tokio::test]
    async fn test_clear_resets_conversation() {
        let mut h = Harness::new(ScriptedInput::lines(&["clear", "quit"]), vec![]);

        h.session.run().await.unwrap();
        let calls = h.calls.lock().unwrap();
        assert_eq!(calls.resets, 1);
        assert!(calls.queries.is_empty());
        assert!(h.output().contains("(Conversation cleared)\n"));
    }

    #[tokio::test]
    async fn test_end_of_input_says_goodbye() {
        let mut h = Harness::new(ScriptedInput::lines(&[]), vec![]);

        assert_eq!(h.session.run().await.unwrap(), ExitReason::InputClosed);
        assert_eq!(h.output(), "\n\nGoodbye!\n");
        assert!(h.calls.lock().unwrap().closed);
    }

    #[tokio::test]
    async fn test_interrupt_while_streaming_closes_connection() {
        let mut h = Harness::build(ScriptedInput::lines(&["Hello"]), vec![], Stall::Response);
        h.session = h
            .session
            .with_interrupt(interrupt_on(|| async {}));

        assert_eq!(h.session.run().await.unwrap(), ExitReason::Interrupted);
        assert_eq!(h.session.state(), DriverState::Terminated);
        assert!(h.output().ends_with("\nInterrupted\n"));
        assert!(h.calls.lock().unwrap().closed);
    }

    #[tokio::test]
    async fn test_interrupt_while_query_is_sent() {
        let mut h = Harness::build(ScriptedInput::lines(&["Hello"]), vec![], Stall::Query);
        h.session = h
            .session
            .with_interrupt(interrupt_on(|| async {}));

        let outcome = tokio::time::timeout(Duration::from_secs(1), h.session.run())
            .await
            .expect("interrupt did not abort the pending query");

        assert_eq!(outcome.unwrap(), ExitReason::Interrupted);
        assert_eq!(h.output(), "\n\nInterrupted\n");
        let calls = h.calls.lock().unwrap();
        assert_eq!(calls.queries, vec!["Hello"]);
        assert!(calls.closed);
    }

    #[tokio::test]
    async fn test_interrupt_while_clearing() {
        let mut h = Harness::build(ScriptedInput::lines(&["clear"]), vec![], Stall::Reset);
        h.session = h
            .session
            .with_interrupt(interrupt_on(|| async {}));

        let outcome = tokio::time::timeout(Duration::from_secs(1), h.session.run())
            .await
            .expect("interrupt did not abort the pending reset");

        assert_eq!(outcome.unwrap(), ExitReason::Interrupted);
        assert!(!h.output().contains("(Conversation cleared)"));
        assert!(h.calls.lock().unwrap().closed);
    }

    #[tokio::test]
    async fn test_agent_error_is_fatal_and_connection_closed() {
        let mut h = Harness::new(
            ScriptedInput::lines(&["Hello", "never read"]),
            vec![vec![
                Ok(ResponseEvent::text("Par")),
                Err(AgentClientError::Run {
                    message: "overloaded".to_string(),
                    code: None,
                }),
            ]],
        );

        let err = h.session.run().await.unwrap_err();
        assert!(matches!(err, SessionError::Agent(AgentClientError::Run { .. })));
        assert_eq!(h.session.state(), DriverState::Terminated);

        let calls = h.calls.lock().unwrap();
        assert_eq!(calls.queries, vec!["Hello"]);
        assert!(calls.closed);
    }

    #[tokio::test]
    async fn test_input_failure_is_fatal() {
        let input = ScriptedInput {
            lines: VecDeque::from([Err(SessionError::Input("terminal gone".to_string()))]),
        };
        let mut h = Harness::new(input, vec![]);

        assert!(matches!(
            h.session.run().await,
            Err(SessionError::Input(_))
        ));
        assert!(h.calls.lock().unwrap().closed);
    }
}
