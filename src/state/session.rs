use super::transcript::Transcript;
use crate::runtime::StreamEvent;
use crate::types::ApiMessage;

pub type TurnId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Pending,
    Error,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "ready",
            Self::Pending => "streaming",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Submit(String),
    Stream { turn: TurnId, event: StreamEvent },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    StartRequest {
        turn: TurnId,
        messages: Vec<ApiMessage>,
    },
    Quit,
}

/// Chat session state machine.
///
/// Owns the transcript exclusively. `update` is the only entry point that
/// mutates it and is driven from the dispatcher task, one input at a time.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    transcript: Transcript,
    last_error: Option<String>,
    active_turn: Option<TurnId>,
    next_turn: TurnId,
    closed: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            transcript: Transcript::new(),
            last_error: None,
            active_turn: None,
            next_turn: 1,
            closed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == SessionState::Pending
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn active_turn(&self) -> Option<TurnId> {
        self.active_turn
    }

    pub fn update(&mut self, input: SessionInput) -> Option<SessionCommand> {
        if self.closed {
            return None;
        }
        match input {
            SessionInput::Submit(text) => self.submit(text),
            SessionInput::Stream { turn, event } => {
                self.apply_stream_event(turn, event);
                None
            }
            SessionInput::Quit => {
                self.closed = true;
                tracing::info!(state = self.state.label(), "session closed");
                Some(SessionCommand::Quit)
            }
        }
    }

    fn submit(&mut self, text: String) -> Option<SessionCommand> {
        if self.state == SessionState::Pending {
            tracing::debug!("submit ignored while a turn is in flight");
            return None;
        }
        let text = text.trim().to_string();
        if text.is_empty() {
            return None;
        }

        self.transcript.push_user(text);
        let messages = self.transcript.to_api_messages();
        if !self.transcript.open_assistant() {
            return None;
        }

        let turn = self.next_turn;
        self.next_turn += 1;
        self.active_turn = Some(turn);
        self.last_error = None;
        self.state = SessionState::Pending;
        tracing::info!(turn, history = messages.len(), "turn accepted");

        Some(SessionCommand::StartRequest { turn, messages })
    }

    fn apply_stream_event(&mut self, turn: TurnId, event: StreamEvent) {
        if self.active_turn != Some(turn) {
            tracing::debug!(turn, "dropping event for inactive turn");
            return;
        }

        match event {
            StreamEvent::Delta(text) => {
                self.transcript.append_to_streaming(&text);
            }
            StreamEvent::Done => {
                self.transcript.finish_streaming();
                self.active_turn = None;
                self.state = SessionState::Idle;
                tracing::info!(turn, "turn complete");
            }
            StreamEvent::Failed(reason) => {
                self.transcript.finish_streaming();
                self.active_turn = None;
                self.state = SessionState::Error;
                tracing::warn!(turn, %reason, "turn failed");
                self.last_error = Some(reason);
            }
        }
    }
}
