use crate::state::{Session, SessionInput};
use anyhow::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserInputEvent {
    Submit(String),
    Quit,
}

impl From<UserInputEvent> for SessionInput {
    fn from(event: UserInputEvent) -> Self {
        match event {
            UserInputEvent::Submit(text) => SessionInput::Submit(text),
            UserInputEvent::Quit => SessionInput::Quit,
        }
    }
}

/// Input and rendering surface driven by [`Runtime`](super::Runtime).
///
/// `poll_user_input` must not block; it is called repeatedly until it returns
/// `None` on every loop iteration.
pub trait FrontendAdapter {
    fn poll_user_input(&mut self, session: &Session) -> Result<Option<UserInputEvent>>;
    fn render(&mut self, session: &Session) -> Result<()>;
}
