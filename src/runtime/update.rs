/// Increment produced by the completion worker for the active turn.
///
/// Values are moved across the bridge; the worker keeps no reference after
/// sending one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Failed(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}
