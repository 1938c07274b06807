use super::bridge::Bridge;
use super::frontend::FrontendAdapter;
use super::update::StreamEvent;
use crate::api::ApiClient;
use crate::state::{Session, SessionCommand, SessionInput, TurnId};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Single-threaded dispatcher feeding frontend input and bridge events into
/// the session, one at a time.
pub struct Runtime<F: FrontendAdapter> {
    session: Session,
    client: Arc<ApiClient>,
    bridge: Option<Bridge>,
    frontend: F,
    tick_interval: Duration,
}

impl<F: FrontendAdapter> Runtime<F> {
    pub fn new(client: Arc<ApiClient>, frontend: F) -> Self {
        Self {
            session: Session::new(),
            client,
            bridge: None,
            frontend,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn has_active_bridge(&self) -> bool {
        self.bridge.is_some()
    }

    /// Runs until the session is closed.
    pub async fn run(&mut self) -> Result<()> {
        let mut tick = tokio::time::interval(self.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.frontend.render(&self.session)?;

            while let Some(input) = self.frontend.poll_user_input(&self.session)? {
                if !self.dispatch(input.into()) {
                    return Ok(());
                }
            }

            tokio::select! {
                _ = tick.tick() => {}
                next = next_bridge_event(&mut self.bridge) => {
                    match next {
                        Some((turn, event)) => {
                            self.dispatch(SessionInput::Stream { turn, event });
                        }
                        None => self.bridge = None,
                    }
                }
            }
        }
    }

    /// Applies one input and carries out the resulting command. Returns
    /// `false` once the session has been closed.
    pub fn dispatch(&mut self, input: SessionInput) -> bool {
        let terminal = matches!(&input, SessionInput::Stream { event, .. } if event.is_terminal());

        match self.session.update(input) {
            Some(SessionCommand::StartRequest { turn, messages }) => {
                if let Some(stale) = self.bridge.take() {
                    stale.abandon();
                }
                self.bridge = Some(Bridge::spawn(Arc::clone(&self.client), turn, messages));
            }
            Some(SessionCommand::Quit) => {
                if let Some(active) = self.bridge.take() {
                    active.abandon();
                }
                return false;
            }
            None => {}
        }

        if terminal && self.bridge.as_ref().is_some_and(Bridge::is_finished) {
            self.bridge = None;
        }
        !self.session.is_closed()
    }
}

async fn next_bridge_event(bridge: &mut Option<Bridge>) -> Option<(TurnId, StreamEvent)> {
    match bridge {
        Some(active) => {
            let turn = active.turn();
            active.recv().await.map(|event| (turn, event))
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::{MockApiClient, MockResponse};
    use crate::runtime::frontend::UserInputEvent;
    use crate::state::SessionState;

    #[derive(Default)]
    struct NullFrontend;

    impl FrontendAdapter for NullFrontend {
        fn poll_user_input(&mut self, _session: &Session) -> Result<Option<UserInputEvent>> {
            Ok(None)
        }

        fn render(&mut self, _session: &Session) -> Result<()> {
            Ok(())
        }
    }

    fn runtime(responses: Vec<MockResponse>) -> Runtime<NullFrontend> {
        let client = ApiClient::new_mock(Arc::new(MockApiClient::new(responses)));
        Runtime::new(Arc::new(client), NullFrontend)
    }

    #[tokio::test]
    async fn test_submit_spawns_one_bridge() {
        let mut runtime = runtime(vec![MockResponse::Stalled(Vec::new())]);
        assert!(runtime.dispatch(SessionInput::Submit("hello".to_string())));
        assert!(runtime.has_active_bridge());
        assert_eq!(runtime.session().state(), SessionState::Pending);

        assert!(runtime.dispatch(SessionInput::Submit("again".to_string())));
        assert_eq!(runtime.session().transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_terminal_event_releases_bridge() {
        let mut runtime = runtime(vec![MockResponse::text_deltas(&["Hi"])]);
        runtime.dispatch(SessionInput::Submit("hello".to_string()));
        let turn = runtime.session().active_turn().expect("active turn");

        while let Some((event_turn, event)) = next_bridge_event(&mut runtime.bridge).await {
            assert_eq!(event_turn, turn);
            runtime.dispatch(SessionInput::Stream {
                turn: event_turn,
                event,
            });
            if !runtime.has_active_bridge() {
                break;
            }
        }

        assert!(!runtime.has_active_bridge());
        assert_eq!(runtime.session().state(), SessionState::Idle);
        assert_eq!(runtime.session().transcript().messages()[1].content, "Hi");
    }

    #[tokio::test]
    async fn test_quit_abandons_bridge() {
        let mut runtime = runtime(vec![MockResponse::Stalled(Vec::new())]);
        runtime.dispatch(SessionInput::Submit("long question".to_string()));
        assert!(!runtime.dispatch(SessionInput::Quit));
        assert!(!runtime.has_active_bridge());
        assert!(runtime.session().is_closed());
    }
}
