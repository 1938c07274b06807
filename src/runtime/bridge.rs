use super::update::StreamEvent;
use crate::api::ApiClient;
use crate::state::TurnId;
use crate::types::ApiMessage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const WORKER_EXITED: &str = "stream worker exited before the response finished";

/// One-way channel from the background request worker to the UI loop.
///
/// Scoped to a single turn. The worker only ever sends `StreamEvent` values;
/// the UI loop is the sole reader. After the terminal event has been read the
/// bridge yields nothing more.
pub struct Bridge {
    turn: TurnId,
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
    finished: bool,
}

impl Bridge {
    /// Starts the request on a tokio task. Must be called inside a runtime.
    pub fn spawn(client: Arc<ApiClient>, turn: TurnId, messages: Vec<ApiMessage>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let worker = tokio::spawn(async move {
            tokio::select! {
                _ = worker_cancel.cancelled() => {
                    tracing::debug!(turn, "request worker cancelled");
                }
                _ = client.send(&messages, &tx) => {}
            }
        });

        Self {
            turn,
            rx,
            cancel,
            worker,
            finished: false,
        }
    }

    pub fn turn(&self) -> TurnId {
        self.turn
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next event in production order.
    ///
    /// A worker that goes away without a terminal event is reported as
    /// `Failed`, so every bridge produces exactly one terminal event.
    /// Cancel safe.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        let event = self
            .rx
            .recv()
            .await
            .unwrap_or_else(|| StreamEvent::Failed(WORKER_EXITED.to_string()));
        if event.is_terminal() {
            self.finished = true;
        }
        Some(event)
    }

    /// Stops the worker without waiting for it. Undelivered events are dropped.
    pub fn abandon(self) {
        tracing::info!(turn = self.turn, "abandoning in-flight request");
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.worker.abort();
    }
}
