use tokio::task::JoinHandle;

use crate::app::App;
use crate::client::{IdeaClient, SendError};
use crate::handler;
use crate::tui::AppEvent;

type PendingSend = JoinHandle<Result<String, SendError>>;

/// Runs requests to the idea service in the background and feeds the results back to the app.
pub struct Session {
    client: IdeaClient,
    pending: Option<PendingSend>,
}

impl Session {
    pub fn new(client: IdeaClient) -> Self {
        Self {
            client,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply one event, start a request if it submitted input, and collect a finished request.
    pub async fn step(&mut self, app: &mut App, event: AppEvent) {
        if let Some(text) = handler::handle_event(app, event) {
            let client = self.client.clone();
            self.pending = Some(tokio::spawn(async move { client.send(&text).await }));
        }

        // Ticks arrive every 300ms, so a finished request is picked up promptly
        if self.pending.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = self.pending.take() {
                let outcome = match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(SendError::TaskFailed(e.to_string())),
                };
                app.finish_send(outcome);
            }
        }
    }

    pub fn abort(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}
