use super::types::SessionState;
use super::SessionController;
use crate::error::SessionError;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Upper bound on waiting for the in-flight render iteration
const RENDER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl SessionController {
    /// End the session. Available in every state, idempotent, never fails.
    ///
    /// Rendering stops after the iteration in flight, the camera is
    /// released, and the state becomes `Closed`.
    pub async fn close(&self) {
        if *self.state.borrow() == SessionState::Closed {
            debug!("Session already closed");
            return;
        }

        info!("Closing try-on session");
        self.transition(SessionState::Closed);
        self.cancellation_token.cancel();

        let handle = self.render_task.lock().take();
        if let Some(handle) = handle {
            match timeout(RENDER_STOP_TIMEOUT, handle).await {
                Ok(Ok(stats)) => {
                    *self.final_stats.lock() = Some(stats);
                }
                Ok(Err(e)) => {
                    error!("Render task ended abnormally: {}", e);
                }
                Err(_) => {
                    warn!(
                        "Render loop did not stop within {:?}",
                        RENDER_STOP_TIMEOUT
                    );
                }
            }
        }

        self.camera.release();
        self.pose.abort();
        self.assets.clear();
        info!("Try-on session closed");
    }

    /// Tear down after a fatal error and park the session in `Failed`
    pub(super) fn fail(&self, error: SessionError) -> SessionError {
        error!("Try-on session failed: {}", error);

        self.cancellation_token.cancel();
        self.camera.release();
        self.pose.abort();
        self.assets.clear();

        if let Some(stats) = self.render_stats.lock().as_ref() {
            *self.final_stats.lock() = Some(stats.lock().clone());
        }

        self.transition(SessionState::Failed(error.clone()));
        error
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(handle) = self.render_task.lock().take() {
            handle.abort();
        }
    }
}
