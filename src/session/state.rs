use super::types::SessionState;

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Live => "live",
            SessionState::Failed(_) => "failed",
            SessionState::Closed => "closed",
        }
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Idle, Closed)
                | (Starting, Live)
                | (Starting, Failed(_))
                | (Starting, Closed)
                | (Live, Failed(_))
                | (Live, Closed)
                | (Failed(_), Closed)
        )
    }

    /// No further frames will ever be rendered
    pub fn is_finished(&self) -> bool {
        matches!(self, SessionState::Failed(_) | SessionState::Closed)
    }

    pub fn error(&self) -> Option<&crate::error::SessionError> {
        match self {
            SessionState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl super::SessionController {
    /// Move to `next` if the lifecycle allows it. Returns false when the
    /// transition was refused, e.g. because the session already closed.
    pub(super) fn transition(&self, next: SessionState) -> bool {
        let mut from = "";
        let changed = self.state.send_if_modified(|state| {
            if state.can_transition_to(&next) {
                from = state.label();
                *state = next.clone();
                true
            } else {
                false
            }
        });

        if changed {
            tracing::debug!("Session state changed: {} -> {}", from, next.label());
        } else {
            tracing::debug!(
                "Session state change to {} refused in {}",
                next.label(),
                self.state.borrow().label()
            );
        }
        changed
    }
}
