use crate::error::SessionError;
use std::fmt;

/// Lifecycle of one try-on session.
///
/// `Idle -> Starting -> Live -> Closed`, with `Starting | Live -> Failed ->
/// Closed`. Nothing leaves `Closed`, and `Failed` never returns to `Live`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Starting,
    Live,
    Failed(SessionError),
    Closed,
}

/// What the on-screen status badge shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    StartingCamera,
    /// Live with the static overlay only
    LiveView,
    /// Live with the pose model ready
    LiveTracking,
    Error(String),
    Closed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::StartingCamera => f.write_str("Starting Camera..."),
            SessionStatus::LiveView => f.write_str("LIVE VIEW"),
            SessionStatus::LiveTracking => f.write_str("LIVE TRACKING"),
            SessionStatus::Error(message) => f.write_str(message),
            SessionStatus::Closed => f.write_str("Closed"),
        }
    }
}
