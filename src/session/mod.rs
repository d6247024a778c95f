mod controller;
mod shutdown;
mod startup;
mod state;
mod types;


pub use controller::SessionController;
pub use types::{SessionState, SessionStatus};
