use crate::error::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Maps the close keys (q, Esc, Ctrl+C) of the terminal to a close request
pub struct CloseKeyHandler {
    close_requested: CancellationToken,
    cancellation_token: CancellationToken,
}

impl CloseKeyHandler {
    /// `close_requested` is cancelled when the user presses a close key
    pub fn new(close_requested: CancellationToken) -> Self {
        Self {
            close_requested,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Press q or Esc to close the try-on preview");

        let close_requested = self.close_requested.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            // Raw mode delivers single key presses, including Ctrl+C
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            loop {
                if cancellation_token.is_cancelled() || close_requested.is_cancelled() {
                    debug!("Close key handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(Event::Key(key_event)) = event::read() {
                            if is_close_key(&key_event) {
                                info!("Close key pressed - closing session");
                                close_requested.cancel();
                                break;
                            }
                            debug!("Key pressed: {:?}", key_event.code);
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
        });

        Ok(())
    }

    /// Stop the handler and restore the terminal
    pub async fn stop(&self) -> Result<()> {
        debug!("Stopping close key handler");
        self.cancellation_token.cancel();

        // let the polling task notice and leave raw mode itself
        tokio::time::sleep(Duration::from_millis(150)).await;
        let _ = disable_raw_mode();

        Ok(())
    }
}

/// Only presses count, not releases or repeats
pub fn is_close_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_close_keys() {
        let press = |code, modifiers| key(code, modifiers, KeyEventKind::Press);

        assert!(is_close_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_close_key(&press(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_close_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)));

        assert!(!is_close_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_close_key(&press(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert!(!is_close_key(&key(
            KeyCode::Esc,
            KeyModifiers::NONE,
            KeyEventKind::Release
        )));
    }

    #[tokio::test]
    async fn test_handler_creation() {
        let close = CancellationToken::new();
        let handler = CloseKeyHandler::new(close.clone());
        assert!(!handler.cancellation_token.is_cancelled());
        assert!(!close.is_cancelled());
    }
}
