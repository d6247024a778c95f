use super::interface::VideoTrack;
use crate::frame::FrameData;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Exclusively owned handle to a live video track.
///
/// Once released the stream never produces frames again; a new
/// acquisition always yields a new `CameraStream` with a new id.
pub struct CameraStream {
    id: u64,
    track: Box<dyn VideoTrack>,
    released: AtomicBool,
}

impl CameraStream {
    pub(crate) fn new(id: u64, track: Box<dyn VideoTrack>) -> Self {
        let (width, height) = track.native_size();
        debug!("Camera stream {} opened at {}x{}", id, width, height);
        Self {
            id,
            track,
            released: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Playable and not yet released
    pub fn is_ready(&self) -> bool {
        !self.released.load(Ordering::Acquire)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub fn native_size(&self) -> (u32, u32) {
        self.track.native_size()
    }

    /// Latest buffered frame; always `None` after release
    pub fn latest_frame(&self) -> Option<FrameData> {
        if self.is_released() {
            return None;
        }
        self.track.latest_frame()
    }

    /// Stop all tracks. Returns true only for the call that actually
    /// released the stream.
    pub fn release(&self) -> bool {
        if self
            .released
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Camera stream {} already released", self.id);
            return false;
        }

        self.track.stop();
        info!("Camera stream {} released", self.id);
        true
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CameraStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraStream")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .finish()
    }
}
