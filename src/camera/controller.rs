use super::interface::{CameraConstraints, CameraSource};
use super::stream::CameraStream;
use crate::error::CameraError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Acquires and releases the camera on behalf of a session
pub struct CameraController {
    source: Arc<dyn CameraSource>,
    active: Mutex<Option<Arc<CameraStream>>>,
    next_stream_id: AtomicU64,
}

impl CameraController {
    pub fn new(source: Arc<dyn CameraSource>) -> Self {
        Self {
            source,
            active: Mutex::new(None),
            next_stream_id: AtomicU64::new(1),
        }
    }

    /// Open a fresh stream. Any previously held stream is released first,
    /// never handed out again.
    pub async fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Arc<CameraStream>, CameraError> {
        self.release();

        info!(
            "Requesting {:?}-facing camera from {} at {}x{}",
            constraints.facing,
            self.source.name(),
            constraints.width,
            constraints.height
        );

        let track = self.source.open(constraints).await.map_err(|e| {
            error!("Camera acquisition failed: {}", e);
            e
        })?;

        let id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        let stream = Arc::new(CameraStream::new(id, track));

        let (width, height) = stream.native_size();
        if (width, height) != (constraints.width, constraints.height) {
            warn!(
                "Camera negotiated {}x{} instead of requested {}x{}",
                width, height, constraints.width, constraints.height
            );
        }

        *self.active.lock() = Some(Arc::clone(&stream));
        Ok(stream)
    }

    /// Stop the active stream. Safe to call any number of times.
    pub fn release(&self) {
        let stream = self.active.lock().take();
        if let Some(stream) = stream {
            stream.release();
        }
    }

    /// Readiness gate for the render loop
    pub fn is_ready(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .map(|stream| stream.is_ready())
            .unwrap_or(false)
    }

    pub fn stream(&self) -> Option<Arc<CameraStream>> {
        self.active.lock().clone()
    }
}

impl Drop for CameraController {
    fn drop(&mut self) {
        self.release();
    }
}
