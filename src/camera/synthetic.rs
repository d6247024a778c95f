use super::interface::{CameraConstraints, CameraSource, VideoTrack};
use crate::error::CameraError;
use crate::frame::{FrameData, FrameFormat};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, trace};

/// How a synthetic device answers an open request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticOutcome {
    Grant,
    Deny,
    NoDevice,
}

/// Test-pattern camera used when no hardware backend is compiled in
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    outcome: SyntheticOutcome,
    native_size: Option<(u32, u32)>,
    warmup_frames: u64,
    open_delay: Duration,
    stops: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self {
            outcome: SyntheticOutcome::Grant,
            native_size: None,
            warmup_frames: 0,
            open_delay: Duration::ZERO,
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Device refuses access as if the user denied the permission prompt
    pub fn denying() -> Self {
        Self {
            outcome: SyntheticOutcome::Deny,
            ..Self::new()
        }
    }

    /// No device attached
    pub fn unavailable() -> Self {
        Self {
            outcome: SyntheticOutcome::NoDevice,
            ..Self::new()
        }
    }

    /// Deliver this resolution regardless of the request
    pub fn with_native_size(mut self, width: u32, height: u32) -> Self {
        self.native_size = Some((width, height));
        self
    }

    /// Report "not enough data" for the first `frames` reads
    pub fn with_warmup(mut self, frames: u64) -> Self {
        self.warmup_frames = frames;
        self
    }

    /// Simulate a slow permission prompt
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Number of times any track opened by this camera was stopped
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraSource for SyntheticCamera {
    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn VideoTrack>, CameraError> {
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }

        match self.outcome {
            SyntheticOutcome::Deny => return Err(CameraError::PermissionDenied),
            SyntheticOutcome::NoDevice => {
                return Err(CameraError::DeviceUnavailable {
                    details: "no synthetic device attached".to_string(),
                })
            }
            SyntheticOutcome::Grant => {}
        }

        let (width, height) = self
            .native_size
            .unwrap_or((constraints.width, constraints.height));
        info!("Synthetic camera opened at {}x{}", width, height);

        Ok(Box::new(SyntheticTrack {
            width: AtomicU32::new(width),
            height: AtomicU32::new(height),
            reads: AtomicU64::new(0),
            warmup_frames: self.warmup_frames,
            stops: Arc::clone(&self.stops),
        }))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Moving gradient with a bright vertical bar
pub struct SyntheticTrack {
    width: AtomicU32,
    height: AtomicU32,
    reads: AtomicU64,
    warmup_frames: u64,
    stops: Arc<AtomicUsize>,
}

impl SyntheticTrack {
    /// Change the delivered resolution, as on a device rotation
    pub fn resize(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::Relaxed);
        self.height.store(height, Ordering::Relaxed);
    }
}

impl VideoTrack for SyntheticTrack {
    fn latest_frame(&self) -> Option<FrameData> {
        let read = self.reads.fetch_add(1, Ordering::Relaxed);
        if read < self.warmup_frames {
            trace!("Synthetic track warming up ({}/{})", read + 1, self.warmup_frames);
            return None;
        }

        let (width, height) = self.native_size();
        let id = read - self.warmup_frames;
        let bar = if width == 0 { 0 } else { (id * 8 % width as u64) as u32 };

        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                if x.abs_diff(bar) < 4 {
                    data.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    let r = (x * 255 / width.max(1)) as u8;
                    let g = (y * 255 / height.max(1)) as u8;
                    data.extend_from_slice(&[r, g, 96, 255]);
                }
            }
        }

        Some(FrameData::new(
            id,
            SystemTime::now(),
            data,
            width,
            height,
            FrameFormat::Rgba8,
        ))
    }

    fn native_size(&self) -> (u32, u32) {
        (
            self.width.load(Ordering::Relaxed),
            self.height.load(Ordering::Relaxed),
        )
    }

    fn stop(&self) {
        let stops = self.stops.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Synthetic track stopped (total stops: {})", stops);
    }
}
