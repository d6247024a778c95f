use crate::config::{CameraConfig, Facing};
use crate::error::CameraError;
use crate::frame::FrameData;
use async_trait::async_trait;

/// What the session asks of the camera. Sources may negotiate a different
/// resolution; the stream reports what it actually delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: Facing,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl CameraConstraints {
    pub fn front(width: u32, height: u32) -> Self {
        Self {
            facing: Facing::Front,
            width,
            height,
            fps: 30,
        }
    }
}

impl From<&CameraConfig> for CameraConstraints {
    fn from(config: &CameraConfig) -> Self {
        Self {
            facing: config.facing,
            width: config.resolution.0,
            height: config.resolution.1,
            fps: config.fps,
        }
    }
}

/// Platform camera that can be opened into a live track
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Open the device. Awaits the user/OS permission grant.
    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn VideoTrack>, CameraError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// A playing video track
pub trait VideoTrack: Send + Sync {
    /// Most recent complete frame, or `None` while the track is still
    /// buffering.
    fn latest_frame(&self) -> Option<FrameData>;

    /// Native resolution currently delivered; may change between frames.
    fn native_size(&self) -> (u32, u32);

    /// Stop the underlying device. Called exactly once by `CameraStream`.
    fn stop(&self);
}
