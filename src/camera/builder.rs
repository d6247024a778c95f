use super::interface::CameraSource;
use super::synthetic::SyntheticCamera;
use crate::config::CameraConfig;
use crate::error::{Result, TryOnError};
use std::sync::Arc;
use tracing::info;

/// Picks the camera backend for this build
pub struct CameraSourceBuilder {
    config: Option<CameraConfig>,
    synthetic: bool,
}

impl CameraSourceBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            synthetic: false,
        }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Force the test-pattern source even when hardware support is built in
    pub fn synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn build(self) -> Result<Arc<dyn CameraSource>> {
        let config = self
            .config
            .ok_or_else(|| TryOnError::system("Camera configuration must be specified"))?;

        if self.synthetic {
            info!("Using synthetic camera source");
            return Ok(Arc::new(SyntheticCamera::new()));
        }

        #[cfg(all(target_os = "linux", feature = "camera"))]
        {
            info!("Using GStreamer camera /dev/video{}", config.index);
            Ok(Arc::new(super::gst::GstCamera::new(config.index)?))
        }

        #[cfg(not(all(target_os = "linux", feature = "camera")))]
        {
            info!(
                "Camera backend not compiled in; using synthetic source for device {}",
                config.index
            );
            Ok(Arc::new(SyntheticCamera::new()))
        }
    }
}

impl Default for CameraSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
