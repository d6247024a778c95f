use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Image shown when a product has no alternate image of its own
pub const DEFAULT_PRODUCT_IMAGE: &str =
    "https://images.unsplash.com/photo-1523381210434-271e8be1f52b?w=800&h=1000&fit=crop";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TryOnConfig {
    pub camera: CameraConfig,
    pub garment: GarmentConfig,
    pub pose: PoseConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Requested resolution (width, height); the device may negotiate another
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second requested from the device
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Which way the camera should face
    #[serde(default)]
    pub facing: Facing,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GarmentConfig {
    /// Image used when the product's own image cannot be loaded
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,

    /// Per-attempt fetch and decode timeout
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PoseConfig {
    /// Load the pose model at session start
    #[serde(default = "default_pose_enabled")]
    pub enabled: bool,

    /// Minimum keypoint score to trust a shoulder
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Numerical runtime descriptor fetched before the module
    #[serde(default = "default_runtime_url")]
    pub runtime_url: String,

    /// Pose detection module descriptor
    #[serde(default = "default_module_url")]
    pub module_url: String,

    /// Endpoint receiving JPEG frames and returning keypoints
    #[serde(default = "default_inference_url")]
    pub inference_url: String,

    /// Estimator variant to instantiate
    #[serde(default = "default_pose_model")]
    pub model: String,

    /// Upper bound on the whole background load
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Upper bound on a single estimation request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RenderConfig {
    /// Render loop ticks per second (display refresh rate)
    #[serde(default = "default_render_fps")]
    pub fps: u32,

    /// Directory receiving periodic JPEG snapshots of the composite
    #[serde(default)]
    pub snapshot_dir: Option<String>,

    /// Write a snapshot every N rendered frames
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Front,
    Back,
}

impl TryOnConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("fitmirror.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("camera.facing", "front")?
            .set_default("garment.fallback_url", default_fallback_url())?
            .set_default("garment.fetch_timeout_ms", default_fetch_timeout_ms())?
            .set_default("pose.enabled", default_pose_enabled())?
            .set_default(
                "pose.confidence_threshold",
                default_confidence_threshold() as f64,
            )?
            .set_default("pose.runtime_url", default_runtime_url())?
            .set_default("pose.module_url", default_module_url())?
            .set_default("pose.inference_url", default_inference_url())?
            .set_default("pose.model", default_pose_model())?
            .set_default("pose.load_timeout_ms", default_load_timeout_ms())?
            .set_default("pose.request_timeout_ms", default_request_timeout_ms())?
            .set_default("render.fps", default_render_fps())?
            .set_default("render.snapshot_every", default_snapshot_every())?
            .add_source(File::with_name(&path_str).required(false))
            // FITMIRROR_POSE__ENABLED=false style overrides
            .add_source(
                Environment::with_prefix("FITMIRROR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: TryOnConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.render.fps == 0 {
            return Err(ConfigError::Message(
                "Render fps must be greater than 0".to_string(),
            ));
        }

        if self.render.snapshot_every == 0 {
            return Err(ConfigError::Message(
                "Render snapshot_every must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.pose.confidence_threshold) {
            return Err(ConfigError::Message(
                "Pose confidence_threshold must be within [0, 1]".to_string(),
            ));
        }

        if self.garment.fallback_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "Garment fallback_url must not be empty".to_string(),
            ));
        }

        if self.garment.fetch_timeout_ms == 0
            || self.pose.load_timeout_ms == 0
            || self.pose.request_timeout_ms == 0
        {
            return Err(ConfigError::Message(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl RenderConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.fps.max(1) as u64)
    }
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            garment: GarmentConfig::default(),
            pose: PoseConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: default_camera_index(),
            resolution: default_camera_resolution(),
            fps: default_camera_fps(),
            facing: Facing::Front,
        }
    }
}

impl Default for GarmentConfig {
    fn default() -> Self {
        Self {
            fallback_url: default_fallback_url(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            enabled: default_pose_enabled(),
            confidence_threshold: default_confidence_threshold(),
            runtime_url: default_runtime_url(),
            module_url: default_module_url(),
            inference_url: default_inference_url(),
            model: default_pose_model(),
            load_timeout_ms: default_load_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: default_render_fps(),
            snapshot_dir: None,
            snapshot_every: default_snapshot_every(),
        }
    }
}

// Default value functions
fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_camera_fps() -> u32 {
    30
}

fn default_fallback_url() -> String {
    DEFAULT_PRODUCT_IMAGE.to_string()
}
fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_pose_enabled() -> bool {
    true
}
fn default_confidence_threshold() -> f32 {
    0.3
}
fn default_runtime_url() -> String {
    "http://127.0.0.1:8501/runtime".to_string()
}
fn default_module_url() -> String {
    "http://127.0.0.1:8501/modules/pose-detection".to_string()
}
fn default_inference_url() -> String {
    "http://127.0.0.1:8501/v1/pose".to_string()
}
fn default_pose_model() -> String {
    "movenet_singlepose_lightning".to_string()
}
fn default_load_timeout_ms() -> u64 {
    30_000
}
fn default_request_timeout_ms() -> u64 {
    2_000
}

fn default_render_fps() -> u32 {
    30
}
fn default_snapshot_every() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TryOnConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.resolution, (1280, 720));
        assert_eq!(config.camera.facing, Facing::Front);
        assert_eq!(config.pose.confidence_threshold, 0.3);
        assert_eq!(config.garment.fallback_url, DEFAULT_PRODUCT_IMAGE);
    }

    #[test]
    fn test_config_validation() {
        let mut config = TryOnConfig::default();
        config.camera.resolution = (0, 720);
        assert!(config.validate().is_err());

        config.camera.resolution = (640, 480);
        assert!(config.validate().is_ok());

        config.pose.confidence_threshold = 1.5;
        assert!(config.validate().is_err());

        config.pose.confidence_threshold = 0.3;
        config.render.fps = 0;
        assert!(config.validate().is_err());

        config.render.fps = 30;
        config.pose.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[camera]\nresolution = [640, 480]\n\n[pose]\nenabled = false\n\n[render]\nfps = 60\nsnapshot_dir = \"/tmp/shots\""
        )
        .unwrap();

        let config = TryOnConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.camera.resolution, (640, 480));
        assert!(!config.pose.enabled);
        assert_eq!(config.render.fps, 60);
        assert_eq!(config.render.snapshot_dir.as_deref(), Some("/tmp/shots"));
        assert_eq!(config.pose.model, "movenet_singlepose_lightning");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = TryOnConfig::load_from_file("/nonexistent/fitmirror-test.toml").unwrap();
        assert_eq!(config, TryOnConfig::default());
    }

    #[test]
    fn test_frame_interval() {
        let render = RenderConfig {
            fps: 50,
            ..RenderConfig::default()
        };
        assert_eq!(render.frame_interval(), Duration::from_millis(20));
    }
}
