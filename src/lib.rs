pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod garment;
pub mod keyboard;
pub mod pose;
pub mod product;
pub mod render;
pub mod session;

pub use config::TryOnConfig;
pub use error::{
    AssetLoadError, CameraError, ModelLoadError, PoseEstimationError, Result, SessionError,
    TryOnError,
};
pub use frame::{FrameData, FrameFormat, RenderFrame};
pub use camera::{CameraController, CameraSource, CameraSourceBuilder, CameraStream};
pub use garment::{AssetSlot, GarmentAsset, GarmentAssetLoader};
pub use pose::{PoseEstimate, PoseEstimator, PoseModelLoader, PoseModelState};
pub use product::Product;
pub use render::{OverlayCompositor, OverlayMode, OverlayTransform, RenderLoop, RenderStats};
pub use session::{SessionController, SessionState, SessionStatus};
