use thiserror::Error;

#[derive(Error, Debug)]
pub enum TryOnError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Garment asset error: {0}")]
    Asset(#[from] AssetLoadError),

    #[error("Pose model error: {0}")]
    Model(#[from] ModelLoadError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl TryOnError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Camera acquisition failures. Both variants end the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access denied. Please allow camera access.")]
    PermissionDenied,

    #[error("Camera device unavailable: {details}")]
    DeviceUnavailable { details: String },
}

/// Both the primary and the fallback garment source failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to load product image (primary: {primary}; fallback: {fallback})")]
pub struct AssetLoadError {
    pub primary: String,
    pub fallback: String,
}

/// Failure while bringing up the pose model. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelLoadError {
    #[error("Failed to fetch numerical runtime: {details}")]
    RuntimeFetch { details: String },

    #[error("Failed to fetch pose detection module: {details}")]
    ModuleFetch { details: String },

    #[error("Failed to instantiate pose estimator: {details}")]
    Instantiation { details: String },

    #[error("Pose model load timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Pose estimation disabled by configuration")]
    Disabled,
}

/// Per-frame estimation failure. The frame falls back to static overlay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoseEstimationError {
    #[error("Failed to encode frame for estimation: {details}")]
    Encode { details: String },

    #[error("Pose estimation request failed: {details}")]
    Request { details: String },

    #[error("Invalid pose estimation response: {details}")]
    InvalidResponse { details: String },
}

/// Fatal session errors, surfaced to the user with a single close action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Asset(#[from] AssetLoadError),

    #[error("Product '{product}' does not support virtual try-on")]
    TryOnUnsupported { product: String },

    #[error("Session already started")]
    AlreadyStarted,

    #[error("Session is not live")]
    NotLive,
}

pub type Result<T> = std::result::Result<T, TryOnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_denied_message_is_user_facing() {
        let err = SessionError::from(CameraError::PermissionDenied);
        assert_eq!(
            err.to_string(),
            "Camera access denied. Please allow camera access."
        );
    }

    #[test]
    fn asset_error_reports_both_causes() {
        let err = AssetLoadError {
            primary: "404".to_string(),
            fallback: "decode".to_string(),
        };
        let message = TryOnError::from(err).to_string();
        assert!(message.contains("primary: 404"));
        assert!(message.contains("fallback: decode"));
    }

    #[test]
    fn component_helper_builds_variant() {
        match TryOnError::component("render", "boom") {
            TryOnError::Component { component, message } => {
                assert_eq!(component, "render");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected variant: {other}"),
        }
    }
}
