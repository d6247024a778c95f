use super::*;
use crate::config::CameraConfig;
use crate::error::CameraError;
use std::sync::Arc;

fn constraints() -> CameraConstraints {
    CameraConstraints::front(640, 480)
}

#[tokio::test]
async fn test_acquire_reports_ready_and_native_size() {
    let source = SyntheticCamera::new().with_native_size(1280, 720);
    let controller = CameraController::new(Arc::new(source));

    assert!(!controller.is_ready());
    let stream = controller.acquire(&constraints()).await.unwrap();

    assert!(controller.is_ready());
    assert!(stream.is_ready());
    assert_eq!(stream.native_size(), (1280, 720));

    let frame = stream.latest_frame().unwrap();
    assert_eq!((frame.width, frame.height), (1280, 720));
    assert!(frame.is_complete());
}

#[tokio::test]
async fn test_permission_denied_is_reported() {
    let controller = CameraController::new(Arc::new(SyntheticCamera::denying()));
    let result = controller.acquire(&constraints()).await;
    assert_eq!(result.unwrap_err(), CameraError::PermissionDenied);
    assert!(!controller.is_ready());
}

#[tokio::test]
async fn test_missing_device_is_reported() {
    let controller = CameraController::new(Arc::new(SyntheticCamera::unavailable()));
    let result = controller.acquire(&constraints()).await;
    assert!(matches!(
        result,
        Err(CameraError::DeviceUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_release_is_idempotent() {
    let source = SyntheticCamera::new();
    let controller = CameraController::new(Arc::new(source.clone()));
    let stream = controller.acquire(&constraints()).await.unwrap();

    controller.release();
    controller.release();
    assert!(!stream.release());
    drop(stream);

    assert_eq!(source.stop_count(), 1);
    assert!(!controller.is_ready());
}

#[tokio::test]
async fn test_released_stream_is_never_reused() {
    let source = SyntheticCamera::new();
    let controller = CameraController::new(Arc::new(source.clone()));

    let first = controller.acquire(&constraints()).await.unwrap();
    let second = controller.acquire(&constraints()).await.unwrap();

    assert_ne!(first.id(), second.id());
    assert!(first.is_released());
    assert!(first.latest_frame().is_none());
    assert!(second.latest_frame().is_some());
    assert_eq!(source.stop_count(), 1);
}

#[tokio::test]
async fn test_warmup_reports_not_enough_data() {
    let controller = CameraController::new(Arc::new(SyntheticCamera::new().with_warmup(2)));
    let stream = controller.acquire(&constraints()).await.unwrap();

    assert!(stream.latest_frame().is_none());
    assert!(stream.latest_frame().is_none());
    assert!(stream.latest_frame().is_some());
}

#[tokio::test]
async fn test_dropping_controller_releases_stream() {
    let source = SyntheticCamera::new();
    {
        let controller = CameraController::new(Arc::new(source.clone()));
        controller.acquire(&constraints()).await.unwrap();
    }
    assert_eq!(source.stop_count(), 1);
}

#[test]
fn test_constraints_from_config() {
    let config = CameraConfig {
        resolution: (800, 600),
        ..CameraConfig::default()
    };
    let constraints = CameraConstraints::from(&config);
    assert_eq!(constraints, CameraConstraints::front(800, 600));

    let config = CameraConfig {
        fps: 15,
        ..CameraConfig::default()
    };
    assert_eq!(CameraConstraints::from(&config).fps, 15);
}

#[test]
fn test_builder_requires_config() {
    let result = CameraSourceBuilder::new().build();
    match result {
        Err(crate::error::TryOnError::System { message }) => {
            assert!(message.contains("Camera configuration must be specified"));
        }
        _ => panic!("Expected system error for missing configuration"),
    }
}

#[test]
fn test_builder_synthetic_source() {
    let source = CameraSourceBuilder::new()
        .config(CameraConfig::default())
        .synthetic(true)
        .build()
        .unwrap();
    assert_eq!(source.name(), "synthetic");
}
