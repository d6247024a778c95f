use super::*;
use crate::config::PoseConfig;
use crate::error::{ModelLoadError, PoseEstimationError};
use crate::frame::{FrameData, FrameFormat};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FixedEstimator;

#[async_trait]
impl PoseEstimator for FixedEstimator {
    async fn estimate(&self, _frame: &FrameData) -> Result<Vec<Keypoint>, PoseEstimationError> {
        Ok(vec![])
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Backend that fails on a chosen step and counts fetches
#[derive(Default)]
struct ScriptedBackend {
    fail_on: Option<Library>,
    fail_instantiation: bool,
    delay: Duration,
    fetches: AtomicUsize,
}

#[async_trait]
impl PoseBackend for ScriptedBackend {
    async fn fetch_library(&self, library: Library) -> Result<(), ModelLoadError> {
        tokio::time::sleep(self.delay).await;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(library) {
            return Err(ModelLoadError::ModuleFetch {
                details: format!("{:?} unreachable", library),
            });
        }
        Ok(())
    }

    async fn create_estimator(&self) -> Result<Arc<dyn PoseEstimator>, ModelLoadError> {
        if self.fail_instantiation {
            return Err(ModelLoadError::Instantiation {
                details: "unsupported model".to_string(),
            });
        }
        Ok(Arc::new(FixedEstimator))
    }
}

fn loader_with(backend: ScriptedBackend) -> (PoseModelLoader, Arc<ScriptedBackend>) {
    let backend = Arc::new(backend);
    let loader = PoseModelLoader::new(
        Arc::clone(&backend) as Arc<dyn PoseBackend>,
        Arc::new(LibraryCache::new()),
        &PoseConfig::default(),
    );
    (loader, backend)
}

#[tokio::test]
async fn test_successful_load_reaches_ready() {
    let (loader, backend) = loader_with(ScriptedBackend::default());
    assert!(matches!(loader.state(), PoseModelState::Unloaded));

    assert!(loader.start());
    let settled = loader.wait_settled().await;

    assert!(settled.is_ready());
    assert_eq!(settled.estimator().unwrap().name(), "fixed");
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_start_does_not_block() {
    let (loader, _) = loader_with(ScriptedBackend {
        delay: Duration::from_secs(60),
        ..ScriptedBackend::default()
    });

    loader.start();
    assert!(matches!(loader.state(), PoseModelState::Loading));
    loader.abort();
}

#[tokio::test]
async fn test_second_fetch_failure_moves_to_failed() {
    let (loader, backend) = loader_with(ScriptedBackend {
        fail_on: Some(Library::PoseModule),
        ..ScriptedBackend::default()
    });

    loader.start();
    let settled = loader.wait_settled().await;

    assert!(matches!(
        settled,
        PoseModelState::Failed(ModelLoadError::ModuleFetch { .. })
    ));
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_instantiation_failure_moves_to_failed() {
    let (loader, _) = loader_with(ScriptedBackend {
        fail_instantiation: true,
        ..ScriptedBackend::default()
    });

    loader.start();
    assert!(matches!(
        loader.wait_settled().await,
        PoseModelState::Failed(ModelLoadError::Instantiation { .. })
    ));
}

#[tokio::test]
async fn test_restart_after_failure_is_noop() {
    let (loader, backend) = loader_with(ScriptedBackend {
        fail_on: Some(Library::Runtime),
        ..ScriptedBackend::default()
    });

    assert!(loader.start());
    loader.wait_settled().await;
    assert!(!loader.start());
    assert!(!loader.start());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(matches!(loader.state(), PoseModelState::Failed(_)));
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disabled_config_fails_immediately() {
    let loader = PoseModelLoader::new(
        Arc::new(ScriptedBackend::default()),
        Arc::new(LibraryCache::new()),
        &PoseConfig {
            enabled: false,
            ..PoseConfig::default()
        },
    );

    loader.start();
    assert!(matches!(
        loader.state(),
        PoseModelState::Failed(ModelLoadError::Disabled)
    ));
}

#[tokio::test]
async fn test_load_timeout_fails() {
    let loader = PoseModelLoader::new(
        Arc::new(ScriptedBackend {
            delay: Duration::from_secs(60),
            ..ScriptedBackend::default()
        }),
        Arc::new(LibraryCache::new()),
        &PoseConfig {
            load_timeout_ms: 20,
            ..PoseConfig::default()
        },
    );

    loader.start();
    assert!(matches!(
        loader.wait_settled().await,
        PoseModelState::Failed(ModelLoadError::Timeout { millis: 20 })
    ));
}

#[tokio::test]
async fn test_cached_libraries_are_not_refetched() {
    let cache = Arc::new(LibraryCache::new());
    cache.mark_loaded(Library::Runtime);
    cache.mark_loaded(Library::PoseModule);

    let backend = Arc::new(ScriptedBackend::default());
    let loader = PoseModelLoader::new(
        Arc::clone(&backend) as Arc<dyn PoseBackend>,
        Arc::clone(&cache),
        &PoseConfig::default(),
    );
    loader.start();
    assert!(loader.wait_settled().await.is_ready());
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 0);

    cache.reset();
    assert!(!cache.contains(Library::Runtime));
}

#[tokio::test]
async fn test_state_subscribers_see_every_forward_step() {
    let (loader, _) = loader_with(ScriptedBackend {
        delay: Duration::from_millis(10),
        ..ScriptedBackend::default()
    });
    let mut rx = loader.subscribe();

    loader.start();
    let mut seen = vec![rx.borrow_and_update().label()];
    while rx.changed().await.is_ok() {
        seen.push(rx.borrow_and_update().label());
        if rx.borrow().is_terminal() {
            break;
        }
    }

    assert_eq!(seen, vec!["loading", "ready"]);
}

#[test]
fn test_transitions_only_move_forward() {
    let ready = PoseModelState::Ready(Arc::new(FixedEstimator));
    let failed = PoseModelState::Failed(ModelLoadError::Disabled);

    assert!(PoseModelState::Unloaded.can_advance_to(&PoseModelState::Loading));
    assert!(PoseModelState::Loading.can_advance_to(&ready));
    assert!(PoseModelState::Loading.can_advance_to(&failed));

    assert!(!PoseModelState::Unloaded.can_advance_to(&ready));
    assert!(!failed.can_advance_to(&PoseModelState::Loading));
    assert!(!ready.can_advance_to(&PoseModelState::Loading));
    assert!(!failed.can_advance_to(&ready));
    assert!(!PoseModelState::Loading.can_advance_to(&PoseModelState::Unloaded));
}

#[test]
fn test_pose_estimate_named_accessors() {
    let estimate = PoseEstimate::from_keypoints(&[
        Keypoint::new("nose", 10.0, 10.0, 0.9),
        Keypoint::new("left_shoulder", 400.0, 300.0, 0.6),
        Keypoint::new("right_shoulder", 600.0, 310.0, 0.5),
        Keypoint::new("tail", 1.0, 1.0, 1.0),
    ]);

    assert_eq!(estimate.detected_count(), 3);
    let (left, right) = estimate.confident_shoulders(0.3).unwrap();
    assert_eq!((left.x, left.y), (400.0, 300.0));
    assert_eq!((right.x, right.y), (600.0, 310.0));
}

#[test]
fn test_missing_or_weak_shoulder_fails_closed() {
    let missing = PoseEstimate::from_keypoints(&[Keypoint::new("left_shoulder", 1.0, 1.0, 0.9)]);
    assert!(missing.confident_shoulders(0.3).is_none());

    let weak = PoseEstimate::from_keypoints(&[
        Keypoint::new("left_shoulder", 1.0, 1.0, 0.9),
        Keypoint::new("right_shoulder", 2.0, 1.0, 0.29),
    ]);
    assert!(weak.confident_shoulders(0.3).is_none());

    let at_threshold = PoseEstimate::from_keypoints(&[
        Keypoint::new("left_shoulder", 1.0, 1.0, 0.3),
        Keypoint::new("right_shoulder", 2.0, 1.0, 0.3),
    ]);
    assert!(at_threshold.confident_shoulders(0.3).is_some());
}

#[test]
fn test_invalid_scores_are_sanitized() {
    let estimate = PoseEstimate::from_keypoints(&[
        Keypoint::new("left_shoulder", 1.0, 1.0, f32::NAN),
        Keypoint::new("right_shoulder", 2.0, 1.0, 7.0),
        Keypoint::new("left_hip", f32::INFINITY, 1.0, 0.9),
    ]);

    assert_eq!(estimate.left_shoulder().unwrap().confidence, 0.0);
    assert_eq!(estimate.right_shoulder().unwrap().confidence, 1.0);
    assert!(estimate.joint(Joint::LeftHip).is_none());
}

#[test]
fn test_keypoint_accepts_score_field() {
    let kps: Vec<Keypoint> =
        serde_json::from_str(r#"[{"name":"left_shoulder","x":1.5,"y":2.0,"score":0.7}]"#)
            .unwrap();
    assert_eq!(kps[0], Keypoint::new("left_shoulder", 1.5, 2.0, 0.7));
}

#[tokio::test]
async fn test_http_backend_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runtime"))
        .respond_with(ResponseTemplate::new(200).set_body_string("runtime"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/module"))
        .respond_with(ResponseTemplate::new(200).set_body_string("module"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/pose"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"name":"left_shoulder","x":10,"y":20,"score":0.8},
                {"name":"right_shoulder","x":30,"y":20,"score":0.9}]"#,
        ))
        .mount(&server)
        .await;

    let config = PoseConfig {
        runtime_url: format!("{}/runtime", server.uri()),
        module_url: format!("{}/module", server.uri()),
        inference_url: format!("{}/pose", server.uri()),
        ..PoseConfig::default()
    };
    let loader = PoseModelLoader::new(
        Arc::new(HttpPoseBackend::new(config.clone())),
        Arc::new(LibraryCache::new()),
        &config,
    );
    loader.start();
    let estimator = loader.wait_settled().await.estimator().unwrap();

    let frame = FrameData::new(
        0,
        SystemTime::now(),
        vec![128u8; 16 * 16 * 4],
        16,
        16,
        FrameFormat::Rgba8,
    );
    let keypoints = estimator.estimate(&frame).await.unwrap();
    let estimate = PoseEstimate::from_keypoints(&keypoints);
    assert!(estimate.confident_shoulders(0.3).is_some());
}

#[tokio::test]
async fn test_http_backend_runtime_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = PoseConfig {
        runtime_url: format!("{}/runtime", server.uri()),
        module_url: format!("{}/module", server.uri()),
        ..PoseConfig::default()
    };
    let loader = PoseModelLoader::new(
        Arc::new(HttpPoseBackend::new(config.clone())),
        Arc::new(LibraryCache::new()),
        &config,
    );
    loader.start();
    assert!(matches!(
        loader.wait_settled().await,
        PoseModelState::Failed(ModelLoadError::RuntimeFetch { .. })
    ));
}
