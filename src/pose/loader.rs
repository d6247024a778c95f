use super::backend::{Library, PoseBackend};
use super::cache::LibraryCache;
use super::estimator::PoseEstimator;
use crate::config::PoseConfig;
use crate::error::ModelLoadError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of the optional pose capability. Moves forward only.
#[derive(Clone)]
pub enum PoseModelState {
    Unloaded,
    Loading,
    Ready(Arc<dyn PoseEstimator>),
    Failed(ModelLoadError),
}

impl PoseModelState {
    fn rank(&self) -> u8 {
        match self {
            PoseModelState::Unloaded => 0,
            PoseModelState::Loading => 1,
            PoseModelState::Ready(_) | PoseModelState::Failed(_) => 2,
        }
    }

    /// Unloaded -> Loading -> Ready | Failed, nothing else
    pub fn can_advance_to(&self, next: &PoseModelState) -> bool {
        self.rank() + 1 == next.rank()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PoseModelState::Ready(_))
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }

    pub fn estimator(&self) -> Option<Arc<dyn PoseEstimator>> {
        match self {
            PoseModelState::Ready(estimator) => Some(Arc::clone(estimator)),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PoseModelState::Unloaded => "unloaded",
            PoseModelState::Loading => "loading",
            PoseModelState::Ready(_) => "ready",
            PoseModelState::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Debug for PoseModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoseModelState::Ready(estimator) => {
                f.debug_tuple("Ready").field(&estimator.name()).finish()
            }
            PoseModelState::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
            other => f.write_str(other.label()),
        }
    }
}

/// Loads the pose capability in the background without ever blocking the
/// camera or the render loop.
pub struct PoseModelLoader {
    backend: Arc<dyn PoseBackend>,
    cache: Arc<LibraryCache>,
    state: Arc<watch::Sender<PoseModelState>>,
    enabled: bool,
    load_timeout: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PoseModelLoader {
    pub fn new(backend: Arc<dyn PoseBackend>, cache: Arc<LibraryCache>, config: &PoseConfig) -> Self {
        let (state, _) = watch::channel(PoseModelState::Unloaded);
        Self {
            backend,
            cache,
            state: Arc::new(state),
            enabled: config.enabled,
            load_timeout: Duration::from_millis(config.load_timeout_ms),
            task: Mutex::new(None),
        }
    }

    /// Kick off the load. Returns immediately; calls after the first are
    /// no-ops and return false.
    pub fn start(&self) -> bool {
        let started = self.state.send_if_modified(|state| {
            if matches!(state, PoseModelState::Unloaded) {
                *state = PoseModelState::Loading;
                true
            } else {
                false
            }
        });

        if !started {
            debug!("Pose model load already started ({})", self.state().label());
            return false;
        }

        if !self.enabled {
            advance(&self.state, PoseModelState::Failed(ModelLoadError::Disabled));
            info!("Pose estimation disabled; using static overlay");
            return true;
        }

        info!("Loading pose model in background");
        let backend = Arc::clone(&self.backend);
        let cache = Arc::clone(&self.cache);
        let state = Arc::clone(&self.state);
        let load_timeout = self.load_timeout;

        let handle = tokio::spawn(async move {
            let result = match tokio::time::timeout(load_timeout, load(backend, cache)).await {
                Ok(result) => result,
                Err(_) => Err(ModelLoadError::Timeout {
                    millis: load_timeout.as_millis() as u64,
                }),
            };

            match result {
                Ok(estimator) => {
                    info!("AI pose detection active ({})", estimator.name());
                    advance(&state, PoseModelState::Ready(estimator));
                }
                Err(e) => {
                    warn!("Pose model failed, using static overlay: {}", e);
                    advance(&state, PoseModelState::Failed(e));
                }
            }
        });

        *self.task.lock() = Some(handle);
        true
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PoseModelState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PoseModelState> {
        self.state.subscribe()
    }

    /// Resolve once the state is Ready or Failed
    pub async fn wait_settled(&self) -> PoseModelState {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => (*state).clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Abandon an in-flight load. The state is left where it was.
    pub fn abort(&self) {
        if let Some(handle) = self.task.lock().take() {
            if !handle.is_finished() {
                debug!("Aborting in-flight pose model load");
                handle.abort();
            }
        }
    }
}

impl Drop for PoseModelLoader {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn load(
    backend: Arc<dyn PoseBackend>,
    cache: Arc<LibraryCache>,
) -> Result<Arc<dyn PoseEstimator>, ModelLoadError> {
    for library in [Library::Runtime, Library::PoseModule] {
        if cache.contains(library) {
            debug!("{:?} already present", library);
            continue;
        }
        backend.fetch_library(library).await?;
        cache.mark_loaded(library);
    }

    backend.create_estimator().await
}

fn advance(state: &watch::Sender<PoseModelState>, next: PoseModelState) {
    state.send_if_modified(|current| {
        if current.can_advance_to(&next) {
            debug!("Pose model state {} -> {}", current.label(), next.label());
            *current = next;
            true
        } else {
            warn!(
                "Rejected pose model transition {} -> {}",
                current.label(),
                next.label()
            );
            false
        }
    });
}
