use super::types::{SessionState, SessionStatus};
use crate::camera::{CameraController, CameraSource};
use crate::config::TryOnConfig;
use crate::error::Result;
use crate::garment::{AssetSlot, GarmentAssetLoader};
use crate::pose::{LibraryCache, PoseBackend, PoseModelLoader};
use crate::product::Product;
use crate::render::{FrameSink, RenderStats, SnapshotSink};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Owns everything one try-on session needs and drives its lifecycle
pub struct SessionController {
    pub(super) config: TryOnConfig,

    // Components
    pub(super) camera: CameraController,
    pub(super) garments: GarmentAssetLoader,
    pub(super) pose: Arc<PoseModelLoader>,
    pub(super) assets: Arc<AssetSlot>,
    pub(super) sinks: Vec<Arc<dyn FrameSink>>,
    pub(super) product: Mutex<Option<Product>>,

    // Lifecycle management
    pub(super) state: watch::Sender<SessionState>,
    pub(super) cancellation_token: CancellationToken,
    pub(super) render_task: Mutex<Option<JoinHandle<RenderStats>>>,
    pub(super) render_stats: Mutex<Option<Arc<Mutex<RenderStats>>>>,
    pub(super) final_stats: Mutex<Option<RenderStats>>,
}

impl SessionController {
    pub fn new(
        config: TryOnConfig,
        camera_source: Arc<dyn CameraSource>,
        pose_backend: Arc<dyn PoseBackend>,
        library_cache: Arc<LibraryCache>,
    ) -> Result<Self> {
        let pose = Arc::new(PoseModelLoader::new(
            pose_backend,
            library_cache,
            &config.pose,
        ));

        let mut sinks: Vec<Arc<dyn FrameSink>> = Vec::new();
        if let Some(dir) = &config.render.snapshot_dir {
            info!(
                "Writing a snapshot every {} frames to {}",
                config.render.snapshot_every, dir
            );
            sinks.push(Arc::new(SnapshotSink::new(dir, config.render.snapshot_every)?));
        }

        let (state, _) = watch::channel(SessionState::Idle);

        Ok(Self {
            camera: CameraController::new(camera_source),
            garments: GarmentAssetLoader::new(&config.garment),
            pose,
            assets: Arc::new(AssetSlot::new()),
            sinks,
            product: Mutex::new(None),
            state,
            cancellation_token: CancellationToken::new(),
            render_task: Mutex::new(None),
            render_stats: Mutex::new(None),
            final_stats: Mutex::new(None),
            config,
        })
    }

    /// Attach an extra frame consumer. Only effective before `start`.
    pub fn add_sink(&mut self, sink: Arc<dyn FrameSink>) {
        self.sinks.push(sink);
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Badge text source: camera phase, tracking mode, or the fatal error
    pub fn status(&self) -> SessionStatus {
        match &*self.state.borrow() {
            SessionState::Idle | SessionState::Starting => SessionStatus::StartingCamera,
            SessionState::Live => {
                if self.pose.state().is_ready() {
                    SessionStatus::LiveTracking
                } else {
                    SessionStatus::LiveView
                }
            }
            SessionState::Failed(error) => SessionStatus::Error(error.to_string()),
            SessionState::Closed => SessionStatus::Closed,
        }
    }

    /// User-facing text of the fatal error, if the session failed
    pub fn error_message(&self) -> Option<String> {
        self.state.borrow().error().map(|e| e.to_string())
    }

    /// Render statistics: live while running, final once closed
    pub fn render_stats(&self) -> Option<RenderStats> {
        if let Some(stats) = self.final_stats.lock().clone() {
            return Some(stats);
        }
        self.render_stats
            .lock()
            .as_ref()
            .map(|stats| stats.lock().clone())
    }

    pub fn pose_loader(&self) -> &Arc<PoseModelLoader> {
        &self.pose
    }

    pub fn asset_slot(&self) -> &Arc<AssetSlot> {
        &self.assets
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn product(&self) -> Option<Product> {
        self.product.lock().clone()
    }

    pub fn config(&self) -> &TryOnConfig {
        &self.config
    }

    /// Resolve once the session has failed or been closed
    pub async fn wait_finished(&self) -> SessionState {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|state| state.is_finished()).await {
            Ok(state) => (*state).clone(),
            Err(_) => self.state(),
        };
        settled
    }
}
