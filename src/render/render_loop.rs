use super::compositor::OverlayCompositor;
use super::sink::FrameSink;
use super::stats::RenderStats;
use super::ticker::FrameTicker;
use super::transform::{OverlayMode, OverlayTransform};
use crate::camera::CameraStream;
use crate::frame::RenderFrame;
use crate::garment::AssetSlot;
use crate::pose::{PoseEstimate, PoseModelState};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Why a tick produced no composite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Camera has not buffered a complete frame yet
    NotEnoughData,
    /// No garment installed
    NoAsset,
    /// Frame could not be painted onto the surface
    DrawFailed,
}

/// Result of one render iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Skipped(SkipReason),
    Rendered(OverlayTransform),
}

impl FrameOutcome {
    pub fn mode(&self) -> Option<OverlayMode> {
        match self {
            FrameOutcome::Rendered(transform) => Some(transform.mode),
            FrameOutcome::Skipped(_) => None,
        }
    }
}

/// Per-frame pipeline: mirror the camera frame, try the pose-aligned
/// overlay, fall back to the static one, hand the result to the sinks.
pub struct RenderLoop {
    stream: Arc<CameraStream>,
    assets: Arc<AssetSlot>,
    pose: watch::Receiver<PoseModelState>,
    compositor: OverlayCompositor,
    surface: RenderFrame,
    sinks: Vec<Arc<dyn FrameSink>>,
    stats: Arc<Mutex<RenderStats>>,
    estimation_failing: bool,
}

impl RenderLoop {
    pub fn new(
        stream: Arc<CameraStream>,
        assets: Arc<AssetSlot>,
        pose: watch::Receiver<PoseModelState>,
        compositor: OverlayCompositor,
    ) -> Self {
        Self {
            stream,
            assets,
            pose,
            compositor,
            surface: RenderFrame::new(0, 0),
            sinks: Vec::new(),
            stats: Arc::new(Mutex::new(RenderStats::default())),
            estimation_failing: false,
        }
    }

    pub fn add_sink(&mut self, sink: Arc<dyn FrameSink>) {
        self.sinks.push(sink);
    }

    /// Live view of the loop's statistics
    pub fn stats_handle(&self) -> Arc<Mutex<RenderStats>> {
        Arc::clone(&self.stats)
    }

    pub fn surface(&self) -> &RenderFrame {
        &self.surface
    }

    /// Render until the ticker is cancelled. The iteration in flight when
    /// cancellation arrives always completes.
    pub async fn run(mut self, mut ticker: FrameTicker) -> RenderStats {
        info!("Render loop started on camera stream {}", self.stream.id());

        while ticker.next().await {
            self.render_frame().await;
        }

        let stats = self.stats.lock().clone();
        info!(
            "Render loop stopped after {} ticks: {} rendered ({} aligned, {} fallback), {} skipped",
            ticker.ticks(),
            stats.frames_rendered,
            stats.aligned_frames,
            stats.fallback_frames,
            stats.frames_skipped
        );
        stats
    }

    /// One iteration of the pipeline
    pub async fn render_frame(&mut self) -> FrameOutcome {
        let Some(frame) = self.stream.latest_frame().filter(|f| f.is_complete()) else {
            trace!("Camera not ready; skipping frame");
            self.stats.lock().record_skip();
            return FrameOutcome::Skipped(SkipReason::NotEnoughData);
        };

        // One Arc for the whole iteration, so a garment swap is never seen
        // half-way.
        let Some(asset) = self.assets.get() else {
            self.stats.lock().record_skip();
            return FrameOutcome::Skipped(SkipReason::NoAsset);
        };

        if self.surface.sync_dimensions(frame.width, frame.height) {
            debug!("Surface resized to {}x{}", frame.width, frame.height);
            self.stats.lock().record_resize();
        }

        if let Err(e) = self.surface.draw_mirrored(&frame) {
            warn!("Failed to draw camera frame {}: {}", frame.id, e);
            self.stats.lock().record_skip();
            return FrameOutcome::Skipped(SkipReason::DrawFailed);
        }

        let estimator = self.pose.borrow().estimator();
        let estimate = match estimator {
            Some(estimator) => match estimator.estimate(&frame).await {
                Ok(keypoints) => {
                    if self.estimation_failing {
                        info!("Pose estimation recovered");
                        self.estimation_failing = false;
                    }
                    Some(PoseEstimate::from_keypoints(&keypoints))
                }
                Err(e) => {
                    if !self.estimation_failing {
                        warn!("Pose error, using static overlay for this frame: {}", e);
                        self.estimation_failing = true;
                    } else {
                        debug!("Pose error on frame {}: {}", frame.id, e);
                    }
                    self.stats.lock().record_estimation_error();
                    None
                }
            },
            None => None,
        };

        let transform = self.compositor.select_transform(
            estimate.as_ref(),
            self.surface.width(),
            self.surface.height(),
            &asset,
        );
        self.compositor.composite(&mut self.surface, &asset, &transform);
        self.stats.lock().record_render(transform.mode);

        for sink in &self.sinks {
            if let Err(e) = sink.present(&self.surface, &transform) {
                warn!("Frame sink '{}' failed: {}", sink.name(), e);
                self.stats.lock().record_sink_error();
            }
        }

        trace!("Frame {} rendered in {:?} mode", frame.id, transform.mode);
        FrameOutcome::Rendered(transform)
    }
}
