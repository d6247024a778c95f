use super::transform::OverlayMode;
use std::time::SystemTime;

/// Render loop statistics
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub aligned_frames: u64,
    pub fallback_frames: u64,
    pub estimation_errors: u64,
    pub surface_resizes: u64,
    pub sink_errors: u64,
    pub last_frame_time: Option<SystemTime>,
}

impl RenderStats {
    pub fn record_render(&mut self, mode: OverlayMode) {
        self.frames_rendered += 1;
        match mode {
            OverlayMode::Aligned => self.aligned_frames += 1,
            OverlayMode::Fallback => self.fallback_frames += 1,
        }
        self.last_frame_time = Some(SystemTime::now());
    }

    pub fn record_skip(&mut self) {
        self.frames_skipped += 1;
    }

    pub fn record_estimation_error(&mut self) {
        self.estimation_errors += 1;
    }

    pub fn record_resize(&mut self) {
        self.surface_resizes += 1;
    }

    pub fn record_sink_error(&mut self) {
        self.sink_errors += 1;
    }

    pub fn tracking_ratio(&self) -> f64 {
        if self.frames_rendered == 0 {
            0.0
        } else {
            self.aligned_frames as f64 / self.frames_rendered as f64
        }
    }
}
