mod compositor;
mod render_loop;
mod sink;
mod stats;
mod ticker;
mod transform;

pub use compositor::{draw_garment, OverlayCompositor, ShadowStyle};
pub use render_loop::{FrameOutcome, RenderLoop, SkipReason};
pub use sink::{FrameSink, LatestFrameSink, SnapshotSink};
pub use stats::RenderStats;
pub use ticker::FrameTicker;
pub use transform::{
    aligned_from_mirrored, aligned_transform, fallback_transform, OverlayMode, OverlayTransform,
    ALIGNED_OPACITY, COLLAR_OFFSET, FALLBACK_OPACITY, FALLBACK_TOP_RATIO, FALLBACK_WIDTH_RATIO,
    SHOULDER_SPAN_SCALE,
};
