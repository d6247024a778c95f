use crate::pose::JointPosition;

/// Garment width relative to the shoulder span
pub const SHOULDER_SPAN_SCALE: f32 = 1.45;
/// Pixels the garment top sits above the shoulder line (collar height)
pub const COLLAR_OFFSET: f32 = 60.0;
pub const ALIGNED_OPACITY: f32 = 0.95;

pub const FALLBACK_WIDTH_RATIO: f32 = 0.6;
pub const FALLBACK_TOP_RATIO: f32 = 0.2;
pub const FALLBACK_OPACITY: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    /// Driven by detected shoulders
    Aligned,
    /// Fixed canvas-relative placement
    Fallback,
}

/// Where and how to draw the garment for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
    pub mode: OverlayMode,
    /// Top-left of the unrotated garment rectangle
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Radians, applied about `pivot`
    pub angle: f32,
    pub pivot: (f32, f32),
    pub opacity: f32,
}

impl OverlayTransform {
    /// Corners of the rotated rectangle in surface coordinates
    pub fn corners(&self) -> [(f32, f32); 4] {
        let (sin, cos) = self.angle.sin_cos();
        let (cx, cy) = self.pivot;
        [
            (self.x, self.y),
            (self.x + self.width, self.y),
            (self.x + self.width, self.y + self.height),
            (self.x, self.y + self.height),
        ]
        .map(|(px, py)| {
            let dx = px - cx;
            let dy = py - cy;
            (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
        })
    }
}

/// Shoulder-driven placement from already mirrored shoulder positions.
/// `aspect` is asset height / asset width.
pub fn aligned_from_mirrored(left: (f32, f32), right: (f32, f32), aspect: f32) -> OverlayTransform {
    let shoulder_width = (left.0 - right.0).abs();
    let width = shoulder_width * SHOULDER_SPAN_SCALE;
    let height = width * aspect;
    let center = ((left.0 + right.0) / 2.0, (left.1 + right.1) / 2.0);
    let angle = (right.1 - left.1).atan2(right.0 - left.0);

    OverlayTransform {
        mode: OverlayMode::Aligned,
        x: center.0 - width / 2.0,
        y: center.1 - COLLAR_OFFSET,
        width,
        height,
        angle,
        pivot: center,
        opacity: ALIGNED_OPACITY,
    }
}

/// Shoulder-driven placement from raw camera keypoints. The surface shows
/// the frame mirrored, so x is flipped against the surface width.
pub fn aligned_transform(
    left: JointPosition,
    right: JointPosition,
    surface_width: u32,
    aspect: f32,
) -> OverlayTransform {
    let w = surface_width as f32;
    aligned_from_mirrored((w - left.x, left.y), (w - right.x, right.y), aspect)
}

/// Pose-independent placement: 60% of the surface width, centered, top at
/// 20% of the height.
pub fn fallback_transform(surface_width: u32, surface_height: u32, aspect: f32) -> OverlayTransform {
    let width = surface_width as f32 * FALLBACK_WIDTH_RATIO;
    let height = width * aspect;
    let x = (surface_width as f32 - width) / 2.0;
    let y = surface_height as f32 * FALLBACK_TOP_RATIO;

    OverlayTransform {
        mode: OverlayMode::Fallback,
        x,
        y,
        width,
        height,
        angle: 0.0,
        pivot: (x + width / 2.0, y + height / 2.0),
        opacity: FALLBACK_OPACITY,
    }
}
