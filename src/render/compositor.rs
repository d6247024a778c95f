use super::transform::{aligned_transform, fallback_transform, OverlayTransform};
use crate::frame::RenderFrame;
use crate::garment::GarmentAsset;
use crate::pose::PoseEstimate;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use tracing::trace;

/// Soft drop shadow drawn beneath the garment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStyle {
    pub offset_x: i32,
    pub offset_y: i32,
    pub blur_radius: f32,
    pub alpha: f32,
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 8,
            blur_radius: 12.0,
            alpha: 0.3,
        }
    }
}

impl ShadowStyle {
    fn sigma(&self) -> f32 {
        self.blur_radius / 2.0
    }

    /// Pixels around the garment the blurred shadow can reach
    fn margin(&self) -> i64 {
        (self.sigma() * 3.0).ceil() as i64 + self.offset_x.unsigned_abs().max(self.offset_y.unsigned_abs()) as i64
    }
}

/// Chooses the overlay transform for a frame and draws it
#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    confidence_threshold: f32,
    shadow: ShadowStyle,
}

impl OverlayCompositor {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            shadow: ShadowStyle::default(),
        }
    }

    pub fn with_shadow(mut self, shadow: ShadowStyle) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Aligned when an estimate has both shoulders above threshold,
    /// fallback otherwise. Always exactly one.
    pub fn select_transform(
        &self,
        estimate: Option<&PoseEstimate>,
        surface_width: u32,
        surface_height: u32,
        asset: &GarmentAsset,
    ) -> OverlayTransform {
        let aspect = asset.aspect_ratio();
        match estimate.and_then(|e| e.confident_shoulders(self.confidence_threshold)) {
            Some((left, right)) => aligned_transform(left, right, surface_width, aspect),
            None => fallback_transform(surface_width, surface_height, aspect),
        }
    }

    /// Draw the garment and its shadow onto the surface
    pub fn composite(&self, surface: &mut RenderFrame, asset: &GarmentAsset, transform: &OverlayTransform) {
        draw_garment(surface.image_mut(), asset.image(), transform, &self.shadow);
    }
}

/// Rasterize `garment` under `transform` and alpha-blend it, with shadow,
/// onto `surface`. Degenerate or fully off-surface transforms draw nothing.
pub fn draw_garment(
    surface: &mut RgbaImage,
    garment: &RgbaImage,
    transform: &OverlayTransform,
    shadow: &ShadowStyle,
) {
    if !(transform.width >= 1.0 && transform.height >= 1.0) {
        return;
    }
    if garment.width() == 0 || garment.height() == 0 {
        return;
    }
    if !transform.x.is_finite() || !transform.y.is_finite() || !transform.angle.is_finite() {
        return;
    }

    let corners = transform.corners();
    let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min).floor() as i64;
    let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max).ceil() as i64;
    let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min).floor() as i64;
    let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max).ceil() as i64;

    // Layer covers the garment plus shadow reach, clipped to the surface,
    // so work is bounded by the surface whatever the transform size.
    let margin = shadow.margin();
    let layer_x0 = min_x.saturating_sub(margin).max(-margin);
    let layer_y0 = min_y.saturating_sub(margin).max(-margin);
    let layer_x1 = max_x.saturating_add(margin).min(surface.width() as i64 + margin);
    let layer_y1 = max_y.saturating_add(margin).min(surface.height() as i64 + margin);
    if layer_x1 <= layer_x0 || layer_y1 <= layer_y0 {
        return;
    }
    if layer_x1 <= 0 || layer_y1 <= 0 {
        return;
    }

    let layer_w = (layer_x1 - layer_x0) as u32;
    let layer_h = (layer_y1 - layer_y0) as u32;

    let (garment_w, garment_h) = garment.dimensions();
    let (sin, cos) = transform.angle.sin_cos();
    let (cx, cy) = transform.pivot;
    let mut layer = RgbaImage::new(layer_w, layer_h);
    for (lx, ly, pixel) in layer.enumerate_pixels_mut() {
        let sx = (layer_x0 + lx as i64) as f32 + 0.5;
        let sy = (layer_y0 + ly as i64) as f32 + 0.5;
        // inverse rotation back into the unrotated garment rectangle
        let dx = sx - cx;
        let dy = sy - cy;
        let qx = cx + dx * cos + dy * sin;
        let qy = cy - dx * sin + dy * cos;
        let u = (qx - transform.x) / transform.width;
        let v = (qy - transform.y) / transform.height;
        if (0.0..1.0).contains(&u) && (0.0..1.0).contains(&v) {
            let gx = ((u * garment_w as f32) as u32).min(garment_w - 1);
            let gy = ((v * garment_h as f32) as u32).min(garment_h - 1);
            *pixel = *garment.get_pixel(gx, gy);
        }
    }

    if shadow.alpha > 0.0 {
        let mask = GrayImage::from_fn(layer_w, layer_h, |x, y| Luma([layer.get_pixel(x, y)[3]]));
        let mask = if shadow.sigma() > 0.0 {
            gaussian_blur_f32(&mask, shadow.sigma())
        } else {
            mask
        };
        for (mx, my, value) in mask.enumerate_pixels() {
            if value[0] == 0 {
                continue;
            }
            let sx = layer_x0 + mx as i64 + shadow.offset_x as i64;
            let sy = layer_y0 + my as i64 + shadow.offset_y as i64;
            let alpha = value[0] as f32 / 255.0 * shadow.alpha * transform.opacity;
            blend_at(surface, sx, sy, Rgba([0, 0, 0, 255]), alpha);
        }
    }

    let mut drawn = 0usize;
    for (lx, ly, pixel) in layer.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let alpha = pixel[3] as f32 / 255.0 * transform.opacity;
        if blend_at(surface, layer_x0 + lx as i64, layer_y0 + ly as i64, *pixel, alpha) {
            drawn += 1;
        }
    }

    trace!(
        "Garment drawn {:?} at ({:.1}, {:.1}) {:.1}x{:.1} angle {:.3}: {} px",
        transform.mode,
        transform.x,
        transform.y,
        transform.width,
        transform.height,
        transform.angle,
        drawn
    );
}

/// Source-over blend of `color` at `alpha`. Returns false when (x, y) is
/// off the surface.
fn blend_at(surface: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, alpha: f32) -> bool {
    if x < 0 || y < 0 || x >= surface.width() as i64 || y >= surface.height() as i64 {
        return false;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let dst = surface.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        let blended = color[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha);
        dst[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    let dst_alpha = dst[3] as f32 / 255.0;
    dst[3] = ((alpha + dst_alpha * (1.0 - alpha)) * 255.0).round() as u8;
    true
}
