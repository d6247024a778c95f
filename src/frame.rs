use crate::error::{PoseEstimationError, Result, TryOnError};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel layout of raw camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// 8-bit RGBA, 4 bytes per pixel
    Rgba8,
    /// 8-bit RGB, 3 bytes per pixel
    Rgb24,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Rgba8 => 4,
            FrameFormat::Rgb24 => 3,
        }
    }
}

/// Raw camera frame with shared pixel data
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Unique frame identifier within its stream
    pub id: u64,
    /// Timestamp when frame was captured
    pub timestamp: SystemTime,
    /// Raw pixel data (shared ownership for efficiency)
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: FrameFormat,
}

impl FrameData {
    /// Create a new frame data instance
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Byte length a complete frame of these dimensions must have
    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// True once the source has buffered a whole, non-empty frame
    pub fn is_complete(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.expected_size()
    }

    /// Read pixel (x, y) as RGBA. Caller guarantees bounds and completeness.
    #[inline]
    fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        let bpp = self.format.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        let px = &self.data[offset..offset + bpp];
        match self.format {
            FrameFormat::Rgba8 => Rgba([px[0], px[1], px[2], px[3]]),
            FrameFormat::Rgb24 => Rgba([px[0], px[1], px[2], 255]),
        }
    }

    /// Convert into an owned RGBA image
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        if !self.is_complete() {
            return Err(TryOnError::component(
                "frame".to_string(),
                format!(
                    "Incomplete frame {}: expected {} bytes, got {}",
                    self.id,
                    self.expected_size(),
                    self.data.len()
                ),
            ));
        }

        Ok(RgbaImage::from_fn(self.width, self.height, |x, y| {
            self.pixel(x, y)
        }))
    }

    /// Encode as JPEG for transport to an inference service
    pub fn encode_jpeg(&self, quality: u8) -> std::result::Result<Vec<u8>, PoseEstimationError> {
        let rgba = self
            .to_rgba_image()
            .map_err(|e| PoseEstimationError::Encode {
                details: e.to_string(),
            })?;
        encode_rgba_jpeg(&rgba, quality).map_err(|e| PoseEstimationError::Encode {
            details: e.to_string(),
        })
    }

    /// Get frame age in milliseconds
    pub fn age_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.timestamp)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// JPEG has no alpha channel, so the image is flattened to RGB first
pub fn encode_rgba_jpeg(image: &RgbaImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(&rgb)?;
    Ok(buf)
}

/// Mutable drawing surface the compositor paints each frame
#[derive(Debug, Clone)]
pub struct RenderFrame {
    image: RgbaImage,
}

impl RenderFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Resize the surface to the camera's native resolution.
    /// Returns true when the dimensions changed.
    pub fn sync_dimensions(&mut self, width: u32, height: u32) -> bool {
        if self.image.width() == width && self.image.height() == height {
            return false;
        }
        self.image = RgbaImage::new(width, height);
        true
    }

    /// Paint the camera frame flipped horizontally (selfie view).
    /// The surface must already match the frame's dimensions.
    pub fn draw_mirrored(&mut self, frame: &FrameData) -> Result<()> {
        if !frame.is_complete() {
            return Err(TryOnError::component(
                "render".to_string(),
                format!("Frame {} is not complete", frame.id),
            ));
        }
        if frame.width != self.width() || frame.height != self.height() {
            return Err(TryOnError::component(
                "render".to_string(),
                format!(
                    "Frame {}x{} does not match surface {}x{}",
                    frame.width,
                    frame.height,
                    self.width(),
                    self.height()
                ),
            ));
        }

        let last = frame.width - 1;
        for (x, y, pixel) in self.image.enumerate_pixels_mut() {
            *pixel = frame.pixel(last - x, y);
        }
        Ok(())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
