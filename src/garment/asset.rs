use image::RgbaImage;
use std::sync::Arc;

/// Decoded garment image. Immutable once built; shared by `Arc`.
#[derive(Debug)]
pub struct GarmentAsset {
    image: RgbaImage,
    source: String,
}

impl GarmentAsset {
    pub fn new(image: RgbaImage, source: impl Into<String>) -> Self {
        Self {
            image,
            source: source.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// height / width
    pub fn aspect_ratio(&self) -> f32 {
        self.image.height() as f32 / self.image.width() as f32
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// URL or path the asset was resolved from
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Session-owned slot holding the current asset.
///
/// Readers clone the `Arc` and keep using it for the whole frame, so a swap
/// is never observed half-way.
#[derive(Debug, Default)]
pub struct AssetSlot {
    current: parking_lot::RwLock<Option<Arc<GarmentAsset>>>,
}

impl AssetSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<GarmentAsset>> {
        self.current.read().clone()
    }

    /// Install a new asset, returning the one it replaced
    pub fn replace(&self, asset: Arc<GarmentAsset>) -> Option<Arc<GarmentAsset>> {
        self.current.write().replace(asset)
    }

    pub fn clear(&self) -> Option<Arc<GarmentAsset>> {
        self.current.write().take()
    }
}
