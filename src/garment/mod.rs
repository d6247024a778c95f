mod asset;
mod loader;

pub use asset::{AssetSlot, GarmentAsset};
pub use loader::GarmentAssetLoader;
