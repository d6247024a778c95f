use crate::config::GarmentConfig;
use serde::{Deserialize, Serialize};

/// Catalog entry as handed over by the storefront. Only the image fields
/// and the try-on flag matter here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub alt_image: Option<String>,
    #[serde(default = "default_has_try_on")]
    pub has_try_on: bool,
}

fn default_has_try_on() -> bool {
    true
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: image.into(),
            alt_image: None,
            has_try_on: true,
        }
    }

    pub fn with_alt_image(mut self, url: impl Into<String>) -> Self {
        self.alt_image = Some(url.into());
        self
    }

    /// Primary and fallback image sources for this product
    pub fn image_sources<'a>(&'a self, config: &'a GarmentConfig) -> (&'a str, &'a str) {
        let fallback = self
            .alt_image
            .as_deref()
            .unwrap_or(config.fallback_url.as_str());
        (self.image.as_str(), fallback)
    }
}
