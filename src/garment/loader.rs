use super::asset::GarmentAsset;
use crate::config::GarmentConfig;
use crate::error::AssetLoadError;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Resolves a garment image, trying a fallback source once
pub struct GarmentAssetLoader {
    client: reqwest::Client,
    attempt_timeout: Duration,
}

impl GarmentAssetLoader {
    pub fn new(config: &GarmentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            attempt_timeout: Duration::from_millis(config.fetch_timeout_ms),
        }
    }

    /// Load `primary_url`, then `fallback_url` if that fails. No retries.
    pub async fn load(
        &self,
        primary_url: &str,
        fallback_url: &str,
    ) -> Result<GarmentAsset, AssetLoadError> {
        let primary_err = match self.load_one(primary_url).await {
            Ok(asset) => return Ok(asset),
            Err(e) => e,
        };
        warn!(
            "Garment image '{}' failed ({}); trying fallback '{}'",
            primary_url, primary_err, fallback_url
        );

        match self.load_one(fallback_url).await {
            Ok(asset) => Ok(asset),
            Err(fallback_err) => Err(AssetLoadError {
                primary: primary_err,
                fallback: fallback_err,
            }),
        }
    }

    async fn load_one(&self, url: &str) -> Result<GarmentAsset, String> {
        let bytes = timeout(self.attempt_timeout, self.fetch(url))
            .await
            .map_err(|_| format!("timed out after {:?}", self.attempt_timeout))??;

        debug!("Fetched {} bytes for garment '{}'", bytes.len(), url);

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| format!("decode task failed: {}", e))?
            .map_err(|e| format!("decode failed: {}", e))?
            .to_rgba8();

        if image.width() == 0 || image.height() == 0 {
            return Err("decoded image is empty".to_string());
        }

        info!(
            "Garment image loaded from '{}' ({}x{})",
            url,
            image.width(),
            image.height()
        );
        Ok(GarmentAsset::new(image, url))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        match AssetLocation::parse(url) {
            AssetLocation::Remote(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| format!("request failed: {}", e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(format!("HTTP {}", status.as_u16()));
                }

                response
                    .bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(|e| format!("body read failed: {}", e))
            }
            AssetLocation::Local(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| format!("read {} failed: {}", path.display(), e)),
        }
    }
}

#[derive(Debug, PartialEq)]
enum AssetLocation<'a> {
    Remote(&'a str),
    Local(PathBuf),
}

impl<'a> AssetLocation<'a> {
    fn parse(url: &'a str) -> Self {
        if url.starts_with("http://") || url.starts_with("https://") {
            AssetLocation::Remote(url)
        } else if let Some(path) = url.strip_prefix("file://") {
            AssetLocation::Local(PathBuf::from(path))
        } else {
            AssetLocation::Local(PathBuf::from(url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_are_classified() {
        assert_eq!(
            AssetLocation::parse("https://cdn/x.png"),
            AssetLocation::Remote("https://cdn/x.png")
        );
        assert_eq!(
            AssetLocation::parse("file:///tmp/x.png"),
            AssetLocation::Local(PathBuf::from("/tmp/x.png"))
        );
        assert_eq!(
            AssetLocation::parse("shirts/x.png"),
            AssetLocation::Local(PathBuf::from("shirts/x.png"))
        );
    }
}
