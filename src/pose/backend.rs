use super::estimator::{HttpPoseEstimator, PoseEstimator};
use crate::config::PoseConfig;
use crate::error::ModelLoadError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Libraries that must be present before an estimator can be created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Library {
    /// Numerical computation runtime
    Runtime,
    /// Pose detection module built on the runtime
    PoseModule,
}

/// Source of the pose capability
#[async_trait]
pub trait PoseBackend: Send + Sync {
    /// Fetch and install one library
    async fn fetch_library(&self, library: Library) -> Result<(), ModelLoadError>;

    /// Instantiate a lightweight single-person estimator
    async fn create_estimator(&self) -> Result<Arc<dyn PoseEstimator>, ModelLoadError>;
}

/// Backend talking to a pose inference service over HTTP
pub struct HttpPoseBackend {
    client: reqwest::Client,
    config: PoseConfig,
}

impl HttpPoseBackend {
    pub fn new(config: PoseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn get_descriptor(&self, url: &str) -> Result<usize, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {} from {}", status.as_u16(), url));
        }

        let body = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(body.len())
    }
}

#[async_trait]
impl PoseBackend for HttpPoseBackend {
    async fn fetch_library(&self, library: Library) -> Result<(), ModelLoadError> {
        match library {
            Library::Runtime => {
                let size = self
                    .get_descriptor(&self.config.runtime_url)
                    .await
                    .map_err(|details| ModelLoadError::RuntimeFetch { details })?;
                debug!("Runtime descriptor fetched ({} bytes)", size);
            }
            Library::PoseModule => {
                let size = self
                    .get_descriptor(&self.config.module_url)
                    .await
                    .map_err(|details| ModelLoadError::ModuleFetch { details })?;
                debug!("Pose module descriptor fetched ({} bytes)", size);
            }
        }
        Ok(())
    }

    async fn create_estimator(&self) -> Result<Arc<dyn PoseEstimator>, ModelLoadError> {
        if self.config.inference_url.trim().is_empty() {
            return Err(ModelLoadError::Instantiation {
                details: "no inference endpoint configured".to_string(),
            });
        }

        Ok(Arc::new(HttpPoseEstimator::new(
            self.client.clone(),
            self.config.inference_url.clone(),
            self.config.model.clone(),
            Duration::from_millis(self.config.request_timeout_ms),
        )))
    }
}
