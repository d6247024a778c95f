use super::keypoint::Keypoint;
use crate::error::PoseEstimationError;
use crate::frame::FrameData;
use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

/// Single-person pose estimator
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    /// Keypoints for the raw (unmirrored) frame, in frame pixel coordinates
    async fn estimate(&self, frame: &FrameData) -> Result<Vec<Keypoint>, PoseEstimationError>;

    fn name(&self) -> &str;
}

/// JPEG quality used when shipping frames to the inference service
const FRAME_JPEG_QUALITY: u8 = 80;

/// Estimator backed by a remote inference endpoint.
///
/// POSTs the frame as `image/jpeg` and expects a JSON array of
/// `{name, x, y, score}`.
pub struct HttpPoseEstimator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    request_timeout: Duration,
}

impl HttpPoseEstimator {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            request_timeout,
        }
    }
}

#[async_trait]
impl PoseEstimator for HttpPoseEstimator {
    async fn estimate(&self, frame: &FrameData) -> Result<Vec<Keypoint>, PoseEstimationError> {
        let body = frame.encode_jpeg(FRAME_JPEG_QUALITY)?;

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("model", self.model.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .timeout(self.request_timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| PoseEstimationError::Request {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PoseEstimationError::Request {
                details: format!("HTTP {}", status.as_u16()),
            });
        }

        let keypoints: Vec<Keypoint> =
            response
                .json()
                .await
                .map_err(|e| PoseEstimationError::InvalidResponse {
                    details: e.to_string(),
                })?;

        trace!("Frame {}: {} keypoints", frame.id, keypoints.len());
        Ok(keypoints)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
