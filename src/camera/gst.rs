use super::interface::{CameraConstraints, CameraSource, VideoTrack};
use crate::error::CameraError;
use crate::frame::{FrameData, FrameFormat};
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::{debug, error, info, trace, warn};

/// How long to wait for the pipeline to reach PLAYING
const OPEN_TIMEOUT_SECONDS: u64 = 5;

/// V4L2 camera through a GStreamer RGBA appsink
pub struct GstCamera {
    device_index: u32,
}

impl GstCamera {
    pub fn new(device_index: u32) -> Result<Self, CameraError> {
        gstreamer::init().map_err(|e| CameraError::DeviceUnavailable {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;
        Ok(Self { device_index })
    }

    fn build_pipeline_string(&self, constraints: &CameraConstraints) -> String {
        format!(
            "v4l2src device=/dev/video{} ! \
             video/x-raw,width={},height={},framerate={}/1 ! \
             videoconvert ! video/x-raw,format=RGBA ! \
             appsink name=sink sync=false max-buffers=1 drop=true emit-signals=false",
            self.device_index, constraints.width, constraints.height, constraints.fps
        )
    }

    fn open_blocking(pipeline_desc: String) -> Result<GstTrack, CameraError> {
        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| CameraError::DeviceUnavailable {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::DeviceUnavailable {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .and_then(|element| element.downcast::<AppSink>().ok())
            .ok_or_else(|| CameraError::DeviceUnavailable {
                details: "Pipeline has no appsink".to_string(),
            })?;

        let started = pipeline
            .set_state(gstreamer::State::Playing)
            .and_then(|_| {
                pipeline
                    .state(gstreamer::ClockTime::from_seconds(OPEN_TIMEOUT_SECONDS))
                    .0
            });

        if let Err(e) = started {
            let details = pipeline
                .bus()
                .and_then(|bus| {
                    bus.timed_pop_filtered(
                        gstreamer::ClockTime::ZERO,
                        &[gstreamer::MessageType::Error],
                    )
                })
                .and_then(|msg| match msg.view() {
                    gstreamer::MessageView::Error(err) => Some(err.error().to_string()),
                    _ => None,
                })
                .unwrap_or_else(|| e.to_string());

            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(classify_open_error(&details));
        }

        info!("GStreamer pipeline started successfully");
        Ok(GstTrack {
            pipeline,
            appsink,
            last_frame: Mutex::new(None),
            frame_counter: AtomicU64::new(0),
            width: AtomicU32::new(0),
            height: AtomicU32::new(0),
        })
    }
}

/// Permission problems surface as EACCES text from v4l2src
fn classify_open_error(details: &str) -> CameraError {
    let lower = details.to_lowercase();
    if lower.contains("permission") || lower.contains("not permitted") {
        CameraError::PermissionDenied
    } else {
        CameraError::DeviceUnavailable {
            details: details.to_string(),
        }
    }
}

#[async_trait]
impl CameraSource for GstCamera {
    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn VideoTrack>, CameraError> {
        if constraints.facing != crate::config::Facing::Front {
            debug!("V4L2 devices have no facing selection; using /dev/video{}", self.device_index);
        }

        let desc = self.build_pipeline_string(constraints);
        let track = tokio::task::spawn_blocking(move || Self::open_blocking(desc))
            .await
            .map_err(|e| CameraError::DeviceUnavailable {
                details: format!("Camera open task failed: {}", e),
            })??;

        Ok(Box::new(track))
    }

    fn name(&self) -> &str {
        "gstreamer-v4l2"
    }
}

pub struct GstTrack {
    pipeline: Pipeline,
    appsink: AppSink,
    last_frame: Mutex<Option<FrameData>>,
    frame_counter: AtomicU64,
    width: AtomicU32,
    height: AtomicU32,
}

impl GstTrack {
    fn convert_sample(&self, sample: &gstreamer::Sample) -> Option<FrameData> {
        let buffer = sample.buffer()?;
        let caps = sample.caps()?;
        let info = match VideoInfo::from_caps(caps) {
            Ok(info) => info,
            Err(e) => {
                warn!("Failed to get video info: {}", e);
                return None;
            }
        };
        let map = match buffer.map_readable() {
            Ok(map) => map,
            Err(e) => {
                warn!("Failed to map buffer: {}", e);
                return None;
            }
        };

        let width = info.width();
        let height = info.height();
        let stride = info.stride()[0] as usize;
        let row_bytes = width as usize * 4;
        let src = map.as_slice();

        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            data.extend_from_slice(src.get(start..start + row_bytes)?);
        }

        self.width.store(width, Ordering::Relaxed);
        self.height.store(height, Ordering::Relaxed);

        let id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        trace!("Captured RGBA frame {} ({}x{})", id, width, height);

        Some(FrameData::new(
            id,
            SystemTime::now(),
            data,
            width,
            height,
            FrameFormat::Rgba8,
        ))
    }
}

impl VideoTrack for GstTrack {
    fn latest_frame(&self) -> Option<FrameData> {
        if let Some(sample) = self.appsink.try_pull_sample(gstreamer::ClockTime::ZERO) {
            if let Some(frame) = self.convert_sample(&sample) {
                *self.last_frame.lock() = Some(frame);
            }
        }
        self.last_frame.lock().clone()
    }

    fn native_size(&self) -> (u32, u32) {
        (
            self.width.load(Ordering::Relaxed),
            self.height.load(Ordering::Relaxed),
        )
    }

    fn stop(&self) {
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            error!("Failed to stop GStreamer pipeline: {}", e);
        } else {
            info!("GStreamer camera pipeline stopped");
        }
    }
}

impl Drop for GstTrack {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_requests_constraints() {
        let camera = GstCamera { device_index: 2 };
        let desc = camera.build_pipeline_string(&CameraConstraints {
            facing: crate::config::Facing::Front,
            width: 1280,
            height: 720,
            fps: 24,
        });
        assert!(desc.contains("/dev/video2"));
        assert!(desc.contains("width=1280,height=720,framerate=24/1"));
        assert!(desc.contains("format=RGBA"));
    }

    #[test]
    fn permission_text_maps_to_denied() {
        assert_eq!(
            classify_open_error("Could not open device '/dev/video0': Permission denied"),
            CameraError::PermissionDenied
        );
        assert!(matches!(
            classify_open_error("Cannot identify device '/dev/video9'"),
            CameraError::DeviceUnavailable { .. }
        ));
    }
}
