mod builder;
mod controller;
#[cfg(all(target_os = "linux", feature = "camera"))]
mod gst;
mod interface;
mod stream;
mod synthetic;
#[cfg(test)]
mod tests;

pub use builder::CameraSourceBuilder;
pub use controller::CameraController;
#[cfg(all(target_os = "linux", feature = "camera"))]
pub use gst::GstCamera;
pub use interface::{CameraConstraints, CameraSource, VideoTrack};
pub use stream::CameraStream;
pub use synthetic::{SyntheticCamera, SyntheticOutcome, SyntheticTrack};
