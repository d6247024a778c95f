mod backend;
mod cache;
mod estimator;
mod keypoint;
mod loader;
#[cfg(test)]
mod tests;

pub use backend::{HttpPoseBackend, Library, PoseBackend};
pub use cache::LibraryCache;
pub use estimator::{HttpPoseEstimator, PoseEstimator};
pub use keypoint::{Joint, JointPosition, Keypoint, PoseEstimate};
pub use loader::{PoseModelLoader, PoseModelState};
