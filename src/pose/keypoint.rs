use serde::Deserialize;
use std::str::FromStr;

/// The 17 COCO joints produced by single-person MoveNet-style estimators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const ALL: [Joint; 17] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "left_eye",
            Joint::RightEye => "right_eye",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for Joint {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Joint::ALL
            .iter()
            .copied()
            .find(|joint| joint.name() == s)
            .ok_or(())
    }
}

/// One named landmark as returned by an estimator, in raw camera pixels
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(alias = "score")]
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f32, y: f32, confidence: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            confidence,
        }
    }
}

/// Validated landmark with a clamped score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPosition {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// Per-frame pose. Lookups are by joint, never by string, and a missing
/// joint reads as absent rather than low-but-present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseEstimate {
    joints: [Option<JointPosition>; 17],
}

impl PoseEstimate {
    /// Build from raw keypoints. Unknown names and non-finite positions are
    /// dropped; scores are clamped into [0, 1] with NaN read as 0. The first
    /// occurrence of a joint wins.
    pub fn from_keypoints(keypoints: &[Keypoint]) -> Self {
        let mut joints = [None; 17];
        for kp in keypoints {
            let Ok(joint) = kp.name.parse::<Joint>() else {
                continue;
            };
            if !kp.x.is_finite() || !kp.y.is_finite() {
                continue;
            }
            let slot = &mut joints[joint.index()];
            if slot.is_none() {
                let confidence = if kp.confidence.is_nan() {
                    0.0
                } else {
                    kp.confidence.clamp(0.0, 1.0)
                };
                *slot = Some(JointPosition {
                    x: kp.x,
                    y: kp.y,
                    confidence,
                });
            }
        }
        Self { joints }
    }

    pub fn joint(&self, joint: Joint) -> Option<JointPosition> {
        self.joints[joint.index()]
    }

    pub fn left_shoulder(&self) -> Option<JointPosition> {
        self.joint(Joint::LeftShoulder)
    }

    pub fn right_shoulder(&self) -> Option<JointPosition> {
        self.joint(Joint::RightShoulder)
    }

    /// Both shoulders, only if each meets `threshold`
    pub fn confident_shoulders(&self, threshold: f32) -> Option<(JointPosition, JointPosition)> {
        let left = self.left_shoulder().filter(|j| j.confidence >= threshold)?;
        let right = self.right_shoulder().filter(|j| j.confidence >= threshold)?;
        Some((left, right))
    }

    pub fn detected_count(&self) -> usize {
        self.joints.iter().filter(|j| j.is_some()).count()
    }
}
