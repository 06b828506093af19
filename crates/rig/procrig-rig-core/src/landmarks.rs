//! Named body points used by probes and content.

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::bones::{HumanBone, Side};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Hips,
    Chest,
    Neck,
    Head,
    HeadTop,
    Mouth,
    Chin,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftHand,
    RightHand,
    LeftKnee,
    RightKnee,
    LeftFoot,
    RightFoot,
    LeftToes,
    RightToes,
}

impl Landmark {
    pub const ALL: [Landmark; 19] = [
        Landmark::Hips,
        Landmark::Chest,
        Landmark::Neck,
        Landmark::Head,
        Landmark::HeadTop,
        Landmark::Mouth,
        Landmark::Chin,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftHand,
        Landmark::RightHand,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftFoot,
        Landmark::RightFoot,
        Landmark::LeftToes,
        Landmark::RightToes,
    ];

    /// The bone whose joint anchors this landmark.
    pub fn bone(self) -> HumanBone {
        match self {
            Landmark::Hips => HumanBone::Hips,
            Landmark::Chest => HumanBone::Chest,
            Landmark::Neck => HumanBone::Neck,
            Landmark::Head | Landmark::HeadTop | Landmark::Mouth | Landmark::Chin => {
                HumanBone::Head
            }
            Landmark::LeftShoulder => HumanBone::LeftUpperArm,
            Landmark::RightShoulder => HumanBone::RightUpperArm,
            Landmark::LeftElbow => HumanBone::LeftLowerArm,
            Landmark::RightElbow => HumanBone::RightLowerArm,
            Landmark::LeftHand => HumanBone::LeftHand,
            Landmark::RightHand => HumanBone::RightHand,
            Landmark::LeftKnee => HumanBone::LeftLowerLeg,
            Landmark::RightKnee => HumanBone::RightLowerLeg,
            Landmark::LeftFoot => HumanBone::LeftFoot,
            Landmark::RightFoot => HumanBone::RightFoot,
            Landmark::LeftToes => HumanBone::LeftToes,
            Landmark::RightToes => HumanBone::RightToes,
        }
    }

    /// Offset from the head joint at rest, in humanoid space (+X left, +Y up,
    /// +Z forward) as a fraction of body height. `None` for joint landmarks.
    pub fn head_offset(self) -> Option<Vector3<f32>> {
        match self {
            Landmark::HeadTop => Some(Vector3::new(0.0, 0.075, 0.0)),
            Landmark::Mouth => Some(Vector3::new(0.0, 0.012, 0.055)),
            Landmark::Chin => Some(Vector3::new(0.0, -0.012, 0.045)),
            _ => None,
        }
    }

    pub fn hand(side: Side) -> Landmark {
        match side {
            Side::Left => Landmark::LeftHand,
            Side::Right => Landmark::RightHand,
        }
    }

    pub fn foot(side: Side) -> Landmark {
        match side {
            Side::Left => Landmark::LeftFoot,
            Side::Right => Landmark::RightFoot,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Landmark::Hips => "hips",
            Landmark::Chest => "chest",
            Landmark::Neck => "neck",
            Landmark::Head => "head",
            Landmark::HeadTop => "head_top",
            Landmark::Mouth => "mouth",
            Landmark::Chin => "chin",
            Landmark::LeftShoulder => "left_shoulder",
            Landmark::RightShoulder => "right_shoulder",
            Landmark::LeftElbow => "left_elbow",
            Landmark::RightElbow => "right_elbow",
            Landmark::LeftHand => "left_hand",
            Landmark::RightHand => "right_hand",
            Landmark::LeftKnee => "left_knee",
            Landmark::RightKnee => "right_knee",
            Landmark::LeftFoot => "left_foot",
            Landmark::RightFoot => "right_foot",
            Landmark::LeftToes => "left_toes",
            Landmark::RightToes => "right_toes",
        }
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
