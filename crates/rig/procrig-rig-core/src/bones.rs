//! Humanoid bone identities and per-side lookup tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// +1 for left, -1 for right: the sign of the lateral axis in humanoid space.
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// Every bone the humanoid contract knows about.
///
/// Declaration order is parent-before-child, so iterating [`HumanBone::ALL`] visits a
/// bone only after its canonical ancestors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanBone {
    Hips,
    Spine,
    Chest,
    UpperChest,
    Neck,
    Head,
    Jaw,
    LeftEye,
    RightEye,
    LeftShoulder,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,
    RightShoulder,
    RightUpperArm,
    RightLowerArm,
    RightHand,
    LeftUpperLeg,
    LeftLowerLeg,
    LeftFoot,
    LeftToes,
    RightUpperLeg,
    RightLowerLeg,
    RightFoot,
    RightToes,
}

impl HumanBone {
    pub const ALL: [HumanBone; 25] = [
        HumanBone::Hips,
        HumanBone::Spine,
        HumanBone::Chest,
        HumanBone::UpperChest,
        HumanBone::Neck,
        HumanBone::Head,
        HumanBone::Jaw,
        HumanBone::LeftEye,
        HumanBone::RightEye,
        HumanBone::LeftShoulder,
        HumanBone::LeftUpperArm,
        HumanBone::LeftLowerArm,
        HumanBone::LeftHand,
        HumanBone::RightShoulder,
        HumanBone::RightUpperArm,
        HumanBone::RightLowerArm,
        HumanBone::RightHand,
        HumanBone::LeftUpperLeg,
        HumanBone::LeftLowerLeg,
        HumanBone::LeftFoot,
        HumanBone::LeftToes,
        HumanBone::RightUpperLeg,
        HumanBone::RightLowerLeg,
        HumanBone::RightFoot,
        HumanBone::RightToes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HumanBone::Hips => "hips",
            HumanBone::Spine => "spine",
            HumanBone::Chest => "chest",
            HumanBone::UpperChest => "upper_chest",
            HumanBone::Neck => "neck",
            HumanBone::Head => "head",
            HumanBone::Jaw => "jaw",
            HumanBone::LeftEye => "left_eye",
            HumanBone::RightEye => "right_eye",
            HumanBone::LeftShoulder => "left_shoulder",
            HumanBone::LeftUpperArm => "left_upper_arm",
            HumanBone::LeftLowerArm => "left_lower_arm",
            HumanBone::LeftHand => "left_hand",
            HumanBone::RightShoulder => "right_shoulder",
            HumanBone::RightUpperArm => "right_upper_arm",
            HumanBone::RightLowerArm => "right_lower_arm",
            HumanBone::RightHand => "right_hand",
            HumanBone::LeftUpperLeg => "left_upper_leg",
            HumanBone::LeftLowerLeg => "left_lower_leg",
            HumanBone::LeftFoot => "left_foot",
            HumanBone::LeftToes => "left_toes",
            HumanBone::RightUpperLeg => "right_upper_leg",
            HumanBone::RightLowerLeg => "right_lower_leg",
            HumanBone::RightFoot => "right_foot",
            HumanBone::RightToes => "right_toes",
        }
    }

    /// Canonical parent in a complete humanoid. A concrete skeleton may skip optional
    /// bones, so its actual parent can be a further ancestor.
    pub fn parent(self) -> Option<HumanBone> {
        use HumanBone::*;
        Some(match self {
            Hips => return None,
            Spine => Hips,
            Chest => Spine,
            UpperChest => Chest,
            Neck => UpperChest,
            Head => Neck,
            Jaw | LeftEye | RightEye => Head,
            LeftShoulder | RightShoulder => UpperChest,
            LeftUpperArm => LeftShoulder,
            LeftLowerArm => LeftUpperArm,
            LeftHand => LeftLowerArm,
            RightUpperArm => RightShoulder,
            RightLowerArm => RightUpperArm,
            RightHand => RightLowerArm,
            LeftUpperLeg | RightUpperLeg => Hips,
            LeftLowerLeg => LeftUpperLeg,
            LeftFoot => LeftLowerLeg,
            LeftToes => LeftFoot,
            RightLowerLeg => RightUpperLeg,
            RightFoot => RightLowerLeg,
            RightToes => RightFoot,
        })
    }

    /// Bones that define this bone's pointing direction, in preference order. The first
    /// one present on a rig wins; an empty list marks a leaf.
    pub fn child_candidates(self) -> &'static [HumanBone] {
        use HumanBone::*;
        match self {
            Hips => &[Spine],
            Spine => &[Chest, UpperChest, Neck, Head],
            Chest => &[UpperChest, Neck, Head],
            UpperChest => &[Neck, Head],
            Neck => &[Head],
            LeftShoulder => &[LeftUpperArm],
            LeftUpperArm => &[LeftLowerArm],
            LeftLowerArm => &[LeftHand],
            RightShoulder => &[RightUpperArm],
            RightUpperArm => &[RightLowerArm],
            RightLowerArm => &[RightHand],
            LeftUpperLeg => &[LeftLowerLeg],
            LeftLowerLeg => &[LeftFoot],
            LeftFoot => &[LeftToes],
            RightUpperLeg => &[RightLowerLeg],
            RightLowerLeg => &[RightFoot],
            RightFoot => &[RightToes],
            Head | Jaw | LeftEye | RightEye | LeftHand | RightHand | LeftToes | RightToes => &[],
        }
    }

    pub fn side(self) -> Option<Side> {
        use HumanBone::*;
        match self {
            LeftEye | LeftShoulder | LeftUpperArm | LeftLowerArm | LeftHand | LeftUpperLeg
            | LeftLowerLeg | LeftFoot | LeftToes => Some(Side::Left),
            RightEye | RightShoulder | RightUpperArm | RightLowerArm | RightHand
            | RightUpperLeg | RightLowerLeg | RightFoot | RightToes => Some(Side::Right),
            _ => None,
        }
    }

    /// The same bone on the other side; central bones map to themselves.
    pub fn mirror(self) -> HumanBone {
        use HumanBone::*;
        match self {
            LeftEye => RightEye,
            RightEye => LeftEye,
            LeftShoulder => RightShoulder,
            RightShoulder => LeftShoulder,
            LeftUpperArm => RightUpperArm,
            RightUpperArm => LeftUpperArm,
            LeftLowerArm => RightLowerArm,
            RightLowerArm => LeftLowerArm,
            LeftHand => RightHand,
            RightHand => LeftHand,
            LeftUpperLeg => RightUpperLeg,
            RightUpperLeg => LeftUpperLeg,
            LeftLowerLeg => RightLowerLeg,
            RightLowerLeg => LeftLowerLeg,
            LeftFoot => RightFoot,
            RightFoot => LeftFoot,
            LeftToes => RightToes,
            RightToes => LeftToes,
            other => other,
        }
    }

    /// Bones every usable humanoid skeleton must provide.
    pub fn is_required(self) -> bool {
        use HumanBone::*;
        !matches!(
            self,
            UpperChest
                | Jaw
                | LeftEye
                | RightEye
                | LeftShoulder
                | RightShoulder
                | LeftToes
                | RightToes
        )
    }

    /// Elbows and knees: single-axis joints with a calibrated hinge.
    pub fn is_hinge(self) -> bool {
        matches!(
            self,
            HumanBone::LeftLowerArm
                | HumanBone::RightLowerArm
                | HumanBone::LeftLowerLeg
                | HumanBone::RightLowerLeg
        )
    }
}

impl fmt::Display for HumanBone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bone name: {0}")]
pub struct UnknownBone(pub String);

impl FromStr for HumanBone {
    type Err = UnknownBone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HumanBone::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| UnknownBone(s.to_string()))
    }
}

/// The bones of one arm.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArmBones {
    pub shoulder: HumanBone,
    pub upper: HumanBone,
    pub lower: HumanBone,
    pub hand: HumanBone,
}

impl ArmBones {
    const LEFT: ArmBones = ArmBones {
        shoulder: HumanBone::LeftShoulder,
        upper: HumanBone::LeftUpperArm,
        lower: HumanBone::LeftLowerArm,
        hand: HumanBone::LeftHand,
    };
    const RIGHT: ArmBones = ArmBones {
        shoulder: HumanBone::RightShoulder,
        upper: HumanBone::RightUpperArm,
        lower: HumanBone::RightLowerArm,
        hand: HumanBone::RightHand,
    };

    pub const fn of(side: Side) -> ArmBones {
        match side {
            Side::Left => Self::LEFT,
            Side::Right => Self::RIGHT,
        }
    }
}

/// The bones of one leg.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LegBones {
    pub upper: HumanBone,
    pub lower: HumanBone,
    pub foot: HumanBone,
    pub toes: HumanBone,
}

impl LegBones {
    const LEFT: LegBones = LegBones {
        upper: HumanBone::LeftUpperLeg,
        lower: HumanBone::LeftLowerLeg,
        foot: HumanBone::LeftFoot,
        toes: HumanBone::LeftToes,
    };
    const RIGHT: LegBones = LegBones {
        upper: HumanBone::RightUpperLeg,
        lower: HumanBone::RightLowerLeg,
        foot: HumanBone::RightFoot,
        toes: HumanBone::RightToes,
    };

    pub const fn of(side: Side) -> LegBones {
        match side {
            Side::Left => Self::LEFT,
            Side::Right => Self::RIGHT,
        }
    }
}
