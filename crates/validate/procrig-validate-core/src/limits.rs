//! Per-bone swing/twist ranges and the measurement they are checked against.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use procrig_kernel_core::math::swing_twist::{decompose, swing_components, twist_angle};
use procrig_kernel_core::math::vec::{any_perpendicular, project_on_plane, NORMALIZE_EPSILON};
use procrig_rig_core::{HumanBone, HumanoidRig, RigCalibration};
use serde::{Deserialize, Serialize};

/// Closed interval in radians.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn symmetric(limit: f32) -> Self {
        Self::new(-limit, limit)
    }

    pub fn degrees(min: f32, max: f32) -> Self {
        Self::new(min.to_radians(), max.to_radians())
    }

    pub fn contains(&self, angle: f32) -> bool {
        angle >= self.min && angle <= self.max
    }

    /// How far `angle` lies outside the range; 0 inside.
    pub fn excess(&self, angle: f32) -> f32 {
        if angle < self.min {
            self.min - angle
        } else if angle > self.max {
            angle - self.max
        } else {
            0.0
        }
    }
}

/// Allowed rest-relative motion of one bone.
///
/// `swing_primary` is measured about the bone's hinge axis (elbows, knees) or its lateral
/// axis; `swing_secondary` about the axis completing the frame with the twist axis.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    pub twist: AngleRange,
    pub swing_primary: AngleRange,
    pub swing_secondary: AngleRange,
}

impl JointLimit {
    /// Limit from degree bounds: twist, primary swing, secondary swing.
    pub fn degrees(twist: (f32, f32), primary: (f32, f32), secondary: (f32, f32)) -> Self {
        Self {
            twist: AngleRange::degrees(twist.0, twist.1),
            swing_primary: AngleRange::degrees(primary.0, primary.1),
            swing_secondary: AngleRange::degrees(secondary.0, secondary.1),
        }
    }

    fn symmetric_degrees(twist: f32, primary: f32, secondary: f32) -> Self {
        Self::degrees((-twist, twist), (-primary, primary), (-secondary, secondary))
    }

    /// Largest excess over any of the three ranges, in radians.
    pub fn violation(&self, angles: &JointAngles) -> f32 {
        self.twist
            .excess(angles.twist)
            .max(self.swing_primary.excess(angles.swing_primary))
            .max(self.swing_secondary.excess(angles.swing_secondary))
    }
}

/// Rest-relative swing/twist of one bone, in radians.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub twist: f32,
    pub swing_primary: f32,
    pub swing_secondary: f32,
}

impl JointAngles {
    /// Decompose `rest⁻¹ ∘ current` about the calibrated twist axis.
    ///
    /// `None` when the bone is missing from the rig or the calibration.
    pub fn measure(
        rig: &dyn HumanoidRig,
        calibration: &RigCalibration,
        bone: HumanBone,
    ) -> Option<Self> {
        let cal = calibration.bone(bone)?;
        let delta = rig.rotation_rel(bone)?;
        let axis = cal.twist_axis;

        let primary = match cal.hinge_axis {
            Some(hinge) => hinge,
            None => {
                let lateral = cal.rest_world.inverse() * calibration.basis().right;
                project_on_plane(&lateral, &axis)
                    .try_normalize(NORMALIZE_EPSILON)
                    .unwrap_or_else(|| any_perpendicular(&axis))
            }
        };
        let secondary = axis.cross(&primary);

        let swing = decompose(&delta, &axis).swing;
        let (swing_primary, swing_secondary) = swing_components(&swing, &primary, &secondary);
        Some(Self {
            twist: twist_angle(&delta, &axis),
            swing_primary,
            swing_secondary,
        })
    }

    pub fn swing_magnitude(&self) -> f32 {
        Vector3::new(self.swing_primary, self.swing_secondary, 0.0).norm()
    }
}

/// Limit table keyed by bone. Bones without an entry are unchecked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointLimits {
    limits: BTreeMap<HumanBone, JointLimit>,
}

impl JointLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generous anatomical ranges for a human character.
    pub fn humanoid_defaults() -> Self {
        let mut table = Self::new();
        let sym = JointLimit::symmetric_degrees;

        table.set(HumanBone::Spine, sym(30.0, 45.0, 30.0));
        table.set(HumanBone::Chest, sym(30.0, 40.0, 30.0));
        table.set(HumanBone::UpperChest, sym(25.0, 35.0, 25.0));
        table.set(HumanBone::Neck, sym(50.0, 50.0, 40.0));
        table.set(HumanBone::Head, sym(60.0, 45.0, 35.0));
        table.set(HumanBone::Jaw, sym(5.0, 30.0, 10.0));
        for eye in [HumanBone::LeftEye, HumanBone::RightEye] {
            table.set(eye, sym(10.0, 35.0, 35.0));
        }

        for (shoulder, upper, lower, hand) in [
            (
                HumanBone::LeftShoulder,
                HumanBone::LeftUpperArm,
                HumanBone::LeftLowerArm,
                HumanBone::LeftHand,
            ),
            (
                HumanBone::RightShoulder,
                HumanBone::RightUpperArm,
                HumanBone::RightLowerArm,
                HumanBone::RightHand,
            ),
        ] {
            table.set(shoulder, sym(20.0, 25.0, 25.0));
            table.set(upper, sym(90.0, 120.0, 120.0));
            table.set(lower, JointLimit::degrees((-90.0, 90.0), (-5.0, 150.0), (-10.0, 10.0)));
            table.set(hand, sym(30.0, 80.0, 40.0));
        }

        for (upper, lower, foot, toes) in [
            (
                HumanBone::LeftUpperLeg,
                HumanBone::LeftLowerLeg,
                HumanBone::LeftFoot,
                HumanBone::LeftToes,
            ),
            (
                HumanBone::RightUpperLeg,
                HumanBone::RightLowerLeg,
                HumanBone::RightFoot,
                HumanBone::RightToes,
            ),
        ] {
            table.set(upper, sym(45.0, 120.0, 60.0));
            table.set(lower, JointLimit::degrees((-15.0, 15.0), (-5.0, 150.0), (-10.0, 10.0)));
            table.set(foot, sym(20.0, 50.0, 35.0));
            table.set(toes, sym(10.0, 60.0, 15.0));
        }
        table
    }

    pub fn get(&self, bone: HumanBone) -> Option<&JointLimit> {
        self.limits.get(&bone)
    }

    pub fn set(&mut self, bone: HumanBone, limit: JointLimit) {
        self.limits.insert(bone, limit);
    }

    pub fn remove(&mut self, bone: HumanBone) -> Option<JointLimit> {
        self.limits.remove(&bone)
    }

    /// Replace entries with those from `overrides`, bone by bone.
    pub fn merge(&mut self, overrides: &JointLimits) {
        for (bone, limit) in &overrides.limits {
            self.limits.insert(*bone, *limit);
        }
    }

    pub fn with_overrides(mut self, overrides: &JointLimits) -> Self {
        self.merge(overrides);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumanBone, &JointLimit)> + '_ {
        self.limits.iter().map(|(b, l)| (*b, l))
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}
