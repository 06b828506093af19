use nalgebra::Vector3;
use procrig_kernel_core::math::quat::{identity, slerp};
use procrig_kernel_core::Rotation;
use procrig_rig_core::{HumanBone, HumanoidRig, Side};
use serde::{Deserialize, Serialize};

/// Solved limb: rest-relative deltas per bone plus the joint positions they reproduce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IkSolution {
    pub side: Side,
    pub reached: bool,
    /// Distance from the end effector to the target, in metres.
    pub error: f32,
    pub iterations: u32,
    /// Local deltas in chain order, for [`HumanoidRig::set_rotation_rel`].
    pub deltas: Vec<(HumanBone, Rotation)>,
    /// Solved world positions, root first, end effector last.
    pub positions: Vec<Vector3<f32>>,
}

impl IkSolution {
    pub fn unreached(side: Side) -> Self {
        Self {
            side,
            reached: false,
            error: f32::INFINITY,
            iterations: 0,
            deltas: Vec::new(),
            positions: Vec::new(),
        }
    }

    pub fn delta(&self, bone: HumanBone) -> Option<Rotation> {
        self.deltas
            .iter()
            .find_map(|(b, delta)| (*b == bone).then_some(*delta))
    }

    pub fn end_effector(&self) -> Option<Vector3<f32>> {
        self.positions.last().copied()
    }

    /// Write the deltas to `rig`, blended from rest by `weight` in `[0, 1]`.
    /// Returns how many bones were written.
    pub fn apply(&self, rig: &mut dyn HumanoidRig, weight: f32) -> usize {
        let w = if weight.is_finite() {
            weight.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let rest = identity();
        self.deltas
            .iter()
            .filter(|(bone, delta)| rig.set_rotation_rel(*bone, slerp(&rest, delta, w)))
            .count()
    }
}
