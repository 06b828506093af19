use log::debug;
use nalgebra::Vector3;
use procrig_kernel_core::math::quat::{compose, rotation_between};
use procrig_kernel_core::math::vec::{is_finite_vec3, NORMALIZE_EPSILON};
use procrig_kernel_core::Rotation;
use procrig_rig_core::{ArmBones, HumanBone, HumanoidRig, RigCalibration, Side};
use serde::{Deserialize, Serialize};

use crate::config::IkConfig;
use crate::fabrik::{apply_pole, solve_chain};
use crate::solution::IkSolution;

/// Where the end of the hand should go, in model space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmTarget {
    pub position: Vector3<f32>,
    /// Model-space direction the elbow should bend toward.
    #[serde(default)]
    pub pole_direction: Option<Vector3<f32>>,
}

impl ArmTarget {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            pole_direction: None,
        }
    }

    pub fn with_pole(mut self, direction: Vector3<f32>) -> Self {
        self.pole_direction = Some(direction);
        self
    }
}

/// FABRIK over shoulder, elbow, wrist and hand end.
#[derive(Clone, Debug, Default)]
pub struct ArmIkSolver {
    config: IkConfig,
}

impl ArmIkSolver {
    pub fn new(config: IkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IkConfig {
        &self.config
    }

    /// Solve one arm from the rig's current pose. Nothing is written to `rig`; call
    /// [`IkSolution::apply`] with the result.
    ///
    /// Returns `None` when the rig or calibration lacks the upper arm, lower arm or hand,
    /// or when the target is not finite.
    pub fn solve(
        &self,
        rig: &dyn HumanoidRig,
        calibration: &RigCalibration,
        side: Side,
        target: &ArmTarget,
    ) -> Option<IkSolution> {
        if !is_finite_vec3(&target.position) {
            return None;
        }
        let arm = ArmBones::of(side);
        let chain = [arm.upper, arm.lower, arm.hand];

        let mut joints = Vec::with_capacity(4);
        for bone in chain {
            if !calibration.has_bone(bone) {
                return None;
            }
            joints.push(rig.world_position(bone)?);
        }

        let hand = calibration.bone(arm.hand)?;
        if hand.length > NORMALIZE_EPSILON {
            let hand_world = rig.world_rotation(arm.hand)?;
            joints.push(joints[2] + hand_world * hand.direction_local * hand.length);
        }
        let bones = &chain[..joints.len() - 1];

        let lengths: Vec<f32> = joints.windows(2).map(|w| (w[1] - w[0]).norm()).collect();
        let result = solve_chain(&mut joints, &lengths, &target.position, &self.config);
        if let Some(pole) = target.pole_direction {
            apply_pole(&mut joints, &pole);
        }

        let deltas = local_deltas(rig, calibration, bones, &joints)?;
        if !result.reached {
            debug!(
                "arm ik ({side:?}): target out of reach, error {:.3} m after {} iterations",
                result.error, result.iterations
            );
        }

        Some(IkSolution {
            side,
            reached: result.reached,
            error: result.error,
            iterations: result.iterations,
            deltas,
            positions: joints,
        })
    }
}

/// Rest-relative deltas that rotate each bone of `bones` onto the solved segment
/// `joints[i] → joints[i + 1]`, walking down the chain so each bone sees its parent's
/// solved rotation.
fn local_deltas(
    rig: &dyn HumanoidRig,
    calibration: &RigCalibration,
    bones: &[HumanBone],
    joints: &[Vector3<f32>],
) -> Option<Vec<(HumanBone, Rotation)>> {
    let first = *bones.first()?;
    let mut parent_world = compose(&rig.world_rotation(first)?, &rig.rotation(first)?.inverse());

    let mut deltas = Vec::with_capacity(bones.len());
    for (i, &bone) in bones.iter().enumerate() {
        let rest_local = rig.rest_rotation(bone)?;
        let direction_local = calibration.bone(bone)?.direction_local;

        let rest_world = compose(&parent_world, &rest_local);
        let from = rest_world * direction_local;
        let to = joints[i + 1] - joints[i];
        let align = rotation_between(&from, &to);

        let delta = compose(&rest_world.inverse(), &compose(&align, &rest_world));
        deltas.push((bone, delta));
        parent_world = compose(&align, &rest_world);
    }
    Some(deltas)
}
