//! The `HumanoidRig` capability trait.

use nalgebra::Vector3;
use procrig_kernel_core::math::quat::{compose, Rotation};
use procrig_kernel_core::math::vec::clamp_abs;

use crate::bones::HumanBone;
use crate::pose::Pose;

/// Per-axis bound on the hips translation, in metres.
pub const MAX_HIPS_OFFSET: f32 = 2.0;

/// Clamp a hips offset into the `±MAX_HIPS_OFFSET` box.
#[inline]
pub fn clamp_hips_offset(offset: &Vector3<f32>) -> Vector3<f32> {
    clamp_abs(offset, MAX_HIPS_OFFSET)
}

/// Read/write access to the bones of a humanoid skeleton.
///
/// Rotations are local (relative to the parent bone). Bones a skeleton lacks are not
/// errors: getters return `None` and setters return `false` without touching anything.
///
/// Setters store what they are given. A NaN or denormalized rotation written here stays
/// visible so validation can report it.
///
/// Content should prefer the rest-relative pair [`rotation_rel`](Self::rotation_rel) /
/// [`set_rotation_rel`](Self::set_rotation_rel): `final = rest_local ∘ delta` makes the
/// same delta mean the same motion on skeletons with different rest orientations.
pub trait HumanoidRig {
    fn has_bone(&self, bone: HumanBone) -> bool;

    /// Bones present, parents before children.
    fn available_bones(&self) -> Vec<HumanBone>;

    /// Current local rotation.
    fn rotation(&self, bone: HumanBone) -> Option<Rotation>;

    /// Overwrite the local rotation.
    fn set_rotation(&mut self, bone: HumanBone, rotation: Rotation) -> bool;

    /// Rest-pose local rotation.
    fn rest_rotation(&self, bone: HumanBone) -> Option<Rotation>;

    /// Offset of the hips from their rest position.
    fn hips_offset(&self) -> Vector3<f32>;

    /// Store the hips offset after clamping it with [`clamp_hips_offset`].
    fn set_hips_offset(&mut self, offset: Vector3<f32>);

    fn world_position(&self, bone: HumanBone) -> Option<Vector3<f32>>;

    fn world_rotation(&self, bone: HumanBone) -> Option<Rotation>;

    /// Post-multiply `delta` onto the current rotation (renormalized).
    fn add_rotation(&mut self, bone: HumanBone, delta: Rotation) -> bool {
        match self.rotation(bone) {
            Some(current) => self.set_rotation(bone, compose(&current, &delta)),
            None => false,
        }
    }

    /// Current rotation expressed as a delta from rest: `rest⁻¹ ∘ current`.
    fn rotation_rel(&self, bone: HumanBone) -> Option<Rotation> {
        let rest = self.rest_rotation(bone)?;
        let current = self.rotation(bone)?;
        Some(compose(&rest.inverse(), &current))
    }

    /// Set `rest ∘ delta`.
    fn set_rotation_rel(&mut self, bone: HumanBone, delta: Rotation) -> bool {
        match self.rest_rotation(bone) {
            Some(rest) => self.set_rotation(bone, compose(&rest, &delta)),
            None => false,
        }
    }

    /// Rest rotations of every available bone and a zero hips offset.
    fn rest_pose(&self) -> Pose {
        let mut pose = Pose::new();
        for bone in self.available_bones() {
            if let Some(rest) = self.rest_rotation(bone) {
                pose.set_rotation(bone, rest);
            }
        }
        pose.set_hips_offset(Vector3::zeros());
        pose
    }

    fn reset_to_rest_pose(&mut self) {
        for bone in self.available_bones() {
            if let Some(rest) = self.rest_rotation(bone) {
                self.set_rotation(bone, rest);
            }
        }
        self.set_hips_offset(Vector3::zeros());
    }
}
