//! Snapshot of local bone rotations plus an optional hips offset.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use procrig_kernel_core::math::quat::Rotation;
use serde::{Deserialize, Serialize};

use crate::bones::HumanBone;
use crate::rig::HumanoidRig;

/// Bone → absolute local rotation, iterated in [`HumanBone`] order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default)]
    rotations: BTreeMap<HumanBone, Rotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hips_offset: Option<Vector3<f32>>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every available bone's current rotation and the hips offset.
    pub fn capture(rig: &dyn HumanoidRig) -> Self {
        let mut pose = Pose::new();
        for bone in rig.available_bones() {
            if let Some(q) = rig.rotation(bone) {
                pose.rotations.insert(bone, q);
            }
        }
        pose.hips_offset = Some(rig.hips_offset());
        pose
    }

    /// Write the pose onto `rig`. Returns how many bones were written; bones the rig
    /// lacks are skipped.
    pub fn apply_to(&self, rig: &mut dyn HumanoidRig) -> usize {
        let mut written = 0;
        for (bone, q) in &self.rotations {
            if rig.set_rotation(*bone, *q) {
                written += 1;
            }
        }
        if let Some(offset) = self.hips_offset {
            rig.set_hips_offset(offset);
        }
        written
    }

    pub fn rotation(&self, bone: HumanBone) -> Option<Rotation> {
        self.rotations.get(&bone).copied()
    }

    pub fn set_rotation(&mut self, bone: HumanBone, rotation: Rotation) {
        self.rotations.insert(bone, rotation);
    }

    pub fn remove(&mut self, bone: HumanBone) -> Option<Rotation> {
        self.rotations.remove(&bone)
    }

    pub fn contains(&self, bone: HumanBone) -> bool {
        self.rotations.contains_key(&bone)
    }

    pub fn hips_offset(&self) -> Option<Vector3<f32>> {
        self.hips_offset
    }

    pub fn set_hips_offset(&mut self, offset: Vector3<f32>) {
        self.hips_offset = Some(offset);
    }

    pub fn clear_hips_offset(&mut self) {
        self.hips_offset = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumanBone, Rotation)> + '_ {
        self.rotations.iter().map(|(b, q)| (*b, *q))
    }

    pub fn bones(&self) -> impl Iterator<Item = HumanBone> + '_ {
        self.rotations.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty() && self.hips_offset.is_none()
    }

    pub fn clear(&mut self) {
        self.rotations.clear();
        self.hips_offset = None;
    }
}
