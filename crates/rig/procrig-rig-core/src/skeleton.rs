//! A concrete [`HumanoidRig`] built from a serializable skeleton definition.

use hashbrown::HashMap;
use log::debug;
use nalgebra::{Quaternion, Vector3};
use procrig_kernel_core::math::quat::{compose, identity, normalize_quat, Rotation};
use procrig_kernel_core::math::vec::is_finite_vec3;
use serde::{Deserialize, Serialize};

use crate::bones::HumanBone;
use crate::error::SkeletonError;
use crate::rig::{clamp_hips_offset, HumanoidRig};

/// Whether bone transforms in a [`SkeletonDef`] are relative to the parent or absolute.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthoringSpace {
    /// Position is the offset from the parent in the parent's frame; rotation is local.
    #[default]
    Local,
    /// Position and rotation are in model space.
    World,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneDef {
    pub bone: HumanBone,
    #[serde(default)]
    pub parent: Option<HumanBone>,
    pub position: [f32; 3],
    /// `[x, y, z, w]`; identity when absent. Normalized on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
}

/// Rest-pose description of a skeleton. Bones must be listed parents first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub space: AuthoringSpace,
    pub bones: Vec<BoneDef>,
}

impl SkeletonDef {
    pub fn from_json(json: &str) -> Result<Self, SkeletonError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Clone, Debug)]
struct BoneSlot {
    bone: HumanBone,
    parent: Option<usize>,
    /// Translation from the parent joint, in the parent's frame.
    offset: Vector3<f32>,
    rest: Rotation,
    local: Rotation,
}

/// In-memory skeleton with forward kinematics computed on demand.
#[derive(Clone, Debug)]
pub struct Skeleton {
    name: String,
    slots: Vec<BoneSlot>,
    index: HashMap<HumanBone, usize>,
    hips: usize,
    hips_offset: Vector3<f32>,
}

const MIN_ROTATION_NORM_SQUARED: f32 = 1e-12;

fn rotation_from_def(bone: HumanBone, raw: Option<[f32; 4]>) -> Result<Rotation, SkeletonError> {
    let Some([x, y, z, w]) = raw else {
        return Ok(identity());
    };
    let q = Quaternion::new(w, x, y, z);
    let len2 = q.norm_squared();
    if !len2.is_finite() || len2 < MIN_ROTATION_NORM_SQUARED {
        return Err(SkeletonError::InvalidRotation { bone });
    }
    Ok(normalize_quat(q))
}

impl Skeleton {
    pub fn from_def(def: &SkeletonDef) -> Result<Self, SkeletonError> {
        let mut slots: Vec<BoneSlot> = Vec::with_capacity(def.bones.len());
        let mut index: HashMap<HumanBone, usize> = HashMap::with_capacity(def.bones.len());
        // Authored model-space transforms, used to localize world-space definitions.
        let mut authored: Vec<(Vector3<f32>, Rotation)> = Vec::with_capacity(def.bones.len());

        for bone_def in &def.bones {
            let bone = bone_def.bone;
            if index.contains_key(&bone) {
                return Err(SkeletonError::DuplicateBone { bone });
            }

            let parent = match bone_def.parent {
                None => None,
                Some(parent) => match index.get(&parent) {
                    Some(&i) => Some(i),
                    None if def.bones.iter().any(|b| b.bone == parent) => {
                        return Err(SkeletonError::ParentAfterChild { bone, parent });
                    }
                    None => return Err(SkeletonError::UnknownParent { bone, parent }),
                },
            };

            let position = Vector3::from(bone_def.position);
            if !is_finite_vec3(&position) {
                return Err(SkeletonError::InvalidPosition { bone });
            }
            let rotation = rotation_from_def(bone, bone_def.rotation)?;

            let (offset, local) = match (def.space, parent) {
                (AuthoringSpace::Local, _) | (AuthoringSpace::World, None) => (position, rotation),
                (AuthoringSpace::World, Some(p)) => {
                    let (parent_pos, parent_rot) = authored[p];
                    let inv = parent_rot.inverse();
                    (inv * (position - parent_pos), compose(&inv, &rotation))
                }
            };

            let model = match (def.space, parent) {
                (AuthoringSpace::World, _) | (AuthoringSpace::Local, None) => (position, rotation),
                (AuthoringSpace::Local, Some(p)) => {
                    let (parent_pos, parent_rot) = authored[p];
                    (parent_pos + parent_rot * position, compose(&parent_rot, &rotation))
                }
            };
            authored.push(model);

            index.insert(bone, slots.len());
            slots.push(BoneSlot {
                bone,
                parent,
                offset,
                rest: local,
                local,
            });
        }

        let hips = *index
            .get(&HumanBone::Hips)
            .ok_or(SkeletonError::MissingHips)?;

        debug!(
            "skeleton '{}' loaded: {} bones ({:?} space)",
            def.name,
            slots.len(),
            def.space
        );

        Ok(Self {
            name: def.name.clone(),
            slots,
            index,
            hips,
            hips_offset: Vector3::zeros(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SkeletonError> {
        Self::from_def(&SkeletonDef::from_json(json)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The parent this skeleton actually uses, which may skip optional canonical bones.
    pub fn parent(&self, bone: HumanBone) -> Option<HumanBone> {
        let slot = &self.slots[*self.index.get(&bone)?];
        slot.parent.map(|p| self.slots[p].bone)
    }

    /// Translation from the parent joint in the parent's frame.
    pub fn local_offset(&self, bone: HumanBone) -> Option<Vector3<f32>> {
        self.index.get(&bone).map(|&i| self.slots[i].offset)
    }

    /// Adopt the current local rotations as the new rest pose.
    pub fn snapshot_rest_pose(&mut self) {
        for slot in &mut self.slots {
            slot.rest = slot.local;
        }
    }

    fn world_transform(&self, i: usize) -> (Vector3<f32>, Rotation) {
        let slot = &self.slots[i];
        let translation = if i == self.hips {
            slot.offset + self.hips_offset
        } else {
            slot.offset
        };
        match slot.parent {
            None => (translation, slot.local),
            Some(p) => {
                let (parent_pos, parent_rot) = self.world_transform(p);
                (parent_pos + parent_rot * translation, parent_rot * slot.local)
            }
        }
    }
}

impl HumanoidRig for Skeleton {
    fn has_bone(&self, bone: HumanBone) -> bool {
        self.index.contains_key(&bone)
    }

    fn available_bones(&self) -> Vec<HumanBone> {
        self.slots.iter().map(|s| s.bone).collect()
    }

    fn rotation(&self, bone: HumanBone) -> Option<Rotation> {
        self.index.get(&bone).map(|&i| self.slots[i].local)
    }

    fn set_rotation(&mut self, bone: HumanBone, rotation: Rotation) -> bool {
        match self.index.get(&bone) {
            Some(&i) => {
                self.slots[i].local = rotation;
                true
            }
            None => false,
        }
    }

    fn rest_rotation(&self, bone: HumanBone) -> Option<Rotation> {
        self.index.get(&bone).map(|&i| self.slots[i].rest)
    }

    fn hips_offset(&self) -> Vector3<f32> {
        self.hips_offset
    }

    fn set_hips_offset(&mut self, offset: Vector3<f32>) {
        self.hips_offset = clamp_hips_offset(&offset);
    }

    fn world_position(&self, bone: HumanBone) -> Option<Vector3<f32>> {
        self.index.get(&bone).map(|&i| self.world_transform(i).0)
    }

    fn world_rotation(&self, bone: HumanBone) -> Option<Rotation> {
        self.index.get(&bone).map(|&i| self.world_transform(i).1)
    }
}
