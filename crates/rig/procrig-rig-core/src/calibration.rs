//! One-time geometric calibration of a rig at its rest pose.
//!
//! Calibration turns whatever rest orientation a skeleton was authored with into
//! per-bone axes that content can rely on: a twist axis along each bone, a hinge axis
//! for elbows and knees, a humanoid frame and whole-body proportions.

use hashbrown::HashMap;
use log::{debug, warn};
use nalgebra::Vector3;
use procrig_kernel_core::math::quat::{quat_is_finite, Rotation};
use procrig_kernel_core::math::vec::{is_finite_vec3, safe_normalize, NORMALIZE_EPSILON};
use serde::{Deserialize, Serialize};

use crate::bones::{ArmBones, HumanBone, LegBones, Side};
use crate::error::CalibrationError;
use crate::landmarks::Landmark;
use crate::rig::HumanoidRig;

/// Length of a leaf bone as a fraction of its parent's length.
fn leaf_length_ratio(bone: HumanBone) -> f32 {
    match bone {
        HumanBone::LeftHand | HumanBone::RightHand => 0.75,
        HumanBone::Head => 2.0,
        HumanBone::LeftFoot | HumanBone::RightFoot => 0.35,
        HumanBone::LeftToes | HumanBone::RightToes => 0.5,
        HumanBone::Jaw | HumanBone::LeftEye | HumanBone::RightEye => 0.0,
        _ => 0.5,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneCalibration {
    pub bone: HumanBone,
    pub rest_local: Rotation,
    pub rest_world: Rotation,
    pub rest_position: Vector3<f32>,
    /// Unit direction from this joint toward its child, in model space.
    pub direction_world: Vector3<f32>,
    /// The same direction in the bone's own rest frame.
    pub direction_local: Vector3<f32>,
    /// Local axis for twist decomposition (equal to `direction_local`).
    pub twist_axis: Vector3<f32>,
    /// Local flexion axis for elbows and knees. Positive rotation bends the joint.
    pub hinge_axis: Option<Vector3<f32>>,
    pub length: f32,
    /// True when the direction and length were borrowed from the parent.
    pub is_leaf: bool,
}

/// Character-relative axes in model space, derived from the hips at rest.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HumanoidBasis {
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
    pub forward: Vector3<f32>,
    pub origin: Vector3<f32>,
}

impl Default for HumanoidBasis {
    fn default() -> Self {
        Self {
            right: -Vector3::x(),
            up: Vector3::y(),
            forward: Vector3::z(),
            origin: Vector3::zeros(),
        }
    }
}

impl HumanoidBasis {
    fn from_hips(rotation: &Rotation, origin: Vector3<f32>) -> Self {
        let forward = rotation * Vector3::z();
        let up = rotation * Vector3::y();
        let right = forward.cross(&up);
        Self {
            right,
            up,
            forward,
            origin,
        }
    }

    #[inline]
    pub fn left(&self) -> Vector3<f32> {
        -self.right
    }

    /// Model-space direction → humanoid space (+X left, +Y up, +Z forward).
    pub fn to_humanoid(&self, v: &Vector3<f32>) -> Vector3<f32> {
        Vector3::new(v.dot(&self.left()), v.dot(&self.up), v.dot(&self.forward))
    }

    /// Humanoid-space direction → model space.
    pub fn from_humanoid(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.left() * v.x + self.up * v.y + self.forward * v.z
    }

    /// Height of a model-space point along `up`.
    #[inline]
    pub fn elevation(&self, p: &Vector3<f32>) -> f32 {
        p.dot(&self.up)
    }
}

/// Whole-body proportions in metres.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleMetrics {
    /// Ground to head joint.
    pub height: f32,
    pub shoulder_width: f32,
    /// Shoulder joint to wrist.
    pub arm_length: f32,
    /// Hip joint to ankle.
    pub leg_length: f32,
    /// Hips to neck.
    pub torso_length: f32,
    pub hip_height: f32,
    /// Elevation of the lowest foot joint at rest.
    pub ground_height: f32,
}

/// Calibration results for one skeleton instance. Immutable once computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigCalibration {
    bones: HashMap<HumanBone, BoneCalibration>,
    basis: HumanoidBasis,
    scale: ScaleMetrics,
}

struct RestSample {
    local: Rotation,
    world: Rotation,
    position: Vector3<f32>,
}

impl RigCalibration {
    /// Reset `rig` to its rest pose and measure it.
    pub fn calibrate(rig: &mut dyn HumanoidRig) -> Result<Self, CalibrationError> {
        if !rig.has_bone(HumanBone::Hips) {
            return Err(CalibrationError::MissingHips);
        }
        rig.reset_to_rest_pose();

        let mut samples: HashMap<HumanBone, RestSample> = HashMap::new();
        for bone in rig.available_bones() {
            let (Some(local), Some(world), Some(position)) = (
                rig.rotation(bone),
                rig.world_rotation(bone),
                rig.world_position(bone),
            ) else {
                debug!("calibration: skipping {bone}, no transform");
                continue;
            };
            samples.insert(
                bone,
                RestSample {
                    local,
                    world,
                    position,
                },
            );
        }

        let hips = samples
            .get(&HumanBone::Hips)
            .ok_or(CalibrationError::MissingHips)?;
        if !quat_is_finite(&hips.world) || !is_finite_vec3(&hips.position) {
            return Err(CalibrationError::DegenerateBasis);
        }
        let basis = HumanoidBasis::from_hips(&hips.world, hips.position);

        let mut bones: HashMap<HumanBone, BoneCalibration> = HashMap::with_capacity(samples.len());
        // Canonical order guarantees ancestors are calibrated before leaves borrow from them.
        for bone in HumanBone::ALL {
            let Some(sample) = samples.get(&bone) else {
                continue;
            };
            let child = bone
                .child_candidates()
                .iter()
                .find_map(|c| samples.get(c));

            let measured = child.and_then(|c| {
                let span = c.position - sample.position;
                let length = span.norm();
                if length > NORMALIZE_EPSILON {
                    Some((span / length, length))
                } else {
                    warn!("calibration: {bone} coincides with its child, treating as leaf");
                    None
                }
            });

            let (direction_world, length, is_leaf) = match measured {
                Some((dir, len)) => (dir, len, false),
                None => {
                    let (dir, parent_len) = nearest_calibrated_ancestor(bone, &bones)
                        .map(|p| (p.direction_world, p.length))
                        .unwrap_or((basis.up, 0.0));
                    (dir, parent_len * leaf_length_ratio(bone), true)
                }
            };

            let inv_world = sample.world.inverse();
            let direction_local = safe_normalize(&(inv_world * direction_world), Vector3::y());

            let hinge_axis = hinge_world(bone, &direction_world, &basis)
                .map(|h| safe_normalize(&(inv_world * h), Vector3::x()));

            bones.insert(
                bone,
                BoneCalibration {
                    bone,
                    rest_local: sample.local,
                    rest_world: sample.world,
                    rest_position: sample.position,
                    direction_world,
                    direction_local,
                    twist_axis: direction_local,
                    hinge_axis,
                    length,
                    is_leaf,
                },
            );
        }

        let scale = measure_scale(&bones, &basis);
        debug!(
            "calibrated {} bones: height {:.3} m, arm {:.3} m, leg {:.3} m",
            bones.len(),
            scale.height,
            scale.arm_length,
            scale.leg_length
        );

        Ok(Self {
            bones,
            basis,
            scale,
        })
    }

    pub fn bone(&self, bone: HumanBone) -> Option<&BoneCalibration> {
        self.bones.get(&bone)
    }

    pub fn has_bone(&self, bone: HumanBone) -> bool {
        self.bones.contains_key(&bone)
    }

    /// Calibrated bones in canonical order.
    pub fn bones(&self) -> impl Iterator<Item = &BoneCalibration> + '_ {
        HumanBone::ALL.iter().filter_map(|b| self.bones.get(b))
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn twist_axis(&self, bone: HumanBone) -> Option<Vector3<f32>> {
        self.bones.get(&bone).map(|b| b.twist_axis)
    }

    pub fn hinge_axis(&self, bone: HumanBone) -> Option<Vector3<f32>> {
        self.bones.get(&bone).and_then(|b| b.hinge_axis)
    }

    /// Rest direction toward the child, in model space.
    pub fn rest_direction(&self, bone: HumanBone) -> Option<Vector3<f32>> {
        self.bones.get(&bone).map(|b| b.direction_world)
    }

    pub fn length(&self, bone: HumanBone) -> Option<f32> {
        self.bones.get(&bone).map(|b| b.length)
    }

    pub fn basis(&self) -> &HumanoidBasis {
        &self.basis
    }

    pub fn scale(&self) -> &ScaleMetrics {
        &self.scale
    }

    #[inline]
    pub fn to_humanoid(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.basis.to_humanoid(v)
    }

    #[inline]
    pub fn from_humanoid(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self.basis.from_humanoid(v)
    }

    /// Current model-space position of `landmark` on `rig`.
    ///
    /// Computed landmarks (mouth, head top, chin) are anatomical offsets from the head
    /// joint, scaled by body height and carried along with the head's rotation since
    /// rest. Everything else is the bone's joint position.
    pub fn landmark_position(
        &self,
        rig: &dyn HumanoidRig,
        landmark: Landmark,
    ) -> Option<Vector3<f32>> {
        match landmark.head_offset() {
            None => rig.world_position(landmark.bone()),
            Some(offset) => {
                let head = self.bones.get(&HumanBone::Head)?;
                let position = rig.world_position(HumanBone::Head)?;
                let rotation = rig.world_rotation(HumanBone::Head)?;
                let rest_offset = self.basis.from_humanoid(&offset) * self.scale.height;
                let since_rest = rotation * head.rest_world.inverse();
                Some(position + since_rest * rest_offset)
            }
        }
    }
}

fn nearest_calibrated_ancestor<'a>(
    bone: HumanBone,
    bones: &'a HashMap<HumanBone, BoneCalibration>,
) -> Option<&'a BoneCalibration> {
    let mut cursor = bone.parent();
    while let Some(parent) = cursor {
        if let Some(found) = bones.get(&parent) {
            return Some(found);
        }
        cursor = parent.parent();
    }
    None
}

/// Elbows flex toward the front, knees toward the back.
fn hinge_world(
    bone: HumanBone,
    direction: &Vector3<f32>,
    basis: &HumanoidBasis,
) -> Option<Vector3<f32>> {
    let bend_toward = match bone {
        HumanBone::LeftLowerArm | HumanBone::RightLowerArm => basis.forward,
        HumanBone::LeftLowerLeg | HumanBone::RightLowerLeg => -basis.forward,
        _ => return None,
    };
    let fallback = if direction.dot(&basis.up).abs() > 0.9 {
        basis.right
    } else {
        basis.up
    };
    Some(safe_normalize(&direction.cross(&bend_toward), fallback))
}

fn measure_scale(
    bones: &HashMap<HumanBone, BoneCalibration>,
    basis: &HumanoidBasis,
) -> ScaleMetrics {
    let elevation = |b: HumanBone| bones.get(&b).map(|c| basis.elevation(&c.rest_position));
    let length = |b: HumanBone| bones.get(&b).map(|c| c.length).unwrap_or(0.0);
    let position = |b: HumanBone| bones.get(&b).map(|c| c.rest_position);

    let ground_height = Side::BOTH
        .iter()
        .flat_map(|s| {
            let leg = LegBones::of(*s);
            [elevation(leg.foot), elevation(leg.toes)]
        })
        .flatten()
        .fold(None, |acc: Option<f32>, e| Some(acc.map_or(e, |a| a.min(e))))
        .unwrap_or(0.0);

    let top = elevation(HumanBone::Head)
        .or_else(|| elevation(HumanBone::Neck))
        .unwrap_or(ground_height);
    let hips = elevation(HumanBone::Hips).unwrap_or(ground_height);

    let side_metric = |f: &dyn Fn(Side) -> Option<f32>| f(Side::Left).or_else(|| f(Side::Right));

    let arm_length = side_metric(&|s| {
        let arm = ArmBones::of(s);
        bones
            .contains_key(&arm.upper)
            .then(|| length(arm.upper) + length(arm.lower))
    })
    .unwrap_or(0.0);

    let leg_length = side_metric(&|s| {
        let leg = LegBones::of(s);
        bones
            .contains_key(&leg.upper)
            .then(|| length(leg.upper) + length(leg.lower))
    })
    .unwrap_or(0.0);

    let shoulder_width = match (
        position(HumanBone::LeftUpperArm),
        position(HumanBone::RightUpperArm),
    ) {
        (Some(l), Some(r)) => (l - r).norm(),
        _ => 0.0,
    };

    let torso_length = match (
        position(HumanBone::Hips),
        position(HumanBone::Neck).or_else(|| position(HumanBone::Head)),
    ) {
        (Some(h), Some(n)) => (n - h).norm(),
        _ => 0.0,
    };

    ScaleMetrics {
        height: (top - ground_height).max(0.0),
        shoulder_width,
        arm_length,
        leg_length,
        torso_length,
        hip_height: (hips - ground_height).max(0.0),
        ground_height,
    }
}
