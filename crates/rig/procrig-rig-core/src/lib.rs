//! procrig-rig-core: the humanoid rig contract and everything measured from it.
//!
//! Load a [`Skeleton`] (or implement [`HumanoidRig`] for your own scene graph), run
//! [`RigCalibration::calibrate`] once at rest, then drive bones through rest-relative
//! deltas from a [`MotionProgram`].

pub mod bones;
pub mod calibration;
pub mod error;
pub mod landmarks;
pub mod motion;
pub mod pose;
pub mod rig;
pub mod skeleton;

pub use bones::{ArmBones, HumanBone, LegBones, Side};
pub use calibration::{BoneCalibration, HumanoidBasis, RigCalibration, ScaleMetrics};
pub use error::{CalibrationError, SkeletonError};
pub use landmarks::Landmark;
pub use motion::{MotionContext, MotionProgram};
pub use pose::Pose;
pub use rig::{clamp_hips_offset, HumanoidRig, MAX_HIPS_OFFSET};
pub use skeleton::{AuthoringSpace, BoneDef, Skeleton, SkeletonDef};
