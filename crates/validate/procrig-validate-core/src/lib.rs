//! procrig-validate-core: check procedural motion before it ships, and watch it while it
//! runs.
//!
//! [`validate_motion`] replays a [`procrig_rig_core::MotionProgram`] at a fixed rate and
//! reports non-finite values, quaternion drift, joint-limit excursions and slow frames.
//! [`PoseProbe`] samples a live rig for landmark kinematics, foot contact and a quality
//! score.

pub mod limits;
pub mod perf;
pub mod probe;
pub mod validator;

pub use limits::{AngleRange, JointAngles, JointLimit, JointLimits};
pub use perf::{FrameTimeStats, FrameTimer};
pub use probe::{
    format_compact, DistanceSample, FootSample, JointSample, LandmarkSample, PoseProbe,
    PoseProbeFrame, ProbeConfig, QualityScore, QualityWeights,
};
pub use validator::{
    quick_validate, validate_motion, EnabledChecks, Severity, ValidationOptions,
    ValidationResult, ValidationStats, Violation, ViolationKind,
};
