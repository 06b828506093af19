use std::cell::Cell;

use approx::assert_relative_eq;
use nalgebra::{Quaternion, Vector3};
use procrig_kernel_core::math::quat::{axis_angle, rotation_angle, Rotation};
use procrig_rig_core::{
    HumanBone, HumanoidRig, MotionContext, MotionProgram, RigCalibration, Skeleton, SkeletonDef,
};
use procrig_validate_core::{
    quick_validate, validate_motion, Severity, ValidationOptions, ViolationKind,
};

fn calibrated(name: &str) -> (Skeleton, RigCalibration) {
    let def: SkeletonDef =
        procrig_test_fixtures::skeletons::load(name).expect("load skeleton fixture");
    let mut skel = Skeleton::from_def(&def).expect("build skeleton");
    let calib = RigCalibration::calibrate(&mut skel).expect("calibrate");
    (skel, calib)
}

/// One second at 60 fps without the wall-clock check, so results are deterministic.
fn options() -> ValidationOptions {
    let mut options = ValidationOptions {
        duration: 1.0,
        ..ValidationOptions::default()
    };
    options.checks.performance = false;
    options
}

/// Gentle head sway that stays well inside every limit.
struct Sway {
    init_spine_angle: Cell<Option<f32>>,
}

impl Sway {
    fn new() -> Self {
        Self {
            init_spine_angle: Cell::new(None),
        }
    }
}

impl MotionProgram for Sway {
    type State = ();

    fn name(&self) -> &str {
        "sway"
    }

    fn init(&self, rig: &dyn HumanoidRig, _calibration: &RigCalibration) {
        let spine = rig.rotation_rel(HumanBone::Spine).map(|q| rotation_angle(&q));
        self.init_spine_angle.set(spine);
    }

    fn update(&self, _state: &mut (), rig: &mut dyn HumanoidRig, ctx: &MotionContext<'_>) {
        let angle = 0.2 * (ctx.time * 2.0).sin();
        rig.set_rotation_rel(HumanBone::Neck, axis_angle(&Vector3::y(), angle));
        rig.set_rotation_rel(HumanBone::Head, axis_angle(&Vector3::x(), angle * 0.5));
    }
}

/// Writes a NaN rotation into the spine on exactly one frame.
struct GlitchAt {
    frame: u32,
}

impl MotionProgram for GlitchAt {
    type State = u32;

    fn name(&self) -> &str {
        "glitch"
    }

    fn init(&self, _rig: &dyn HumanoidRig, _calibration: &RigCalibration) -> u32 {
        0
    }

    fn update(&self, frame: &mut u32, rig: &mut dyn HumanoidRig, _ctx: &MotionContext<'_>) {
        if *frame == self.frame {
            let nan = Rotation::new_unchecked(Quaternion::new(f32::NAN, 0.0, 0.0, 0.0));
            rig.set_rotation(HumanBone::Spine, nan);
        } else {
            rig.set_rotation_rel(HumanBone::Spine, Rotation::identity());
        }
        *frame += 1;
    }
}

/// Stores the chest's rest rotation scaled off the unit sphere from `from_frame` on.
struct Drift {
    scale: f32,
    from_frame: u32,
}

impl Drift {
    fn every_frame(scale: f32) -> Self {
        Self {
            scale,
            from_frame: 0,
        }
    }
}

impl MotionProgram for Drift {
    type State = u32;

    fn name(&self) -> &str {
        "drift"
    }

    fn init(&self, _rig: &dyn HumanoidRig, _calibration: &RigCalibration) -> u32 {
        0
    }

    fn update(&self, frame: &mut u32, rig: &mut dyn HumanoidRig, _ctx: &MotionContext<'_>) {
        if let Some(rest) = rig.rest_rotation(HumanBone::Chest) {
            let scale = if *frame >= self.from_frame { self.scale } else { 1.0 };
            let scaled = Rotation::new_unchecked(rest.into_inner() * scale);
            rig.set_rotation(HumanBone::Chest, scaled);
        }
        *frame += 1;
    }
}

/// Writes a non-finite hips offset on exactly one frame.
struct HipsGlitchAt {
    frame: u32,
}

impl MotionProgram for HipsGlitchAt {
    type State = u32;

    fn name(&self) -> &str {
        "hips_glitch"
    }

    fn init(&self, _rig: &dyn HumanoidRig, _calibration: &RigCalibration) -> u32 {
        0
    }

    fn update(&self, frame: &mut u32, rig: &mut dyn HumanoidRig, _ctx: &MotionContext<'_>) {
        if *frame == self.frame {
            rig.set_hips_offset(Vector3::new(f32::NAN, 0.0, 0.0));
        } else {
            rig.set_hips_offset(Vector3::new(0.0, 0.02, 0.0));
        }
        *frame += 1;
    }
}

/// Bends the left elbow backwards past its hinge stop.
struct Hyperextend {
    angle: f32,
}

impl MotionProgram for Hyperextend {
    type State = Vector3<f32>;

    fn name(&self) -> &str {
        "hyperextend"
    }

    fn init(&self, _rig: &dyn HumanoidRig, calibration: &RigCalibration) -> Vector3<f32> {
        calibration
            .bone(HumanBone::LeftLowerArm)
            .and_then(|b| b.hinge_axis)
            .unwrap_or_else(Vector3::x)
    }

    fn update(&self, hinge: &mut Vector3<f32>, rig: &mut dyn HumanoidRig, _: &MotionContext<'_>) {
        rig.set_rotation_rel(HumanBone::LeftLowerArm, axis_angle(hinge, self.angle));
    }
}

/// it should pass compliant motion on every fixture
#[test]
fn compliant_motion_has_no_violations() {
    for name in procrig_test_fixtures::skeletons::keys() {
        let (mut rig, calib) = calibrated(&name);
        let result = validate_motion(&Sway::new(), &mut rig, &calib, &options());
        assert!(result.valid, "{name}: {:?}", result.violations);
        assert!(result.violations.is_empty(), "{name}: {:?}", result.violations);
        assert!(!result.truncated);
        assert_eq!(result.stats.frames, 60);
        assert_relative_eq!(result.stats.simulated_time, 1.0, epsilon = 1e-5);
        assert_eq!(result.stats.frame_time.frames, 60);
    }
}

/// it should start every replay from the rest pose
#[test]
fn replay_starts_from_rest() {
    let (mut rig, calib) = calibrated("reference");
    rig.set_rotation_rel(HumanBone::Spine, axis_angle(&Vector3::x(), 0.8));

    let sway = Sway::new();
    validate_motion(&sway, &mut rig, &calib, &options());
    let angle = sway.init_spine_angle.get().expect("spine measured at init");
    assert!(angle < 1e-3, "spine was {angle} rad from rest at init");
}

/// it should report a single-frame NaN exactly once as an error
#[test]
fn nan_rotation_is_an_error() {
    let (mut rig, calib) = calibrated("reference");
    let result = validate_motion(&GlitchAt { frame: 10 }, &mut rig, &calib, &options());

    assert!(!result.valid);
    assert_eq!(result.count(ViolationKind::NanRotation), 1);
    assert_eq!(result.errors().count(), 1);
    assert_eq!(result.stats.errors, 1);
    assert_eq!(result.stats.frames, 60);

    let violation = result.worst(ViolationKind::NanRotation).unwrap();
    assert_eq!(violation.frame, 10);
    assert_eq!(violation.bone, Some(HumanBone::Spine));
    assert_eq!(violation.severity, Severity::Error);
    assert_relative_eq!(violation.time, 10.0 / 60.0, epsilon = 1e-5);
}

/// it should warn about quaternion drift without failing the motion
#[test]
fn denormalized_rotation_is_a_warning() {
    let (mut rig, calib) = calibrated("reference");
    let result = validate_motion(&Drift::every_frame(1.01), &mut rig, &calib, &options());

    assert!(result.valid);
    assert_eq!(result.count(ViolationKind::DenormalizedRotation), 60);
    assert_eq!(result.warnings().count(), 60);
    let worst = result.worst(ViolationKind::DenormalizedRotation).unwrap();
    assert_eq!(worst.bone, Some(HumanBone::Chest));
    assert_eq!(worst.severity, Severity::Warning);
    assert_relative_eq!(worst.magnitude, 0.01, epsilon = 1e-4);
}

/// it should flag an elbow bent past its stop with the excess as magnitude
#[test]
fn elbow_hyperextension_violates_limit() {
    let (mut rig, calib) = calibrated("reference");
    let motion = Hyperextend { angle: -0.5 };
    let result = validate_motion(&motion, &mut rig, &calib, &options());

    assert!(result.valid);
    assert_eq!(result.count(ViolationKind::JointLimit), 60);
    assert!(result
        .violations
        .iter()
        .all(|v| v.bone == Some(HumanBone::LeftLowerArm)));
    let worst = result.worst(ViolationKind::JointLimit).unwrap();
    assert_relative_eq!(worst.magnitude, 0.5 - 5f32.to_radians(), epsilon = 1e-3);

    // Loosening the elbow through overrides silences it.
    let mut loose = options();
    loose.limit_overrides.set(
        HumanBone::LeftLowerArm,
        procrig_validate_core::JointLimit::degrees((-90.0, 90.0), (-45.0, 150.0), (-10.0, 10.0)),
    );
    let result = validate_motion(&motion, &mut rig, &calib, &loose);
    assert_eq!(result.count(ViolationKind::JointLimit), 0);
}

/// it should stop recording at the violation cap and say so
#[test]
fn violation_cap_truncates() {
    let (mut rig, calib) = calibrated("reference");
    let mut capped = options();
    capped.max_violations = 10;
    let result = validate_motion(&Drift::every_frame(1.01), &mut rig, &calib, &capped);

    assert!(result.truncated);
    assert_eq!(result.violations.len(), 10);
    assert_eq!(result.stats.frames, 10);
}

/// it should not call a replay truncated when the cap fills on its last frame
#[test]
fn cap_filled_on_final_frame_is_not_truncated() {
    let (mut rig, calib) = calibrated("reference");
    let mut capped = options();
    capped.max_violations = 1;
    let motion = Drift {
        scale: 1.01,
        from_frame: 59,
    };
    let result = validate_motion(&motion, &mut rig, &calib, &capped);

    assert_eq!(result.stats.frames, 60);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].frame, 59);
    assert!(!result.truncated);
}

/// it should warn on every frame over budget and keep the timing stats
#[test]
fn slow_frames_are_warnings() {
    let (mut rig, calib) = calibrated("reference");
    let mut strict = options();
    strict.checks.performance = true;
    strict.frame_budget_ms = -1.0;
    let result = validate_motion(&Sway::new(), &mut rig, &calib, &strict);

    assert!(result.valid);
    assert_eq!(result.count(ViolationKind::PerformanceBudget), 60);
    assert!(result
        .violations
        .iter()
        .all(|v| v.severity == Severity::Warning && v.bone.is_none()));

    let timing = result.stats.frame_time;
    assert_eq!(timing.frames, 60);
    assert_eq!(timing.over_budget, 60);
    assert_eq!(timing.budget_ms, -1.0);
    assert!(timing.avg_ms >= 0.0);
    assert!(timing.max_ms >= timing.p95_ms && timing.p95_ms >= 0.0);
}

/// it should report a non-finite hips offset once as an error
#[test]
fn nan_hips_offset_is_an_error() {
    let (mut rig, calib) = calibrated("reference");
    let result = validate_motion(&HipsGlitchAt { frame: 7 }, &mut rig, &calib, &options());

    assert!(!result.valid);
    assert_eq!(result.count(ViolationKind::NanPosition), 1);
    assert_eq!(result.errors().count(), 1);
    let violation = result.worst(ViolationKind::NanPosition).unwrap();
    assert_eq!(violation.frame, 7);
    assert_eq!(violation.bone, Some(HumanBone::Hips));
    assert_eq!(violation.severity, Severity::Error);
}

/// it should honour a custom time step
#[test]
fn time_step_sets_frame_count() {
    let (mut rig, calib) = calibrated("reference");
    let coarse = ValidationOptions {
        time_step: 0.1,
        ..options()
    };
    let result = validate_motion(&Sway::new(), &mut rig, &calib, &coarse);
    assert_eq!(result.stats.frames, 10);
    assert_relative_eq!(result.stats.simulated_time, 1.0, epsilon = 1e-5);
}

/// it should stop at the first error in quick mode
#[test]
fn quick_validate_stops_at_first_error() {
    let (mut rig, calib) = calibrated("reference");
    let result = quick_validate(&GlitchAt { frame: 5 }, &mut rig, &calib);

    assert!(!result.valid);
    assert!(!result.truncated);
    assert_eq!(result.count(ViolationKind::NanRotation), 1);
    assert_eq!(result.stats.frames, 6);
}
