//! Deterministic replay of a motion with per-frame correctness checks.
//!
//! The validator never repairs what it finds. Non-finite values are errors; drift,
//! joint-limit excursions and slow frames are warnings carrying a magnitude so they can
//! be ranked.

use std::fmt;

use log::{debug, warn};
use procrig_kernel_core::math::quat::{norm_error, quat_is_finite};
use procrig_kernel_core::math::vec::is_finite_vec3;
use procrig_rig_core::{HumanBone, HumanoidRig, MotionContext, MotionProgram, RigCalibration};
use serde::{Deserialize, Serialize};

use crate::limits::{JointAngles, JointLimits};
use crate::perf::{FrameTimeStats, FrameTimer};

const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;
const FRAME_COUNT_SLACK: f32 = 1e-3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    NanRotation,
    NanPosition,
    DenormalizedRotation,
    JointLimit,
    PerformanceBudget,
}

impl ViolationKind {
    /// Stable snake_case identifier.
    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::NanRotation => "nan_rotation",
            ViolationKind::NanPosition => "nan_position",
            ViolationKind::DenormalizedRotation => "denormalized_rotation",
            ViolationKind::JointLimit => "joint_limit",
            ViolationKind::PerformanceBudget => "performance_budget",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::NanRotation | ViolationKind::NanPosition => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub frame: u32,
    pub time: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bone: Option<HumanBone>,
    /// Kind-specific size: norm error, radians over the limit, milliseconds. Always 1
    /// for non-finite values.
    pub magnitude: f32,
    pub message: String,
}

impl Violation {
    fn new(
        kind: ViolationKind,
        frame: u32,
        time: f32,
        bone: Option<HumanBone>,
        magnitude: f32,
        message: String,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            frame,
            time,
            bone,
            magnitude,
            message,
        }
    }
}

/// Which per-frame checks run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnabledChecks {
    pub nan: bool,
    pub normalization: bool,
    pub joint_limits: bool,
    pub performance: bool,
}

impl Default for EnabledChecks {
    fn default() -> Self {
        Self {
            nan: true,
            normalization: true,
            joint_limits: true,
            performance: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Simulated seconds.
    pub duration: f32,
    /// Fixed simulation step in seconds.
    pub time_step: f32,
    pub checks: EnabledChecks,
    /// Allowed `| |q| - 1 |`.
    pub normalization_tolerance: f32,
    pub frame_budget_ms: f32,
    /// Replay ends once this many violations are recorded.
    pub max_violations: usize,
    pub stop_on_error: bool,
    /// Merged over [`JointLimits::humanoid_defaults`] bone by bone.
    pub limit_overrides: JointLimits,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            duration: 5.0,
            time_step: DEFAULT_TIME_STEP,
            checks: EnabledChecks::default(),
            normalization_tolerance: 1e-3,
            frame_budget_ms: 4.0,
            max_violations: 100,
            stop_on_error: false,
            limit_overrides: JointLimits::new(),
        }
    }
}

impl ValidationOptions {
    /// One second, numeric checks only, stopping at the first error.
    pub fn quick() -> Self {
        Self {
            duration: 1.0,
            checks: EnabledChecks {
                nan: true,
                normalization: true,
                joint_limits: false,
                performance: false,
            },
            stop_on_error: true,
            ..Self::default()
        }
    }

    fn frame_count(&self) -> (u32, f32) {
        let dt = if self.time_step.is_finite() && self.time_step > 0.0 {
            self.time_step
        } else {
            DEFAULT_TIME_STEP
        };
        let frames = if self.duration.is_finite() && self.duration > 0.0 {
            // Absorb f32 rounding so 1 s at 1/60 s is 60 frames, not 61.
            (self.duration / dt - FRAME_COUNT_SLACK).ceil().max(0.0) as u32
        } else {
            0
        };
        (frames, dt)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    /// Frames actually simulated.
    pub frames: u32,
    pub simulated_time: f32,
    pub errors: usize,
    pub warnings: usize,
    pub frame_time: FrameTimeStats,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// False iff an error-severity violation was recorded.
    pub valid: bool,
    /// The replay hit `max_violations` and dropped findings or skipped frames.
    pub truncated: bool,
    pub violations: Vec<Violation>,
    pub stats: ValidationStats,
}

impl ValidationResult {
    pub fn errors(&self) -> impl Iterator<Item = &Violation> + '_ {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> + '_ {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    /// Worst violation of `kind` by magnitude.
    pub fn worst(&self, kind: ViolationKind) -> Option<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.kind == kind)
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
    }
}

/// Collects violations for one replay and enforces the cap.
struct Recorder {
    violations: Vec<Violation>,
    cap: usize,
    truncated: bool,
    saw_error: bool,
}

impl Recorder {
    fn push(&mut self, violation: Violation) {
        if violation.severity == Severity::Error && !self.saw_error {
            warn!(
                "validation: first error at frame {} ({}): {}",
                violation.frame, violation.kind, violation.message
            );
            self.saw_error = true;
        }
        self.violations.push(violation);
    }

    fn is_full(&self) -> bool {
        self.violations.len() >= self.cap
    }
}

/// Reset `rig` to rest, initialize `motion` and replay it at a fixed time step,
/// checking every available bone after each update.
pub fn validate_motion<M: MotionProgram>(
    motion: &M,
    rig: &mut dyn HumanoidRig,
    calibration: &RigCalibration,
    options: &ValidationOptions,
) -> ValidationResult {
    let (frames, dt) = options.frame_count();
    let checks = options.checks;
    let limits = JointLimits::humanoid_defaults().with_overrides(&options.limit_overrides);
    let bones = rig.available_bones();

    rig.reset_to_rest_pose();
    let mut state = motion.init(rig, calibration);
    let mut timer = FrameTimer::new(options.frame_budget_ms);
    let mut recorder = Recorder {
        violations: Vec::new(),
        cap: options.max_violations.max(1),
        truncated: false,
        saw_error: false,
    };

    let mut simulated = 0;
    for frame in 0..frames {
        let time = frame as f32 * dt;
        let ctx = MotionContext::new(time, dt, calibration);
        let ((), ms) = timer.time(|| motion.update(&mut state, &mut *rig, &ctx));
        simulated = frame + 1;

        let mut found = Vec::new();
        for &bone in &bones {
            let Some(q) = rig.rotation(bone) else {
                continue;
            };
            if !quat_is_finite(&q) {
                if checks.nan {
                    found.push(Violation::new(
                        ViolationKind::NanRotation,
                        frame,
                        time,
                        Some(bone),
                        1.0,
                        format!("{bone} rotation is not finite"),
                    ));
                }
                continue;
            }
            if checks.normalization {
                let drift = norm_error(&q);
                if drift > options.normalization_tolerance {
                    found.push(Violation::new(
                        ViolationKind::DenormalizedRotation,
                        frame,
                        time,
                        Some(bone),
                        drift,
                        format!("{bone} quaternion norm off by {drift:.2e}"),
                    ));
                }
            }
            if checks.joint_limits {
                let excess = limits.get(bone).and_then(|limit| {
                    JointAngles::measure(rig, calibration, bone).map(|a| limit.violation(&a))
                });
                if let Some(excess) = excess.filter(|e| *e > 0.0) {
                    found.push(Violation::new(
                        ViolationKind::JointLimit,
                        frame,
                        time,
                        Some(bone),
                        excess,
                        format!("{bone} exceeds its limit by {:.1}°", excess.to_degrees()),
                    ));
                }
            }
        }

        if checks.nan && !is_finite_vec3(&rig.hips_offset()) {
            found.push(Violation::new(
                ViolationKind::NanPosition,
                frame,
                time,
                Some(HumanBone::Hips),
                1.0,
                "hips offset is not finite".to_string(),
            ));
        }

        if checks.performance && ms > options.frame_budget_ms {
            found.push(Violation::new(
                ViolationKind::PerformanceBudget,
                frame,
                time,
                None,
                ms,
                format!("frame took {ms:.2} ms (budget {:.2} ms)", options.frame_budget_ms),
            ));
        }

        let mut frame_error = false;
        let mut pending = found.into_iter();
        for violation in pending.by_ref() {
            frame_error |= violation.severity == Severity::Error;
            recorder.push(violation);
            if recorder.is_full() {
                break;
            }
        }
        let stopping = frame_error && options.stop_on_error;
        if recorder.is_full() {
            // Only a cut replay counts as truncated: dropped findings or unplayed frames.
            recorder.truncated = pending.next().is_some() || (frame + 1 < frames && !stopping);
            break;
        }
        if stopping {
            break;
        }
    }

    let errors = recorder
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .count();
    let stats = ValidationStats {
        frames: simulated,
        simulated_time: simulated as f32 * dt,
        errors,
        warnings: recorder.violations.len() - errors,
        frame_time: timer.stats(),
    };
    debug!(
        "validated '{}': {} frames, {} errors, {} warnings{}",
        motion.name(),
        stats.frames,
        stats.errors,
        stats.warnings,
        if recorder.truncated { " (truncated)" } else { "" }
    );

    ValidationResult {
        valid: errors == 0,
        truncated: recorder.truncated,
        violations: recorder.violations,
        stats,
    }
}

/// [`validate_motion`] with [`ValidationOptions::quick`].
pub fn quick_validate<M: MotionProgram>(
    motion: &M,
    rig: &mut dyn HumanoidRig,
    calibration: &RigCalibration,
) -> ValidationResult {
    validate_motion(motion, rig, calibration, &ValidationOptions::quick())
}
