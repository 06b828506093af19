//! Live telemetry over a posed rig: landmark kinematics, joint angles, foot contact and a
//! single quality score.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use nalgebra::Vector3;
use procrig_kernel_core::math::curves::clamp01;
use procrig_rig_core::{HumanBone, HumanoidRig, Landmark, LegBones, RigCalibration, Side};
use serde::{Deserialize, Serialize};

use crate::limits::{JointAngles, JointLimits};

/// Relative importance of each quality term.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub joints: f32,
    pub sliding: f32,
    pub hand_spikes: f32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            joints: 0.5,
            sliding: 0.3,
            hand_spikes: 0.2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Landmarks reported in every frame.
    pub landmarks: Vec<Landmark>,
    /// Pairs whose distance is reported in every frame.
    pub distance_pairs: Vec<(Landmark, Landmark)>,
    /// Bones whose swing/twist is reported in every frame.
    pub joints: Vec<HumanBone>,
    pub limits: JointLimits,
    /// Foot height above calibrated ground, in metres, that counts as contact.
    pub contact_height: f32,
    /// Horizontal speed of a planted foot, in m/s, that counts as sliding.
    pub slide_speed: f32,
    /// Hand speed, in m/s, above which motion reads as a spike.
    pub hand_speed_spike: f32,
    /// Total joint-limit excess, in radians, that saturates the joint term.
    pub joint_severity_scale: f32,
    pub weights: QualityWeights,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            landmarks: vec![
                Landmark::Hips,
                Landmark::Head,
                Landmark::HeadTop,
                Landmark::Mouth,
                Landmark::LeftHand,
                Landmark::RightHand,
                Landmark::LeftFoot,
                Landmark::RightFoot,
            ],
            distance_pairs: vec![
                (Landmark::LeftHand, Landmark::RightHand),
                (Landmark::LeftHand, Landmark::Mouth),
                (Landmark::RightHand, Landmark::Mouth),
                (Landmark::LeftFoot, Landmark::RightFoot),
            ],
            joints: vec![
                HumanBone::Neck,
                HumanBone::Head,
                HumanBone::LeftUpperArm,
                HumanBone::RightUpperArm,
                HumanBone::LeftLowerArm,
                HumanBone::RightLowerArm,
                HumanBone::LeftUpperLeg,
                HumanBone::RightUpperLeg,
                HumanBone::LeftLowerLeg,
                HumanBone::RightLowerLeg,
            ],
            limits: JointLimits::humanoid_defaults(),
            contact_height: 0.03,
            slide_speed: 0.1,
            hand_speed_spike: 3.0,
            joint_severity_scale: 0.5,
            weights: QualityWeights::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSample {
    pub landmark: Landmark,
    pub position: Vector3<f32>,
    /// Finite difference against the previous frame; zero on the first frame.
    pub velocity: Vector3<f32>,
}

impl LandmarkSample {
    pub fn speed(&self) -> f32 {
        self.velocity.norm()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceSample {
    pub a: Landmark,
    pub b: Landmark,
    pub distance: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub bone: HumanBone,
    pub angles: JointAngles,
    /// Radians beyond the configured limit; 0 when inside or unlimited.
    pub violation: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FootSample {
    pub side: Side,
    /// Height of the lower of ankle and toes above calibrated ground.
    pub height: f32,
    pub horizontal_speed: f32,
    pub contact: bool,
    pub sliding: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// 1 is clean; 0 is as bad as every term allows.
    pub score: f32,
    pub joint_severity: f32,
    pub sliding_severity: f32,
    pub spike_severity: f32,
}

/// Everything the probe measured at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseProbeFrame {
    pub time: f32,
    pub dt: f32,
    pub landmarks: Vec<LandmarkSample>,
    pub distances: Vec<DistanceSample>,
    pub joints: Vec<JointSample>,
    pub feet: Vec<FootSample>,
    pub quality: QualityScore,
}

impl PoseProbeFrame {
    pub fn landmark(&self, landmark: Landmark) -> Option<&LandmarkSample> {
        self.landmarks.iter().find(|s| s.landmark == landmark)
    }

    pub fn joint(&self, bone: HumanBone) -> Option<&JointSample> {
        self.joints.iter().find(|s| s.bone == bone)
    }

    pub fn foot(&self, side: Side) -> Option<&FootSample> {
        self.feet.iter().find(|s| s.side == side)
    }
}

/// Samples a rig frame by frame, remembering the previous frame for velocities.
#[derive(Clone, Debug, Default)]
pub struct PoseProbe {
    config: ProbeConfig,
    previous: BTreeMap<Landmark, Vector3<f32>>,
}

impl PoseProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            previous: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Forget the previous frame; the next sample reports zero velocities.
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    pub fn position(
        &self,
        rig: &dyn HumanoidRig,
        calibration: &RigCalibration,
        landmark: Landmark,
    ) -> Option<Vector3<f32>> {
        calibration.landmark_position(rig, landmark)
    }

    pub fn distance(
        &self,
        rig: &dyn HumanoidRig,
        calibration: &RigCalibration,
        a: Landmark,
        b: Landmark,
    ) -> Option<f32> {
        let pa = calibration.landmark_position(rig, a)?;
        let pb = calibration.landmark_position(rig, b)?;
        Some((pa - pb).norm())
    }

    pub fn joint_angle(
        &self,
        rig: &dyn HumanoidRig,
        calibration: &RigCalibration,
        bone: HumanBone,
    ) -> Option<JointSample> {
        let angles = JointAngles::measure(rig, calibration, bone)?;
        let violation = self
            .config
            .limits
            .get(bone)
            .map_or(0.0, |limit| limit.violation(&angles));
        Some(JointSample {
            bone,
            angles,
            violation,
        })
    }

    /// Measure the rig at time `t`, `dt` seconds after the previous sample.
    pub fn sample(
        &mut self,
        rig: &dyn HumanoidRig,
        calibration: &RigCalibration,
        t: f32,
        dt: f32,
    ) -> PoseProbeFrame {
        let mut tracked: Vec<Landmark> = self.config.landmarks.clone();
        for extra in [
            Landmark::LeftHand,
            Landmark::RightHand,
            Landmark::LeftFoot,
            Landmark::RightFoot,
        ] {
            if !tracked.contains(&extra) {
                tracked.push(extra);
            }
        }

        let mut current = BTreeMap::new();
        let mut samples = BTreeMap::new();
        for landmark in tracked {
            let Some(position) = calibration.landmark_position(rig, landmark) else {
                continue;
            };
            let velocity = match self.previous.get(&landmark) {
                Some(prev) if dt > 0.0 && dt.is_finite() => (position - prev) / dt,
                _ => Vector3::zeros(),
            };
            current.insert(landmark, position);
            samples.insert(
                landmark,
                LandmarkSample {
                    landmark,
                    position,
                    velocity,
                },
            );
        }

        let distances = self
            .config
            .distance_pairs
            .iter()
            .filter_map(|&(a, b)| {
                let pa = current.get(&a)?;
                let pb = match current.get(&b) {
                    Some(p) => *p,
                    None => calibration.landmark_position(rig, b)?,
                };
                Some(DistanceSample {
                    a,
                    b,
                    distance: (pa - pb).norm(),
                })
            })
            .collect();

        let joints: Vec<JointSample> = self
            .config
            .joints
            .iter()
            .filter_map(|&bone| self.joint_angle(rig, calibration, bone))
            .collect();

        let basis = calibration.basis();
        let ground = calibration.scale().ground_height;
        let feet: Vec<FootSample> = Side::BOTH
            .iter()
            .filter_map(|&side| {
                let sample = samples.get(&Landmark::foot(side))?;
                let lowest = rig
                    .world_position(LegBones::of(side).toes)
                    .map_or(sample.position, |toes| {
                        if basis.elevation(&toes) < basis.elevation(&sample.position) {
                            toes
                        } else {
                            sample.position
                        }
                    });
                let height = basis.elevation(&lowest) - ground;
                let vertical = basis.up * sample.velocity.dot(&basis.up);
                let horizontal_speed = (sample.velocity - vertical).norm();
                let contact = height <= self.config.contact_height;
                Some(FootSample {
                    side,
                    height,
                    horizontal_speed,
                    contact,
                    sliding: contact && horizontal_speed > self.config.slide_speed,
                })
            })
            .collect();

        let hand_speed = Side::BOTH
            .iter()
            .filter_map(|&side| samples.get(&Landmark::hand(side)))
            .map(LandmarkSample::speed)
            .fold(0.0, f32::max);
        let quality = self.score(&joints, &feet, hand_speed);

        let landmarks = self
            .config
            .landmarks
            .iter()
            .filter_map(|l| samples.get(l).copied())
            .collect();
        self.previous = current;

        PoseProbeFrame {
            time: t,
            dt,
            landmarks,
            distances,
            joints,
            feet,
            quality,
        }
    }

    fn score(&self, joints: &[JointSample], feet: &[FootSample], hand_speed: f32) -> QualityScore {
        let cfg = &self.config;
        let excess: f32 = joints.iter().map(|j| j.violation).sum();
        let joint_severity = if cfg.joint_severity_scale > 0.0 {
            clamp01(excess / cfg.joint_severity_scale)
        } else {
            0.0
        };

        let sliding_severity = if cfg.slide_speed > 0.0 {
            feet.iter()
                .filter(|f| f.sliding)
                .map(|f| clamp01((f.horizontal_speed - cfg.slide_speed) / cfg.slide_speed))
                .fold(0.0, f32::max)
        } else {
            0.0
        };

        let spike_severity = if cfg.hand_speed_spike > 0.0 {
            clamp01((hand_speed - cfg.hand_speed_spike) / cfg.hand_speed_spike)
        } else {
            0.0
        };

        let w = cfg.weights;
        let total = w.joints + w.sliding + w.hand_spikes;
        let penalty = if total > 0.0 {
            (w.joints * joint_severity
                + w.sliding * sliding_severity
                + w.hand_spikes * spike_severity)
                / total
        } else {
            0.0
        };

        QualityScore {
            score: clamp01(1.0 - penalty),
            joint_severity,
            sliding_severity,
            spike_severity,
        }
    }
}

/// Short human-readable digest of `frame`, at most `max_lines` lines.
pub fn format_compact(frame: &PoseProbeFrame, max_lines: usize) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "t={:.3}s quality={:.2} (joints {:.2}, sliding {:.2}, spikes {:.2})",
        frame.time,
        frame.quality.score,
        frame.quality.joint_severity,
        frame.quality.sliding_severity,
        frame.quality.spike_severity
    ));
    for s in &frame.landmarks {
        let p = s.position;
        lines.push(format!(
            "{} ({:.3}, {:.3}, {:.3}) v={:.2}",
            s.landmark,
            p.x,
            p.y,
            p.z,
            s.speed()
        ));
    }
    for d in &frame.distances {
        lines.push(format!("{}..{} {:.3}", d.a, d.b, d.distance));
    }
    for f in &frame.feet {
        let mut line = format!(
            "{}_foot h={:.3}",
            if f.side == Side::Left { "left" } else { "right" },
            f.height
        );
        if f.contact {
            line.push_str(" contact");
        }
        if f.sliding {
            let _ = write!(line, " sliding {:.2}m/s", f.horizontal_speed);
        }
        lines.push(line);
    }
    for j in frame.joints.iter().filter(|j| j.violation > 0.0) {
        lines.push(format!(
            "{} over limit by {:.1}° (twist {:.1}°, swing {:.1}°/{:.1}°)",
            j.bone,
            j.violation.to_degrees(),
            j.angles.twist.to_degrees(),
            j.angles.swing_primary.to_degrees(),
            j.angles.swing_secondary.to_degrees()
        ));
    }
    lines.truncate(max_lines);
    lines.join("\n")
}
