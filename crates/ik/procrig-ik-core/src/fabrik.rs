//! Forward And Backward Reaching IK over a chain of joint positions.

use nalgebra::Vector3;
use procrig_kernel_core::math::vec::{
    project_on_plane, rotate_about_axis, safe_normalize, signed_angle, NORMALIZE_EPSILON,
};
use serde::{Deserialize, Serialize};

use crate::config::IkConfig;

/// Outcome of [`solve_chain`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSolve {
    pub reached: bool,
    /// Distance from the end effector to the target after solving.
    pub error: f32,
    pub iterations: u32,
}

/// Direction from `from` to `to`, or `fallback` when the points coincide.
fn direction(from: &Vector3<f32>, to: &Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    safe_normalize(&(to - from), fallback)
}

/// Solve `joints` so the last one reaches `target` with `joints[0]` fixed.
///
/// `lengths[i]` is the distance between `joints[i]` and `joints[i + 1]`. Segment lengths
/// are preserved whether or not the target is reachable; an unreachable target leaves
/// the chain stretched straight toward it.
pub fn solve_chain(
    joints: &mut [Vector3<f32>],
    lengths: &[f32],
    target: &Vector3<f32>,
    config: &IkConfig,
) -> ChainSolve {
    let n = joints.len();
    if n < 2 || lengths.len() != n - 1 {
        let error = joints.last().map_or(f32::INFINITY, |end| (end - target).norm());
        return ChainSolve {
            reached: false,
            error,
            iterations: 0,
        };
    }

    let root = joints[0];
    let total: f32 = lengths.iter().sum();
    let to_target = target - root;

    if to_target.norm() >= total {
        let fallback = direction(&joints[0], &joints[1], Vector3::y());
        let dir = safe_normalize(&to_target, fallback);
        for i in 1..n {
            joints[i] = joints[i - 1] + dir * lengths[i - 1];
        }
        let error = (joints[n - 1] - target).norm();
        return ChainSolve {
            reached: error <= config.tolerance,
            error,
            iterations: 0,
        };
    }

    let mut iterations = 0;
    let mut error = (joints[n - 1] - target).norm();
    while error > config.tolerance && iterations < config.max_iterations {
        // Forward: pin the end effector on the target and pull toward the root.
        joints[n - 1] = *target;
        for i in (0..n - 1).rev() {
            let dir = direction(&joints[i + 1], &joints[i], -Vector3::y());
            joints[i] = joints[i + 1] + dir * lengths[i];
        }
        // Backward: pin the root and push out again.
        joints[0] = root;
        for i in 0..n - 1 {
            let dir = direction(&joints[i], &joints[i + 1], Vector3::y());
            joints[i + 1] = joints[i] + dir * lengths[i];
        }
        iterations += 1;
        error = (joints[n - 1] - target).norm();
    }

    ChainSolve {
        reached: error <= config.tolerance,
        error,
        iterations,
    }
}

/// Swing the interior joints about the root→end axis so the first interior joint points
/// toward `pole` (a direction). Root and end lie on the axis, so the rotation is rigid and
/// every segment keeps its length.
///
/// Returns the applied angle in radians, or `None` when the geometry is degenerate
/// (pole parallel to the axis, straight chain, fewer than three joints).
pub fn apply_pole(joints: &mut [Vector3<f32>], pole: &Vector3<f32>) -> Option<f32> {
    let n = joints.len();
    if n < 3 {
        return None;
    }
    let root = joints[0];
    let axis = (joints[n - 1] - root).try_normalize(NORMALIZE_EPSILON)?;

    let bend = project_on_plane(&(joints[1] - root), &axis);
    let wanted = project_on_plane(pole, &axis);
    if bend.norm() <= NORMALIZE_EPSILON || wanted.norm() <= NORMALIZE_EPSILON {
        return None;
    }

    let angle = signed_angle(&bend, &wanted, &axis);
    for joint in joints.iter_mut().take(n - 1).skip(1) {
        *joint = root + rotate_about_axis(&(*joint - root), &axis, angle);
    }
    Some(angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn arm() -> (Vec<Vector3<f32>>, Vec<f32>) {
        (
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(0.3, 0.0, 0.0),
                Vector3::new(0.55, 0.0, 0.0),
                Vector3::new(0.7, 0.0, 0.0),
            ],
            vec![0.3, 0.25, 0.15],
        )
    }

    fn segment_lengths(joints: &[Vector3<f32>]) -> Vec<f32> {
        joints.windows(2).map(|w| (w[1] - w[0]).norm()).collect()
    }

    /// it should keep every segment length whether or not the target is reachable
    #[test]
    fn preserves_segment_lengths() {
        let targets = [
            Vector3::new(0.2, 0.3, 0.2),
            Vector3::new(0.0, -0.4, 0.3),
            Vector3::new(3.0, 1.0, 0.0),
            Vector3::new(0.05, 0.05, 0.0),
        ];
        for target in targets {
            let (mut joints, lengths) = arm();
            solve_chain(&mut joints, &lengths, &target, &IkConfig::default());
            for (got, want) in segment_lengths(&joints).iter().zip(&lengths) {
                assert_relative_eq!(got, want, epsilon = 1e-4);
            }
            assert_eq!(joints[0], Vector3::zeros());
        }
    }

    #[test]
    fn reachable_target_converges() {
        let (mut joints, lengths) = arm();
        let target = Vector3::new(0.2, 0.35, 0.15);
        let result = solve_chain(&mut joints, &lengths, &target, &IkConfig::default());
        assert!(result.reached);
        assert!(result.error <= 0.01);
        assert!(result.iterations >= 1 && result.iterations <= 10);
    }

    #[test]
    fn unreachable_target_stretches_toward_it() {
        let (mut joints, lengths) = arm();
        let target = Vector3::new(0.0, 2.0, 0.0);
        let result = solve_chain(&mut joints, &lengths, &target, &IkConfig::default());
        assert!(!result.reached);
        assert_relative_eq!(result.error, 2.0 - 0.7, epsilon = 1e-5);
        assert_relative_eq!(joints[3], Vector3::new(0.0, 0.7, 0.0), epsilon = 1e-5);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn malformed_chain_is_unreached() {
        let mut joints = vec![Vector3::zeros()];
        let result = solve_chain(&mut joints, &[], &Vector3::x(), &IkConfig::default());
        assert!(!result.reached);
        let (mut joints, _) = arm();
        let result = solve_chain(&mut joints, &[0.3], &Vector3::x(), &IkConfig::default());
        assert!(!result.reached);
    }

    #[test]
    fn pole_swings_elbow_toward_direction() {
        let mut joints = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.2, 0.2, 0.0),
            Vector3::new(0.4, 0.0, 0.0),
            Vector3::new(0.5, 0.0, 0.0),
        ];
        let lengths = segment_lengths(&joints);
        let end = joints[3];
        let angle = apply_pole(&mut joints, &-Vector3::z()).unwrap();
        assert_relative_eq!(angle.abs(), std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
        // Elbow now bends toward -Z, off the root→end axis.
        assert!(joints[1].z < -0.19);
        assert_relative_eq!(joints[1].y, 0.0, epsilon = 1e-5);
        assert_eq!(joints[0], Vector3::zeros());
        assert_eq!(joints[3], end);
        for (got, want) in segment_lengths(&joints).iter().zip(&lengths) {
            assert_relative_eq!(got, want, epsilon = 1e-5);
        }
    }

    #[test]
    fn pole_along_axis_is_ignored() {
        let (mut joints, _) = arm();
        assert_eq!(apply_pole(&mut joints, &Vector3::x()), None);
        // Straight chain has no bend plane to swing.
        assert_eq!(apply_pole(&mut joints, &Vector3::z()), None);
    }
}
