//! Swing-twist decomposition: `q = swing ∘ twist`, where `twist` rotates about a chosen
//! axis and `swing` is the remainder.
//!
//! Clamping never scales angles of the whole rotation. It rebuilds the offending
//! component from a reduced angle about its own preserved axis so the axis cannot drift.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use super::quat::{axis_angle, compose, identity, renormalize, rotation_angle, Rotation};
use super::vec::{safe_normalize, NORMALIZE_EPSILON};

/// Below this squared length the twist projection is degenerate (a half-turn swing).
const DEGENERATE_TWIST_EPSILON: f32 = 1e-9;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SwingTwist {
    pub swing: Rotation,
    pub twist: Rotation,
}

impl SwingTwist {
    /// Recombine into `swing ∘ twist`.
    #[inline]
    pub fn combine(&self) -> Rotation {
        compose(&self.swing, &self.twist)
    }
}

/// Split `q` into swing and twist about `axis` (normalized internally).
pub fn decompose(q: &Rotation, axis: &Vector3<f32>) -> SwingTwist {
    let axis = safe_normalize(axis, Vector3::y());
    let projection = axis * q.imag().dot(&axis);
    let raw = Quaternion::from_parts(q.w, projection);
    let len2 = raw.norm_squared();

    let twist = if len2 < DEGENERATE_TWIST_EPSILON {
        identity()
    } else {
        let mut t = raw / len2.sqrt();
        // Canonical hemisphere so the angle sign is carried by the vector part alone.
        if t.w < 0.0 {
            t = -t;
        }
        UnitQuaternion::new_unchecked(t)
    };

    let swing = renormalize(&(q * twist.inverse()));
    SwingTwist { swing, twist }
}

/// Signed twist angle about `axis` in `[-π, π]`.
pub fn twist_angle(q: &Rotation, axis: &Vector3<f32>) -> f32 {
    let axis = safe_normalize(axis, Vector3::y());
    let twist = decompose(q, &axis).twist;
    let angle = rotation_angle(&twist);
    if twist.imag().dot(&axis) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Unsigned swing angle away from `axis` in `[0, π]`.
#[inline]
pub fn swing_angle(q: &Rotation, axis: &Vector3<f32>) -> f32 {
    rotation_angle(&decompose(q, axis).swing)
}

/// Limit the twist about `axis` to `[min, max]` radians, keeping the swing.
pub fn clamp_twist(q: &Rotation, axis: &Vector3<f32>, min: f32, max: f32) -> Rotation {
    let axis = safe_normalize(axis, Vector3::y());
    let parts = decompose(q, &axis);
    let angle = twist_angle(q, &axis);
    let clamped = angle.clamp(min, max);
    if clamped == angle {
        return *q;
    }
    compose(&parts.swing, &axis_angle(&axis, clamped))
}

/// Limit the swing away from `axis` to `max` radians, keeping the swing axis and the twist.
pub fn clamp_swing(q: &Rotation, axis: &Vector3<f32>, max: f32) -> Rotation {
    let parts = decompose(q, axis);
    let angle = rotation_angle(&parts.swing);
    if angle <= max {
        return *q;
    }
    let sign = if parts.swing.w < 0.0 { -1.0 } else { 1.0 };
    let Some(swing_axis) = (parts.swing.imag() * sign).try_normalize(NORMALIZE_EPSILON) else {
        return *q;
    };
    compose(&axis_angle(&swing_axis, max.max(0.0)), &parts.twist)
}

/// Apply both [`clamp_swing`] and [`clamp_twist`].
pub fn clamp_swing_twist(
    q: &Rotation,
    axis: &Vector3<f32>,
    max_swing: f32,
    twist_min: f32,
    twist_max: f32,
) -> Rotation {
    let swung = clamp_swing(q, axis, max_swing);
    clamp_twist(&swung, axis, twist_min, twist_max)
}

/// Signed swing components about two axes perpendicular to the twist axis.
///
/// Returns `(about_primary, about_secondary)` in radians, taken from the swing's rotation
/// vector. `primary` is typically a hinge axis; `secondary` completes the frame.
pub fn swing_components(
    swing: &Rotation,
    primary: &Vector3<f32>,
    secondary: &Vector3<f32>,
) -> (f32, f32) {
    let rv = super::quat::rotation_vector(swing);
    (rv.dot(primary), rv.dot(secondary))
}
