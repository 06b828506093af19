//! Quaternion helpers.
//!
//! Producers are expected to renormalize proactively: every helper that composes or
//! interpolates returns a renormalized quaternion. Nothing here repairs NaN; a
//! corrupted input stays corrupted so that validation can see it.

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

use super::vec::{any_perpendicular, NORMALIZE_EPSILON};

/// A bone rotation. Expected to be unit length within tolerance.
pub type Rotation = UnitQuaternion<f32>;

/// Above this |dot| two rotations are close enough to interpolate linearly.
const DOT_THRESHOLD: f32 = 0.9995;

#[inline]
pub fn identity() -> Rotation {
    UnitQuaternion::identity()
}

/// Normalize a raw quaternion. A zero quaternion becomes identity; NaN stays NaN.
#[inline]
pub fn normalize_quat(q: Quaternion<f32>) -> Rotation {
    let len2 = q.norm_squared();
    if len2 == 0.0 {
        return identity();
    }
    UnitQuaternion::new_unchecked(q / len2.sqrt())
}

/// Renormalize a rotation that may have drifted.
#[inline]
pub fn renormalize(q: &Rotation) -> Rotation {
    normalize_quat(*q.quaternion())
}

/// Build a rotation from raw `(x, y, z, w)` components without normalizing.
#[inline]
pub fn from_xyzw_unchecked(x: f32, y: f32, z: f32, w: f32) -> Rotation {
    UnitQuaternion::new_unchecked(Quaternion::new(w, x, y, z))
}

/// `(x, y, z, w)` components.
#[inline]
pub fn to_xyzw(q: &Rotation) -> [f32; 4] {
    [q.i, q.j, q.k, q.w]
}

/// Renormalized product `a ∘ b`.
#[inline]
pub fn compose(a: &Rotation, b: &Rotation) -> Rotation {
    renormalize(&(a * b))
}

/// Spherical linear interpolation along the shortest arc.
pub fn slerp(a: &Rotation, b: &Rotation, t: f32) -> Rotation {
    let qa = a.coords;
    let mut qb = b.coords;

    let mut dot = qa.dot(&qb);

    // Flip one end so slerp takes the short path.
    if dot < 0.0 {
        qb = -qb;
        dot = -dot;
    }

    if dot > DOT_THRESHOLD {
        return normalize_quat(Quaternion::from_vector(qa.lerp(&qb, t)));
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();

    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;

    normalize_quat(Quaternion::from_vector(qa * s0 + qb * s1))
}

/// Normalized linear interpolation along the shortest arc.
pub fn nlerp(a: &Rotation, b: &Rotation, t: f32) -> Rotation {
    let qa = a.coords;
    let mut qb = b.coords;
    if qa.dot(&qb) < 0.0 {
        qb = -qb;
    }
    normalize_quat(Quaternion::from_vector(qa.lerp(&qb, t)))
}

/// Rotation of `angle` radians about `axis`. A zero axis yields identity.
pub fn axis_angle(axis: &Vector3<f32>, angle: f32) -> Rotation {
    match Unit::try_new(*axis, NORMALIZE_EPSILON) {
        Some(unit) => UnitQuaternion::from_axis_angle(&unit, angle),
        None => identity(),
    }
}

/// Rotation from Euler angles in degrees (roll about X, pitch about Y, yaw about Z).
pub fn from_euler_deg(x: f32, y: f32, z: f32) -> Rotation {
    UnitQuaternion::from_euler_angles(x.to_radians(), y.to_radians(), z.to_radians())
}

/// Shortest rotation taking direction `from` onto direction `to`.
///
/// Anti-parallel inputs rotate half a turn about an arbitrary perpendicular axis.
/// Zero-length inputs yield identity.
pub fn rotation_between(from: &Vector3<f32>, to: &Vector3<f32>) -> Rotation {
    let (Some(f), Some(t)) = (
        from.try_normalize(NORMALIZE_EPSILON),
        to.try_normalize(NORMALIZE_EPSILON),
    ) else {
        return identity();
    };
    let d = f.dot(&t);
    if d < -0.999_999 {
        return axis_angle(&any_perpendicular(&f), std::f32::consts::PI);
    }
    normalize_quat(Quaternion::from_parts(1.0 + d, f.cross(&t)))
}

/// True when every component is finite.
#[inline]
pub fn quat_is_finite(q: &Rotation) -> bool {
    q.coords.iter().all(|c| c.is_finite())
}

/// Distance of the quaternion norm from 1.
#[inline]
pub fn norm_error(q: &Rotation) -> f32 {
    (q.quaternion().norm() - 1.0).abs()
}

/// Total rotation angle in `[0, π]`. Clamps |w| before `acos` so rounding never yields NaN.
#[inline]
pub fn rotation_angle(q: &Rotation) -> f32 {
    2.0 * q.w.abs().clamp(0.0, 1.0).acos()
}

/// Scaled-axis (rotation vector) form, canonicalized to the short way round.
pub fn rotation_vector(q: &Rotation) -> Vector3<f32> {
    let sign = if q.w < 0.0 { -1.0 } else { 1.0 };
    let imag = q.imag() * sign;
    match imag.try_normalize(NORMALIZE_EPSILON) {
        Some(axis) => axis * rotation_angle(q),
        None => Vector3::zeros(),
    }
}

/// Angular distance between two rotations in radians.
///
/// Uses the relative rotation's vector part so nearly equal inputs measure close to 0
/// instead of being dominated by `acos` rounding near 1.
#[inline]
pub fn angle_between(a: &Rotation, b: &Rotation) -> f32 {
    let rel = a.quaternion().conjugate() * b.quaternion();
    2.0 * rel.imag().norm().atan2(rel.w.abs())
}
