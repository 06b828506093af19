//! Vector helpers on top of `nalgebra::Vector3<f32>`.

use nalgebra::Vector3;

/// Below this length a vector is treated as zero when normalizing.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Linear interpolation between two points.
#[inline]
pub fn lerp_vec3(a: &Vector3<f32>, b: &Vector3<f32>, t: f32) -> Vector3<f32> {
    a + (b - a) * t
}

/// Normalize `v`, or return `fallback` when `v` is (near) zero.
#[inline]
pub fn safe_normalize(v: &Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    v.try_normalize(NORMALIZE_EPSILON).unwrap_or(fallback)
}

/// Remove the component of `v` along the unit `normal`.
#[inline]
pub fn project_on_plane(v: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    v - normal * v.dot(normal)
}

/// Angle from `from` to `to` in radians, signed by the handedness around `axis`.
///
/// Inputs need not be normalized. Returns 0 when either vector is zero.
pub fn signed_angle(from: &Vector3<f32>, to: &Vector3<f32>, axis: &Vector3<f32>) -> f32 {
    let cross = from.cross(to);
    let angle = cross.norm().atan2(from.dot(to));
    if cross.dot(axis) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Rodrigues' rotation of `v` around the unit `axis` by `angle` radians.
pub fn rotate_about_axis(v: &Vector3<f32>, axis: &Vector3<f32>, angle: f32) -> Vector3<f32> {
    let (sin, cos) = angle.sin_cos();
    v * cos + axis.cross(v) * sin + axis * (axis.dot(v) * (1.0 - cos))
}

/// Some unit vector perpendicular to `v`. Deterministic for a given input.
pub fn any_perpendicular(v: &Vector3<f32>) -> Vector3<f32> {
    let reference = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    safe_normalize(&v.cross(&reference), Vector3::z())
}

#[inline]
pub fn is_finite_vec3(v: &Vector3<f32>) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Component-wise clamp into `[-limit, limit]`.
#[inline]
pub fn clamp_abs(v: &Vector3<f32>, limit: f32) -> Vector3<f32> {
    v.map(|c| c.clamp(-limit, limit))
}
