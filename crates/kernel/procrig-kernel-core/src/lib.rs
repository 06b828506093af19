//! procrig-kernel-core: leaf primitives shared by every other procrig crate.
//!
//! - [`math`]: vector/quaternion helpers, easing and oscillator curves, swing-twist.
//! - [`noise`]: seeded simplex noise with fractal composites.
//! - [`spring`]: critically-damped style spring integrators.
//!
//! Everything here is pure and frame-synchronous: no hidden global state, no allocation
//! on the per-frame paths.

pub mod math;
pub mod noise;
pub mod spring;

pub use math::curves::Easing;
pub use math::quat::Rotation;
pub use math::swing_twist::SwingTwist;
pub use noise::{NoiseGenerator, Octaves};
pub use spring::{Spring, Spring3};

pub use nalgebra::{Quaternion, UnitQuaternion, Vector3};
