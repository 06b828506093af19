//! Damped springs integrated with semi-implicit Euler.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Larger steps are clamped so a hitch cannot blow the integration up.
pub const MAX_SPRING_DT: f32 = 0.1;

#[inline]
fn sanitize_gain(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[inline]
fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_SPRING_DT)
    } else {
        0.0
    }
}

/// Scalar spring pulling `value` toward `target` with force `-k(x - target) - c·v`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub value: f32,
    pub velocity: f32,
    pub target: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl Default for Spring {
    fn default() -> Self {
        Self::critically_damped(120.0)
    }
}

impl Spring {
    pub fn new(stiffness: f32, damping: f32) -> Self {
        Self {
            value: 0.0,
            velocity: 0.0,
            target: 0.0,
            stiffness: sanitize_gain(stiffness),
            damping: sanitize_gain(damping),
        }
    }

    /// Damping `c = 2√k`: fastest approach without overshoot.
    pub fn critically_damped(stiffness: f32) -> Self {
        let k = sanitize_gain(stiffness);
        Self::new(k, 2.0 * k.sqrt())
    }

    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump to `value` at rest, with the target following.
    pub fn snap_to(&mut self, value: f32) {
        self.value = value;
        self.target = value;
        self.velocity = 0.0;
    }

    /// Advance by `dt` seconds and return the new value.
    pub fn update(&mut self, dt: f32) -> f32 {
        let dt = sanitize_dt(dt);
        if dt == 0.0 {
            return self.value;
        }
        let displacement = self.value - self.target;
        let acceleration = -self.stiffness * displacement - self.damping * self.velocity;
        self.velocity += acceleration * dt;
        self.value += self.velocity * dt;
        self.value
    }

    pub fn is_settled(&self, epsilon: f32) -> bool {
        (self.value - self.target).abs() <= epsilon && self.velocity.abs() <= epsilon
    }
}

/// Three independent [`Spring`]s sharing gains, exposed as a vector.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Spring3 {
    pub x: Spring,
    pub y: Spring,
    pub z: Spring,
}

impl Spring3 {
    pub fn new(stiffness: f32, damping: f32) -> Self {
        let s = Spring::new(stiffness, damping);
        Self { x: s, y: s, z: s }
    }

    pub fn critically_damped(stiffness: f32) -> Self {
        let s = Spring::critically_damped(stiffness);
        Self { x: s, y: s, z: s }
    }

    pub fn value(&self) -> Vector3<f32> {
        Vector3::new(self.x.value, self.y.value, self.z.value)
    }

    pub fn velocity(&self) -> Vector3<f32> {
        Vector3::new(self.x.velocity, self.y.velocity, self.z.velocity)
    }

    pub fn target(&self) -> Vector3<f32> {
        Vector3::new(self.x.target, self.y.target, self.z.target)
    }

    pub fn set_target(&mut self, target: &Vector3<f32>) {
        self.x.set_target(target.x);
        self.y.set_target(target.y);
        self.z.set_target(target.z);
    }

    pub fn snap_to(&mut self, value: &Vector3<f32>) {
        self.x.snap_to(value.x);
        self.y.snap_to(value.y);
        self.z.snap_to(value.z);
    }

    pub fn update(&mut self, dt: f32) -> Vector3<f32> {
        Vector3::new(self.x.update(dt), self.y.update(dt), self.z.update(dt))
    }

    pub fn is_settled(&self, epsilon: f32) -> bool {
        self.x.is_settled(epsilon) && self.y.is_settled(epsilon) && self.z.is_settled(epsilon)
    }
}
