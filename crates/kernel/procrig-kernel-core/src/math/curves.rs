//! Scalar curves: interpolation, easing and oscillators.
//!
//! Oscillators take time in seconds and a frequency in Hz, and return values in
//! `[-1, 1]` unless documented otherwise.

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse of [`lerp`]. Returns 0 for an empty range.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Map `value` from `[in_min, in_max]` to `[out_min, out_max]` without clamping.
#[inline]
pub fn remap(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    lerp(out_min, out_max, inverse_lerp(in_min, in_max, value))
}

#[inline]
pub fn clamp01(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Hermite smoothstep between two edges.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp01(inverse_lerp(edge0, edge1, x));
    t * t * (3.0 - 2.0 * t)
}

/// Perlin's quintic smootherstep between two edges.
#[inline]
pub fn smootherstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp01(inverse_lerp(edge0, edge1, x));
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Step `current` toward `target` by at most `max_delta`, landing exactly on it.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

/// Frame-rate independent exponential approach toward `target`.
#[inline]
pub fn damp(current: f32, target: f32, lambda: f32, dt: f32) -> f32 {
    lerp(current, target, 1.0 - (-lambda * dt).exp())
}

/// Named easing curves over normalized time `t ∈ [0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    SineIn,
    SineOut,
    SineInOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    BackIn,
    BackOut,
    BackInOut,
    ElasticOut,
    BounceOut,
}

impl Easing {
    /// Evaluate the curve. Input is clamped to `[0, 1]`; Back and Elastic may overshoot.
    pub fn apply(self, t: f32) -> f32 {
        let t = clamp01(t);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
                }
            }
            Easing::SineIn => 1.0 - (t * PI * 0.5).cos(),
            Easing::SineOut => (t * PI * 0.5).sin(),
            Easing::SineInOut => -((PI * t).cos() - 1.0) * 0.5,
            Easing::ExpoIn => {
                if t == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Easing::ExpoOut => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Easing::ExpoInOut => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    2f32.powf(20.0 * t - 10.0) * 0.5
                } else {
                    (2.0 - 2f32.powf(-20.0 * t + 10.0)) * 0.5
                }
            }
            Easing::BackIn => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                C3 * t * t * t - C1 * t * t
            }
            Easing::BackOut => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
            Easing::BackInOut => {
                const C2: f32 = 1.70158 * 1.525;
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((C2 + 1.0) * 2.0 * t - C2)) * 0.5
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((C2 + 1.0) * (t * 2.0 - 2.0) + C2) + 2.0) * 0.5
                }
            }
            Easing::ElasticOut => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let c4 = TAU / 3.0;
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Easing::BounceOut => bounce_out(t),
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

#[inline]
pub fn sine_wave(t: f32, frequency: f32, phase: f32) -> f32 {
    (TAU * frequency * t + phase).sin()
}

#[inline]
pub fn cosine_wave(t: f32, frequency: f32, phase: f32) -> f32 {
    (TAU * frequency * t + phase).cos()
}

/// Fractional part of `t * frequency`, always in `[0, 1)`.
#[inline]
fn cycle(t: f32, frequency: f32) -> f32 {
    (t * frequency).rem_euclid(1.0)
}

#[inline]
pub fn triangle_wave(t: f32, frequency: f32) -> f32 {
    let p = cycle(t, frequency);
    1.0 - 4.0 * (p - 0.5).abs()
}

#[inline]
pub fn square_wave(t: f32, frequency: f32) -> f32 {
    if cycle(t, frequency) < 0.5 {
        1.0
    } else {
        -1.0
    }
}

#[inline]
pub fn sawtooth_wave(t: f32, frequency: f32) -> f32 {
    2.0 * cycle(t, frequency) - 1.0
}

/// 1 during the first `duty` fraction of each period, 0 otherwise.
#[inline]
pub fn pulse(t: f32, period: f32, duty: f32) -> f32 {
    if period <= 0.0 {
        return 0.0;
    }
    if (t / period).rem_euclid(1.0) < clamp01(duty) {
        1.0
    } else {
        0.0
    }
}

/// Sine oscillation whose amplitude decays exponentially from 1.
#[inline]
pub fn damped_oscillation(t: f32, frequency: f32, decay: f32) -> f32 {
    (-decay * t.max(0.0)).exp() * sine_wave(t, frequency, 0.0)
}

/// Asymmetric breathing cycle in `[0, 1]`: quicker inhale, slower exhale.
pub fn breathing(t: f32, rate_hz: f32) -> f32 {
    let p = cycle(t, rate_hz);
    const INHALE: f32 = 0.4;
    if p < INHALE {
        Easing::SineInOut.apply(p / INHALE)
    } else {
        1.0 - Easing::SineInOut.apply((p - INHALE) / (1.0 - INHALE))
    }
}
