//! Math kernel: vectors, quaternions, scalar curves and swing-twist decomposition.
//!
//! Conventions used across the workspace:
//! - f32 everywhere.
//! - Humanoid space is right-handed, +Y up, character faces +Z, so the character's
//!   left side is +X.
//! - Local rotation deltas are post-multiplied: `final = rest ∘ delta`.

pub mod curves;
pub mod quat;
pub mod swing_twist;
pub mod vec;
