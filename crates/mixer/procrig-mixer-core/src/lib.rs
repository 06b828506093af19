//! procrig-mixer-core: layered pose blending.
//!
//! Layers hold a [`Pose`](procrig_rig_core::Pose), a weight that fades toward a target
//! each [`AnimationMixer::update`], a blend mode, an optional bone mask and a priority.
//! [`AnimationMixer::blended_pose`] folds them together in priority order.

pub mod config;
pub mod layer;
pub mod mixer;

pub use config::MixerConfig;
pub use layer::{AnimationLayer, BlendMode, LayerDesc};
pub use mixer::AnimationMixer;
