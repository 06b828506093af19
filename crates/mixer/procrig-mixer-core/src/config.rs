use serde::{Deserialize, Serialize};

/// Mixer-wide defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Weight units per second for layers that do not set their own fade speed.
    pub default_fade_speed: f32,
    /// Weights at or below this count as silent.
    pub silence_threshold: f32,
    /// Drop layers that have faded out to silence at the end of every `update`.
    pub auto_prune: bool,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            default_fade_speed: 4.0,
            silence_threshold: 1e-4,
            auto_prune: false,
        }
    }
}
