use serde::{Deserialize, Serialize};

/// Iteration budget for FABRIK.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IkConfig {
    pub max_iterations: u32,
    /// End-effector distance, in metres, that counts as reached.
    pub tolerance: f32,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 0.01,
        }
    }
}
