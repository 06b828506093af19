use nalgebra::Vector3;
use procrig_rig_core::{HumanoidRig, RigCalibration, Side};
use serde::{Deserialize, Serialize};

use crate::config::IkConfig;
use crate::solution::IkSolution;

/// Foot placement request, in model space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegTarget {
    pub position: Vector3<f32>,
    /// Model-space direction the knee should bend toward.
    #[serde(default)]
    pub pole_direction: Option<Vector3<f32>>,
}

impl LegTarget {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            pole_direction: None,
        }
    }
}

/// Placeholder leg solver with the same surface as [`crate::ArmIkSolver`].
///
/// Always reports an unreached solution with no deltas, so applying it is a no-op.
// TODO: foot planting needs ground contact from the probe before this can solve.
#[derive(Clone, Debug, Default)]
pub struct LegIkSolver {
    config: IkConfig,
}

impl LegIkSolver {
    pub fn new(config: IkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IkConfig {
        &self.config
    }

    pub fn solve(
        &self,
        _rig: &dyn HumanoidRig,
        _calibration: &RigCalibration,
        side: Side,
        _target: &LegTarget,
    ) -> IkSolution {
        IkSolution::unreached(side)
    }
}
