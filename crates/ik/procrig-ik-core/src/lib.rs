//! procrig-ik-core: position-based IK on calibrated humanoid rigs.
//!
//! [`fabrik::solve_chain`] works on bare joint positions. [`ArmIkSolver`] wraps it for a
//! rig: it reads the arm's current joints, solves, applies an optional pole vector and
//! converts the result into rest-relative local deltas ready for
//! [`HumanoidRig::set_rotation_rel`](procrig_rig_core::HumanoidRig::set_rotation_rel).

pub mod arm;
pub mod config;
pub mod fabrik;
pub mod leg;
pub mod solution;

pub use arm::{ArmIkSolver, ArmTarget};
pub use config::IkConfig;
pub use fabrik::{apply_pole, solve_chain, ChainSolve};
pub use leg::{LegIkSolver, LegTarget};
pub use solution::IkSolution;
