//! Contract between procedural motion content and the frame loop.
//!
//! A motion is constructed, then initialized against a calibrated rig to produce its
//! state, then updated every frame with that state. `update` cannot be called without a
//! state value, so there is no "forgot to initialize" path at runtime.

use crate::calibration::RigCalibration;
use crate::rig::HumanoidRig;

/// Per-frame inputs handed to [`MotionProgram::update`].
#[derive(Copy, Clone, Debug)]
pub struct MotionContext<'a> {
    /// Seconds since the motion started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
    pub calibration: &'a RigCalibration,
}

impl<'a> MotionContext<'a> {
    pub fn new(time: f32, dt: f32, calibration: &'a RigCalibration) -> Self {
        Self {
            time,
            dt,
            calibration,
        }
    }
}

/// A procedural animation driven one frame at a time.
///
/// All mutable generator state (springs, noise phases, small state machines) lives in
/// `State`, owned by the caller and threaded through every update.
pub trait MotionProgram {
    type State;

    fn name(&self) -> &str;

    fn init(&self, rig: &dyn HumanoidRig, calibration: &RigCalibration) -> Self::State;

    fn update(&self, state: &mut Self::State, rig: &mut dyn HumanoidRig, ctx: &MotionContext<'_>);
}
