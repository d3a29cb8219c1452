//! Steering actuator step accounting
//!
//! The open-loop stepper reports its absolute position in microsteps whenever it
//! answers a TMCL "move to position" command. Tracking that absolute value makes
//! lost steps detectable, and it survives dropped frames because the position
//! simply holds until the next report.

use serde::{Deserialize, Serialize};

/// TMCL opcode for MVP (move to position); replies carry the absolute position
pub const TMCL_MVP: i64 = 4;

/// Calibration for converting microsteps to steering wheel degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorParams {
    /// Full motor steps per degree of steering wheel rotation
    #[serde(default = "default_actuator_ratio")]
    pub actuator_ratio: f64,
    /// Microsteps per full step
    #[serde(default = "default_position_scaling")]
    pub position_scaling: f64,
}

fn default_actuator_ratio() -> f64 {
    // 200-step motor behind a 25:11 reduction
    200.0 / 360.0 * 25.0 / 11.0
}

fn default_position_scaling() -> f64 {
    256.0
}

impl Default for ActuatorParams {
    fn default() -> Self {
        Self {
            actuator_ratio: default_actuator_ratio(),
            position_scaling: default_position_scaling(),
        }
    }
}

impl ActuatorParams {
    pub fn new(actuator_ratio: f64, position_scaling: f64) -> Self {
        Self {
            actuator_ratio,
            position_scaling,
        }
    }

    /// Microsteps to degrees
    pub fn steps_to_angle(&self, steps: f64) -> f64 {
        steps / self.actuator_ratio / self.position_scaling
    }
}

/// Absolute actuator position with a lag-1 tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepperTracker {
    /// Last reported absolute position (deg)
    pub position: f64,
    /// Position at the end of the previous update (deg)
    pub position_prev: f64,
    /// `position - position_prev` from the latest update (deg)
    pub delta: f64,
}

impl StepperTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one tick of actuator bus data
    ///
    /// Only an MVP reply moves the absolute position; any other opcode leaves it
    /// in place so the delta for that tick is zero.
    pub fn update(&mut self, command: i64, value: f64, params: &ActuatorParams) -> f64 {
        if command == TMCL_MVP {
            self.position = params.steps_to_angle(value);
        }
        self.delta = self.position - self.position_prev;
        self.position_prev = self.position;
        self.delta
    }
}
