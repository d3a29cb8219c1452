//! Fusion configuration types
//!
//! Tunables of the fusion core that are not tied to a vehicle model. The stored
//! metric/imperial preference is not part of this: the caller reads it from its
//! own persistence and passes it at construction.

use crate::stepper::ActuatorParams;
use crate::types::{FusionError, Result};
use crate::units::DEFAULT_UNIT_MATCH_TOLERANCE;
use serde::{Deserialize, Serialize};

/// Configuration for the fusion core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Infer metric/imperial from the cruise setpoint vs. current speed
    #[serde(default)]
    pub unit_auto_detect: bool,

    /// With auto-detection off, treat the setpoint as km/h regardless of the
    /// stored preference
    #[serde(default = "default_true")]
    pub force_metric: bool,

    /// Allowed distance between setpoint/speed ratio and a unit factor
    #[serde(default = "default_unit_match_tolerance")]
    pub unit_match_tolerance: f64,

    /// Raw speed (m/s) at or below which the car counts as standing still
    #[serde(default = "default_standstill_threshold")]
    pub standstill_threshold: f64,

    /// Steering actuator calibration
    #[serde(default)]
    pub actuator: ActuatorParams,
}

fn default_true() -> bool {
    true
}

fn default_unit_match_tolerance() -> f64 {
    DEFAULT_UNIT_MATCH_TOLERANCE
}

fn default_standstill_threshold() -> f64 {
    0.001
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            unit_auto_detect: false,
            force_metric: true,
            unit_match_tolerance: default_unit_match_tolerance(),
            standstill_threshold: default_standstill_threshold(),
            actuator: ActuatorParams::default(),
        }
    }
}

impl FusionConfig {
    /// Create a new fusion configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable cruise unit auto-detection
    pub fn with_unit_auto_detect(mut self, enabled: bool) -> Self {
        self.unit_auto_detect = enabled;
        self
    }

    /// Builder method: force metric units when auto-detection is off
    pub fn with_force_metric(mut self, enabled: bool) -> Self {
        self.force_metric = enabled;
        self
    }

    /// Builder method: set the unit match tolerance
    pub fn with_unit_match_tolerance(mut self, tolerance: f64) -> Self {
        self.unit_match_tolerance = tolerance;
        self
    }

    /// Builder method: set actuator calibration
    pub fn with_actuator(mut self, actuator: ActuatorParams) -> Self {
        self.actuator = actuator;
        self
    }

    /// Reject values that would make the update produce NaN or nonsense
    pub fn validate(&self) -> Result<()> {
        if !(self.unit_match_tolerance > 0.0) {
            return Err(FusionError::InvalidConfig(format!(
                "unit_match_tolerance must be positive, got {}",
                self.unit_match_tolerance
            )));
        }
        if !(self.standstill_threshold >= 0.0) {
            return Err(FusionError::InvalidConfig(format!(
                "standstill_threshold must not be negative, got {}",
                self.standstill_threshold
            )));
        }
        if !(self.actuator.actuator_ratio.abs() > 0.0) || !(self.actuator.position_scaling.abs() > 0.0) {
            return Err(FusionError::InvalidConfig(format!(
                "actuator calibration must be non-zero, got ratio {} scaling {}",
                self.actuator.actuator_ratio, self.actuator.position_scaling
            )));
        }
        Ok(())
    }
}
