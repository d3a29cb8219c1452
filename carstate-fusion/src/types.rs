//! Core types for the car state fusion library
//!
//! This module defines the error type and the snapshot that [`StateFusion`](crate::StateFusion)
//! emits once per control tick. The snapshot is rebuilt from scratch on every call and
//! carries no identity between ticks.

use crate::gear::GearShifter;
use serde::{Deserialize, Serialize};

/// Result type for fusion operations
pub type Result<T> = std::result::Result<T, FusionError>;

/// Errors that can occur while setting up the fusion core
///
/// `update` itself never fails; every variant here is raised before the first tick.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("No value table for {message}.{signal}")]
    MissingValueTable { message: String, signal: String },

    #[error("Unknown vehicle model: {0}")]
    UnknownVehicleModel(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Per-wheel speed estimate in m/s
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub fl: f64,
    pub fr: f64,
    pub rl: f64,
    pub rr: f64,
}

impl WheelSpeeds {
    /// Stand-in until the per-wheel signals are decoded: every wheel reports
    /// the vehicle speed.
    pub fn aliased_from_vehicle_speed(v_ego_raw: f64) -> Self {
        Self {
            fl: v_ego_raw,
            fr: v_ego_raw,
            rl: v_ego_raw,
            rr: v_ego_raw,
        }
    }
}

/// Cruise control status as seen by the control pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CruiseState {
    pub available: bool,
    pub enabled: bool,
    /// Setpoint speed in m/s
    pub speed: f64,
}

/// Vehicle state snapshot - the primary output of the fusion core
///
/// Units follow the control pipeline contract: speeds in m/s, acceleration in
/// m/s², angles in degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarState {
    /// Not wired to a signal yet, always false
    pub door_open: bool,
    /// Not wired to a signal yet, always false
    pub seatbelt_unlatched: bool,
    pub esp_disabled: bool,

    pub brake_pressed: bool,
    /// Accelerator pedal position in percent
    pub gas: f64,
    pub gas_pressed: bool,

    pub v_ego_raw: f64,
    pub v_ego: f64,
    pub a_ego: f64,
    pub wheel_speeds: WheelSpeeds,
    pub standstill: bool,

    pub steering_angle: f64,
    pub steering_rate: f64,
    pub steering_torque: f64,
    pub steering_pressed: bool,
    pub steering_torque_eps: f64,

    pub gear_shifter: GearShifter,
    pub left_blinker: bool,
    pub right_blinker: bool,

    pub cruise_state: CruiseState,
    pub generic_toggle: bool,
}
