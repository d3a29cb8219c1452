//! Per-bus parser declarations
//!
//! Declares, for each bus, which (message, signal) pairs the fusion core reads,
//! the value the decoder must report before the first frame arrives, and the
//! minimum refresh rate the external watchdog should enforce per message.

use crate::vehicle::{VehicleModel, VehicleVariant};
use serde::{Deserialize, Serialize};

/// CAN buses the core consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bus {
    /// Powertrain bus
    PtCan,
    /// Chassis bus
    FCan,
    /// Steering actuator bus
    ActuatorCan,
}

impl Bus {
    /// Bus index as wired on the interface box
    pub fn index(&self) -> u8 {
        match self {
            Bus::PtCan => 0,
            Bus::FCan => 1,
            Bus::ActuatorCan => 2,
        }
    }
}

/// A signal the core reads, with the decoder-supplied default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    pub message: String,
    pub signal: String,
    pub default: f64,
}

/// Minimum refresh rate for a message, enforced outside the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyCheck {
    pub message: String,
    pub hz: f64,
}

/// Everything the decoder needs to know to feed one bus into the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusDefinition {
    pub bus: Bus,
    /// Name of the signal database the bus is decoded with
    pub dbc: String,
    pub signals: Vec<SignalSpec>,
    pub checks: Vec<FrequencyCheck>,
}

/// DBC used for both vehicle buses
pub const VEHICLE_DBC: &str = "bmw_e9x_e8x";
/// DBC used for the actuator bus
pub const ACTUATOR_DBC: &str = "OpenActuator";

const CRUISE_BUTTON_SIGNALS: [&str; 7] = [
    "minus1mph_request",
    "plus1mph_request",
    "minus5mph_request",
    "plus5mph_request",
    "Resume_request",
    "Cancel_request_up_stalk",
    "Cancel_request_up_or_down_stalk",
];

impl BusDefinition {
    fn new(bus: Bus, dbc: &str) -> Self {
        Self {
            bus,
            dbc: dbc.to_string(),
            signals: Vec::new(),
            checks: Vec::new(),
        }
    }

    fn signal(mut self, message: &str, signal: &str, default: f64) -> Self {
        self.signals.push(SignalSpec {
            message: message.to_string(),
            signal: signal.to_string(),
            default,
        });
        self
    }

    fn check(mut self, message: &str, hz: f64) -> Self {
        self.checks.push(FrequencyCheck {
            message: message.to_string(),
            hz,
        });
        self
    }

    fn cruise_buttons(self) -> Self {
        CRUISE_BUTTON_SIGNALS
            .iter()
            .fold(self, |def, sig| def.signal("CruiseControl", sig, 0.0))
    }

    /// Declared default for a signal, if it is declared on this bus
    pub fn default_for(&self, message: &str, signal: &str) -> Option<f64> {
        self.signals
            .iter()
            .find(|s| s.message == message && s.signal == signal)
            .map(|s| s.default)
    }

    /// Expected refresh rate for a message, if one is declared
    pub fn expected_hz(&self, message: &str) -> Option<f64> {
        self.checks.iter().find(|c| c.message == message).map(|c| c.hz)
    }
}

/// Powertrain bus declarations
pub fn pt_definition(model: VehicleModel) -> BusDefinition {
    let def = BusDefinition::new(Bus::PtCan, VEHICLE_DBC)
        .signal("EngineAndBrake", "BrakePressed", 0.0)
        .signal("TransmissionDataDisplay", "ShiftLeverPosition", 0.0)
        .signal("TransmissionDataDisplay", "SportButtonState", 0.0)
        .signal("AccPedal", "AcceleratorPedalPressed", 0.0)
        .signal("AccPedal", "AcceleratorPedalPercentage", 0.0)
        .signal("AccPedal", "KickDownPressed", 0.0)
        .signal("Speed", "VehicleSpeed", 0.0)
        .signal("SteeringWheelAngle", "SteeringPosition", 0.0)
        .signal("SteeringWheelAngle", "SteeringSpeed", 0.0)
        .signal("TurnSignals", "TurnSignalIdle", 0.0)
        .signal("TurnSignals", "TurnSignalActive", 0.0)
        .signal("TurnSignals", "RightTurn", 0.0)
        .signal("TurnSignals", "LeftTurn", 0.0)
        .signal("SteeringButtons", "Volume_DOWN", 0.0)
        .signal("SteeringButtons", "Volume_UP", 0.0)
        .signal("SteeringButtons", "Previous_down", 0.0)
        .signal("SteeringButtons", "Next_up", 0.0)
        // Declared for the decoder, not read individually yet
        .signal("WheelSpeeds", "Wheel1", 0.0)
        .signal("WheelSpeeds", "Wheel2", 0.0)
        .signal("WheelSpeeds", "Wheel3", 0.0)
        .signal("WheelSpeeds", "Wheel4", 0.0)
        .cruise_buttons()
        .check("EngineAndBrake", 80.0)
        .check("AccPedal", 33.0)
        .check("Speed", 80.0);

    match model.variant() {
        VehicleVariant::DualBus => def
            .signal("DynamicCruiseControlStatus", "CruiseActive", 0.0)
            // 252 is what the car reports while DCC is not engaged
            .signal("DynamicCruiseControlStatus", "CruiseControlSetpointSpeed", 252.0)
            .check("DynamicCruiseControlStatus", 33.0),
        VehicleVariant::SingleBus => def
            .signal("CruiseControlStatus", "CruiseCoontrolActiveFlag", 0.0)
            .signal("CruiseControlStatus", "CruiseControlSetpointSpeed", 0.0)
            .check("CruiseControlStatus", 33.0),
    }
}

/// Chassis bus declarations
///
/// Some chassis messages (CruiseControl) are mirrored on the powertrain bus. Dual-bus
/// vehicles transmit cruise commands on this bus, so they also read them back here.
pub fn chassis_definition(model: VehicleModel) -> BusDefinition {
    let def = BusDefinition::new(Bus::FCan, VEHICLE_DBC)
        .signal("SteeringWheelAngle_DSC", "SteeringPosition", 0.0)
        .cruise_buttons();

    match model.variant() {
        VehicleVariant::DualBus => def.check("SteeringWheelAngle_DSC", 80.0),
        VehicleVariant::SingleBus => def,
    }
}

/// Actuator bus declarations
///
/// No refresh check: the actuator stays silent while steering is inactive.
pub fn actuator_definition() -> BusDefinition {
    BusDefinition::new(Bus::ActuatorCan, ACTUATOR_DBC)
        .signal("TMCL_actuatorStatus", "Command", 0.0)
        .signal("TMCL_actuatorStatus", "Value", 0.0)
}
