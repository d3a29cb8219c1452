//! Main fusion API
//!
//! [`StateFusion`] turns the latest decoded signal tables of the three buses into
//! one [`CarState`] per control tick. It owns every piece of history that has to
//! survive between ticks: cruise button levels for edge detection, the previous
//! gas pedal state, the speed filter and the stepper position tracker.

use crate::config::FusionConfig;
use crate::gear::GearTable;
use crate::signals::SignalTable;
use crate::speed_filter::SpeedFilter;
use crate::stepper::StepperTracker;
use crate::types::{CarState, CruiseState, Result, WheelSpeeds};
use crate::units::{self, KPH_TO_MS};
use crate::vehicle::{VehicleModel, VehicleVariant};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Torque reported while the driver signals a lane change with the pedal held
pub const EMULATED_STEER_TORQUE: f64 = 1.0;

/// Cruise stalk request levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CruiseButtons {
    pub plus: bool,
    pub minus: bool,
    pub plus5: bool,
    pub minus5: bool,
    pub resume: bool,
    /// Cancel from either stalk direction
    pub cancel: bool,
    pub cancel_up_stalk: bool,
    /// Not reported by the car; inferred as cancel without up-stalk
    pub cancel_down_stalk: bool,
}

impl CruiseButtons {
    /// Read the seven raw request levels of a `CruiseControl` message
    fn read(table: &SignalTable) -> Self {
        let cancel = table.get_bool("CruiseControl", "Cancel_request_up_or_down_stalk");
        let cancel_up_stalk = table.get_bool("CruiseControl", "Cancel_request_up_stalk");
        Self {
            plus: table.get_bool("CruiseControl", "plus1mph_request"),
            minus: table.get_bool("CruiseControl", "minus1mph_request"),
            plus5: table.get_bool("CruiseControl", "plus5mph_request"),
            minus5: table.get_bool("CruiseControl", "minus5mph_request"),
            resume: table.get_bool("CruiseControl", "Resume_request"),
            cancel,
            cancel_up_stalk,
            cancel_down_stalk: cancel && !cancel_up_stalk,
        }
    }

    /// Buttons that are pressed now but were released in `prev`
    pub fn rising_edges(&self, prev: &CruiseButtons) -> CruiseButtons {
        CruiseButtons {
            plus: self.plus && !prev.plus,
            minus: self.minus && !prev.minus,
            plus5: self.plus5 && !prev.plus5,
            minus5: self.minus5 && !prev.minus5,
            resume: self.resume && !prev.resume,
            cancel: self.cancel && !prev.cancel,
            cancel_up_stalk: self.cancel_up_stalk && !prev.cancel_up_stalk,
            cancel_down_stalk: self.cancel_down_stalk && !prev.cancel_down_stalk,
        }
    }

    pub fn any(&self) -> bool {
        self.plus
            || self.minus
            || self.plus5
            || self.minus5
            || self.resume
            || self.cancel
            || self.cancel_up_stalk
            || self.cancel_down_stalk
    }
}

/// History carried from one tick to the next
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionState {
    /// Current belief about the cruise setpoint unit
    pub is_metric: bool,
    pub gas_kickdown: bool,
    /// Direction bit set while the blinker is not running
    pub left_blinker_pressed: bool,
    pub right_blinker_pressed: bool,
    /// Loose "driver is interacting" flag for a car without a torque sensor
    pub other_buttons: bool,
    pub cruise_buttons: CruiseButtons,
    /// `cruise_buttons` as left by the previous update
    pub prev_cruise_buttons: CruiseButtons,
    pub prev_gas_pressed: bool,
    pub stepper: StepperTracker,
}

/// Blinker stalk decoding for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Blinkers {
    left: bool,
    right: bool,
    left_pressed: bool,
    right_pressed: bool,
}

impl Blinkers {
    fn read(pt: &SignalTable) -> Self {
        let active = pt.get_bool("TurnSignals", "TurnSignalActive")
            && !pt.get_bool("TurnSignals", "TurnSignalIdle");
        let left_dir = pt.get_bool("TurnSignals", "LeftTurn");
        let right_dir = pt.get_bool("TurnSignals", "RightTurn");
        Self {
            left: active && left_dir,
            right: active && right_dir,
            left_pressed: !active && left_dir,
            right_pressed: !active && right_dir,
        }
    }
}

/// Non-strict: a raw speed equal to the threshold is still standstill
fn is_standstill(v_ego_raw: f64, threshold: f64) -> bool {
    !(v_ego_raw > threshold)
}

/// Torque emulation from pedal and blinker; left blinker wins when both are on
fn emulated_steering_torque(pressed: bool, left_blinker: bool, right_blinker: bool) -> f64 {
    if pressed && left_blinker {
        EMULATED_STEER_TORQUE
    } else if pressed && right_blinker {
        -EMULATED_STEER_TORQUE
    } else {
        0.0
    }
}

/// The fusion core - one instance per vehicle session
pub struct StateFusion {
    model: VehicleModel,
    variant: VehicleVariant,
    gear_table: GearTable,
    config: FusionConfig,
    speed_filter: SpeedFilter,
    state: FusionState,
}

impl StateFusion {
    /// Create a fusion core for `model`
    ///
    /// `is_metric` is the stored unit preference; it seeds the unit belief.
    pub fn new(model: VehicleModel, gear_table: GearTable, is_metric: bool, config: FusionConfig) -> Self {
        log::info!(
            "Car state fusion for {} ({:?}), {} gear codes, metric={}",
            model,
            model.variant(),
            gear_table.len(),
            is_metric
        );

        Self {
            model,
            variant: model.variant(),
            gear_table,
            config,
            speed_filter: SpeedFilter::new(),
            state: FusionState {
                is_metric,
                ..FusionState::default()
            },
        }
    }

    /// Create a fusion core with the gear table read from the vehicle DBC
    ///
    /// # Example
    /// ```no_run
    /// use carstate_fusion::{FusionConfig, StateFusion, VehicleModel};
    /// use std::path::Path;
    ///
    /// let fusion = StateFusion::from_dbc(
    ///     VehicleModel::E90Dcc,
    ///     Path::new("bmw_e9x_e8x.dbc"),
    ///     true,
    ///     FusionConfig::new(),
    /// ).unwrap();
    /// ```
    pub fn from_dbc(
        model: VehicleModel,
        dbc_path: &Path,
        is_metric: bool,
        config: FusionConfig,
    ) -> Result<Self> {
        let gear_table = GearTable::from_dbc_file(dbc_path)?;
        Ok(Self::new(model, gear_table, is_metric, config))
    }

    pub fn model(&self) -> VehicleModel {
        self.model
    }

    pub fn variant(&self) -> VehicleVariant {
        self.variant
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// History as left by the latest update
    pub fn state(&self) -> &FusionState {
        &self.state
    }

    /// Produce the snapshot for this tick and advance the history
    ///
    /// Never fails: every signal read falls back to the table default.
    pub fn update(&mut self, pt: &SignalTable, chassis: &SignalTable, actuator: &SignalTable) -> CarState {
        // Previous button levels are consumed outside the update, capture them first
        self.state.prev_cruise_buttons = self.state.cruise_buttons;

        let mut ret = CarState::default();

        ret.brake_pressed = pt.get_bool("EngineAndBrake", "BrakePressed");
        ret.gas = pt.get("AccPedal", "AcceleratorPedalPercentage");
        ret.gas_pressed = pt.get_bool("AccPedal", "AcceleratorPedalPressed");
        // Kickdown switch sits at the bottom of the pedal travel
        self.state.gas_kickdown = pt.get_bool("AccPedal", "KickDownPressed");

        ret.v_ego_raw = pt.get("Speed", "VehicleSpeed") * KPH_TO_MS;
        ret.wheel_speeds = WheelSpeeds::aliased_from_vehicle_speed(ret.v_ego_raw);
        let (v_ego, a_ego) = self.speed_filter.update(ret.v_ego_raw);
        ret.v_ego = v_ego;
        ret.a_ego = a_ego;
        ret.standstill = is_standstill(ret.v_ego_raw, self.config.standstill_threshold);

        ret.steering_rate = pt.get("SteeringWheelAngle", "SteeringSpeed");
        let gear_code = pt.get("TransmissionDataDisplay", "ShiftLeverPosition") as i64;
        ret.gear_shifter = self.gear_table.gear(gear_code);

        let blinkers = Blinkers::read(pt);
        ret.left_blinker = blinkers.left;
        ret.right_blinker = blinkers.right;
        self.state.left_blinker_pressed = blinkers.left_pressed;
        self.state.right_blinker_pressed = blinkers.right_pressed;

        let wheel_button = pt.get_bool("SteeringButtons", "Volume_DOWN")
            || pt.get_bool("SteeringButtons", "Volume_UP")
            || pt.get_bool("SteeringButtons", "Previous_down")
            || pt.get_bool("SteeringButtons", "Next_up");
        let gas_released = self.state.prev_gas_pressed && !ret.gas_pressed;
        self.state.other_buttons = wheel_button || gas_released;

        // No torque sensor: a light press on the gas stands in for driver intent
        ret.steering_pressed = ret.gas_pressed;
        ret.steering_torque =
            emulated_steering_torque(ret.steering_pressed, ret.left_blinker, ret.right_blinker);
        ret.steering_torque_eps = 0.0;

        let (setpoint, cruise_enabled) = match self.variant {
            VehicleVariant::DualBus => {
                ret.steering_angle = chassis.get("SteeringWheelAngle_DSC", "SteeringPosition");
                // Commands are sent on F-CAN, so read them back there to tell ours from the car's
                self.state.cruise_buttons = CruiseButtons::read(chassis);
                (
                    pt.get("DynamicCruiseControlStatus", "CruiseControlSetpointSpeed"),
                    pt.get_bool("DynamicCruiseControlStatus", "CruiseActive"),
                )
            }
            VehicleVariant::SingleBus => {
                ret.steering_angle = pt.get("SteeringWheelAngle", "SteeringPosition");
                self.state.cruise_buttons = CruiseButtons::read(pt);
                (
                    pt.get("CruiseControlStatus", "CruiseControlSetpointSpeed"),
                    pt.get_bool("CruiseControlStatus", "CruiseCoontrolActiveFlag"),
                )
            }
        };

        self.update_unit_belief(cruise_enabled, setpoint, ret.v_ego_raw);
        ret.cruise_state = CruiseState {
            available: true,
            enabled: cruise_enabled,
            speed: units::setpoint_to_ms(setpoint, self.state.is_metric),
        };

        ret.generic_toggle = pt.get_bool("TransmissionDataDisplay", "SportButtonState");

        let command = actuator.get("TMCL_actuatorStatus", "Command") as i64;
        let steps = actuator.get("TMCL_actuatorStatus", "Value");
        self.state.stepper.update(command, steps, &self.config.actuator);

        self.state.prev_gas_pressed = ret.gas_pressed;
        ret
    }

    fn update_unit_belief(&mut self, cruise_enabled: bool, setpoint: f64, v_ego_raw: f64) {
        if self.config.unit_auto_detect {
            if !cruise_enabled {
                return;
            }
            if let Some(is_metric) =
                units::detect_metric(setpoint, v_ego_raw, self.config.unit_match_tolerance)
            {
                if is_metric != self.state.is_metric {
                    log::debug!("Cruise setpoint unit detected: metric={}", is_metric);
                }
                self.state.is_metric = is_metric;
            }
        } else if self.config.force_metric {
            self.state.is_metric = true;
        }
    }

    /// Shortcut for the controller: stepper movement since the previous update (deg)
    pub fn steer_angle_delta_cmd(&self) -> f64 {
        self.state.stepper.delta
    }

    /// Cruise buttons pressed since the previous update
    pub fn cruise_button_presses(&self) -> CruiseButtons {
        self.state.cruise_buttons.rising_edges(&self.state.prev_cruise_buttons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gear::GearShifter;
    use crate::signals::{actuator_definition, chassis_definition, pt_definition};

    struct Tables {
        pt: SignalTable,
        chassis: SignalTable,
        actuator: SignalTable,
    }

    impl Tables {
        fn new(model: VehicleModel) -> Self {
            Self {
                pt: SignalTable::new(&pt_definition(model)),
                chassis: SignalTable::new(&chassis_definition(model)),
                actuator: SignalTable::new(&actuator_definition()),
            }
        }
    }

    fn fusion(model: VehicleModel) -> StateFusion {
        let gears = GearTable::from_pairs([(0, "P"), (1, "R"), (2, "N"), (3, "D")]);
        StateFusion::new(model, gears, true, FusionConfig::new())
    }

    fn step(f: &mut StateFusion, t: &Tables) -> CarState {
        f.update(&t.pt, &t.chassis, &t.actuator)
    }

    #[test]
    fn test_initial_state() {
        let f = fusion(VehicleModel::E90);
        assert_eq!(f.variant(), VehicleVariant::SingleBus);
        assert!(f.state().is_metric);
        assert!(!f.state().other_buttons);
        assert_eq!(f.state().cruise_buttons, CruiseButtons::default());
        assert_eq!(f.state().stepper, StepperTracker::default());
    }

    #[test]
    fn test_standstill_boundary() {
        let mut f = fusion(VehicleModel::E90);
        let mut t = Tables::new(VehicleModel::E90);

        assert!(is_standstill(0.001, 0.001));
        assert!(is_standstill(0.0, 0.001));
        assert!(!is_standstill(0.0011, 0.001));

        t.pt.set("Speed", "VehicleSpeed", 0.0036 * 2.0);
        assert!(!step(&mut f, &t).standstill);

        t.pt.set("Speed", "VehicleSpeed", 0.0);
        assert!(step(&mut f, &t).standstill);
    }

    #[test]
    fn test_gear_lookup() {
        let mut f = fusion(VehicleModel::E82);
        let mut t = Tables::new(VehicleModel::E82);

        t.pt.set("TransmissionDataDisplay", "ShiftLeverPosition", 3.0);
        assert_eq!(step(&mut f, &t).gear_shifter, GearShifter::Drive);

        t.pt.set("TransmissionDataDisplay", "ShiftLeverPosition", 12.0);
        assert_eq!(step(&mut f, &t).gear_shifter, GearShifter::Unknown);
    }

    #[test]
    fn test_blinker_press_edge() {
        let mut f = fusion(VehicleModel::E90);
        let mut t = Tables::new(VehicleModel::E90);

        for active in [false, true] {
            for idle in [false, true] {
                for left in [false, true] {
                    for right in [false, true] {
                        t.pt.set("TurnSignals", "TurnSignalActive", active as u8 as f64);
                        t.pt.set("TurnSignals", "TurnSignalIdle", idle as u8 as f64);
                        t.pt.set("TurnSignals", "LeftTurn", left as u8 as f64);
                        t.pt.set("TurnSignals", "RightTurn", right as u8 as f64);
                        let ret = step(&mut f, &t);

                        let blinking = active && !idle;
                        assert_eq!(ret.left_blinker, blinking && left);
                        assert_eq!(ret.right_blinker, blinking && right);
                        assert_eq!(f.state().left_blinker_pressed, !blinking && left);
                        assert_eq!(f.state().right_blinker_pressed, !blinking && right);
                        if blinking {
                            assert!(!f.state().left_blinker_pressed);
                            assert!(!f.state().right_blinker_pressed);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_emulated_torque_table() {
        for pressed in [false, true] {
            for left in [false, true] {
                for right in [false, true] {
                    let torque = emulated_steering_torque(pressed, left, right);
                    let expected = match (pressed, left, right) {
                        (true, true, _) => EMULATED_STEER_TORQUE,
                        (true, false, true) => -EMULATED_STEER_TORQUE,
                        _ => 0.0,
                    };
                    assert_eq!(torque, expected);
                }
            }
        }
    }

    #[test]
    fn test_steering_pressed_follows_gas() {
        let mut f = fusion(VehicleModel::E90);
        let mut t = Tables::new(VehicleModel::E90);
        t.pt.set("AccPedal", "AcceleratorPedalPressed", 1.0);
        t.pt.set("AccPedal", "AcceleratorPedalPercentage", 12.5);
        t.pt.set("TurnSignals", "TurnSignalActive", 1.0);
        t.pt.set("TurnSignals", "RightTurn", 1.0);

        let ret = step(&mut f, &t);
        assert!(ret.steering_pressed);
        assert_eq!(ret.gas, 12.5);
        assert_eq!(ret.steering_torque, -EMULATED_STEER_TORQUE);
        assert_eq!(ret.steering_torque_eps, 0.0);
    }

    #[test]
    fn test_kickdown_and_toggle() {
        let mut f = fusion(VehicleModel::E90);
        let mut t = Tables::new(VehicleModel::E90);
        t.pt.set("AccPedal", "KickDownPressed", 1.0);
        t.pt.set("TransmissionDataDisplay", "SportButtonState", 1.0);
        t.pt.set("EngineAndBrake", "BrakePressed", 1.0);

        let ret = step(&mut f, &t);
        assert!(f.state().gas_kickdown);
        assert!(ret.generic_toggle);
        assert!(ret.brake_pressed);
        assert!(!ret.door_open);
        assert!(!ret.seatbelt_unlatched);
    }

    #[test]
    fn test_cancel_down_stalk_inferred() {
        let mut f = fusion(VehicleModel::E82);
        let mut t = Tables::new(VehicleModel::E82);

        for cancel in [false, true] {
            for up in [false, true] {
                t.pt.set("CruiseControl", "Cancel_request_up_or_down_stalk", cancel as u8 as f64);
                t.pt.set("CruiseControl", "Cancel_request_up_stalk", up as u8 as f64);
                step(&mut f, &t);
                let buttons = f.state().cruise_buttons;
                assert_eq!(buttons.cancel, cancel);
                assert_eq!(buttons.cancel_up_stalk, up);
                assert_eq!(buttons.cancel_down_stalk, cancel && !up);
            }
        }
    }

    #[test]
    fn test_single_bus_ignores_chassis_buttons() {
        let mut f = fusion(VehicleModel::E90);
        let mut t = Tables::new(VehicleModel::E90);
        t.chassis.set("CruiseControl", "plus1mph_request", 1.0);
        t.chassis.set("SteeringWheelAngle_DSC", "SteeringPosition", 15.0);
        t.pt.set("SteeringWheelAngle", "SteeringPosition", 20.0);

        let ret = step(&mut f, &t);
        assert!(!f.state().cruise_buttons.plus);
        assert_eq!(ret.steering_angle, 20.0);
    }

    #[test]
    fn test_dual_bus_reads_chassis_buttons() {
        let mut f = fusion(VehicleModel::E82Dcc);
        let mut t = Tables::new(VehicleModel::E82Dcc);
        t.chassis.set("CruiseControl", "Resume_request", 1.0);
        t.pt.set("CruiseControl", "minus5mph_request", 1.0);

        step(&mut f, &t);
        let buttons = f.state().cruise_buttons;
        assert!(buttons.resume);
        assert!(!buttons.minus5);
    }

    #[test]
    fn test_rising_edges() {
        let mut f = fusion(VehicleModel::E90);
        let mut t = Tables::new(VehicleModel::E90);

        t.pt.set("CruiseControl", "plus1mph_request", 1.0);
        step(&mut f, &t);
        assert!(f.cruise_button_presses().plus);

        // Held: no new press
        step(&mut f, &t);
        assert!(!f.cruise_button_presses().plus);
        assert!(!f.cruise_button_presses().any());

        t.pt.set("CruiseControl", "plus1mph_request", 0.0);
        step(&mut f, &t);
        assert!(!f.cruise_button_presses().any());
    }

    #[test]
    fn test_forced_metric_overrides_stored_preference() {
        let gears = GearTable::from_pairs([(0, "P")]);
        let mut f = StateFusion::new(VehicleModel::E90, gears, false, FusionConfig::new());
        let mut t = Tables::new(VehicleModel::E90);
        t.pt.set("CruiseControlStatus", "CruiseControlSetpointSpeed", 36.0);

        let ret = step(&mut f, &t);
        assert!(f.state().is_metric);
        assert!((ret.cruise_state.speed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_stored_preference_kept_without_forcing() {
        let gears = GearTable::from_pairs([(0, "P")]);
        let config = FusionConfig::new().with_force_metric(false);
        let mut f = StateFusion::new(VehicleModel::E90, gears, false, config);
        let mut t = Tables::new(VehicleModel::E90);
        t.pt.set("CruiseControlStatus", "CruiseControlSetpointSpeed", 10.0);

        let ret = step(&mut f, &t);
        assert!(!f.state().is_metric);
        assert!((ret.cruise_state.speed - 4.4704).abs() < 1e-9);
    }

    #[test]
    fn test_auto_detect_imperial() {
        let gears = GearTable::from_pairs([(0, "P")]);
        let config = FusionConfig::new().with_unit_auto_detect(true);
        let mut f = StateFusion::new(VehicleModel::E90, gears, true, config);
        let mut t = Tables::new(VehicleModel::E90);

        // 60 mph setpoint at ~60 mph
        t.pt.set("Speed", "VehicleSpeed", 96.56);
        t.pt.set("CruiseControlStatus", "CruiseCoontrolActiveFlag", 1.0);
        t.pt.set("CruiseControlStatus", "CruiseControlSetpointSpeed", 60.0);

        let ret = step(&mut f, &t);
        assert!(!f.state().is_metric);
        assert!((ret.cruise_state.speed - 60.0 * units::MPH_TO_MS).abs() < 1e-9);

        // Cruise off: belief is retained
        t.pt.set("CruiseControlStatus", "CruiseCoontrolActiveFlag", 0.0);
        step(&mut f, &t);
        assert!(!f.state().is_metric);
    }

    #[test]
    fn test_auto_detect_ambiguous_keeps_belief() {
        let gears = GearTable::from_pairs([(0, "P")]);
        let config = FusionConfig::new().with_unit_auto_detect(true);
        let mut f = StateFusion::new(VehicleModel::E90Dcc, gears, true, config);
        let mut t = Tables::new(VehicleModel::E90Dcc);

        t.pt.set("Speed", "VehicleSpeed", 50.0);
        t.pt.set("DynamicCruiseControlStatus", "CruiseActive", 1.0);
        t.pt.set("DynamicCruiseControlStatus", "CruiseControlSetpointSpeed", 130.0);

        step(&mut f, &t);
        assert!(f.state().is_metric);
    }
}
