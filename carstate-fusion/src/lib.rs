//! Car State Fusion Library
//!
//! Turns decoded CAN signal tables from the powertrain, chassis and steering
//! actuator buses into one time-consistent vehicle state snapshot per control tick.
//!
//! # Architecture
//!
//! The library does:
//! - Variant dispatch: which bus is authoritative for steering angle and cruise
//! - Edge/level detection for cruise stalk, blinker presses and driver activity
//! - Speed filtering, standstill detection and steering torque emulation
//! - Cruise setpoint unit reconciliation (metric/imperial)
//! - Stepper actuator step accounting
//!
//! The library does NOT:
//! - Decode raw CAN frames (bit layouts, scaling)
//! - Perform bus I/O or enforce message refresh rates
//! - Validate checksums or counters
//! - Drive actuators or implement a control law
//!
//! # Example Usage
//!
//! ```no_run
//! use carstate_fusion::signals::{actuator_definition, chassis_definition, pt_definition};
//! use carstate_fusion::{FusionConfig, GearTable, SignalTable, StateFusion, VehicleModel};
//!
//! let model = VehicleModel::E90Dcc;
//! let gears = GearTable::from_pairs([(0, "P"), (1, "R"), (2, "N"), (3, "D")]);
//! let mut fusion = StateFusion::new(model, gears, true, FusionConfig::new());
//!
//! // Tables are filled by the external decoder
//! let mut pt = SignalTable::new(&pt_definition(model));
//! let chassis = SignalTable::new(&chassis_definition(model));
//! let actuator = SignalTable::new(&actuator_definition());
//!
//! pt.set("Speed", "VehicleSpeed", 50.0);
//! let state = fusion.update(&pt, &chassis, &actuator);
//! println!("v_ego = {:.2} m/s", state.v_ego);
//! ```

// Public modules
pub mod config;
pub mod fusion;
pub mod gear;
pub mod signals;
pub mod speed_filter;
pub mod stepper;
pub mod types;
pub mod units;
pub mod vehicle;

// Re-export main types for convenience
pub use config::FusionConfig;
pub use fusion::{CruiseButtons, FusionState, StateFusion, EMULATED_STEER_TORQUE};
pub use gear::{GearShifter, GearTable};
pub use signals::{Bus, BusDefinition, SignalTable};
pub use stepper::{ActuatorParams, StepperTracker, TMCL_MVP};
pub use types::{CarState, CruiseState, FusionError, Result, WheelSpeeds};
pub use vehicle::{VehicleModel, VehicleVariant};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
