//! Signal tables, bus declarations and DBC value tables
//!
//! This module holds the boundary with the external CAN decoder: what each bus is
//! expected to deliver and the tables the decoded values land in.

pub mod dbc;
pub mod definitions;
pub mod table;

// Re-export key types for convenience
pub use definitions::{
    actuator_definition, chassis_definition, pt_definition, Bus, BusDefinition,
    FrequencyCheck, SignalSpec,
};
pub use table::SignalTable;
