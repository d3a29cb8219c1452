//! Supported vehicles and their bus variant
//!
//! The variant decides which bus is authoritative for steering angle and cruise
//! control. It is resolved once, when the fusion core is built.

use crate::types::{FusionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported vehicle models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VehicleModel {
    E82,
    E90,
    /// E82 with dynamic cruise control; requires the F-CAN bus
    E82Dcc,
    /// E90 with dynamic cruise control; requires the F-CAN bus
    E90Dcc,
}

/// Which signal set is authoritative for steering angle and cruise state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleVariant {
    /// Steering angle and cruise buttons read from the auxiliary chassis bus (F-CAN)
    DualBus,
    /// Everything read from the primary powertrain bus (PT-CAN)
    SingleBus,
}

impl VehicleModel {
    pub const ALL: [VehicleModel; 4] = [
        VehicleModel::E82,
        VehicleModel::E90,
        VehicleModel::E82Dcc,
        VehicleModel::E90Dcc,
    ];

    pub fn variant(&self) -> VehicleVariant {
        match self {
            VehicleModel::E82Dcc | VehicleModel::E90Dcc => VehicleVariant::DualBus,
            VehicleModel::E82 | VehicleModel::E90 => VehicleVariant::SingleBus,
        }
    }

    /// Fingerprint string used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleModel::E82 => "E82",
            VehicleModel::E90 => "E90",
            VehicleModel::E82Dcc => "E82_DCC",
            VehicleModel::E90Dcc => "E90_DCC",
        }
    }
}

impl fmt::Display for VehicleModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VehicleModel {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        VehicleModel::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| FusionError::UnknownVehicleModel(s.to_string()))
    }
}

impl TryFrom<String> for VehicleModel {
    type Error = FusionError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VehicleModel> for String {
    fn from(model: VehicleModel) -> Self {
        model.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_dispatch() {
        assert_eq!(VehicleModel::E82Dcc.variant(), VehicleVariant::DualBus);
        assert_eq!(VehicleModel::E90Dcc.variant(), VehicleVariant::DualBus);
        assert_eq!(VehicleModel::E82.variant(), VehicleVariant::SingleBus);
        assert_eq!(VehicleModel::E90.variant(), VehicleVariant::SingleBus);
    }

    #[test]
    fn test_parse_model() {
        assert_eq!("E90_DCC".parse::<VehicleModel>().unwrap(), VehicleModel::E90Dcc);
        assert_eq!("e82-dcc".parse::<VehicleModel>().unwrap(), VehicleModel::E82Dcc);
        assert_eq!(" e90 ".parse::<VehicleModel>().unwrap(), VehicleModel::E90);
        assert!(matches!(
            "F30".parse::<VehicleModel>(),
            Err(FusionError::UnknownVehicleModel(_))
        ));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for model in VehicleModel::ALL {
            assert_eq!(model.to_string().parse::<VehicleModel>().unwrap(), model);
        }
    }
}
