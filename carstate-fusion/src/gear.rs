//! Gear lever lookup
//!
//! Maps the raw shift-lever code to a gear through the value table of the vehicle
//! DBC. Codes without a table entry, and labels that do not name a gear, resolve
//! to [`GearShifter::Unknown`].

use crate::signals::dbc;
use crate::types::{FusionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Message and signal carrying the shift lever code
pub const SHIFTER_MESSAGE: &str = "TransmissionDataDisplay";
pub const SHIFTER_SIGNAL: &str = "ShiftLeverPosition";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GearShifter {
    #[default]
    Unknown,
    Park,
    Drive,
    Neutral,
    Reverse,
    Sport,
    Low,
    Brake,
    Eco,
    Manumatic,
}

impl GearShifter {
    /// Parse a value-table label
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return GearShifter::Unknown;
        };

        match label.trim().to_uppercase().as_str() {
            "P" | "PARK" => GearShifter::Park,
            "R" | "REVERSE" => GearShifter::Reverse,
            "N" | "NEUTRAL" => GearShifter::Neutral,
            "E" | "ECO" => GearShifter::Eco,
            "T" | "MANUMATIC" => GearShifter::Manumatic,
            "D" | "DRIVE" => GearShifter::Drive,
            "S" | "SPORT" => GearShifter::Sport,
            "L" | "LOW" => GearShifter::Low,
            "B" | "BRAKE" => GearShifter::Brake,
            _ => GearShifter::Unknown,
        }
    }
}

/// Raw shift-lever code to label, built from vehicle decoder metadata
#[derive(Debug, Clone, Default)]
pub struct GearTable {
    labels: HashMap<i64, String>,
}

impl GearTable {
    /// Build from in-memory (code, label) pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self {
            labels: pairs.into_iter().map(|(code, label)| (code, label.into())).collect(),
        }
    }

    /// Build from the shift-lever value table of a vehicle DBC file
    pub fn from_dbc_file(path: &Path) -> Result<Self> {
        let parsed = dbc::parse_dbc_file(path)?;
        Self::from_dbc(&parsed)
    }

    /// Build from an already parsed DBC
    pub fn from_dbc(parsed: &can_dbc::DBC) -> Result<Self> {
        let labels = dbc::value_table(parsed, SHIFTER_MESSAGE, SHIFTER_SIGNAL)?;
        if labels.is_empty() {
            return Err(FusionError::MissingValueTable {
                message: SHIFTER_MESSAGE.to_string(),
                signal: SHIFTER_SIGNAL.to_string(),
            });
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for a raw code, if the table has one
    pub fn lookup(&self, code: i64) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    /// Gear for a raw code
    pub fn gear(&self, code: i64) -> GearShifter {
        let label = self.lookup(code);
        if label.is_none() {
            log::debug!("Unmapped shift lever code {}", code);
        }
        GearShifter::from_label(label)
    }
}
