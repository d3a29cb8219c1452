//! Latest decoded values for one bus
//!
//! A `SignalTable` mirrors what the external decoder reports for a bus: the last
//! value seen per (message, signal), seeded with the declared defaults so every
//! read has a defined result.

use crate::signals::definitions::{Bus, BusDefinition};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SignalTable {
    bus: Bus,
    /// Key: message name, Value: signal name -> latest value
    values: HashMap<String, HashMap<String, f64>>,
    /// Key: message name, Value: expected refresh rate (Hz)
    checks: HashMap<String, f64>,
}

impl SignalTable {
    /// Create a table holding the declared defaults for every signal on the bus
    pub fn new(definition: &BusDefinition) -> Self {
        let mut values: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for spec in &definition.signals {
            values
                .entry(spec.message.clone())
                .or_insert_with(HashMap::new)
                .insert(spec.signal.clone(), spec.default);
        }

        let checks = definition
            .checks
            .iter()
            .map(|c| (c.message.clone(), c.hz))
            .collect();

        Self {
            bus: definition.bus,
            values,
            checks,
        }
    }

    /// Bus this table was built for
    pub fn bus(&self) -> Bus {
        self.bus
    }

    /// Store a freshly decoded value
    pub fn set(&mut self, message: &str, signal: &str, value: f64) {
        self.values
            .entry(message.to_string())
            .or_insert_with(HashMap::new)
            .insert(signal.to_string(), value);
    }

    /// Store all signals of a freshly decoded message
    pub fn update_message<'a, I>(&mut self, message: &str, signals: I)
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let entry = self
            .values
            .entry(message.to_string())
            .or_insert_with(HashMap::new);
        for (signal, value) in signals {
            entry.insert(signal.to_string(), value);
        }
    }

    /// Latest value, the declared default, or 0.0 for an undeclared signal
    pub fn get(&self, message: &str, signal: &str) -> f64 {
        match self.values.get(message).and_then(|m| m.get(signal)) {
            Some(value) => *value,
            None => {
                log::trace!(
                    "Undeclared signal {}.{} on {:?}, reading 0",
                    message,
                    signal,
                    self.bus
                );
                0.0
            }
        }
    }

    /// Level signal read: anything non-zero is set
    pub fn get_bool(&self, message: &str, signal: &str) -> bool {
        self.get(message, signal) != 0.0
    }

    /// Expected refresh rate for a message, if the bus declares one
    pub fn expected_hz(&self, message: &str) -> Option<f64> {
        self.checks.get(message).copied()
    }
}
