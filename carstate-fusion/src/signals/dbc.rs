//! DBC value-table reader
//!
//! Reads `VAL_` descriptions out of a vehicle DBC file. The fusion core only needs
//! these enum-like tables (for example the shift lever codes); bit layouts are the
//! decoder's business.

use crate::types::{FusionError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Parse a DBC file from disk
pub fn parse_dbc_file(path: &Path) -> Result<can_dbc::DBC> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read the DBC file as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path).map_err(|e| {
        FusionError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    parse_dbc_bytes(&bytes).map_err(|e| match e {
        FusionError::DbcParseError(msg) => {
            FusionError::DbcParseError(format!("{:?}: {}", path, msg))
        }
        other => other,
    })
}

/// Parse DBC content already held in memory
pub fn parse_dbc_bytes(bytes: &[u8]) -> Result<can_dbc::DBC> {
    // Vehicle DBCs are frequently Windows-1252; fall back to Latin-1
    let content = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            bytes.iter().map(|&b| b as char).collect()
        }
    };

    let dbc = can_dbc::DBC::from_slice(content.as_bytes())
        .map_err(|e| FusionError::DbcParseError(format!("{:?}", e)))?;
    Ok(dbc)
}

/// Extract the value table (raw code -> label) for one signal
pub fn value_table(
    dbc: &can_dbc::DBC,
    message_name: &str,
    signal_name: &str,
) -> Result<HashMap<i64, String>> {
    let missing = || FusionError::MissingValueTable {
        message: message_name.to_string(),
        signal: signal_name.to_string(),
    };

    let message = dbc
        .messages()
        .iter()
        .find(|m| m.message_name() == message_name)
        .ok_or_else(missing)?;

    let descriptions = dbc
        .value_descriptions_for_signal(message.message_id().clone(), signal_name)
        .ok_or_else(missing)?;

    let table: HashMap<i64, String> = descriptions
        .iter()
        .map(|d| (*d.a() as i64, d.b().to_string()))
        .collect();

    log::debug!(
        "Loaded {} value descriptions for {}.{}",
        table.len(),
        message_name,
        signal_name
    );

    Ok(table)
}
