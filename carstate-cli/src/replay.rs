//! Replay of recorded signal tables
//!
//! Each input line holds what the decoder reported for one control tick. Tables
//! persist across ticks, so a message absent from a line keeps its last value the
//! same way it would on the live bus.

use anyhow::{Context, Result};
use carstate_fusion::signals::{actuator_definition, chassis_definition, pt_definition};
use carstate_fusion::{CarState, SignalTable, StateFusion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Message name -> signal name -> value
pub type MessageValues = HashMap<String, HashMap<String, f64>>;

/// One recorded control tick
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplayTick {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pt: MessageValues,
    #[serde(default)]
    pub chassis: MessageValues,
    #[serde(default)]
    pub actuator: MessageValues,
}

/// One output line
#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutput<'a> {
    pub tick: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub state: &'a CarState,
    pub steer_angle_delta_cmd: f64,
}

/// Replay statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub ticks: usize,
    pub skipped_lines: usize,
}

fn apply(table: &mut SignalTable, values: &MessageValues) {
    for (message, signals) in values {
        table.update_message(message, signals.iter().map(|(s, v)| (s.as_str(), *v)));
    }
}

/// Run every tick of `input` through `fusion`, writing one JSON line per tick
pub fn run<R: BufRead, W: Write>(
    fusion: &mut StateFusion,
    input: R,
    mut output: W,
    max_ticks: Option<usize>,
) -> Result<ReplayStats> {
    let model = fusion.model();
    let mut pt = SignalTable::new(&pt_definition(model));
    let mut chassis = SignalTable::new(&chassis_definition(model));
    let mut actuator = SignalTable::new(&actuator_definition());

    let mut stats = ReplayStats::default();

    for (line_no, line) in input.lines().enumerate() {
        if max_ticks.is_some_and(|max| stats.ticks >= max) {
            log::info!("Reached tick limit ({})", stats.ticks);
            break;
        }

        let line = line.with_context(|| format!("Failed to read replay line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let tick: ReplayTick = match serde_json::from_str(&line) {
            Ok(tick) => tick,
            Err(e) => {
                log::warn!("Skipping replay line {}: {}", line_no + 1, e);
                stats.skipped_lines += 1;
                continue;
            }
        };

        apply(&mut pt, &tick.pt);
        apply(&mut chassis, &tick.chassis);
        apply(&mut actuator, &tick.actuator);

        let state = fusion.update(&pt, &chassis, &actuator);
        let record = ReplayOutput {
            tick: stats.ticks,
            timestamp: tick.timestamp,
            state: &state,
            steer_angle_delta_cmd: fusion.steer_angle_delta_cmd(),
        };
        serde_json::to_writer(&mut output, &record)?;
        writeln!(output)?;

        log::trace!("Tick {}: v_ego={:.3} gear={:?}", stats.ticks, state.v_ego, state.gear_shifter);
        stats.ticks += 1;
    }

    output.flush()?;
    Ok(stats)
}
