//! Car State CLI Application
//!
//! Replays recorded per-tick CAN signal tables through the car state fusion
//! library and prints one JSON snapshot per tick. Useful for checking a vehicle
//! DBC and fusion settings against a drive before putting them in the loop.

use anyhow::{bail, Context, Result};
use carstate_fusion::{FusionConfig, StateFusion, VehicleModel};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod replay;

/// Car State - Fuse decoded CAN signal tables into vehicle state snapshots
#[derive(Parser, Debug)]
#[command(name = "carstate-cli")]
#[command(about = "Replay decoded CAN signal tables through the car state fusion core", long_about = None)]
#[command(version)]
struct Args {
    /// Vehicle model (E82, E90, E82_DCC, E90_DCC)
    #[arg(short, long, value_name = "MODEL")]
    model: Option<String>,

    /// Vehicle DBC file with the shift lever value table
    #[arg(long, value_name = "FILE")]
    dbc: Option<PathBuf>,

    /// JSON-lines recording of per-tick signal tables (default: stdin)
    #[arg(short, long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Output file for snapshots (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stored unit preference is imperial
    #[arg(long)]
    imperial: bool,

    /// Infer the cruise setpoint unit from the current speed
    #[arg(long)]
    unit_auto_detect: bool,

    /// Maximum number of ticks to replay (for testing)
    #[arg(long, value_name = "COUNT")]
    max_ticks: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

/// Settings after merging the config file with command line flags
struct Settings {
    model: VehicleModel,
    dbc: PathBuf,
    is_metric: bool,
    fusion: FusionConfig,
    replay: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Car State CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using fusion library v{}", carstate_fusion::VERSION);

    let settings = resolve_settings(&args)?;

    let mut fusion = StateFusion::from_dbc(
        settings.model,
        &settings.dbc,
        settings.is_metric,
        settings.fusion,
    )
    .with_context(|| format!("Failed to build gear table from {:?}", settings.dbc))?;

    let input: Box<dyn io::BufRead> = match &settings.replay {
        Some(path) => {
            log::info!("Replaying {:?}", path);
            let file = File::open(path).with_context(|| format!("Failed to open replay file: {:?}", path))?;
            Box::new(BufReader::new(file))
        }
        None => {
            log::info!("Replaying from stdin");
            Box::new(BufReader::new(io::stdin()))
        }
    };

    let output: Box<dyn Write> = match &settings.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let stats = replay::run(&mut fusion, input, output, args.max_ticks)?;
    log::info!(
        "Replayed {} ticks ({} lines skipped)",
        stats.ticks,
        stats.skipped_lines
    );

    Ok(())
}

/// Merge config file and flags; flags win
fn resolve_settings(args: &Args) -> Result<Settings> {
    let file_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            Some(config::load_config(path)?)
        }
        None => None,
    };

    let model = match (&args.model, &file_config) {
        (Some(name), _) => name.parse::<VehicleModel>()?,
        (None, Some(cfg)) => cfg.vehicle.model,
        (None, None) => bail!("No vehicle model given (use --model or --config)"),
    };

    let dbc = match (&args.dbc, &file_config) {
        (Some(path), _) => path.clone(),
        (None, Some(cfg)) => cfg.vehicle.dbc.clone(),
        (None, None) => bail!("No vehicle DBC given (use --dbc or --config)"),
    };

    let is_metric = if args.imperial {
        false
    } else {
        file_config.as_ref().map_or(true, |cfg| cfg.vehicle.is_metric)
    };

    let mut fusion = file_config
        .as_ref()
        .map(|cfg| cfg.fusion.clone())
        .unwrap_or_default();
    if args.unit_auto_detect {
        fusion = fusion.with_unit_auto_detect(true);
    }

    let replay = args
        .replay
        .clone()
        .or_else(|| file_config.as_ref().and_then(|cfg| cfg.input.replay.clone()));
    let output = args
        .output
        .clone()
        .or_else(|| file_config.as_ref().and_then(|cfg| cfg.input.output.clone()));

    log::debug!("Model {} ({:?}), DBC {:?}, metric={}", model, model.variant(), dbc, is_metric);

    Ok(Settings {
        model,
        dbc,
        is_metric,
        fusion,
        replay,
        output,
    })
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_only() {
        let args = Args::parse_from([
            "carstate-cli",
            "--model",
            "e82_dcc",
            "--dbc",
            "bmw.dbc",
            "--imperial",
            "--unit-auto-detect",
        ]);
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.model, VehicleModel::E82Dcc);
        assert_eq!(settings.dbc, PathBuf::from("bmw.dbc"));
        assert!(!settings.is_metric);
        assert!(settings.fusion.unit_auto_detect);
        assert!(settings.replay.is_none());
    }

    #[test]
    fn test_missing_model() {
        let args = Args::parse_from(["carstate-cli", "--dbc", "bmw.dbc"]);
        assert!(resolve_settings(&args).is_err());
    }

    #[test]
    fn test_unknown_model_flag() {
        let args = Args::parse_from(["carstate-cli", "--model", "F30", "--dbc", "bmw.dbc"]);
        assert!(resolve_settings(&args).is_err());
    }
}
