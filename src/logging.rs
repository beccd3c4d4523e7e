//! Per-rank structured logging setup.
//!
//! Grounded on `SimulationBuilder::log_setup` (see DESIGN.md): rank 0
//! gets a combined terminal + file logger, every other rank gets a
//! file-only logger, and a verbosity count maps onto `log::LevelFilter` the
//! same way (0 -> Info, 1 -> Debug, >=2 -> Trace).

use log::LevelFilter;
use simplelog::ColorChoice;
use simplelog::CombinedLogger;
use simplelog::Config;
use simplelog::SharedLogger;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;
use std::fs::File;
use std::path::Path;

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the global logger for `rank`, writing to `log_dir/rank_<n>.log`
/// and, on rank 0 only, also to the terminal.
pub fn init(rank: i32, verbosity: u8, log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let level = level_for(verbosity);
    let log_path = log_dir.join(format!("rank_{rank}.log"));
    let file = File::create(&log_path)?;

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if rank == 0 {
        loggers.push(TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto));
    }
    loggers.push(WriteLogger::new(level, Config::default(), file));
    CombinedLogger::init(loggers)?;
    Ok(())
}
