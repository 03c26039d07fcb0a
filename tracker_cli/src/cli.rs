//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tracker", version, about = "Closed-loop organism tracker")]
pub struct Cli {
    /// Path to config TOML; built-in defaults (simulated backends) when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Calibration file (TOML with homography_image_to_stage, or CSV h0,h1,h2);
    /// overrides [calibration] in the config
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track the organism until interrupted
    Run {
        /// Target clicks read from stdin ("x y" per line) instead of blob detection
        #[arg(long, action = ArgAction::SetTrue)]
        mouse: bool,
        /// Do not acquire frames
        #[arg(long, action = ArgAction::SetTrue)]
        blind: bool,
        /// Localize and transform but never move the stage
        #[arg(long, action = ArgAction::SetTrue)]
        paralyzed: bool,
        /// Echo every stage protocol line at info level
        #[arg(long, action = ArgAction::SetTrue)]
        debug: bool,
        /// Stop after this many control-loop cycles
        #[arg(long, value_name = "N")]
        max_cycles: Option<u64>,
    },
    /// Verify config, calibration, camera and stage handshake, then exit
    SelfCheck,
}
