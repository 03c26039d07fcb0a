mod cli;
mod error_fmt;
mod hw;
mod logging;
mod pointer;
mod track;

use clap::Parser;
use eyre::WrapErr;
use tracker_core::{CancelToken, RunStats};

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        tracing::error!(error = %format!("{e:#}"), "tracker failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn print_stats(stats: &RunStats, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "cycles": stats.cycles,
                "frames": stats.frames,
                "targets": stats.targets,
                "moves": stats.moves,
                "deadbanded": stats.deadbanded,
                "homing_polls": stats.homing_polls,
                "stage_errors": stats.stage_errors,
                "frame_errors": stats.frame_errors,
            })
        );
    } else {
        println!(
            "tracking finished: cycles={} frames={} targets={} moves={} deadbanded={} stage_errors={}",
            stats.cycles,
            stats.frames,
            stats.targets,
            stats.moves,
            stats.deadbanded,
            stats.stage_errors
        );
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    if !cli.json {
        let _ = color_eyre::install();
    }
    let mut cfg = track::load_config(cli.config.as_deref())?;
    if let Some(path) = cli.calibration {
        cfg.calibration.path = Some(path);
    }
    logging::init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            tracing::info!("interrupt received; stopping after this cycle");
            cancel.cancel();
        })
        .wrap_err("installing Ctrl-C handler")?;
    }

    match cli.cmd {
        Commands::Run {
            mouse,
            blind,
            paralyzed,
            debug,
            max_cycles,
        } => {
            if mouse {
                cfg.localizer.mode = tracker_config::TargetMode::Mouse;
            }
            cfg.run.blind |= blind;
            cfg.run.paralyzed |= paralyzed;
            cfg.run.debug |= debug;
            let stats = track::run_tracking(&cfg, max_cycles, &cancel)?;
            print_stats(&stats, cli.json);
        }
        Commands::SelfCheck => {
            track::self_check(&cfg)?;
            if cli.json {
                println!("{}", serde_json::json!({ "self_check": "ok" }));
            } else {
                println!("self-check ok");
            }
        }
    }
    Ok(())
}
