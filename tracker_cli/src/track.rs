//! Config loading, tracker assembly, and the `run` / `self-check` commands.

use std::path::Path;
use std::time::Duration;

use eyre::{Result, WrapErr};
use tracker_config::{Config, TargetMode};
use tracker_core::{
    CancelToken, CoordinateTransform, DynTracker, LoopCfg, RunStats, StageController,
    TrackerError, click_channel,
};
use tracker_hardware::util::warn_on_err;
use tracker_traits::Camera;

use crate::hw::{make_camera, make_link};
use crate::pointer::spawn_stdin_clicks;

fn config_error(msg: String) -> eyre::Report {
    eyre::Report::new(TrackerError::Config(msg))
}

/// Read and validate the config; defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|e| config_error(format!("reading {}: {e}", p.display())))?;
            tracker_config::load_toml(&text)
                .map_err(|e| config_error(format!("parsing {}: {e}", p.display())))?
        }
        None => Config::default(),
    };
    cfg.validate().map_err(|e| config_error(format!("{e:#}")))?;
    Ok(cfg)
}

fn load_transform(cfg: &Config) -> Result<CoordinateTransform> {
    let mut transform = CoordinateTransform::new();
    transform.load(cfg)?;
    Ok(transform)
}

pub fn run_tracking(cfg: &Config, max_cycles: Option<u64>, cancel: &CancelToken) -> Result<RunStats> {
    // Calibration first: a bad matrix must fail before any device is touched.
    let transform = load_transform(cfg)?;
    let camera = make_camera(&cfg.camera)?;
    let link = make_link(&cfg.stage);

    let loop_cfg = LoopCfg {
        max_cycles,
        ..LoopCfg::from(cfg)
    };
    let mut builder = DynTracker::builder()
        .with_camera(camera)
        .with_stage(link)
        .with_transform(transform)
        .with_localizer((&cfg.localizer).into())
        .with_stage_cfg(cfg.into())
        .with_loop_cfg(loop_cfg);
    if cfg.localizer.mode == TargetMode::Mouse {
        let (tx, rx) = click_channel();
        spawn_stdin_clicks(tx).wrap_err("starting pointing-device reader")?;
        builder = builder.with_clicks(rx);
        tracing::info!("manual targeting: reading clicks from stdin");
    }
    let mut tracker = builder.build()?;

    tracker.connect()?;
    let res = tracker.run(cancel);
    tracker.disconnect();
    res
}

/// Start, grab one frame, stop. A failing stop is logged, not fatal.
fn check_camera(camera: &mut dyn Camera, timeout: Duration) -> Result<(u32, u32)> {
    camera
        .start()
        .map_err(|e| eyre::eyre!("{e}"))
        .wrap_err("starting camera")?;
    let frame = camera
        .acquire(timeout)
        .map_err(|e| eyre::eyre!("{e}"))
        .wrap_err("acquiring a frame")?;
    warn_on_err(camera.stop(), "stopping camera");
    Ok(frame.dimensions())
}

/// One pass over every collaborator without entering the loop.
pub fn self_check(cfg: &Config) -> Result<()> {
    load_transform(cfg)?;
    tracing::info!("calibration ok");

    if !cfg.run.blind {
        let mut camera = make_camera(&cfg.camera)?;
        let (width, height) = check_camera(
            camera.as_mut(),
            Duration::from_millis(cfg.camera.frame_timeout_ms),
        )?;
        tracing::info!(width, height, "camera ok");
    }

    if !cfg.run.paralyzed {
        let mut stage = StageController::new(make_link(&cfg.stage), cfg.into());
        stage.connect()?;
        stage.disconnect();
        tracing::info!("stage ok");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_traits::{BoxError, Frame};

    struct StickyCamera;

    impl Camera for StickyCamera {
        fn start(&mut self) -> std::result::Result<(), BoxError> {
            Ok(())
        }
        fn stop(&mut self) -> std::result::Result<(), BoxError> {
            Err("shutter jammed".into())
        }
        fn acquire(&mut self, _timeout: Duration) -> std::result::Result<Frame, BoxError> {
            Ok(Frame::new(8, 6))
        }
    }

    #[test]
    fn camera_check_survives_failed_stop() {
        let dims = check_camera(&mut StickyCamera, Duration::from_millis(5)).unwrap();
        assert_eq!(dims, (8, 6));
    }
}
