//! Backend assembly: camera and stage link from config and build features.
//!
//! Without the `hardware` feature the stage is simulated. Test hooks:
//! `TRACKER_TEST_SIM_DEVICE_ID` replaces the simulated identity line,
//! `TRACKER_TEST_SIM_ABSENT=1` hides the simulated device node,
//! `TRACKER_TEST_SIM_HOMING_POLLS` sets how many polls homing takes.

use eyre::Result;
use tracker_config::{CameraBackend, CameraCfg, StageCfg};
use tracker_core::TrackerError;
use tracker_hardware::{ReplayCamera, SimulatedCamera};
use tracker_traits::{Camera, SerialLink};

pub fn make_camera(cfg: &CameraCfg) -> Result<Box<dyn Camera>> {
    match cfg.backend {
        CameraBackend::Simulated => {
            tracing::info!(width = cfg.width, height = cfg.height, "using simulated camera");
            Ok(Box::new(
                SimulatedCamera::new(cfg.width, cfg.height).with_rate(cfg.sample_rate_hz),
            ))
        }
        CameraBackend::Replay => {
            let dir = cfg.frames_dir.as_ref().ok_or_else(|| {
                eyre::Report::new(TrackerError::Config(
                    "camera.frames_dir is required for the replay backend".into(),
                ))
            })?;
            let cam = ReplayCamera::from_dir(dir).map_err(|e| {
                eyre::Report::new(TrackerError::Config(format!(
                    "camera.frames_dir {}: {e}",
                    dir.display()
                )))
            })?;
            Ok(Box::new(cam.with_rate(cfg.sample_rate_hz)))
        }
    }
}

#[cfg(feature = "hardware")]
pub fn make_link(cfg: &StageCfg) -> Box<dyn SerialLink> {
    tracing::info!(device = %cfg.device_path, baud = cfg.baud_rate, "using serial stage");
    Box::new(tracker_hardware::SerialPortLink::new(
        cfg.device_path.clone(),
        cfg.baud_rate,
    ))
}

#[cfg(not(feature = "hardware"))]
pub fn make_link(_cfg: &StageCfg) -> Box<dyn SerialLink> {
    let mut stage = tracker_hardware::SimulatedStage::new();
    if let Ok(id) = std::env::var("TRACKER_TEST_SIM_DEVICE_ID") {
        stage = stage.with_device_id(id);
    }
    if std::env::var("TRACKER_TEST_SIM_ABSENT").is_ok_and(|v| v == "1") {
        stage = stage.absent();
    }
    if let Some(n) = std::env::var("TRACKER_TEST_SIM_HOMING_POLLS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        stage = stage.with_homing_polls(n);
    }
    tracing::info!("using simulated stage");
    Box::new(stage)
}
