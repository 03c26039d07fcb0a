//! Human-readable error descriptions and structured JSON error formatting.

use tracker_core::error::{BuildError, TrackerError, TransformError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingCamera => {
                "What happened: No camera was provided to the tracker.\nLikely causes: The camera backend failed to initialize.\nHow to fix: Check [camera] in the config.".to_string()
            }
            BuildError::MissingStage => {
                "What happened: No stage link was provided to the tracker.\nLikely causes: The stage backend failed to initialize.\nHow to fix: Check [stage] in the config.".to_string()
            }
            BuildError::MissingTransform => {
                "What happened: No calibration was loaded.\nLikely causes: The calibration step was skipped.\nHow to fix: Set calibration.path or pass --calibration.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TrackerError>() {
        return match te {
            TrackerError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo or out-of-range value in the TOML.\nHow to fix: Edit the config file and try again."
            ),
            TrackerError::Calibration(msg) => format!(
                "What happened: Calibration could not be loaded ({msg}).\nLikely causes: Missing file, a matrix that is not 3x3, or a singular matrix.\nHow to fix: Re-run the calibration and point calibration.path (or --calibration) at the result."
            ),
            TrackerError::DevicePathMissing(path) => format!(
                "What happened: Stage controller {path} is not present.\nLikely causes: USB cable unplugged or the device enumerated under another name.\nHow to fix: Plug in the controller and set stage.device_path; or run with --paralyzed."
            ),
            TrackerError::Handshake(msg) => format!(
                "What happened: Stage handshake failed ({msg}).\nLikely causes: Another device is attached at stage.device_path, or wrong baud rate.\nHow to fix: Check stage.device_path, stage.baud_rate and stage.device_id_token."
            ),
            TrackerError::ReadRetriesExhausted(n) => format!(
                "What happened: The stage did not answer after {n} read attempts.\nLikely causes: Controller busy or firmware hung.\nHow to fix: Power-cycle the controller or raise stage.max_read_attempts."
            ),
            TrackerError::Timeout => {
                "What happened: A device read timed out.\nLikely causes: Camera or stage not responding.\nHow to fix: Check connections and raise camera.frame_timeout_ms or stage.read_timeout_ms.".to_string()
            }
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(TransformError::AtInfinity) = err.downcast_ref::<TransformError>() {
        return "What happened: A point mapped to infinity.\nLikely causes: Degenerate calibration.\nHow to fix: Re-run the calibration.".to_string();
    }

    let msg = format!("{err:#}");
    format!("Something went wrong.\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}")
}

/// Stable exit codes per failure class.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(BuildError::InvalidConfig(_)) = err.downcast_ref::<BuildError>() {
        return 2;
    }
    match err.downcast_ref::<TrackerError>() {
        Some(TrackerError::Config(_)) => 2,
        Some(TrackerError::Calibration(_)) => 3,
        Some(TrackerError::Handshake(_)) => 4,
        Some(TrackerError::DevicePathMissing(_)) => 5,
        _ => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<TrackerError>() {
        Some(TrackerError::Config(_)) => "Config",
        Some(TrackerError::Calibration(_)) => "Calibration",
        Some(TrackerError::Handshake(_)) => "Handshake",
        Some(TrackerError::DevicePathMissing(_)) => "DevicePathMissing",
        Some(TrackerError::ReadRetriesExhausted(_)) => "ReadRetriesExhausted",
        Some(TrackerError::Timeout) => "Timeout",
        Some(_) => "Hardware",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
