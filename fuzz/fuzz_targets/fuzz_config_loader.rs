#![no_main]
use libfuzzer_sys::fuzz_target;

// Arbitrary TOML must either be rejected or validate without panicking,
// and inline calibration rows must resolve without panicking.
fuzz_target!(|data: &str| {
    if let Ok(cfg) = tracker_config::load_toml(data) {
        if cfg.validate().is_ok() && cfg.calibration.path.is_none() {
            let _ = cfg.calibration_rows();
        }
    }
    let _ = tracker_config::load_calibration_toml(data);
});
