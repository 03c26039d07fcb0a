use std::time::Duration;

/// Frame period for a pacing rate; `0` Hz means "do not pace".
pub fn period_from_hz(hz: u32) -> Option<Duration> {
    if hz == 0 {
        None
    } else {
        Some(Duration::from_micros((1_000_000 / u64::from(hz)).max(1)))
    }
}

/// Strip trailing `\r` characters from a received line.
pub fn strip_cr(line: &str) -> String {
    line.chars().filter(|c| *c != '\r').collect()
}

/// Log a failed best-effort step at `warn` and carry on.
pub fn warn_on_err<T, E: std::fmt::Display>(result: Result<T, E>, action: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, action, "best-effort step failed");
            None
        }
    }
}
