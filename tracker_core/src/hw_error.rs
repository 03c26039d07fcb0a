//! Maps `Box<dyn Error>` from trait boundaries to typed `TrackerError`.
//!
//! With the `hardware-errors` feature, `tracker_hardware::HwError` is
//! downcast for a precise mapping; otherwise the message is inspected.

use crate::error::TrackerError;

pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> TrackerError {
    #[cfg(feature = "hardware-errors")]
    {
        use tracker_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => TrackerError::Timeout,
                HwError::DeviceMissing(p) => TrackerError::DevicePathMissing(p.clone()),
                HwError::Io(io) => TrackerError::Io(io.to_string()),
                other => TrackerError::HardwareFault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        if io.kind() == std::io::ErrorKind::TimedOut {
            return TrackerError::Timeout;
        }
        return TrackerError::Io(io.to_string());
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        TrackerError::Timeout
    } else {
        TrackerError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e: Box<dyn std::error::Error + Send + Sync> = "read timeout on stage".into();
        assert!(matches!(map_hw_error(e.as_ref()), TrackerError::Timeout));
    }

    #[test]
    fn io_timed_out_maps_to_timeout() {
        let e = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(matches!(map_hw_error(&e), TrackerError::Timeout));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_error_is_downcast() {
        let e = tracker_hardware::error::HwError::NotOpen;
        assert!(matches!(map_hw_error(&e), TrackerError::HardwareFault(_)));
    }
}
