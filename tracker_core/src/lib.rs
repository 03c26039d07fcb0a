#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core tracking logic (hardware-agnostic).
//!
//! All device access goes through `tracker_traits::Camera` and
//! `tracker_traits::SerialLink`.
//!
//! ## Architecture
//!
//! - **Localizer**: background model, threshold, erosion, centroid, or
//!   pointing-device clicks (`localizer`, `background`, `click`)
//! - **Transform**: validated 3x3 homography, pixel to stage (`transform`)
//! - **Stage**: line protocol, handshake, homing, deadband (`protocol`, `stage`)
//! - **Loop**: per-cycle orchestration with blind/paralyzed modes and
//!   cooperative cancellation (`tracker`, `cancel`, `builder`)

pub mod background;
pub mod builder;
pub mod calibration;
pub mod cancel;
pub mod click;
pub mod config;
pub mod conversions;
pub mod error;
pub mod fps;
pub mod hw_error;
pub mod localizer;
pub mod mocks;
pub mod protocol;
pub mod stage;
pub mod status;
pub mod tracker;
pub mod transform;

pub use builder::{DynTracker, Missing, Set, TrackerBuilder, build_tracker};
pub use calibration::{CalibrationSource, FileCalibration, StaticCalibration};
pub use cancel::CancelToken;
pub use click::{ClickReceiver, ClickSender, click_channel};
pub use config::{BackgroundKind, LocalizerCfg, LoopCfg, Polarity, StageCfg};
pub use error::{BuildError, TrackerError, TransformError};
pub use localizer::{Locate, Localizer, PixelPoint};
pub use stage::{HomingState, MoveOutcome, StageController};
pub use status::{CycleOutcome, RunStats};
pub use tracker::Tracker;
pub use transform::{CoordinateTransform, Homography, StagePoint};
