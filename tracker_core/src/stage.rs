//! Stage motion controller: handshake, homing state machine, deadbanded moves.

use std::time::Duration;

use eyre::WrapErr;
use tracker_traits::SerialLink;

use crate::config::StageCfg;
use crate::error::{Result, TrackerError};
use crate::hw_error::map_hw_error;
use crate::protocol::{StageCommand, parse_bool};
use crate::transform::StagePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomingState {
    #[default]
    NotHomed,
    Homing,
    Homed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Command transmitted for the rounded target.
    Sent { x: i64, y: i64 },
    /// Within the deadband of the last commanded target; nothing sent.
    Deadbanded,
    /// Stage not homed; nothing sent.
    NotHomed,
}

/// Rounded coordinates that convert to `i64` without saturating.
const I64_RANGE: std::ops::Range<f64> = (i64::MIN as f64)..(i64::MAX as f64);

macro_rules! echo {
    ($debug:expr, $dir:literal, $line:expr) => {
        if $debug {
            tracing::info!(target: "tracker::serial", dir = $dir, line = %$line);
        } else {
            tracing::trace!(target: "tracker::serial", dir = $dir, line = %$line);
        }
    };
}

pub struct StageController<L: SerialLink> {
    link: L,
    cfg: StageCfg,
    state: HomingState,
    last_target: Option<(i64, i64)>,
    connected: bool,
}

impl<L: SerialLink> std::fmt::Debug for StageController<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageController")
            .field("device", &self.cfg.device_path)
            .field("state", &self.state)
            .field("last_target", &self.last_target)
            .field("connected", &self.connected)
            .finish()
    }
}

impl<L: SerialLink> StageController<L> {
    pub fn new(link: L, cfg: StageCfg) -> Self {
        Self {
            link,
            cfg,
            state: HomingState::NotHomed,
            last_target: None,
            connected: false,
        }
    }

    pub fn state(&self) -> HomingState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_target(&self) -> Option<(i64, i64)> {
        self.last_target
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn config(&self) -> &StageCfg {
        &self.cfg
    }

    /// Open the link and verify the controller identity.
    pub fn connect(&mut self) -> Result<()> {
        if !self.link.device_present() {
            return Err(eyre::Report::new(TrackerError::DevicePathMissing(
                self.cfg.device_path.clone(),
            )));
        }
        self.link
            .open()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("opening {}", self.cfg.device_path))?;
        self.connected = true;

        let id = match self.query(StageCommand::GetDeviceId) {
            Ok(id) => id,
            Err(e) => {
                self.close_quietly();
                let msg = format!("no identity response: {e:#}");
                return Err(eyre::Report::new(TrackerError::Handshake(msg)));
            }
        };
        if !id.contains(&self.cfg.device_id_token) {
            self.close_quietly();
            return Err(eyre::Report::new(TrackerError::Handshake(format!(
                "device answered {id:?}, expected it to contain {:?}",
                self.cfg.device_id_token
            ))));
        }
        tracing::info!(device = %self.cfg.device_path, id = %id, "stage connected");
        Ok(())
    }

    /// Close the link. Errors are logged, not returned.
    pub fn disconnect(&mut self) {
        if self.connected {
            self.close_quietly();
            tracing::info!(device = %self.cfg.device_path, "stage disconnected");
        }
    }

    fn close_quietly(&mut self) {
        if let Err(e) = self.link.close() {
            tracing::warn!(error = %e, "closing stage link failed");
        }
        self.connected = false;
    }

    /// Start homing. Forgets the last commanded target.
    pub fn home(&mut self) -> Result<()> {
        self.send(StageCommand::Home).wrap_err("home")?;
        self.state = HomingState::Homing;
        self.last_target = None;
        tracing::info!("homing requested");
        Ok(())
    }

    /// Ask the controller whether homing has finished.
    ///
    /// Only a `Homing` controller becomes `Homed`; a positive answer before
    /// `home()` is reported but leaves the state untouched.
    pub fn is_homed(&mut self) -> Result<bool> {
        let resp = self.query(StageCommand::QueryHomed).wrap_err("isHomed")?;
        let homed = parse_bool(&resp);
        match self.state {
            HomingState::Homing if homed => {
                self.state = HomingState::Homed;
                tracing::info!("stage homed");
            }
            HomingState::NotHomed if homed => {
                tracing::debug!("controller reports homed before home(); ignoring");
            }
            _ => {}
        }
        Ok(homed)
    }

    /// Command an absolute move. Only transmits once homed and when the
    /// rounded target is at least `deadband` away from the last one.
    pub fn move_to(&mut self, p: StagePoint) -> Result<MoveOutcome> {
        if self.state != HomingState::Homed {
            return Ok(MoveOutcome::NotHomed);
        }
        if !p.x.is_finite() || !p.y.is_finite() {
            return Err(eyre::Report::new(TrackerError::State(format!(
                "non-finite stage target {p:?}"
            ))));
        }
        let (rx, ry) = (p.x.round(), p.y.round());
        if !I64_RANGE.contains(&rx) || !I64_RANGE.contains(&ry) {
            return Err(eyre::Report::new(TrackerError::State(format!(
                "stage target {p:?} outside the addressable range"
            ))));
        }
        let (x, y) = (rx as i64, ry as i64);
        if let Some((lx, ly)) = self.last_target {
            let d = (x as f64 - lx as f64).hypot(y as f64 - ly as f64);
            if d < self.cfg.deadband {
                return Ok(MoveOutcome::Deadbanded);
            }
        }
        self.send(StageCommand::MoveTo { x, y }).wrap_err("moveStageTo")?;
        self.last_target = Some((x, y));
        Ok(MoveOutcome::Sent { x, y })
    }

    fn send(&mut self, cmd: StageCommand) -> Result<()> {
        let line = cmd.to_string();
        echo!(self.cfg.debug, "tx", line);
        self.link
            .write_line(&line)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
    }

    fn query(&mut self, cmd: StageCommand) -> Result<String> {
        debug_assert!(cmd.expects_response(), "{cmd} has no response");
        self.send(cmd)?;
        self.read_response()
    }

    /// Read one non-empty response line, retrying empty reads and timeouts.
    fn read_response(&mut self) -> Result<String> {
        let timeout = Duration::from_millis(self.cfg.read_timeout_ms);
        let attempts = self.cfg.max_read_attempts.max(1);
        for attempt in 1..=attempts {
            match self.link.read_line(timeout) {
                Ok(Some(line)) if !line.trim().is_empty() => {
                    echo!(self.cfg.debug, "rx", line);
                    return Ok(line);
                }
                Ok(_) => {}
                Err(e) => match map_hw_error(&*e) {
                    TrackerError::Timeout => {}
                    other => return Err(eyre::Report::new(other)),
                },
            }
            tracing::trace!(attempt, attempts, "no response yet");
        }
        Err(eyre::Report::new(TrackerError::ReadRetriesExhausted(
            attempts,
        )))
    }
}

impl<L: SerialLink> Drop for StageController<L> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
