//! Test and helper mocks for tracker_core

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracker_traits::{BoxError, Camera, Frame, SerialLink};

/// A camera that never delivers; useful in blind mode where frames are
/// never requested.
pub struct NoCamera;

impl Camera for NoCamera {
    fn start(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn acquire(&mut self, _timeout: Duration) -> Result<Frame, BoxError> {
        Err(Box::new(std::io::Error::other("no camera")))
    }
}

/// Camera that replays a fixed list of frames, then reports a timeout.
pub struct ScriptedCamera {
    frames: VecDeque<Frame>,
}

impl ScriptedCamera {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl Camera for ScriptedCamera {
    fn start(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn acquire(&mut self, _timeout: Duration) -> Result<Frame, BoxError> {
        self.frames
            .pop_front()
            .ok_or_else(|| Box::new(std::io::Error::from(std::io::ErrorKind::TimedOut)) as BoxError)
    }
}

/// Lines written to a [`ScriptedLink`], shared with the test.
#[derive(Debug, Clone, Default)]
pub struct Written(Arc<Mutex<Vec<String>>>);

impl Written {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }
}

/// Serial link answering configured commands with canned responses.
///
/// `respond_seq` answers successive writes of a command in order and then
/// repeats the final answer.
#[derive(Default)]
pub struct ScriptedLink {
    present: bool,
    open: bool,
    replies: HashMap<String, VecDeque<String>>,
    pending: VecDeque<String>,
    empty_reads: u32,
    empty_left: u32,
    fail_reads: bool,
    written: Written,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self {
            present: true,
            ..Self::default()
        }
    }

    pub fn respond(self, cmd: &str, response: &str) -> Self {
        self.respond_seq(cmd, &[response])
    }

    pub fn respond_seq(mut self, cmd: &str, responses: &[&str]) -> Self {
        self.replies.insert(
            cmd.to_string(),
            responses.iter().map(|s| (*s).to_string()).collect(),
        );
        self
    }

    pub fn with_empty_reads(mut self, n: u32) -> Self {
        self.empty_reads = n;
        self
    }

    /// Every read fails with a non-timeout error.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    pub fn written(&self) -> Written {
        self.written.clone()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl SerialLink for ScriptedLink {
    fn device_present(&self) -> bool {
        self.present
    }

    fn open(&mut self) -> Result<(), BoxError> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.open = false;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        if !self.open {
            return Err(Box::new(std::io::Error::from(
                std::io::ErrorKind::NotConnected,
            )));
        }
        if let Ok(mut w) = self.written.0.lock() {
            w.push(line.to_string());
        }
        if let Some(q) = self.replies.get_mut(line) {
            let reply = if q.len() > 1 { q.pop_front() } else { q.front().cloned() };
            if let Some(r) = reply {
                self.pending.push_back(r);
                self.empty_left = self.empty_reads;
            }
        }
        Ok(())
    }

    fn read_line(&mut self, _timeout: Duration) -> Result<Option<String>, BoxError> {
        if self.fail_reads {
            return Err(Box::new(std::io::Error::from(
                std::io::ErrorKind::BrokenPipe,
            )));
        }
        if self.empty_left > 0 {
            self.empty_left -= 1;
            return Ok(None);
        }
        Ok(self.pending.pop_front())
    }
}
