use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracker_traits::{BoxError, SerialLink};

use crate::error::HwError;
use crate::util;

/// Stage link over a USB CDC serial port, 8N1 without flow control.
pub struct SerialPortLink {
    path: String,
    baud: u32,
    port: Option<Box<dyn SerialPort>>,
    buf: Vec<u8>,
}

impl SerialPortLink {
    pub fn new(path: impl Into<String>, baud: u32) -> Self {
        Self {
            path: path.into(),
            baud,
            port: None,
            buf: Vec::with_capacity(256),
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&line[..line.len() - 1]);
        Some(util::strip_cr(&text))
    }
}

impl SerialLink for SerialPortLink {
    fn device_present(&self) -> bool {
        Path::new(&self.path).exists()
    }

    fn open(&mut self) -> Result<(), BoxError> {
        let port = serialport::new(&self.path, self.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|e| HwError::Serial(format!("{}: {e}", self.path)))?;
        util::warn_on_err(port.clear(serialport::ClearBuffer::All), "clearing serial buffers");
        self.buf.clear();
        self.port = Some(port);
        tracing::info!(path = %self.path, baud = self.baud, "serial port opened");
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        if self.port.take().is_some() {
            tracing::info!(path = %self.path, "serial port closed");
        }
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        let port = self.port.as_mut().ok_or(HwError::NotOpen)?;
        port.write_all(line.as_bytes()).map_err(HwError::Io)?;
        port.write_all(b"\n").map_err(HwError::Io)?;
        port.flush().map_err(HwError::Io)?;
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, BoxError> {
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; 128];
        loop {
            let port = self.port.as_mut().ok_or(HwError::NotOpen)?;
            match port.read(&mut chunk) {
                Ok(0) => {}
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    if let Some(line) = self.take_line() {
                        return Ok(Some(line));
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => {}
                Err(e) => return Err(Box::new(HwError::Io(e))),
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }
}
