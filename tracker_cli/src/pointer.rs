//! Headless pointing device: clicks read from stdin as `x y` lines.

use std::io::BufRead;
use std::thread::JoinHandle;

use tracker_core::ClickSender;

/// Parse `x y` or `x,y` into finite pixel coordinates.
pub fn parse_click(line: &str) -> Option<(f64, f64)> {
    let mut it = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty());
    let x: f64 = it.next()?.parse().ok()?;
    let y: f64 = it.next()?.parse().ok()?;
    if it.next().is_some() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some((x, y))
}

pub fn spawn_stdin_clicks(tx: ClickSender) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("pointer".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_click(&line) {
                    Some((x, y)) => {
                        tracing::debug!(x, y, "click");
                        if !tx.click(x, y) {
                            break;
                        }
                    }
                    None => tracing::warn!(line = %line, "ignoring malformed click"),
                }
            }
        })
}
