//! Pointing-device input for manual targeting.
//!
//! The pointing-device collaborator owns a [`ClickSender`]; the localizer owns
//! the receiving end. A click is consumed by exactly one cycle.

use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::localizer::PixelPoint;

/// Bound on queued clicks; older clicks are superseded anyway.
pub const CLICK_QUEUE: usize = 64;

#[derive(Debug, Clone)]
pub struct ClickSender {
    tx: Sender<PixelPoint>,
    // Handle on the queue used to evict the oldest click when it is full.
    // It keeps the channel connected, so liveness is tracked through `alive`.
    evict: Receiver<PixelPoint>,
    alive: Weak<()>,
}

impl ClickSender {
    /// Report a click at pixel `(x, y)`. Returns `false` once the localizer
    /// is gone. When the queue is full the oldest pending click is evicted,
    /// so the newest click is never lost.
    pub fn click(&self, x: f64, y: f64) -> bool {
        if self.alive.strong_count() == 0 {
            return false;
        }
        let mut point = PixelPoint::new(x, y);
        loop {
            match self.tx.try_send(point) {
                Ok(()) => return true,
                Err(TrySendError::Full(p)) => {
                    if let Ok(old) = self.evict.try_recv() {
                        tracing::debug!(x = old.x, y = old.y, "click queue full; evicting oldest click");
                    }
                    point = p;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

#[derive(Debug)]
pub struct ClickReceiver {
    rx: Receiver<PixelPoint>,
    _alive: Arc<()>,
}

impl ClickReceiver {
    /// Drain pending clicks and return the most recent one.
    pub fn latest(&self) -> Option<PixelPoint> {
        self.rx.try_iter().last()
    }
}

pub fn click_channel() -> (ClickSender, ClickReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(CLICK_QUEUE);
    let alive = Arc::new(());
    let sender = ClickSender {
        tx,
        evict: rx.clone(),
        alive: Arc::downgrade(&alive),
    };
    (sender, ClickReceiver { rx, _alive: alive })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_click_wins_and_is_consumed() {
        let (tx, rx) = click_channel();
        assert!(tx.click(1.0, 2.0));
        assert!(tx.click(3.0, 4.0));
        assert_eq!(rx.latest(), Some(PixelPoint::new(3.0, 4.0)));
        assert_eq!(rx.latest(), None);
    }

    #[test]
    fn burst_beyond_queue_keeps_newest_click() {
        let (tx, rx) = click_channel();
        for i in 0..=CLICK_QUEUE {
            assert!(tx.click(i as f64, 0.0));
        }
        assert_eq!(rx.latest(), Some(PixelPoint::new(CLICK_QUEUE as f64, 0.0)));
        assert_eq!(rx.latest(), None);
    }

    #[test]
    fn sender_reports_dropped_receiver() {
        let (tx, rx) = click_channel();
        drop(rx);
        assert!(!tx.click(0.0, 0.0));
    }
}
