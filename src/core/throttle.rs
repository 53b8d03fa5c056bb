//! Redraw throttle for the 2D canvases.
//!
//! During a drag every pointer-move mutates the box, but re-projecting a
//! large point cloud into three canvases each time is expensive. The
//! throttle coalesces redraw requests so a canvas repaints at most once per
//! interval; a request that arrives inside the window stays pending and is
//! released by `tick()` once the window has passed.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RedrawThrottle {
    interval: Duration,
    last_fire: Option<Instant>,
    pending: bool,
}

impl Default for RedrawThrottle {
    fn default() -> Self {
        Self::new(16)
    }
}

impl RedrawThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            last_fire: None,
            pending: false,
        }
    }

    pub fn set_interval(&mut self, interval_ms: u64) {
        self.interval = Duration::from_millis(interval_ms);
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval.as_millis() as u64
    }

    /// Request a redraw at `now`. Returns true if it may happen immediately.
    pub fn request_at(&mut self, now: Instant) -> bool {
        let open = match self.last_fire {
            None => true,
            Some(t) => now.duration_since(t) >= self.interval,
        };
        if open {
            self.last_fire = Some(now);
            self.pending = false;
            log::trace!("RedrawThrottle: fire");
        } else {
            self.pending = true;
        }
        open
    }

    pub fn request(&mut self) -> bool {
        self.request_at(Instant::now())
    }

    /// Release a coalesced request once its window has passed.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        self.request_at(now)
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Force the next request through (drag end, selection change).
    pub fn flush(&mut self) {
        self.last_fire = None;
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Time left until a pending request may fire.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        if !self.pending {
            return None;
        }
        let t = self.last_fire?;
        Some(self.interval.saturating_sub(now.duration_since(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_fires() {
        let mut throttle = RedrawThrottle::new(16);
        assert!(throttle.request_at(Instant::now()));
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_coalesces_within_window() {
        let mut throttle = RedrawThrottle::new(16);
        let t0 = Instant::now();
        assert!(throttle.request_at(t0));
        assert!(!throttle.request_at(t0 + Duration::from_millis(5)));
        assert!(!throttle.request_at(t0 + Duration::from_millis(10)));
        assert!(throttle.is_pending());
        assert!(!throttle.tick_at(t0 + Duration::from_millis(12)));
        assert!(throttle.tick_at(t0 + Duration::from_millis(17)));
        assert!(!throttle.is_pending());
        assert!(!throttle.tick_at(t0 + Duration::from_millis(40)));
    }

    #[test]
    fn test_flush_reopens() {
        let mut throttle = RedrawThrottle::new(1000);
        let t0 = Instant::now();
        assert!(throttle.request_at(t0));
        assert!(!throttle.request_at(t0));
        throttle.flush();
        assert!(throttle.request_at(t0));
    }

    #[test]
    fn test_remaining() {
        let mut throttle = RedrawThrottle::new(16);
        let t0 = Instant::now();
        throttle.request_at(t0);
        assert!(throttle.remaining_at(t0).is_none());
        throttle.request_at(t0 + Duration::from_millis(6));
        assert_eq!(throttle.remaining_at(t0 + Duration::from_millis(6)), Some(Duration::from_millis(10)));
    }
}
