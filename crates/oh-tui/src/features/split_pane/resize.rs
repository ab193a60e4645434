//! Trailing-edge debounce for viewport resizes.

use std::time::{Duration, Instant};

/// Quiet period before a resize is applied.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Coalesces a burst of resize notifications into one.
///
/// Each `push` restarts the timer; `poll` yields the latest size once the
/// timer has run out.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    delay: Duration,
    pending: Option<((u16, u16), Instant)>,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}

impl ResizeDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, size: (u16, u16), now: Instant) {
        self.pending = Some((size, now + self.delay));
    }

    pub fn poll(&mut self, now: Instant) -> Option<(u16, u16)> {
        match self.pending {
            Some((size, deadline)) if now >= deadline => {
                self.pending = None;
                Some(size)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
