//! [`RateLimitWindow`] – per-session sliding-window command counter.
//!
//! # Algorithm
//!
//! The window keeps the timestamps of accepted commands in arrival order.
//! On every [`try_acquire`][RateLimitWindow::try_acquire] call, timestamps
//! older than the window are dropped from the front; if `max` timestamps
//! remain the command is refused, otherwise `now` is appended.  Refused
//! attempts are not recorded, so hammering a limited session does not push
//! its recovery further out.
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use skyvox_kernel::rate_limiter::RateLimitWindow;
//!
//! let mut window = RateLimitWindow::new();
//! let t0 = Instant::now();
//! let span = Duration::from_secs(1);
//!
//! assert!(window.try_acquire(t0, 2, span));
//! assert!(window.try_acquire(t0, 2, span));
//! assert!(!window.try_acquire(t0, 2, span)); // third inside the window
//!
//! // Once the window has slid past both entries the session recovers.
//! assert!(window.try_acquire(t0 + span, 2, span));
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Timestamps of recently accepted commands for one session.
#[derive(Debug, Default, Clone)]
pub struct RateLimitWindow {
    history: VecDeque<Instant>,
}

impl RateLimitWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a command at `now` if fewer than `max` commands were accepted
    /// within the trailing `window`.  Returns `false` (and records nothing)
    /// when the session is over its limit.
    pub fn try_acquire(&mut self, now: Instant, max: usize, window: Duration) -> bool {
        self.prune(now, window);
        if self.history.len() >= max {
            return false;
        }
        self.history.push_back(now);
        true
    }

    /// Time until the oldest entry leaves the window, i.e. until the next
    /// command would be accepted.  `None` when the window is empty.
    pub fn retry_after(&self, now: Instant, window: Duration) -> Option<Duration> {
        let oldest = *self.history.front()?;
        Some(window.saturating_sub(now.saturating_duration_since(oldest)))
    }

    /// Drop entries that fell out of the trailing `window`.
    pub fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.history.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of commands currently counted against the session.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
