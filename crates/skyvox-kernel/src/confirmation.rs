//! Pending confirmations and per-session policy state.
//!
//! A session is either *idle* or *awaiting confirmation* of exactly one
//! high-risk command.  A [`PendingConfirmation`] records what is waiting and
//! when it was requested; it expires lazily, i.e. an entry older than the
//! configured timeout is treated as absent whether or not anything has
//! removed it yet.

use std::time::{Duration, Instant};

use serde::Serialize;
use skyvox_types::{Intent, Slots};

use crate::rate_limiter::RateLimitWindow;

/// A high-risk command waiting for the operator to confirm it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    pub intent: Intent,
    pub slots: Slots,
    pub normalized_command: String,
    pub requested_at: Instant,
}

impl PendingConfirmation {
    pub fn new(
        intent: Intent,
        slots: Slots,
        normalized_command: &str,
        requested_at: Instant,
    ) -> Self {
        Self {
            intent,
            slots,
            normalized_command: normalized_command.to_string(),
            requested_at,
        }
    }

    /// Time elapsed since the confirmation was requested.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.requested_at)
    }

    /// `true` once the entry is older than `timeout`.  An entry exactly
    /// `timeout` old is still redeemable.
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        self.age(now) > timeout
    }
}

/// Where a session sits in the confirmation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Idle,
    AwaitingConfirm,
}

/// Everything the gate remembers about one session.
#[derive(Debug, Default)]
pub struct SessionState {
    pub pending: Option<PendingConfirmation>,
    pub window: RateLimitWindow,
}

impl SessionState {
    pub fn phase(&self, now: Instant, timeout: Duration) -> SessionPhase {
        match &self.pending {
            Some(p) if !p.is_expired(now, timeout) => SessionPhase::AwaitingConfirm,
            _ => SessionPhase::Idle,
        }
    }

    /// Drop an expired pending entry.  Returns `true` if one was removed.
    pub fn expire_pending(&mut self, now: Instant, timeout: Duration) -> bool {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.is_expired(now, timeout))
        {
            self.pending = None;
            return true;
        }
        false
    }

    /// `true` when the session holds nothing worth keeping.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && self.window.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn pending_at(t: Instant) -> PendingConfirmation {
        PendingConfirmation::new(Intent::Takeoff, Slots::default(), "TAKEOFF", t)
    }

    #[test]
    fn fresh_pending_is_not_expired() {
        let t0 = Instant::now();
        assert!(!pending_at(t0).is_expired(t0, TIMEOUT));
    }

    #[test]
    fn pending_expires_after_timeout() {
        let t0 = Instant::now();
        let p = pending_at(t0);
        assert!(!p.is_expired(t0 + TIMEOUT, TIMEOUT));
        assert!(p.is_expired(t0 + TIMEOUT + Duration::from_millis(1), TIMEOUT));
    }

    #[test]
    fn phase_reflects_pending_and_expiry() {
        let t0 = Instant::now();
        let mut state = SessionState::default();
        assert_eq!(state.phase(t0, TIMEOUT), SessionPhase::Idle);

        state.pending = Some(pending_at(t0));
        assert_eq!(state.phase(t0, TIMEOUT), SessionPhase::AwaitingConfirm);

        // Expired entries are inert even before anything removes them.
        let later = t0 + Duration::from_secs(1);
        assert_eq!(state.phase(later, TIMEOUT), SessionPhase::Idle);
        assert!(state.pending.is_some());
    }

    #[test]
    fn expire_pending_removes_only_stale_entries() {
        let t0 = Instant::now();
        let mut state = SessionState {
            pending: Some(pending_at(t0)),
            ..Default::default()
        };
        assert!(!state.expire_pending(t0, TIMEOUT));
        assert!(state.pending.is_some());
        assert!(state.expire_pending(t0 + Duration::from_secs(1), TIMEOUT));
        assert!(state.pending.is_none());
        assert!(state.is_idle());
    }

    #[test]
    fn age_never_underflows() {
        let t0 = Instant::now();
        let p = pending_at(t0 + Duration::from_secs(1));
        assert_eq!(p.age(t0), Duration::ZERO);
    }

    #[test]
    fn phase_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&SessionPhase::AwaitingConfirm).unwrap(),
            "\"AWAITING_CONFIRM\""
        );
    }
}
