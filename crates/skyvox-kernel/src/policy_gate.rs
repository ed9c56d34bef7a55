//! [`PolicyGate`] – the safety checkpoint between the parser and the vehicle.
//!
//! Every parsed command passes through [`PolicyGate::evaluate`] before an
//! adapter may execute it.  Checks run in a fixed order:
//!
//! 1. **STOP override**: [`Intent::Stop`] is approved unconditionally.  It is
//!    never rate limited, never needs confirmation, and clears whatever
//!    confirmation the session had pending.
//! 2. **Rate limit**: at most `rate_limit_max` commands per session within a
//!    sliding `rate_limit_window_seconds`.  Refused attempts are not counted.
//! 3. **Confirmation redemption** (`confirm == true`): the session's pending
//!    command is approved if it exists, has not expired, and matches the
//!    caller's command.
//! 4. **Unrecognised**: [`Intent::Unknown`] without `confirm` is blocked.
//! 5. **Confirmation required**: `TAKEOFF`, `LAND`, and `RETURN_HOME` are
//!    parked as the session's pending command (replacing any earlier one)
//!    and answered with `NEEDS_CONFIRM`.
//! 6. Anything else is approved.
//!
//! State is kept per session behind its own mutex, so each evaluation is an
//! atomic read-modify-write for that session while distinct sessions proceed
//! in parallel.
//!
//! # Example
//!
//! ```
//! use skyvox_kernel::{PolicyConfig, PolicyGate};
//! use skyvox_types::{ExecutionStatus, Intent, Slots};
//!
//! let gate = PolicyGate::new(PolicyConfig::default());
//!
//! let first = gate
//!     .evaluate("op-1", Intent::Takeoff, &Slots::default(), "TAKEOFF", false)
//!     .unwrap();
//! assert_eq!(first.status, ExecutionStatus::NeedsConfirm);
//!
//! let confirmed = gate
//!     .evaluate("op-1", Intent::Unknown, &Slots::default(), "", true)
//!     .unwrap();
//! assert_eq!(confirmed.status, ExecutionStatus::Ok);
//! assert_eq!(confirmed.command.unwrap().intent, Intent::Takeoff);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};
use std::time::Instant;

use serde::Serialize;
use skyvox_types::{ExecutionStatus, Intent, ParsedCommand, SkyError, Slots, format_number};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::PolicyConfig;
use crate::confirmation::{PendingConfirmation, SessionPhase, SessionState};

/// Longest session id the gate accepts, in bytes.
pub const MAX_SESSION_ID_LEN: usize = 128;

const NO_PENDING: &str = "No pending confirmation for this session";
const UNRECOGNIZED: &str = "Unrecognized command; try rephrasing";

// ────────────────────────────────────────────────────────────────────────────
// Decisions
// ────────────────────────────────────────────────────────────────────────────

/// A command the gate has cleared for execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovedCommand {
    pub intent: Intent,
    pub slots: Slots,
    pub normalized_command: String,
}

impl From<PendingConfirmation> for ApprovedCommand {
    fn from(p: PendingConfirmation) -> Self {
        Self {
            intent: p.intent,
            slots: p.slots,
            normalized_command: p.normalized_command,
        }
    }
}

/// Verdict for one evaluation.  `command` is `Some` exactly when `status`
/// is [`ExecutionStatus::Ok`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDecision {
    pub status: ExecutionStatus,
    pub message: String,
    pub command: Option<ApprovedCommand>,
}

impl PolicyDecision {
    fn approved(message: impl Into<String>, command: ApprovedCommand) -> Self {
        Self {
            status: ExecutionStatus::Ok,
            message: message.into(),
            command: Some(command),
        }
    }

    fn rejected(status: ExecutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            command: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == ExecutionStatus::Ok
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PolicyGate
// ────────────────────────────────────────────────────────────────────────────

/// Per-session rate limiting and confirmation bookkeeping.
pub struct PolicyGate {
    config: PolicyConfig,
    clock: Arc<dyn Clock>,
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl PolicyGate {
    /// Create a gate driven by the system clock.
    pub fn new(config: PolicyConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a gate driven by `clock`.
    pub fn with_clock(config: PolicyConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Decide whether `intent` may run for `session_id`.
    ///
    /// `normalized_command` is the parser's canonical rendering; it is what
    /// a confirmation is matched against.  `confirm` marks the call as the
    /// operator's confirmation of a previously parked command; with
    /// `confirm` set, `intent` may be [`Intent::Unknown`] to redeem whatever
    /// is pending.
    ///
    /// # Errors
    ///
    /// [`SkyError::InvalidSession`] if `session_id` is empty, blank, longer
    /// than [`MAX_SESSION_ID_LEN`] bytes, or contains control characters.
    /// Every policy outcome, including refusals, is an `Ok` decision.
    pub fn evaluate(
        &self,
        session_id: &str,
        intent: Intent,
        slots: &Slots,
        normalized_command: &str,
        confirm: bool,
    ) -> Result<PolicyDecision, SkyError> {
        validate_session_id(session_id)?;

        if intent == Intent::Stop {
            let mut cleared = false;
            if let Some(handle) = self.existing_session(session_id) {
                cleared = lock(&handle).pending.take().is_some();
            }
            info!(session = session_id, cleared_pending = cleared, "STOP override approved");
            return Ok(PolicyDecision::approved(
                "STOP approved",
                ApprovedCommand {
                    intent: Intent::Stop,
                    slots: *slots,
                    normalized_command: normalized_command.to_string(),
                },
            ));
        }

        let now = self.clock.now();
        let handle = self.session(session_id);
        let mut state = lock(&handle);

        let window = self.config.rate_limit_window();
        if !state
            .window
            .try_acquire(now, self.config.rate_limit_max, window)
        {
            let retry = state.window.retry_after(now, window).unwrap_or_default();
            warn!(
                session = session_id,
                command = normalized_command,
                retry_after_ms = retry.as_millis() as u64,
                "rate limit exceeded"
            );
            return Ok(PolicyDecision::rejected(
                ExecutionStatus::RateLimited,
                format!(
                    "Rate limit exceeded: at most {} commands per {} s; retry in {:.1} s",
                    self.config.rate_limit_max,
                    format_number(self.config.rate_limit_window_seconds),
                    retry.as_secs_f64()
                ),
            ));
        }

        if confirm {
            return Ok(self.redeem(&mut state, session_id, intent, normalized_command, now));
        }

        if intent == Intent::Unknown {
            debug!(session = session_id, "blocked unrecognized command");
            return Ok(PolicyDecision::rejected(ExecutionStatus::Blocked, UNRECOGNIZED));
        }

        if intent.requires_confirmation() {
            let replaced = state
                .pending
                .replace(PendingConfirmation::new(intent, *slots, normalized_command, now));
            info!(
                session = session_id,
                command = normalized_command,
                replaced = replaced.is_some(),
                "confirmation requested"
            );
            return Ok(PolicyDecision::rejected(
                ExecutionStatus::NeedsConfirm,
                format!(
                    "{intent} requires confirmation; say \"confirm\" within {} s",
                    format_number(self.config.confirmation_timeout_seconds)
                ),
            ));
        }

        debug!(session = session_id, command = normalized_command, "approved");
        Ok(PolicyDecision::approved(
            format!("{intent} approved"),
            ApprovedCommand {
                intent,
                slots: *slots,
                normalized_command: normalized_command.to_string(),
            },
        ))
    }

    /// [`evaluate`][Self::evaluate] taking its inputs from a parser result.
    pub fn evaluate_parsed(
        &self,
        session_id: &str,
        parsed: &ParsedCommand,
        confirm: bool,
    ) -> Result<PolicyDecision, SkyError> {
        self.evaluate(
            session_id,
            parsed.intent,
            &parsed.slots,
            &parsed.normalized_command,
            confirm,
        )
    }

    fn redeem(
        &self,
        state: &mut SessionState,
        session_id: &str,
        intent: Intent,
        normalized_command: &str,
        now: Instant,
    ) -> PolicyDecision {
        let timeout = self.config.confirmation_timeout();
        match state.pending.take() {
            None => {
                debug!(session = session_id, "confirm with nothing pending");
                PolicyDecision::rejected(ExecutionStatus::Blocked, NO_PENDING)
            }
            Some(pending) if pending.is_expired(now, timeout) => {
                info!(
                    session = session_id,
                    command = %pending.normalized_command,
                    "confirmation expired"
                );
                PolicyDecision::rejected(
                    ExecutionStatus::Blocked,
                    format!(
                        "Confirmation expired for {}; issue the command again",
                        pending.normalized_command
                    ),
                )
            }
            Some(pending)
                if intent != Intent::Unknown && pending.normalized_command != normalized_command =>
            {
                let message = format!(
                    "Confirmation mismatch: pending command is {}, not {normalized_command}",
                    pending.normalized_command
                );
                warn!(session = session_id, "{message}");
                state.pending = Some(pending);
                PolicyDecision::rejected(ExecutionStatus::Blocked, message)
            }
            Some(pending) => {
                info!(
                    session = session_id,
                    command = %pending.normalized_command,
                    "confirmation redeemed"
                );
                let message = format!("{} confirmed", pending.intent);
                PolicyDecision::approved(message, pending.into())
            }
        }
    }

    // ── Session bookkeeping ───────────────────────────────────────────────

    /// The session's pending confirmation, if one exists and has not expired.
    pub fn pending(&self, session_id: &str) -> Option<PendingConfirmation> {
        let handle = self.existing_session(session_id)?;
        let state = lock(&handle);
        let now = self.clock.now();
        let timeout = self.config.confirmation_timeout();
        let pending = state
            .pending
            .as_ref()
            .filter(|p| !p.is_expired(now, timeout))
            .cloned();
        pending
    }

    pub fn has_pending(&self, session_id: &str) -> bool {
        self.pending(session_id).is_some()
    }

    /// Confirmation state of `session_id`.  Unknown sessions are idle.
    pub fn phase(&self, session_id: &str) -> SessionPhase {
        let Some(handle) = self.existing_session(session_id) else {
            return SessionPhase::Idle;
        };
        let phase = lock(&handle).phase(self.clock.now(), self.config.confirmation_timeout());
        phase
    }

    /// Drop expired confirmations and forget sessions with nothing left to
    /// remember.  Returns the number of confirmations removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let timeout = self.config.confirmation_timeout();
        let window = self.config.rate_limit_window();

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        sessions.retain(|_, handle| {
            // A handle cloned by an in-flight evaluation is left alone; that
            // evaluation expires its own confirmation lazily.
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            let mut state = match handle.try_lock() {
                Ok(state) => state,
                Err(TryLockError::Poisoned(e)) => e.into_inner(),
                Err(TryLockError::WouldBlock) => return true,
            };
            if state.expire_pending(now, timeout) {
                removed += 1;
            }
            state.window.prune(now, window);
            !state.is_idle()
        });
        if removed > 0 {
            debug!(removed, remaining = sessions.len(), "swept expired confirmations");
        }
        removed
    }

    /// Number of sessions the gate currently tracks.
    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forget everything about `session_id`.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
    }

    fn existing_session(&self, session_id: &str) -> Option<Arc<Mutex<SessionState>>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    fn session(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        if let Some(handle) = self.existing_session(session_id) {
            return handle;
        }
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}

impl std::fmt::Debug for PolicyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyGate")
            .field("config", &self.config)
            .field("sessions", &self.session_count())
            .finish_non_exhaustive()
    }
}

fn lock(handle: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Check that `session_id` is usable as a map key and a log field.
pub fn validate_session_id(session_id: &str) -> Result<(), SkyError> {
    let reason = if session_id.trim().is_empty() {
        Some("must not be blank")
    } else if session_id.len() > MAX_SESSION_ID_LEN {
        Some("too long")
    } else if session_id.chars().any(char::is_control) {
        Some("contains control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => {
            warn!(reason, "rejected session id");
            Err(SkyError::InvalidSession(session_id.to_string()))
        }
        None => Ok(()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
