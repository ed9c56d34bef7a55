//! `skyvox-kernel` – The Policy Gate
//!
//! The brainstem of the pipeline.  It does not interpret speech and does not
//! fly anything; it decides whether a parsed command may reach the vehicle.
//!
//! # Modules
//!
//! - [`policy_gate`] – [`PolicyGate`][policy_gate::PolicyGate]: the single
//!   checkpoint every command passes through.  Applies the STOP override,
//!   per-session rate limiting, and the two-step confirmation handshake for
//!   high-risk intents.
//! - [`confirmation`] – [`PendingConfirmation`][confirmation::PendingConfirmation]
//!   and the per-session state machine (idle / awaiting confirmation).
//! - [`rate_limiter`] – [`RateLimitWindow`][rate_limiter::RateLimitWindow]:
//!   a sliding-window counter of accepted commands.
//! - [`clock`] – the [`Clock`][clock::Clock] seam, with a manual clock for
//!   deterministic expiry tests.
//! - [`config`] – [`PolicyConfig`][config::PolicyConfig] tunables.

pub mod clock;
pub mod config;
pub mod confirmation;
pub mod policy_gate;
pub mod rate_limiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PolicyConfig;
pub use confirmation::{PendingConfirmation, SessionPhase};
pub use policy_gate::{ApprovedCommand, PolicyDecision, PolicyGate, validate_session_id};
pub use rate_limiter::RateLimitWindow;
