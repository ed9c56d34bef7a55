//! [`CommandContext`] – one live parser, policy gate, and vehicle adapter.
//!
//! Each utterance runs through the same three stages:
//!
//! 1. **Parse** – the transcript becomes a [`ParsedCommand`].  Unrecognised
//!    speech without a confirmation flag is answered here and never reaches
//!    the gate.
//! 2. **Gate** – [`PolicyGate::evaluate_parsed`] applies the STOP override,
//!    the rate limit, and the confirmation handshake.
//! 3. **Act** – an approved command is checked against the adapter's
//!    capability matrix and executed.  Capability gaps come back as a failed
//!    [`ExecutionResult`], not an error.
//!
//! Every utterance yields an [`AuditRecord`], logged on the
//! `skyvox::audit` target.
//!
//! The adapter and the gate sit behind `RwLock<Arc<_>>` so they can be
//! swapped or reset while other sessions are mid-flight; an in-progress
//! call keeps the instance it started with.
//!
//! # Example
//!
//! ```rust
//! use skyvox_runtime::CommandContext;
//! use skyvox_types::ExecutionStatus;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let ctx = CommandContext::new();
//!
//! let out = ctx.process("pilot-1", "go left 5 meters", false).await.unwrap();
//! assert_eq!(out.status, ExecutionStatus::Ok);
//! assert!(out.execution.unwrap().message.contains("5 meters"));
//!
//! let out = ctx.process("pilot-1", "take off", false).await.unwrap();
//! assert_eq!(out.status, ExecutionStatus::NeedsConfirm);
//! let out = ctx.process("pilot-1", "yes", true).await.unwrap();
//! assert_eq!(out.status, ExecutionStatus::Ok);
//! # });
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use skyvox_hal::{MockAdapter, VehicleAdapter};
use skyvox_kernel::{ApprovedCommand, PolicyConfig, PolicyGate, validate_session_id};
use skyvox_parser::normalize::normalize;
use skyvox_parser::{CommandParser, canonical_command};
use skyvox_types::{
    AuditRecord, ExecutionResult, ExecutionStatus, Intent, ParsedCommand, SkyError, Slots,
};
use tracing::{debug, info, warn};

/// Spoken words that confirm a pending command.
pub const CONFIRM_PHRASES: &[&str] = &[
    "confirm",
    "confirmed",
    "yes",
    "yes confirm",
    "affirmative",
];

const NOT_UNDERSTOOD: &str = "Sorry, I did not understand that command";

fn is_confirm_phrase(transcript: &str) -> bool {
    let text = normalize(transcript);
    CONFIRM_PHRASES.iter().any(|p| *p == text)
}

// ────────────────────────────────────────────────────────────────────────────
// PipelineOutcome
// ────────────────────────────────────────────────────────────────────────────

/// Everything the caller needs to answer the operator.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// What the parser heard.
    pub parsed: ParsedCommand,
    /// Policy verdict.  `BLOCKED` for unrecognised speech.
    pub status: ExecutionStatus,
    /// Operator-facing message: the adapter's message when something ran,
    /// otherwise the gate's.
    pub message: String,
    /// The command the gate released, which differs from `parsed` when a
    /// confirmation redeemed an earlier request.
    pub approved: Option<ApprovedCommand>,
    /// Adapter result, present only when a command was dispatched.
    pub execution: Option<ExecutionResult>,
    pub audit: AuditRecord,
}

impl PipelineOutcome {
    /// `true` when the vehicle accepted the command.
    pub fn succeeded(&self) -> bool {
        self.execution.as_ref().is_some_and(|e| e.success)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// CommandContext
// ────────────────────────────────────────────────────────────────────────────

pub struct CommandContext {
    parser: CommandParser,
    adapter: RwLock<Arc<dyn VehicleAdapter>>,
    policy_gate: RwLock<Arc<PolicyGate>>,
}

impl CommandContext {
    /// Built-in parser, a connected [`MockAdapter`], and a default gate.
    pub fn new() -> Self {
        Self::with_parts(
            CommandParser::new(),
            Arc::new(MockAdapter::new()),
            Arc::new(PolicyGate::new(PolicyConfig::default())),
        )
    }

    pub fn with_parts(
        parser: CommandParser,
        adapter: Arc<dyn VehicleAdapter>,
        policy_gate: Arc<PolicyGate>,
    ) -> Self {
        Self {
            parser,
            adapter: RwLock::new(adapter),
            policy_gate: RwLock::new(policy_gate),
        }
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// `true` when `transcript` is an affirmative reply and nothing else.
    /// A phrase the parser maps to a command is never a confirmation.
    ///
    /// ```
    /// use skyvox_runtime::CommandContext;
    ///
    /// let ctx = CommandContext::new();
    /// assert!(ctx.is_confirmation("Yes!"));
    /// assert!(ctx.is_confirmation("  confirm "));
    /// assert!(!ctx.is_confirmation("yes go left"));
    /// ```
    pub fn is_confirmation(&self, transcript: &str) -> bool {
        is_confirm_phrase(transcript) && self.parser.parse(transcript).is_unknown()
    }

    // ── Adapter ───────────────────────────────────────────────────────────

    pub fn adapter(&self) -> Arc<dyn VehicleAdapter> {
        self.adapter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make `adapter` the live adapter and return the previous one.
    pub fn set_adapter(&self, adapter: Arc<dyn VehicleAdapter>) -> Arc<dyn VehicleAdapter> {
        info!(adapter = adapter.name(), "adapter swapped");
        let mut slot = self.adapter.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, adapter)
    }

    /// Replace the live adapter with a fresh, connected [`MockAdapter`].
    pub fn reset_adapter(&self) -> Arc<dyn VehicleAdapter> {
        self.set_adapter(Arc::new(MockAdapter::new()))
    }

    // ── Policy gate ───────────────────────────────────────────────────────

    pub fn policy_gate(&self) -> Arc<PolicyGate> {
        self.policy_gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_policy_gate(&self, gate: Arc<PolicyGate>) -> Arc<PolicyGate> {
        info!(config = ?gate.config(), "policy gate swapped");
        let mut slot = self
            .policy_gate
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, gate)
    }

    /// Replace the gate with one using [`PolicyConfig::default`], dropping
    /// all session state.
    pub fn reset_policy_gate(&self) -> Arc<PolicyGate> {
        self.set_policy_gate(Arc::new(PolicyGate::new(PolicyConfig::default())))
    }

    // ── Pipeline ──────────────────────────────────────────────────────────

    /// Run one transcript through parse → gate → adapter.
    ///
    /// `confirm` marks the utterance as the operator confirming a pending
    /// high-risk command; the transcript may then be anything, typically
    /// "yes".
    ///
    /// # Errors
    ///
    /// Only [`SkyError::InvalidSession`]; every other outcome is carried in
    /// the returned [`PipelineOutcome`].
    pub async fn process(
        &self,
        session_id: &str,
        transcript: &str,
        confirm: bool,
    ) -> Result<PipelineOutcome, SkyError> {
        let parsed = self.parser.parse(transcript);
        self.dispatch(session_id, parsed, confirm).await
    }

    /// Gate and execute STOP for `session_id`, bypassing the parser.
    pub async fn emergency_stop(&self, session_id: &str) -> Result<PipelineOutcome, SkyError> {
        warn!(session = session_id, "emergency stop requested");
        let slots = Slots::default();
        let parsed = ParsedCommand {
            intent: Intent::Stop,
            confidence: 1.0,
            slots,
            normalized_command: canonical_command(Intent::Stop, &slots),
            requires_confirmation: false,
        };
        self.dispatch(session_id, parsed, false).await
    }

    /// Gate and execute an already-parsed command.
    pub async fn dispatch(
        &self,
        session_id: &str,
        parsed: ParsedCommand,
        confirm: bool,
    ) -> Result<PipelineOutcome, SkyError> {
        validate_session_id(session_id)?;
        let mut audit = AuditRecord::new(session_id, &parsed.normalized_command);

        if parsed.is_unknown() && !confirm {
            debug!(session = session_id, "unrecognised utterance");
            log_audit(&audit);
            return Ok(PipelineOutcome {
                parsed,
                status: ExecutionStatus::Blocked,
                message: NOT_UNDERSTOOD.to_string(),
                approved: None,
                execution: None,
                audit,
            });
        }

        let decision = self.policy_gate().evaluate_parsed(session_id, &parsed, confirm)?;
        audit.status = Some(decision.status);

        let Some(approved) = decision.command else {
            log_audit(&audit);
            return Ok(PipelineOutcome {
                parsed,
                status: decision.status,
                message: decision.message,
                approved: None,
                execution: None,
                audit,
            });
        };

        let adapter = self.adapter();
        let execution = if adapter.supports_intent(approved.intent) {
            adapter.execute(approved.intent, &approved.slots).await
        } else {
            warn!(
                adapter = adapter.name(),
                intent = %approved.intent,
                "intent outside adapter capabilities"
            );
            ExecutionResult::failed(
                approved.intent,
                format!(
                    "{} not supported by the {} adapter",
                    approved.intent,
                    adapter.name()
                ),
            )
        };
        audit.normalized_command = approved.normalized_command.clone();
        audit.executed = Some(execution.success);
        log_audit(&audit);

        Ok(PipelineOutcome {
            parsed,
            status: decision.status,
            message: execution.message.clone(),
            approved: Some(approved),
            execution: Some(execution),
            audit,
        })
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}

fn log_audit(audit: &AuditRecord) {
    let status = audit
        .status
        .map_or_else(|| "UNPARSED".to_string(), |s| s.to_string());
    info!(
        target: "skyvox::audit",
        id = %audit.id,
        session = %audit.session_id,
        command = %audit.normalized_command,
        status = %status,
        executed = ?audit.executed,
        "audit"
    );
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use skyvox_hal::{CapabilityMatrix, MavlinkAdapter};
    use skyvox_kernel::ManualClock;
    use skyvox_types::{Capability, DistanceUnit};

    use super::*;

    fn context_with_mock() -> (CommandContext, Arc<MockAdapter>) {
        let ctx = CommandContext::new();
        let mock = Arc::new(MockAdapter::new());
        ctx.set_adapter(mock.clone());
        (ctx, mock)
    }

    // ── End-to-end ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn move_left_runs_without_confirmation() {
        let (ctx, _) = context_with_mock();
        let out = ctx.process("s", "go left 5 meters", false).await.unwrap();
        assert_eq!(out.parsed.intent, Intent::MoveLeft);
        assert_eq!(out.parsed.slots.distance, Some(5.0));
        assert_eq!(out.parsed.slots.unit, Some(DistanceUnit::Meters));
        assert_eq!(out.status, ExecutionStatus::Ok);
        let exec = out.execution.unwrap();
        assert!(exec.success);
        assert!(exec.message.contains('5'));
        assert!(exec.message.contains("meters"));
    }

    #[tokio::test]
    async fn takeoff_needs_confirmation_then_flies() {
        let (ctx, mock) = context_with_mock();
        let first = ctx.process("s", "take off", false).await.unwrap();
        assert!(first.parsed.requires_confirmation);
        assert_eq!(first.status, ExecutionStatus::NeedsConfirm);
        assert!(first.execution.is_none());
        assert!(!mock.state().is_flying);

        let second = ctx.process("s", "yes", true).await.unwrap();
        assert_eq!(second.status, ExecutionStatus::Ok);
        assert_eq!(second.approved.as_ref().unwrap().intent, Intent::Takeoff);
        assert!(second.succeeded());
        assert!(mock.state().is_flying);
    }

    #[tokio::test]
    async fn repeating_the_command_with_confirm_also_works() {
        let (ctx, mock) = context_with_mock();
        ctx.process("s", "land the drone", false).await.unwrap();
        let out = ctx.process("s", "land", true).await.unwrap();
        assert_eq!(out.status, ExecutionStatus::Ok);
        assert!(!mock.state().is_flying);
    }

    #[tokio::test]
    async fn expired_confirmation_does_not_fly() {
        let (ctx, mock) = context_with_mock();
        let clock = Arc::new(ManualClock::new());
        ctx.set_policy_gate(Arc::new(PolicyGate::with_clock(
            PolicyConfig {
                confirmation_timeout_seconds: 0.1,
                ..Default::default()
            },
            clock.clone(),
        )));
        ctx.process("s", "take off", false).await.unwrap();
        clock.advance(Duration::from_millis(500));
        let out = ctx.process("s", "confirm", true).await.unwrap();
        assert_eq!(out.status, ExecutionStatus::Blocked);
        assert!(out.message.to_lowercase().contains("expired"));
        assert!(!mock.state().is_flying);
    }

    #[tokio::test]
    async fn unrecognised_speech_skips_the_gate() {
        let (ctx, _) = context_with_mock();
        ctx.set_policy_gate(Arc::new(PolicyGate::new(PolicyConfig {
            rate_limit_max: 1,
            ..Default::default()
        })));
        let out = ctx.process("s", "florp zib quux", false).await.unwrap();
        assert_eq!(out.status, ExecutionStatus::Blocked);
        assert_eq!(out.parsed.confidence, 0.0);
        assert!(out.audit.status.is_none());
        // The gibberish did not use up the single allowed command.
        let next = ctx.process("s", "battery", false).await.unwrap();
        assert_eq!(next.status, ExecutionStatus::Ok);
        assert_eq!(ctx.policy_gate().session_count(), 1);
    }

    #[tokio::test]
    async fn stop_overrides_pending_and_rate_limit() {
        let (ctx, _) = context_with_mock();
        ctx.set_policy_gate(Arc::new(PolicyGate::new(PolicyConfig {
            rate_limit_max: 1,
            ..Default::default()
        })));
        ctx.process("s", "return home", false).await.unwrap();
        let limited = ctx.process("s", "altitude", false).await.unwrap();
        assert_eq!(limited.status, ExecutionStatus::RateLimited);

        let stop = ctx.process("s", "stop the takeoff", false).await.unwrap();
        assert_eq!(stop.parsed.intent, Intent::Stop);
        assert_eq!(stop.status, ExecutionStatus::Ok);
        assert!(stop.succeeded());
        assert!(!ctx.policy_gate().has_pending("s"));
    }

    #[tokio::test]
    async fn emergency_stop_bypasses_parser() {
        let (ctx, _) = context_with_mock();
        ctx.process("s", "take off", false).await.unwrap();
        let out = ctx.emergency_stop("s").await.unwrap();
        assert_eq!(out.status, ExecutionStatus::Ok);
        assert_eq!(out.parsed.normalized_command, "STOP");
        assert!(out.succeeded());
        assert!(!ctx.policy_gate().has_pending("s"));
    }

    #[tokio::test]
    async fn malformed_session_is_an_error() {
        let ctx = CommandContext::new();
        assert!(matches!(
            ctx.process("", "hover", false).await,
            Err(SkyError::InvalidSession(_))
        ));
        assert!(ctx.emergency_stop("bad\u{7}id").await.is_err());
    }

    // ── Capability gaps ─────────────────────────────────────────────────

    #[tokio::test]
    async fn mavlink_refuses_zoom_gracefully() {
        let ctx = CommandContext::new();
        let (mavlink, link) = MavlinkAdapter::loopback("udp:127.0.0.1:14550").unwrap();
        mavlink.connect().await.unwrap();
        ctx.set_adapter(Arc::new(mavlink));
        link.clear_frames();

        let out = ctx.process("s", "zoom in", false).await.unwrap();
        assert_eq!(out.status, ExecutionStatus::Ok);
        let exec = out.execution.unwrap();
        assert!(!exec.success);
        assert!(exec.message.contains("not supported"));
        assert!(link.frames().is_empty());
        assert_eq!(out.audit.executed, Some(false));

        let out = ctx.process("s", "go forward 3 meters", false).await.unwrap();
        assert!(out.succeeded());
        assert_eq!(link.frames().len(), 1);
    }

    #[tokio::test]
    async fn restricted_mock_refuses_camera() {
        let ctx = CommandContext::new();
        ctx.set_adapter(Arc::new(MockAdapter::with_capabilities(
            CapabilityMatrix::all().revoke(Capability::Camera),
        )));
        let out = ctx.process("s", "take a photo", false).await.unwrap();
        assert!(!out.succeeded());
    }

    #[tokio::test]
    async fn disconnected_adapter_reports_failure() {
        let (ctx, mock) = context_with_mock();
        mock.disconnect().await;
        let out = ctx.process("s", "hover", false).await.unwrap();
        assert_eq!(out.status, ExecutionStatus::Ok);
        assert!(!out.succeeded());
        assert!(out.message.contains("not connected"));
    }

    // ── Swap / reset ────────────────────────────────────────────────────

    #[tokio::test]
    async fn reset_adapter_installs_fresh_mock() {
        let (ctx, mock) = context_with_mock();
        ctx.process("s", "start recording", false).await.unwrap();
        assert!(mock.state().recording);

        let previous = ctx.reset_adapter();
        assert_eq!(previous.name(), "mock");
        assert_eq!(ctx.adapter().name(), "mock");
        assert!(ctx.adapter().is_connected());
        // The replaced instance keeps its own state.
        assert!(mock.state().recording);
    }

    #[tokio::test]
    async fn reset_policy_gate_forgets_sessions() {
        let ctx = CommandContext::new();
        ctx.set_policy_gate(Arc::new(PolicyGate::new(PolicyConfig {
            rate_limit_max: 5,
            ..Default::default()
        })));
        ctx.process("s", "take off", false).await.unwrap();
        assert!(ctx.policy_gate().has_pending("s"));

        ctx.reset_policy_gate();
        assert!(!ctx.policy_gate().has_pending("s"));
        assert_eq!(ctx.policy_gate().config(), &PolicyConfig::default());
    }

    // ── Audit ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn audit_record_tracks_outcome() {
        let (ctx, _) = context_with_mock();
        let out = ctx.process("pilot-7", "rotate right 45 degrees", false).await.unwrap();
        assert_eq!(out.audit.session_id, "pilot-7");
        assert_eq!(out.audit.normalized_command, "YAW_RIGHT degrees=45");
        assert_eq!(out.audit.status, Some(ExecutionStatus::Ok));
        assert_eq!(out.audit.executed, Some(true));

        let pending = ctx.process("pilot-7", "take off", false).await.unwrap();
        assert_eq!(pending.audit.status, Some(ExecutionStatus::NeedsConfirm));
        assert_eq!(pending.audit.executed, None);

        let confirmed = ctx.process("pilot-7", "yes", true).await.unwrap();
        assert_eq!(confirmed.audit.normalized_command, "TAKEOFF");
    }

    // ── Confirmation phrases ────────────────────────────────────────────

    #[test]
    fn confirmation_phrases() {
        let ctx = CommandContext::new();
        assert!(ctx.is_confirmation("Confirm."));
        assert!(ctx.is_confirmation("affirmative"));
        assert!(!ctx.is_confirmation("go ahead"));
        assert!(!ctx.is_confirmation("yes go left"));
        assert!(!ctx.is_confirmation(""));
    }

    #[test]
    fn phrase_claimed_by_a_synonym_is_not_a_confirmation() {
        let mut parser = CommandParser::new();
        parser.add_synonym("affirmative", Intent::Hover);
        let ctx = CommandContext::with_parts(
            parser,
            Arc::new(MockAdapter::new()),
            Arc::new(PolicyGate::new(PolicyConfig::default())),
        );
        assert!(!ctx.is_confirmation("affirmative"));
        assert!(ctx.is_confirmation("yes"));
    }

    #[tokio::test]
    async fn go_ahead_moves_forward_with_or_without_pending() {
        let (ctx, mock) = context_with_mock();
        let out = ctx
            .process("s", "go ahead", ctx.is_confirmation("go ahead"))
            .await
            .unwrap();
        assert_eq!(out.status, ExecutionStatus::Ok);
        assert_eq!(out.parsed.intent, Intent::MoveForward);
        assert!(out.succeeded());

        ctx.process("s", "take off", false).await.unwrap();
        let before = mock.state().y_m + mock.state().x_m;
        let out = ctx
            .process("s", "go ahead", ctx.is_confirmation("go ahead"))
            .await
            .unwrap();
        assert_eq!(out.status, ExecutionStatus::Ok);
        assert_ne!(mock.state().y_m + mock.state().x_m, before);
        // The takeoff request is still waiting for a real confirmation.
        assert!(ctx.policy_gate().has_pending("s"));
        assert!(!mock.state().is_flying);
    }

    #[tokio::test]
    async fn outcome_serializes_for_relay() {
        let (ctx, _) = context_with_mock();
        let out = ctx.process("s", "take off", false).await.unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["status"], "NEEDS_CONFIRM");
        assert_eq!(json["parsed"]["intent"], "TAKEOFF");
        assert!(json["execution"].is_null());
        assert_eq!(json["audit"]["session_id"], "s");
    }
}
