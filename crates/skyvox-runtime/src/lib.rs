//! `skyvox-runtime` – The Command Context
//!
//! Wires the parser, the policy gate, and the live vehicle adapter into one
//! pipeline that turns a transcript into an audited outcome.
//!
//! # Modules
//!
//! - [`context`] – [`CommandContext`][context::CommandContext]: the
//!   parse → gate → adapter pipeline, emergency stop, and hot-swapping of the
//!   adapter and gate.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export
//!   to Jaeger, Grafana Tempo, or any OTLP-compatible collector.
//!
//! # Audit trail
//!
//! Every utterance produces an [`AuditRecord`][skyvox_types::AuditRecord],
//! returned in the [`PipelineOutcome`] and logged at `info` on the
//! `skyvox::audit` target.  Filter with `RUST_LOG=skyvox::audit=info` to get
//! the trail alone.

pub mod context;
pub mod telemetry;

pub use context::{CommandContext, PipelineOutcome};
pub use telemetry::{TracerProviderGuard, init_tracing};

// Re-exported so front-ends can build a gate without a direct dependency on
// skyvox-kernel.
pub use skyvox_kernel::{PolicyConfig, PolicyGate};
