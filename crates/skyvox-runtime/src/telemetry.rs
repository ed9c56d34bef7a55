//! Logging and trace-export setup for SkyVox processes.
//!
//! Call [`init_tracing`] once at startup.  It installs a `tracing`
//! subscriber filtered by `RUST_LOG`, formatted compactly or as JSON, and,
//! when a collector is configured, forwarding spans over OTLP/HTTP.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `SKYVOX_LOG_FORMAT=json` | Newline-delimited JSON instead of compact text. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL, e.g. `http://localhost:4318`. |
//!
//! # Example
//!
//! ```rust,no_run
//! // Keep the guard alive until the process exits.
//! let _guard = skyvox_runtime::telemetry::init_tracing("skyvox");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Console output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Resolved telemetry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl TelemetryConfig {
    /// Read `SKYVOX_LOG_FORMAT` and `OTEL_EXPORTER_OTLP_ENDPOINT`.
    pub fn from_env(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            format: LogFormat::from_env_value(std::env::var("SKYVOX_LOG_FORMAT").ok().as_deref()),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|e| !e.trim().is_empty()),
        }
    }
}

/// Install the global subscriber from the environment.
///
/// The returned [`TracerProviderGuard`] must live as long as the process;
/// dropping it flushes buffered spans.  A second call leaves the first
/// subscriber in place.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    init_with(&TelemetryConfig::from_env(service_name))
}

/// Install the global subscriber from explicit settings.
pub fn init_with(config: &TelemetryConfig) -> TracerProviderGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let provider = config
        .otlp_endpoint
        .as_deref()
        .and_then(|endpoint| build_provider(&config.service_name, endpoint));

    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("skyvox")));
    let json_layer =
        (config.format == LogFormat::Json).then(|| tracing_subscriber::fmt::layer().json());
    let compact_layer =
        (config.format == LogFormat::Compact).then(|| tracing_subscriber::fmt::layer().compact());

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer)
        .with(json_layer)
        .with(compact_layer)
        .try_init()
    {
        eprintln!("[skyvox] tracing already initialised: {e}");
    }

    TracerProviderGuard(provider)
}

// ─────────────────────────────────────────────────────────────────────────────
// RAII guard
// ─────────────────────────────────────────────────────────────────────────────

/// Shuts the OTel [`SdkTracerProvider`] down on drop, flushing pending
/// spans.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl TracerProviderGuard {
    /// `true` when spans are being exported.
    pub fn is_exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[skyvox] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

/// Build an OTLP/HTTP provider, or `None` (with a note on stderr) when the
/// exporter cannot be created.
fn build_provider(service_name: &str, endpoint: &str) -> Option<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[skyvox] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    // Simple (synchronous) export: the CLI builds its Tokio runtime after
    // tracing is initialised, so a batch exporter has nowhere to spawn.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}
