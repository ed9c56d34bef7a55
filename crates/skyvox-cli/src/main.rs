//! `skyvox-cli` – SkyVox Operator Console
//!
//! This binary is the operator entry point for the SkyVox pipeline.  It:
//!
//! 1. Loads `~/.skyvox/config.toml` (writing defaults on first run) and
//!    applies `SKYVOX_*` overrides.
//! 2. Installs the configured adapter and a policy gate built from the
//!    `[policy]` table.
//! 3. Drops the operator into an **interactive REPL** where each line is a
//!    transcript and slash-commands manage the session.
//! 4. Intercepts **Ctrl-C** to dispatch STOP for the session and exit.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

use skyvox_kernel::PolicyGate;
use skyvox_runtime::CommandContext;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG filters (default "info"); SKYVOX_LOG_FORMAT=json switches to
    // newline-delimited JSON; OTEL_EXPORTER_OTLP_ENDPOINT enables span export.
    // Operator-facing output still uses println!.
    let _telemetry = skyvox_runtime::init_tracing("skyvox");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => first_run(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start the async runtime");
            eprintln!("{}: {}", "Fatal".red().bold(), e);
            std::process::exit(1);
        }
    };

    let ctx = Arc::new(CommandContext::new());
    ctx.set_policy_gate(Arc::new(PolicyGate::new(cfg.policy.clone())));
    let session_id = format!("cli-{}", uuid::Uuid::new_v4());

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    // STOP goes through the pipeline like any other command so it is gated,
    // dispatched to the live adapter, and audited.
    {
        let ctx = ctx.clone();
        let session_id = session_id.clone();
        let shutdown = shutdown.clone();
        let handle = rt.handle().clone();
        if let Err(e) = ctrlc::set_handler(move || {
            println!();
            println!("{}", "⚠  Ctrl-C received – sending STOP …".yellow().bold());
            match handle.block_on(ctx.emergency_stop(&session_id)) {
                Ok(outcome) if outcome.succeeded() => {
                    println!("{} {}", "  ✓".green(), outcome.message);
                }
                Ok(outcome) => println!("{} {}", "  ✗".red(), outcome.message),
                Err(e) => println!("{} {}", "  ✗".red(), e),
            }
            println!("{}", "  ✓ Exiting SkyVox.".green());
            shutdown.store(true, Ordering::SeqCst);
            std::process::exit(130);
        }) {
            warn!(error = %e, "Failed to install Ctrl-C handler; Ctrl-C will not send STOP");
        }
    }

    println!("  Session {}", session_id.dimmed());
    println!(
        "  Type a command such as {} or {} for a list of commands.\n",
        "\"take off\"".bold(),
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    let repl = repl::Repl::new(ctx, cfg, session_id);
    repl::run(repl, &rt, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// First run
// ─────────────────────────────────────────────────────────────────────────────

fn first_run() -> config::Config {
    let cfg = config::Config::default();
    match config::save(&cfg) {
        Ok(()) => println!(
            "  {} Default config written to {}",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    // The saved file carries no env overrides; the running config does.
    match config::resolve(cfg) {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ____ __         _    __         "#.bold().cyan());
    println!("{}", r#"  / __// /__ __ __| |  / /__  __ __"#.bold().cyan());
    println!("{}", r#" _\ \ /  '_// // /| | / / _ \ \ \ /"#.bold().cyan());
    println!("{}", r#"/___//_/\_\ \_, / |___/\___//_\_\ "#.bold().cyan());
    println!("{}", r#"           /___/                   "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "SkyVox".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Voice command safety pipeline for drone teleoperation");
    println!();
}
