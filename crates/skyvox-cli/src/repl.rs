//! REPL – Read-Eval-Print Loop for the SkyVox operator console.
//!
//! Plain lines are treated as spoken transcripts and run through the
//! pipeline.  A bare affirmative ("yes", "confirm") confirms the pending
//! command.
//!
//! Supported slash-commands:
//!   /confirm          – confirm the pending high-risk command
//!   /status           – adapter, capabilities, and session state
//!   /adapter <kind>   – switch to the mock, mavlink, or dji adapter
//!   /connect          – connect the current adapter
//!   /disconnect       – disconnect the current adapter
//!   /reset            – fresh mock adapter and policy gate
//!   /help             – show this list
//!   /quit | /exit     – gracefully exit the CLI

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use skyvox_kernel::{PolicyGate, SessionPhase};
use skyvox_runtime::{CommandContext, PipelineOutcome};
use skyvox_types::{Capability, ExecutionStatus};
use tokio::runtime::Runtime;

use crate::config::{self, AdapterKind, Config};

/// One parsed REPL input line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// A transcript; bare affirmatives confirm the pending command.
    Transcript(String),
    Confirm,
    Status,
    /// `/adapter` with no argument shows the current adapter.
    Adapter(Option<String>),
    Connect,
    Disconnect,
    Reset,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Transcript(line.to_string());
        };
        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        match name.as_str() {
            "confirm" | "yes" => ReplCommand::Confirm,
            "status" => ReplCommand::Status,
            "adapter" => ReplCommand::Adapter(words.next().map(str::to_string)),
            "connect" => ReplCommand::Connect,
            "disconnect" => ReplCommand::Disconnect,
            "reset" => ReplCommand::Reset,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// REPL state: the pipeline plus the operator's session.
pub struct Repl {
    ctx: Arc<CommandContext>,
    cfg: Config,
    session_id: String,
    adapter_kind: AdapterKind,
}

impl Repl {
    pub fn new(ctx: Arc<CommandContext>, cfg: Config, session_id: String) -> Self {
        Self {
            ctx,
            adapter_kind: AdapterKind::Mock,
            cfg,
            session_id,
        }
    }

    /// Install the configured adapter and connect it.
    pub async fn start(&mut self) {
        let kind = self.cfg.adapter;
        self.switch_adapter(kind).await;
    }

    pub async fn handle(&mut self, cmd: ReplCommand) -> Flow {
        match cmd {
            ReplCommand::Empty => {}
            ReplCommand::Transcript(text) => {
                let confirm = self.ctx.is_confirmation(&text);
                self.submit(&text, confirm).await;
            }
            ReplCommand::Confirm => self.submit("confirm", true).await,
            ReplCommand::Status => self.cmd_status(),
            ReplCommand::Adapter(None) => {
                println!("  Current adapter: {}", self.adapter_kind.to_string().bold());
            }
            ReplCommand::Adapter(Some(kind)) => match kind.parse::<AdapterKind>() {
                Ok(kind) => self.switch_adapter(kind).await,
                Err(e) => println!("{}: {}", "Error".red(), e),
            },
            ReplCommand::Connect => self.cmd_connect().await,
            ReplCommand::Disconnect => {
                let adapter = self.ctx.adapter();
                adapter.disconnect().await;
                println!("  {} {} adapter disconnected", "✓".green(), adapter.name().bold());
            }
            ReplCommand::Reset => self.cmd_reset().await,
            ReplCommand::Help => cmd_help(),
            ReplCommand::Quit => {
                println!("{}", "Goodbye.".green());
                return Flow::Quit;
            }
            ReplCommand::Unknown(other) => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
        Flow::Continue
    }

    async fn submit(&self, text: &str, confirm: bool) {
        match self.ctx.process(&self.session_id, text, confirm).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => println!("{}: {}", "Error".red(), e),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Command handlers
    // ─────────────────────────────────────────────────────────────────────────

    async fn switch_adapter(&mut self, kind: AdapterKind) {
        let adapter = match config::build_adapter(kind, &self.cfg) {
            Ok(adapter) => adapter,
            Err(e) => {
                println!("{}: {}", "Cannot build adapter".red(), e);
                return;
            }
        };
        if !adapter.is_connected()
            && let Err(e) = adapter.connect().await
        {
            println!("  {} {}", "⚠".yellow(), e.to_string().yellow());
            println!("    Use {} after fixing the configuration.", "/connect".bold());
        }
        let previous = self.ctx.set_adapter(adapter);
        previous.disconnect().await;
        self.adapter_kind = kind;
        println!("  {} Adapter set to {}", "✓".green(), kind.to_string().bold());
    }

    async fn cmd_connect(&self) {
        let adapter = self.ctx.adapter();
        if adapter.is_connected() {
            println!("  {} adapter already connected", adapter.name().bold());
            return;
        }
        match adapter.connect().await {
            Ok(()) => println!("  {} {} adapter connected", "✓".green(), adapter.name().bold()),
            Err(e) => println!("{}: {}", "Connection failed".red(), e),
        }
    }

    async fn cmd_reset(&mut self) {
        let previous = self.ctx.reset_adapter();
        previous.disconnect().await;
        self.adapter_kind = AdapterKind::Mock;
        self.ctx.set_policy_gate(Arc::new(PolicyGate::new(self.cfg.policy.clone())));
        println!("  {} Mock adapter and policy state reset", "✓".green());
    }

    fn cmd_status(&self) {
        let adapter = self.ctx.adapter();
        let gate = self.ctx.policy_gate();
        println!("{}", "Status".bold().underline());
        println!("  Session       : {}", self.session_id.dimmed());
        println!(
            "  Adapter       : {} ({})",
            adapter.name().bold(),
            if adapter.is_connected() {
                "connected".green()
            } else {
                "disconnected".red()
            }
        );
        let caps = adapter.capabilities();
        let listed: Vec<String> = Capability::ALL
            .iter()
            .map(|cap| {
                let label = format!("{cap:?}").to_uppercase();
                if caps.supports(*cap) {
                    label
                } else {
                    format!("{}", label.dimmed().strikethrough())
                }
            })
            .collect();
        println!("  Capabilities  : {}", listed.join(" "));
        match gate.phase(&self.session_id) {
            SessionPhase::Idle => println!("  Confirmation  : {}", "none pending".dimmed()),
            SessionPhase::AwaitingConfirm => {
                let pending = gate
                    .pending(&self.session_id)
                    .map(|p| p.normalized_command)
                    .unwrap_or_default();
                println!("  Confirmation  : {} awaiting /confirm", pending.yellow());
            }
        }
        let policy = gate.config();
        println!(
            "  Policy        : {} cmds / {}s, confirm within {}s",
            policy.rate_limit_max,
            policy.rate_limit_window_seconds,
            policy.confirmation_timeout_seconds
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loop
// ─────────────────────────────────────────────────────────────────────────────

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(mut repl: Repl, rt: &Runtime, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    rt.block_on(repl.start());

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "skyvox>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        if rt.block_on(repl.handle(ReplCommand::parse(&line))) == Flow::Quit {
            shutdown.store(true, Ordering::SeqCst);
            break;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_outcome(outcome: &PipelineOutcome) {
    let status = outcome.status.to_string();
    let badge = match outcome.status {
        ExecutionStatus::Ok if outcome.execution.as_ref().is_some_and(|e| !e.success) => {
            status.red()
        }
        ExecutionStatus::Ok => status.green(),
        ExecutionStatus::NeedsConfirm => status.yellow(),
        ExecutionStatus::Blocked => status.red(),
        ExecutionStatus::RateLimited => status.magenta(),
    };
    println!("  [{}] {}", badge.bold(), outcome.message);
    println!(
        "    {} {}",
        outcome.parsed.normalized_command.dimmed(),
        format!("(confidence {:.2})", outcome.parsed.confidence).dimmed()
    );
}

fn cmd_help() {
    println!();
    println!("{}", "SkyVox Commands".bold().underline());
    println!("  {}  – say anything else to command the aircraft", "<transcript>".bold().cyan());
    println!(
        "  {}       – confirm the pending takeoff / land / return home",
        "/confirm".bold().cyan()
    );
    println!("  {}        – adapter, capabilities, and session state", "/status".bold().cyan());
    println!("  {} – switch adapter (mock, mavlink, dji)", "/adapter <kind>".bold().cyan());
    println!("  {}       – connect the current adapter", "/connect".bold().cyan());
    println!("  {}    – disconnect the current adapter", "/disconnect".bold().cyan());
    println!("  {}         – fresh mock adapter and policy state", "/reset".bold().cyan());
    println!("  {}  – exit the CLI (Ctrl-C sends STOP first)", "/quit  /exit".bold().cyan());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl() -> Repl {
        Repl::new(Arc::new(CommandContext::new()), Config::default(), "test-session".into())
    }

    #[test]
    fn parse_plain_lines_as_transcripts() {
        assert_eq!(
            ReplCommand::parse("  go left 5 meters "),
            ReplCommand::Transcript("go left 5 meters".into())
        );
        assert_eq!(ReplCommand::parse("Yes!"), ReplCommand::Transcript("Yes!".into()));
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Empty);
    }

    #[test]
    fn parse_slash_commands() {
        assert_eq!(ReplCommand::parse("/confirm"), ReplCommand::Confirm);
        assert_eq!(ReplCommand::parse("/STATUS"), ReplCommand::Status);
        assert_eq!(ReplCommand::parse("/adapter"), ReplCommand::Adapter(None));
        assert_eq!(
            ReplCommand::parse("/adapter mavlink"),
            ReplCommand::Adapter(Some("mavlink".into()))
        );
        assert_eq!(ReplCommand::parse("/connect"), ReplCommand::Connect);
        assert_eq!(ReplCommand::parse("/disconnect"), ReplCommand::Disconnect);
        assert_eq!(ReplCommand::parse("/reset"), ReplCommand::Reset);
        assert_eq!(ReplCommand::parse("/help"), ReplCommand::Help);
        assert_eq!(ReplCommand::parse("/exit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/fly"), ReplCommand::Unknown("/fly".into()));
    }

    #[tokio::test]
    async fn confirm_flow_through_the_repl() {
        let mut repl = repl();
        repl.handle(ReplCommand::parse("take off")).await;
        assert!(repl.ctx.policy_gate().has_pending("test-session"));
        repl.handle(ReplCommand::Confirm).await;
        assert!(!repl.ctx.policy_gate().has_pending("test-session"));
    }

    #[tokio::test]
    async fn spoken_yes_confirms_but_go_ahead_moves() {
        let mut repl = repl();
        repl.handle(ReplCommand::parse("take off")).await;
        repl.handle(ReplCommand::parse("go ahead")).await;
        assert!(repl.ctx.policy_gate().has_pending("test-session"));
        repl.handle(ReplCommand::parse("yes")).await;
        assert!(!repl.ctx.policy_gate().has_pending("test-session"));
    }

    #[tokio::test]
    async fn switching_adapters() {
        let mut repl = repl();
        repl.handle(ReplCommand::Adapter(Some("mavlink".into()))).await;
        assert_eq!(repl.ctx.adapter().name(), "mavlink");
        assert!(repl.ctx.adapter().is_connected());

        // No app key configured: installed but left disconnected.
        repl.handle(ReplCommand::Adapter(Some("dji".into()))).await;
        assert_eq!(repl.ctx.adapter().name(), "dji");
        assert!(!repl.ctx.adapter().is_connected());

        repl.handle(ReplCommand::Adapter(Some("zeppelin".into()))).await;
        assert_eq!(repl.ctx.adapter().name(), "dji");
    }

    #[tokio::test]
    async fn connect_and_disconnect() {
        let mut repl = repl();
        repl.handle(ReplCommand::Disconnect).await;
        assert!(!repl.ctx.adapter().is_connected());
        repl.handle(ReplCommand::Connect).await;
        assert!(repl.ctx.adapter().is_connected());
    }

    #[tokio::test]
    async fn reset_uses_configured_policy() {
        let mut cfg = Config::default();
        cfg.policy.rate_limit_max = 4;
        let mut repl = Repl::new(Arc::new(CommandContext::new()), cfg, "s".into());
        repl.handle(ReplCommand::parse("land")).await;
        repl.handle(ReplCommand::Reset).await;
        assert!(!repl.ctx.policy_gate().has_pending("s"));
        assert_eq!(repl.ctx.policy_gate().config().rate_limit_max, 4);
        assert_eq!(repl.ctx.adapter().name(), "mock");
    }

    #[tokio::test]
    async fn quit_ends_the_loop() {
        let mut repl = repl();
        assert_eq!(repl.handle(ReplCommand::Status).await, Flow::Continue);
        assert_eq!(repl.handle(ReplCommand::Help).await, Flow::Continue);
        assert_eq!(repl.handle(ReplCommand::Quit).await, Flow::Quit);
    }
}
