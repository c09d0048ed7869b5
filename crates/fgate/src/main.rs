#![forbid(unsafe_code)]

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use freshgate_core::config::{self, GateConfig};
use freshgate_core::input::HookInput;
use freshgate_core::types::Decision;
use freshgate_engine::gates::{EvidenceGate, RestartGate};
use freshgate_engine::state::decision_log;
use freshgate_engine::state::store::for_persistence;
use freshgate_engine::state::ValidationStamp;

const DECISION_LOG_FILE: &str = "decisions.jsonl";

#[derive(Parser)]
#[command(
    name = "fgate",
    version,
    about = "Freshness-gated preconditions for agent actions. One JSON payload on stdin, exit 0 allows, exit 2 denies."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the restart gate over a shell-command payload from stdin.
    Command {
        /// Project root (default: discovered from the working directory).
        #[arg(long)]
        root: Option<String>,

        /// Explicit config file (default: <root>/.freshgate/config.json).
        #[arg(long)]
        config: Option<String>,
    },

    /// Run the evidence gate over a file-edit payload from stdin.
    Edit {
        /// Project root (default: discovered from the working directory).
        #[arg(long)]
        root: Option<String>,

        /// Explicit config file (default: <root>/.freshgate/config.json).
        #[arg(long)]
        config: Option<String>,
    },

    /// Report current lock freshness for both gates.
    Status {
        /// Project root (default: discovered from the working directory).
        #[arg(long)]
        root: Option<String>,

        /// Explicit config file (default: <root>/.freshgate/config.json).
        #[arg(long)]
        config: Option<String>,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write .freshgate/config.json with the built-in defaults.
    Init {
        /// Project root (default: the working directory).
        #[arg(long)]
        root: Option<String>,
    },

    /// Inspect the decision log.
    Log {
        /// Project root (default: discovered from the working directory).
        #[arg(long)]
        root: Option<String>,

        /// Verify the hash chain.
        #[arg(long)]
        verify: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Command { root, config } => {
            std::process::exit(run_gate(Gate::Restart, root, config))
        }
        Cmd::Edit { root, config } => std::process::exit(run_gate(Gate::Evidence, root, config)),
        Cmd::Status { root, config, json } => cmd_status(root, config, json),
        Cmd::Init { root } => cmd_init(root),
        Cmd::Log { root, verify } => cmd_log(root, verify),
    }
}

enum Gate {
    Restart,
    Evidence,
}

/// One gate evaluation: read the payload, decide, explain denies on
/// stderr, exit 0 or 2. Nothing on this path may escape as an unhandled
/// fault; unusable input or missing configuration degrades to allow.
fn run_gate(gate: Gate, root: Option<String>, config_file: Option<String>) -> i32 {
    let mut raw = String::new();
    if io::stdin().read_to_string(&mut raw).is_err() {
        return 0;
    }
    let Some(input) = HookInput::parse(&raw) else {
        return 0;
    };

    let root = resolve_root(root.as_deref());
    let mut cfg = load_config(&root, config_file.as_deref());
    if let Some(overlay) = &input.config {
        cfg.apply_overlay(overlay);
    }
    let store = for_persistence(cfg.persistence);
    let now = epoch_now();

    let (label, action, decision) = match gate {
        Gate::Restart => {
            let Some(command) = input.command() else {
                return 0;
            };
            let decision = RestartGate::new(&cfg, store.as_ref()).decide(&root, command, now);
            ("restart", command.to_string(), decision)
        }
        Gate::Evidence => {
            let Some(file_path) = input.file_path() else {
                return 0;
            };
            let decision = EvidenceGate::new(&cfg, store.as_ref()).decide(&root, file_path, now);
            ("evidence", file_path.to_string(), decision)
        }
    };

    // Diagnostic trail only; a log failure never changes the decision.
    let log_path = root.join(config::CONFIG_DIR).join(DECISION_LOG_FILE);
    if std::fs::create_dir_all(root.join(config::CONFIG_DIR)).is_ok() {
        let _ = decision_log::append_entry(
            &log_path,
            &decision_log::decision_entry(label, &action, decision.label()),
        );
    }

    if let Decision::Deny { reason } = &decision {
        eprintln!("{reason}");
    }
    decision.exit_code()
}

fn cmd_status(root: Option<String>, config_file: Option<String>, json_out: bool) -> Result<()> {
    let root = resolve_root(root.as_deref());
    let cfg = load_config(&root, config_file.as_deref());
    let now = epoch_now();

    let stamp_path = cfg.restart_lock_path(&root);
    let stamp_age = std::fs::read_to_string(&stamp_path)
        .ok()
        .and_then(|content| {
            ValidationStamp::parse(&stamp_path.display().to_string(), &content).ok()
        })
        .map(|stamp| now - stamp.timestamp);

    let artifact_dir = PathBuf::from(&cfg.evidence.artifact_dir);
    let newest_artifact = freshgate_engine::gates::evidence::newest_artifact(&artifact_dir)
        .map(|(path, mtime)| (path.display().to_string(), now - mtime));

    if json_out {
        let status = serde_json::json!({
            "root": root.display().to_string(),
            "container": cfg.container_name,
            "validation_stamp_age_secs": stamp_age,
            "validation_window_secs": cfg.restart.lock_timeout_secs,
            "newest_artifact_age_secs": newest_artifact.as_ref().map(|(_, age)| age),
            "newest_artifact": newest_artifact.as_ref().map(|(path, _)| path),
            "artifact_window_secs": cfg.evidence.max_artifact_age_minutes * 60,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        eprintln!("  Root:       {}", root.display());
        eprintln!("  Container:  {}", cfg.container_name);
        match stamp_age {
            Some(age) => eprintln!(
                "  Validation: {:.0}s old (window {}s)",
                age, cfg.restart.lock_timeout_secs
            ),
            None => eprintln!("  Validation: (no stamp)"),
        }
        match &newest_artifact {
            Some((path, age)) => eprintln!(
                "  Artifact:   {path} ({age:.0}s old, window {}s)",
                cfg.evidence.max_artifact_age_minutes * 60
            ),
            None => eprintln!("  Artifact:   (none)"),
        }
    }
    Ok(())
}

fn cmd_init(root: Option<String>) -> Result<()> {
    let root = match root {
        Some(r) => PathBuf::from(r),
        None => std::env::current_dir()?,
    };
    let cfg_dir = root.join(config::CONFIG_DIR);
    std::fs::create_dir_all(&cfg_dir)?;
    let path = cfg_dir.join(config::CONFIG_FILE);
    let json = serde_json::to_string_pretty(&GateConfig::default())?;
    std::fs::write(&path, json)?;
    eprintln!("created {}", path.display());
    Ok(())
}

fn cmd_log(root: Option<String>, verify: bool) -> Result<()> {
    if !verify {
        anyhow::bail!("specify --verify");
    }
    let root = resolve_root(root.as_deref());
    let path = root.join(config::CONFIG_DIR).join(DECISION_LOG_FILE);
    if !path.exists() {
        eprintln!("  no decision log found at {}", path.display());
        return Ok(());
    }
    let count = decision_log::verify_chain(&path)?;
    eprintln!("  decision chain valid ({count} entries)");
    Ok(())
}

fn resolve_root(root: Option<&str>) -> PathBuf {
    match root {
        Some(r) => PathBuf::from(r),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            config::discover_root(&cwd)
        }
    }
}

fn load_config(root: &Path, config_file: Option<&str>) -> GateConfig {
    match config_file {
        Some(file) => GateConfig::from_file(Path::new(file)),
        None => GateConfig::load(root),
    }
}

fn epoch_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}
