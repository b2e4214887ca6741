//! smrun - event-driven state machine interpreter.
//!
//! Loads a state machine definition, registers interest in the variables
//! and timers its guards reference, and drives transitions as events
//! arrive. Idle between events; stops on SIGINT/SIGTERM.

use clap::Parser;
use smrun_engine::{Event, Machine, TimerManager};
use smrun_lang::parse_definition;
use smrun_vars::{MemoryVars, Value, VarRegistry, VarType};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smrun")]
#[command(about = "Event-driven state machine interpreter")]
#[command(version)]
struct Cli {
    /// Verbose event and transition logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON file seeding the variable registry (path -> value)
    #[arg(long)]
    vars: Option<PathBuf>,

    /// State machine definition file
    filename: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    // No definition file is accepted; there is just nothing to run.
    let Some(filename) = cli.filename else {
        return ExitCode::SUCCESS;
    };

    let source = match std::fs::read_to_string(&filename) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("cannot read '{}': {}", filename.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let vars = MemoryVars::open();
    if let Some(path) = &cli.vars {
        if let Err(e) = seed_registry(&vars, path) {
            tracing::error!("cannot load variable seed '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let sender = tx.clone();
    vars.set_notifier(move |handle| {
        let _ = sender.send(Event::Variable(handle));
    });

    // Parsing subscribes guard variables as a side effect, so the
    // notifier must already be in place.
    let outcome = parse_definition(&source, &*vars);
    for diag in &outcome.diagnostics {
        eprintln!("{diag}");
    }

    tracing::info!(
        name = %outcome.machine.name,
        states = outcome.machine.states.len(),
        "state machine loaded"
    );

    let timers = Arc::new(TimerManager::new(tx));
    let mut machine = Machine::new(
        outcome.machine,
        vars.clone() as Arc<dyn VarRegistry>,
        timers,
    );

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("cannot install SIGTERM handler: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = tokio::select! {
        result = machine.run(&mut rx) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("state machine stopped: {e}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::error!("abnormal termination of statemachine");
            ExitCode::FAILURE
        }
        _ = sigterm.recv() => {
            tracing::error!("abnormal termination of statemachine");
            ExitCode::FAILURE
        }
    };

    vars.close();
    code
}

/// Seeds the registry from a JSON object of path -> value. A value may be
/// a bare scalar or a `{"type": ..., "value": ...}` pair for explicit
/// typing (JSON numbers alone cannot express `short`).
fn seed_registry(vars: &MemoryVars, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let root: serde_json::Value = serde_json::from_str(&text)?;
    let entries = root
        .as_object()
        .ok_or("variable seed file must be a JSON object")?;

    for (name, raw) in entries {
        let value =
            seed_value(raw).ok_or_else(|| format!("unsupported seed value for '{}'", name))?;
        vars.define(name, value);
    }
    Ok(())
}

fn seed_value(raw: &serde_json::Value) -> Option<Value> {
    match raw {
        serde_json::Value::Number(n) if n.is_i64() => Some(Value::Int(n.as_i64()? as i32)),
        serde_json::Value::Number(n) => Some(Value::Float(n.as_f64()? as f32)),
        serde_json::Value::String(s) => Some(Value::Str(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Int(i32::from(*b))),
        serde_json::Value::Object(entry) => {
            let ty = match entry.get("type")?.as_str()? {
                "short" => VarType::Short,
                "int" => VarType::Int,
                "float" => VarType::Float,
                "string" => VarType::Str,
                _ => return None,
            };
            seed_value(entry.get("value")?)?.convert_to(ty).ok()
        }
        _ => None,
    }
}
