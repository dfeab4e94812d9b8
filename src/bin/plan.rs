//! Dry-run planner: runs one scheduling pass for a settings file against an
//! in-memory trigger registry and prints the result as JSON.
//!
//! Usage: `cadence-plan <settings.toml> [engine.toml]`
//!
//! Tracing output goes to stderr so stdout stays machine-readable.

use cadence::{EngineConfig, InMemoryScheduler, MemoryStore, ReminderEngine, ReminderSettings};
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args_os().skip(1);
    let Some(settings_path) = args.next().map(PathBuf::from) else {
        anyhow::bail!("usage: cadence-plan <settings.toml> [engine.toml]");
    };
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(EngineConfig::default_config_path);

    let settings = ReminderSettings::from_file(&settings_path)
        .map_err(|e| anyhow::anyhow!("cannot load {}: {e}", settings_path.display()))?;
    let config = if config_path.is_file() {
        EngineConfig::from_file(&config_path)?
    } else {
        tracing::debug!("no engine config at {}, using defaults", config_path.display());
        EngineConfig::default()
    };

    let registry = Arc::new(InMemoryScheduler::new());
    let engine =
        ReminderEngine::new(registry.clone(), Arc::new(MemoryStore::new())).with_config(config);
    let report = engine.schedule_reminders(&settings);

    let output = serde_json::json!({
        "report": report,
        "triggers": registry.live(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
