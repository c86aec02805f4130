//! Terminal front-end for Infinite Resume.
//!
//! Wires configuration, logging, the persistent journey store, and the
//! session loop together. Commands are read from stdin, one per line.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `infinite-config.yaml` (or defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Open the journey store (JSON files, or memory when `storage.dir` is null)
//! 4. Spawn the stdin reader
//! 5. Run the session loop until `quit`, end of input, or Ctrl-C

mod error;
mod terminal;

use std::path::Path;

use anyhow::Context as _;
use infinite_core::{Command, ResumeConfig, RunSummary, Session, run_session};
use infinite_journey::{JsonFileStore, MemoryStore, SnapshotStore};
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::terminal::TerminalCallback;

/// Config file looked up in the working directory.
const CONFIG_FILE: &str = "infinite-config.yaml";

/// Commands buffered between the stdin reader and the loop.
const COMMAND_BUFFER: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = load_config(Path::new(CONFIG_FILE)).context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level())),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if source == ConfigSource::Defaults {
        info!(path = CONFIG_FILE, "Config file not found, using defaults");
    }
    info!(
        ?source,
        mode = ?config.mode,
        storage_dir = ?config.storage.dir,
        storage_key = config.storage.key,
        seed = config.geometry.seed,
        "Configuration loaded"
    );

    let summary = match config.storage.dir.clone() {
        Some(dir) => run(JsonFileStore::new(dir), &config).await,
        None => {
            info!("No storage directory configured, journey will not persist");
            run(MemoryStore::new(), &config).await
        }
    }
    .context("running session")?;

    if let Some(summary) = summary {
        info!(
            end_reason = ?summary.end_reason,
            commands = summary.commands,
            frames = summary.frames,
            "infinite-resume shutdown complete"
        );
    }
    Ok(())
}

/// Where the configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    /// The config file.
    File,
    /// Built-in defaults; no file was found.
    Defaults,
}

/// Load configuration from `path` if it exists, defaults otherwise.
/// Environment overrides apply in both cases.
///
/// Runs before logging is set up, so it reports the source instead of
/// logging it.
fn load_config(path: &Path) -> Result<(ResumeConfig, ConfigSource), EngineError> {
    if path.exists() {
        Ok((ResumeConfig::from_file(path)?, ConfigSource::File))
    } else {
        Ok((ResumeConfig::from_env()?, ConfigSource::Defaults))
    }
}

/// Open a session over `store` and run it. Returns `None` when interrupted.
async fn run<S: SnapshotStore>(
    store: S,
    config: &ResumeConfig,
) -> Result<Option<RunSummary>, EngineError> {
    let mut session = Session::open(store, config)?;
    let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
    tokio::spawn(read_commands(tx));

    println!("Infinite Resume. You are in {}. Type 'help' for commands.\n", session.state().current_layer);

    let mut callback = TerminalCallback::new();
    tokio::select! {
        summary = run_session(&mut session, &mut rx, &config.timers, &mut callback) => Ok(Some(summary)),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(None)
        }
    }
}

/// Parse stdin lines into commands until end of input or the loop is gone.
async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if tx.send(command).await.is_err() {
                    break;
                }
            }
            Err(e) => eprintln!("! {e}\n"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, source) = load_config(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config.timers, ResumeConfig::default().timers);
    }

    #[test]
    fn present_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "geometry:\n  seed: 7\ntimers:\n  frame_ms: 33\n").unwrap();
        let (config, source) = load_config(&path).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.geometry.seed, 7);
        assert_eq!(config.timers.frame_ms, 33);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "timers:\n  sort_ms: 0\n").unwrap();
        assert!(matches!(load_config(&path), Err(EngineError::Config { .. })));
    }
}
