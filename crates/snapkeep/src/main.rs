//! snapkeep - background version keeper for a single working file.
//!
//! Watches a file that a GUI application saves over, captures a
//! timestamped snapshot per save, and lets the user walk the history or
//! materialize any past version as a new copy.

mod config;
mod hooks;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use hooks::CommandHooks;
use snapkeep_engine::{HistoryCursor, Snapshot, SnapshotStore, WorkingFile};
use snapkeep_util::log::{self, LogConfig, LogLevel};
use snapkeep_watch::FileMonitor;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "snapkeep")]
#[command(author, version, about = "Background version keeper for a single working file", long_about = None)]
struct Cli {
    /// File to protect (overrides configuration)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the working file and snapshot every save
    Watch,
    /// List the snapshot history
    History {
        /// Only show snapshots captured within a window (e.g. 90m, 24h, 7d)
        #[arg(long)]
        within: Option<String>,
        /// Show the newest snapshot first
        #[arg(long)]
        newest_first: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore an earlier snapshot onto the working file
    Undo {
        /// Steps to walk back from the latest snapshot
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Restore a later snapshot onto the working file
    Redo {
        /// Steps to walk forward
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Materialize a snapshot as a new copy next to the working file
    Restore {
        /// Snapshot stamp (yyyyMMdd_HHmmss), or a unique prefix of one
        stamp: String,
    },
    /// Open the snapshot directory in the file manager
    OpenDir,
    /// Show the resolved configuration
    Config,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("resolving current directory")?;
    let mut config = Config::load(&cwd)?;
    if cli.file.is_some() {
        config.file = cli.file.clone();
    }

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        config
            .log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or_default()
    };
    log::init(LogConfig {
        print: true,
        level,
        include_location: cli.verbose,
    });

    match cli.command {
        Commands::Version => {
            println!("snapkeep {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        command => {
            let store = open_store(&config).await?;
            run_command(command, store, &config).await
        }
    }
}

async fn open_store(config: &Config) -> Result<Arc<SnapshotStore>> {
    let path = config.file.clone().context(
        "no working file configured; pass --file or set \"file\" in snapkeep.json",
    )?;
    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };

    let working = WorkingFile::new(path)?;
    let hooks = Arc::new(CommandHooks::new(config.hooks.clone().unwrap_or_default()));
    let store = SnapshotStore::open(working, config.store_config(), hooks).await?;
    Ok(Arc::new(store))
}

async fn run_command(command: Commands, store: Arc<SnapshotStore>, config: &Config) -> Result<()> {
    match command {
        Commands::Watch => watch(store, config).await,
        Commands::History {
            within,
            newest_first,
            json,
        } => history(store, within, newest_first, json).await,
        Commands::Undo { steps } => undo(store, steps).await,
        Commands::Redo { steps } => redo(store, steps).await,
        Commands::Restore { stamp } => restore(store, &stamp).await,
        Commands::OpenDir => {
            open::that(store.snapshot_dir()).context("opening snapshot directory")?;
            println!("{}", store.snapshot_dir().display());
            Ok(())
        }
        Commands::Version | Commands::Config => unreachable!("handled before store setup"),
    }
}

async fn watch(store: Arc<SnapshotStore>, config: &Config) -> Result<()> {
    let monitor = FileMonitor::spawn(Arc::clone(&store), config.monitor_config())?;
    info!("press ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    monitor.shutdown().await;
    Ok(())
}

async fn history(
    store: Arc<SnapshotStore>,
    within: Option<String>,
    newest_first: bool,
    json: bool,
) -> Result<()> {
    let mut snapshots = store.history().await;

    if let Some(spec) = within {
        let cutoff = chrono::Local::now() - parse_window(&spec)?;
        snapshots.retain(|s| s.timestamp >= cutoff);
    }
    if newest_first {
        // Display order only; the underlying history stays ascending.
        snapshots.reverse();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    if snapshots.is_empty() {
        println!("no snapshots");
        return Ok(());
    }
    for snap in &snapshots {
        println!("{}", format_entry(snap));
    }
    Ok(())
}

fn format_entry(snap: &Snapshot) -> String {
    let preview = if snap.has_preview() { "  [preview]" } else { "" };
    format!(
        "{}  {} ({}){}",
        snap.stamp(),
        snap.timestamp.format("%Y-%m-%d %H:%M:%S"),
        snap.age,
        preview
    )
}

/// Parse a display window like `90m`, `24h` or `7d`.
fn parse_window(spec: &str) -> Result<chrono::Duration> {
    let spec = spec.trim();
    if spec.len() < 2 || !spec.is_ascii() {
        bail!("invalid window {spec:?}, expected forms like 90m, 24h or 7d");
    }
    let (value, unit) = spec.split_at(spec.len() - 1);
    let value: i64 = value
        .parse()
        .with_context(|| format!("invalid window {spec:?}"))?;
    match unit {
        "m" => Ok(chrono::Duration::minutes(value)),
        "h" => Ok(chrono::Duration::hours(value)),
        "d" => Ok(chrono::Duration::days(value)),
        _ => bail!("invalid window unit in {spec:?}, expected m, h or d"),
    }
}

async fn undo(store: Arc<SnapshotStore>, steps: u32) -> Result<()> {
    let cursor = HistoryCursor::new(Arc::clone(&store));
    let mut last = None;
    for _ in 0..steps {
        match cursor.undo().await? {
            Some(snapshot) => last = Some(snapshot),
            None => break,
        }
    }
    match last {
        Some(snapshot) => println!("restored {}", snapshot.stamp()),
        None => println!("nothing to undo"),
    }
    Ok(())
}

async fn redo(store: Arc<SnapshotStore>, steps: u32) -> Result<()> {
    let cursor = HistoryCursor::new(Arc::clone(&store));
    let mut last = None;
    for _ in 0..steps {
        match cursor.redo().await? {
            Some(snapshot) => last = Some(snapshot),
            None => break,
        }
    }
    match last {
        Some(snapshot) => println!("restored {}", snapshot.stamp()),
        None => println!("nothing to redo"),
    }
    Ok(())
}

async fn restore(store: Arc<SnapshotStore>, stamp: &str) -> Result<()> {
    let snapshots = store.history().await;
    let matched: Vec<&Snapshot> = snapshots
        .iter()
        .filter(|s| s.stamp().starts_with(stamp))
        .collect();

    match matched.as_slice() {
        [] => bail!("no snapshot matches {stamp:?}"),
        [snapshot] => {
            let restored = store.restore_as_copy(snapshot).await?;
            println!("{}", restored.display());
            Ok(())
        }
        many => bail!("{} snapshots match {stamp:?}, give more digits", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("90m").unwrap(), chrono::Duration::minutes(90));
        assert_eq!(parse_window("24h").unwrap(), chrono::Duration::hours(24));
        assert_eq!(parse_window("7d").unwrap(), chrono::Duration::days(7));
    }

    #[test]
    fn test_parse_window_rejects_garbage() {
        assert!(parse_window("").is_err());
        assert!(parse_window("d").is_err());
        assert!(parse_window("7y").is_err());
        assert!(parse_window("abc").is_err());
    }
}
