//! Reach Labels CLI
//!
//! Extracts action labels from behaviour recordings and adds reach onsets
//! from motion tracking.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reach_labels::{
    transparency::create_shared_log_with_persistence, ActionLabelArray, ActionLabels,
    BoundaryLines, Config, CsvTrackingSource, Events, Session, VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reach-labels")]
#[command(version = VERSION)]
#[command(about = "Trial and event labelling for reach-to-grasp recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract action labels for every recording of a session
    Extract {
        /// Session directory containing session.json
        #[arg(long, short)]
        session: PathBuf,
    },

    /// Add reach onsets from motion tracking to saved label arrays
    Inject {
        /// Session directory containing session.json
        #[arg(long, short)]
        session: PathBuf,

        /// Directory of trial-aligned tracking CSVs (default: <session>/tracking)
        #[arg(long)]
        tracking_dir: Option<PathBuf>,
    },

    /// Summarise a saved label array
    Inspect {
        /// Path to an action_labels_<n>.npy file
        path: PathBuf,
    },

    /// Show cumulative processing statistics
    Status,

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { session } => cmd_extract(&session),
        Commands::Inject {
            session,
            tracking_dir,
        } => cmd_inject(&session, tracking_dir),
        Commands::Inspect { path } => cmd_inspect(&path),
        Commands::Status => {
            cmd_status();
            Ok(())
        }
        Commands::Config => {
            cmd_config();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_extract(session_dir: &Path) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let session = Session::load(session_dir)
        .with_context(|| format!("Could not load session from {}", session_dir.display()))?;
    let log = create_shared_log_with_persistence(config.processing_log_path());

    println!("Reach Labels v{VERSION}");
    println!();
    println!("Session: {} ({} recordings)", session.name, session.recordings.len());
    println!("Variant: {:?}", session.variant);
    println!();

    let mut failed = 0;
    for (id, result) in session.extract_all(&config, &log) {
        match result {
            Ok(extraction) => {
                println!("  {id}: {} trials labelled", extraction.labelled_trials);
                for repair in &extraction.repairs {
                    println!("    repair: {repair}");
                }
            }
            Err(e) => {
                eprintln!("  {id}: FAILED: {e}");
                failed += 1;
            }
        }
    }

    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save processing stats: {e}");
    }

    println!();
    println!("Run: {}", log.run_id());
    if failed > 0 {
        bail!("{failed} of {} recordings failed", session.recordings.len());
    }
    Ok(())
}

fn cmd_inject(session_dir: &Path, tracking_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let session = Session::load(session_dir)
        .with_context(|| format!("Could not load session from {}", session_dir.display()))?;
    let log = create_shared_log_with_persistence(config.processing_log_path());
    let source =
        CsvTrackingSource::new(tracking_dir.unwrap_or_else(|| session_dir.join("tracking")));

    println!("Reach Labels v{VERSION}");
    println!();
    println!("Session: {}", session.name);
    println!("Tracking: {}", source.dir.display());
    for view in &config.camera_views {
        println!(
            "  {} ({:?}): {}",
            view.name,
            view.side,
            if BoundaryLines::exists(&session.processed_dir, &view.name) {
                "calibrated"
            } else {
                "no boundary lines"
            }
        );
    }
    println!();

    let report = session
        .inject_slit_crossings(&config, &source, &log)
        .with_context(|| format!("Reach onset injection failed for {}", session.name))?;

    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save processing stats: {e}");
    }

    if report.skipped {
        println!("Session skipped: boundary lines have not been drawn.");
        return Ok(());
    }

    println!("Correct trials: {}", report.trials);
    println!("Reach onsets injected: {}", report.injected);
    println!("Trials without crossing: {}", report.without_crossing);
    Ok(())
}

fn cmd_inspect(path: &Path) -> anyhow::Result<()> {
    let labels = ActionLabelArray::load(path)
        .with_context(|| format!("Could not read label array {}", path.display()))?;

    println!("Label array: {}", path.display());
    println!("Samples: {}", labels.len());
    println!();

    println!("Trials:");
    for (name, label) in ActionLabels::PRIMITIVES {
        let count = labels.trial_starts(*label).len();
        if count > 0 {
            println!("  {name}: {count}");
        }
    }
    println!();

    println!("Events:");
    for (name, event) in Events::PRIMITIVES {
        let count = labels.event_samples(*event).len();
        if count > 0 {
            println!("  {name}: {count}");
        }
    }
    Ok(())
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Reach Labels Status");
    println!("===================");
    println!();

    println!("Configuration:");
    println!("  Sample rate: {} Hz", config.sample_rate_hz);
    println!("  Cue channel: {}", config.channels.cue);
    println!(
        "  Camera views: {}",
        config
            .camera_views
            .iter()
            .map(|v| v.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let stats_path = config.processing_log_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                for (key, label) in [
                    ("recordings_extracted", "Recordings extracted"),
                    ("trials_labelled", "Trials labelled"),
                    ("repairs_applied", "Repairs applied"),
                    ("reach_onsets_injected", "Reach onsets injected"),
                    ("trials_without_crossing", "Trials without crossing"),
                    ("sessions_skipped", "Sessions skipped"),
                ] {
                    if let Some(value) = stats.get(key) {
                        println!("  {label}: {value}");
                    }
                }
                if let Some(updated) = stats.get("last_updated") {
                    println!("  Last updated: {updated}");
                }
            }
        }
    } else {
        println!("No previous processing data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
