//! Auditable record of what the pipeline did.
//!
//! Counts recordings, trials, repairs and reach onsets across runs so a
//! dataset's provenance can be checked without re-running extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Processing statistics for the current run, optionally accumulated on disk.
#[derive(Debug)]
pub struct ProcessingLog {
    /// Recordings whose action labels were extracted and saved
    recordings_extracted: AtomicU64,
    /// Trials that received an action label
    trials_labelled: AtomicU64,
    /// Reconciliation repairs that fired
    repairs_applied: AtomicU64,
    /// `reach_onset` events written
    reach_onsets_injected: AtomicU64,
    /// Correct trials where no view saw a boundary crossing
    trials_without_crossing: AtomicU64,
    /// Sessions skipped for lack of calibration
    sessions_skipped: AtomicU64,
    /// Identifier of this run
    run_id: Uuid,
    /// Run start time
    run_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl ProcessingLog {
    /// Create a new processing log.
    pub fn new() -> Self {
        Self {
            recordings_extracted: AtomicU64::new(0),
            trials_labelled: AtomicU64::new(0),
            repairs_applied: AtomicU64::new(0),
            reach_onsets_injected: AtomicU64::new(0),
            trials_without_crossing: AtomicU64::new(0),
            sessions_skipped: AtomicU64::new(0),
            run_id: Uuid::new_v4(),
            run_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a processing log that continues from, and saves to, `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            warn!("Could not load previous processing stats: {e}");
        }

        log
    }

    /// Record an extracted recording with its labelled trials and repairs.
    pub fn record_extraction(&self, trials: u64, repairs: u64) {
        self.recordings_extracted.fetch_add(1, Ordering::Relaxed);
        self.trials_labelled.fetch_add(trials, Ordering::Relaxed);
        self.repairs_applied.fetch_add(repairs, Ordering::Relaxed);
    }

    /// Record injected reach onsets.
    pub fn record_reach_onsets(&self, count: u64) {
        self.reach_onsets_injected.fetch_add(count, Ordering::Relaxed);
    }

    /// Record trials left without a reach onset.
    pub fn record_trials_without_crossing(&self, count: u64) {
        self.trials_without_crossing
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Record a session skipped during reach onset injection.
    pub fn record_session_skipped(&self) {
        self.sessions_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ProcessingStats {
        ProcessingStats {
            recordings_extracted: self.recordings_extracted.load(Ordering::Relaxed),
            trials_labelled: self.trials_labelled.load(Ordering::Relaxed),
            repairs_applied: self.repairs_applied.load(Ordering::Relaxed),
            reach_onsets_injected: self.reach_onsets_injected.load(Ordering::Relaxed),
            trials_without_crossing: self.trials_without_crossing.load(Ordering::Relaxed),
            sessions_skipped: self.sessions_skipped.load(Ordering::Relaxed),
            run_id: self.run_id,
            run_start: self.run_start,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Processing Statistics:\n\
             - Recordings extracted: {}\n\
             - Trials labelled: {}\n\
             - Reconciliation repairs applied: {}\n\
             - Reach onsets injected: {}\n\
             - Trials without boundary crossing: {}\n\
             - Sessions skipped (no calibration): {}\n\
             - Run: {} (started {})",
            stats.recordings_extracted,
            stats.trials_labelled,
            stats.repairs_applied,
            stats.reach_onsets_injected,
            stats.trials_without_crossing,
            stats.sessions_skipped,
            stats.run_id,
            stats.run_start.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                recordings_extracted: stats.recordings_extracted,
                trials_labelled: stats.trials_labelled,
                repairs_applied: stats.repairs_applied,
                reach_onsets_injected: stats.reach_onsets_injected,
                trials_without_crossing: stats.trials_without_crossing,
                sessions_skipped: stats.sessions_skipped,
                last_run_id: stats.run_id,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.recordings_extracted
                    .store(persisted.recordings_extracted, Ordering::Relaxed);
                self.trials_labelled
                    .store(persisted.trials_labelled, Ordering::Relaxed);
                self.repairs_applied
                    .store(persisted.repairs_applied, Ordering::Relaxed);
                self.reach_onsets_injected
                    .store(persisted.reach_onsets_injected, Ordering::Relaxed);
                self.trials_without_crossing
                    .store(persisted.trials_without_crossing, Ordering::Relaxed);
                self.sessions_skipped
                    .store(persisted.sessions_skipped, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.recordings_extracted.store(0, Ordering::Relaxed);
        self.trials_labelled.store(0, Ordering::Relaxed);
        self.repairs_applied.store(0, Ordering::Relaxed);
        self.reach_onsets_injected.store(0, Ordering::Relaxed);
        self.trials_without_crossing.store(0, Ordering::Relaxed);
        self.sessions_skipped.store(0, Ordering::Relaxed);
    }
}

impl Default for ProcessingLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of processing statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub recordings_extracted: u64,
    pub trials_labelled: u64,
    pub repairs_applied: u64,
    pub reach_onsets_injected: u64,
    pub trials_without_crossing: u64,
    pub sessions_skipped: u64,
    pub run_id: Uuid,
    pub run_start: DateTime<Utc>,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    recordings_extracted: u64,
    trials_labelled: u64,
    repairs_applied: u64,
    reach_onsets_injected: u64,
    trials_without_crossing: u64,
    sessions_skipped: u64,
    last_run_id: Uuid,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared processing log.
pub type SharedProcessingLog = Arc<ProcessingLog>;

/// Create a new shared processing log.
pub fn create_shared_log() -> SharedProcessingLog {
    Arc::new(ProcessingLog::new())
}

/// Create a new shared processing log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedProcessingLog {
    Arc::new(ProcessingLog::with_persistence(path))
}
