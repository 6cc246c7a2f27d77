//! Reach Labels - trial and event labelling for reach-to-grasp recordings.
//!
//! This library turns the hardware behaviour trace of a cued reaching task and
//! its software trial log into a per-sample label array, then refines it with
//! reach onsets detected from motion tracking.
//!
//! # Guarantees
//!
//! - **Reconciled**: labels are only written once the trace and trial log agree
//! - **Audited**: every repair applied to a recording is logged and counted
//! - **Non-destructive**: reach onset injection only adds bits to saved arrays
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Reach Labels                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Signal    │──▶│  Reconcile  │──▶│   Assign    │       │
//! │  │ (binarise)  │   │ (repairs)   │   │  (labels)   │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │  ┌─────────────┐   ┌─────────────┐          ▼              │
//! │  │ Calibration │──▶│  Tracking   │──▶ action_labels.npy    │
//! │  │   (lines)   │   │(reach onset)│                         │
//! │  └─────────────┘   └─────────────┘                         │
//! │         │                 │                                 │
//! │         ▼                 ▼                                 │
//! │  ┌───────────────────────────────┐                          │
//! │  │        Processing Log         │                          │
//! │  └───────────────────────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use reach_labels::{transparency, Config, Session};
//! use std::path::Path;
//!
//! let config = Config::load().unwrap_or_default();
//! let log = transparency::create_shared_log();
//!
//! let session = Session::load(Path::new("/data/211027_VR49")).expect("no session manifest");
//! for (id, result) in session.extract_all(&config, &log) {
//!     if let Err(e) = result {
//!         eprintln!("{id}: {e}");
//!     }
//! }
//! ```

pub mod calibration;
pub mod config;
pub mod core;
pub mod error;
pub mod session;
pub mod signal;
pub mod taxonomy;
pub mod tracking;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use calibration::{BoundaryLine, BoundaryLines, TrialType};
pub use config::{CameraView, Config, ConfigError, ViewSide};
pub use core::{extract_action_labels, ActionLabelArray, Extraction, RecordingId, TaskVariant};
pub use error::LabelError;
pub use session::{CsvTrackingSource, InjectionReport, Session};
pub use taxonomy::{ActionLabels, Events};
pub use tracking::{detect_reach_onsets, TrackingSource};
pub use transparency::{ProcessingLog, ProcessingStats, SharedProcessingLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
