//! Core label extraction.
//!
//! This module contains:
//! - Trial log records
//! - The per-sample action label array and its `.npy` storage
//! - Reconciliation of cue edges against the trial log
//! - Action and cue event label assignment

pub mod assign;
pub mod labels;
mod npy;
pub mod reconcile;
pub mod trials;

// Re-export commonly used types
pub use assign::{extract_action_labels, preprocess, Extraction, TaskVariant};
pub use labels::ActionLabelArray;
pub use reconcile::{reconcile, ReconcileState, Reconciled, RepairOutcome, RepairStrategy};
pub use trials::{Outcome, RecordingId, Side, TrialLog, TrialRecord};
