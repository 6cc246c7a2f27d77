//! Transparency module for reach label extraction.
//!
//! This module provides tools for tracking and exposing what the pipeline
//! did to each dataset, so derived labels can be audited.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, ProcessingLog, ProcessingStats,
    SharedProcessingLog,
};
