//! Behaviour trace handling.
//!
//! This module contains:
//! - Multi-channel trace containers and CSV loading
//! - Cue channel cross-talk correction and binarisation
//! - Cue onset / offset detection

pub mod binarise;
pub mod edges;
pub mod frame;

// Re-export commonly used types
pub use binarise::{binarise, correct_sync_crosstalk};
pub use edges::{cue_channel, detect_edges, CueEdges};
pub use frame::{BehaviourFrame, BinaryFrame};
