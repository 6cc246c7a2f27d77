//! Camera calibration for reach detection.
//!
//! Each camera view gets one boundary line per correct trial type, drawn by
//! hand once per session and stored next to the session's processed data.

pub mod annotate;
pub mod lines;

// Re-export commonly used types
pub use annotate::{
    draw_slit_thresholds, AnnotatorGuard, GreyFrame, LineAnnotator, RawFrame, VideoSource,
};
pub use lines::{BoundaryLine, BoundaryLines, TrialType};
