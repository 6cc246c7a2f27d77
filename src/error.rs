//! Error types for label extraction and reach-onset detection.

use std::path::PathBuf;

/// Errors raised while extracting or enriching action labels.
///
/// Recording-level variants carry the recording identifier so that a failed
/// batch run points straight at the offending data.
#[derive(Debug)]
pub enum LabelError {
    /// Hardware and trial log disagree on the number of trials after repairs.
    TrialCountMismatch {
        recording: String,
        hardware: usize,
        metadata: usize,
        diagnosis: String,
    },
    /// Cue onsets and offsets could not be paired one-to-one.
    EdgeCountMismatch {
        recording: String,
        onsets: usize,
        offsets: usize,
    },
    /// Too many trials have different cue durations in the two logs.
    DurationMismatch {
        recording: String,
        mismatched: usize,
        total: usize,
    },
    /// The cue channel never switched on.
    NoCueOnsets { recording: String },
    /// Nothing was left after reconciliation.
    NoTrials { recording: String },
    /// Neither the cue channel nor its legacy fallback is present.
    MissingChannel { name: String },
    /// A channel does not have the same number of samples as the others.
    ChannelLength {
        name: String,
        expected: usize,
        found: usize,
    },
    /// A trial lacks a field needed to label it.
    IncompleteTrial {
        recording: String,
        trial: usize,
        field: &'static str,
    },
    /// An expected event bit was not found within the search window.
    MissingEvent {
        recording: String,
        start: usize,
        event: String,
    },
    /// Motion tracking data came from more than one model.
    ScorerMismatch { scorers: Vec<String> },
    /// No videos were available for a camera view.
    NoVideos { view: String },
    /// Boundary lines have not been drawn for a camera view.
    MissingCalibration { view: String, path: PathBuf },
    /// Underlying I/O failure.
    Io(String),
    /// Input could not be parsed.
    Parse(String),
    /// A stored file does not have the expected layout.
    Format(String),
}

impl std::fmt::Display for LabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelError::TrialCountMismatch {
                recording,
                hardware,
                metadata,
                diagnosis,
            } => write!(
                f,
                "{recording}: hardware trace has {hardware} trials but trial log has {metadata} ({diagnosis})"
            ),
            LabelError::EdgeCountMismatch {
                recording,
                onsets,
                offsets,
            } => write!(
                f,
                "{recording}: {onsets} cue onsets cannot be paired with {offsets} offsets"
            ),
            LabelError::DurationMismatch {
                recording,
                mismatched,
                total,
            } => write!(
                f,
                "{recording}: hardware trace and trial log have mismatching trial data \
                 ({mismatched} of {total} cue durations differ)"
            ),
            LabelError::NoCueOnsets { recording } => {
                write!(f, "{recording}: no cue onsets found in hardware trace")
            }
            LabelError::NoTrials { recording } => {
                write!(f, "{recording}: no trials left after reconciliation")
            }
            LabelError::MissingChannel { name } => write!(f, "Channel not found: {name}"),
            LabelError::ChannelLength {
                name,
                expected,
                found,
            } => write!(
                f,
                "Channel {name} has {found} samples, expected {expected}"
            ),
            LabelError::IncompleteTrial {
                recording,
                trial,
                field,
            } => write!(f, "{recording}: trial {trial} has no '{field}'"),
            LabelError::MissingEvent {
                recording,
                start,
                event,
            } => write!(
                f,
                "{recording}: no {event} event after trial start at sample {start}; \
                 action labels probably miscalculated"
            ),
            LabelError::ScorerMismatch { scorers } => {
                write!(f, "Expected exactly one scorer, found {scorers:?}")
            }
            LabelError::NoVideos { view } => {
                write!(f, "No videos were found to draw slits on for {view}")
            }
            LabelError::MissingCalibration { view, path } => {
                write!(f, "Lines not drawn for {view} (expected {path:?})")
            }
            LabelError::Io(e) => write!(f, "IO error: {e}"),
            LabelError::Parse(e) => write!(f, "Parse error: {e}"),
            LabelError::Format(e) => write!(f, "Format error: {e}"),
        }
    }
}

impl std::error::Error for LabelError {}

impl From<std::io::Error> for LabelError {
    fn from(err: std::io::Error) -> Self {
        LabelError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LabelError {
    fn from(err: serde_json::Error) -> Self {
        LabelError::Parse(err.to_string())
    }
}

impl From<csv::Error> for LabelError {
    fn from(err: csv::Error) -> Self {
        LabelError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_recording() {
        let err = LabelError::DurationMismatch {
            recording: "211027_VR49/1".to_string(),
            mismatched: 4,
            total: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("211027_VR49/1"));
        assert!(msg.contains("4 of 40"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LabelError = io_err.into();
        match err {
            LabelError::Io(details) => assert!(details.contains("gone")),
            other => panic!("Expected Io variant, got {other:?}"),
        }
    }
}
