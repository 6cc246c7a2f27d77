//! Trial metadata as logged by the task controller.

use crate::error::LabelError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Identifies one recording within a session, e.g. `211027_VR49/1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordingId {
    pub session: String,
    pub index: usize,
}

impl RecordingId {
    pub fn new(session: impl Into<String>, index: usize) -> Self {
        Self {
            session: session.into(),
            index,
        }
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.session, self.index)
    }
}

/// How a trial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Missed,
    Correct,
    Incorrect,
    /// Any outcome that has no action label (early release, timeout, ...)
    #[serde(other)]
    Other,
}

/// Target spout, which is also the side of the cue LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// One entry of the trial log.
///
/// Times are task-clock seconds. Only `start` is guaranteed; the controller
/// sometimes writes a final trial holding nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub start: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spout: Option<Side>,
    /// Cue duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue_duration: Option<f64>,
    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TrialRecord {
    /// A trial holding only its start time.
    pub fn stub(start: f64) -> Self {
        Self {
            start,
            end: None,
            outcome: None,
            spout: None,
            cue_duration: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Number of keys present in the logged record.
    pub fn field_count(&self) -> usize {
        1 + usize::from(self.end.is_some())
            + usize::from(self.outcome.is_some())
            + usize::from(self.spout.is_some())
            + usize::from(self.cue_duration.is_some())
            + self.extra.len()
    }

    /// True for a record that carries nothing but `start`.
    pub fn is_stub(&self) -> bool {
        self.field_count() == 1
    }

    /// Logged cue duration in seconds, if the trial has an end.
    pub fn logged_duration(&self) -> Option<f64> {
        self.end.map(|end| end - self.start)
    }
}

/// The per-recording trial log file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialLog {
    pub trials: Vec<TrialRecord>,
}

impl TrialLog {
    /// Load a trial log from a JSON file.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LabelError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, LabelError> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trial_log() {
        let json = r#"{
            "trials": [
                {"start": 10.0, "end": 10.5, "outcome": "correct", "spout": "left", "reward": 3},
                {"start": 20.0, "end": 20.5, "outcome": "early_release", "spout": "right"},
                {"start": 30.0}
            ]
        }"#;
        let log = TrialLog::from_json(json).unwrap();

        assert_eq!(log.trials.len(), 3);
        assert_eq!(log.trials[0].outcome, Some(Outcome::Correct));
        assert_eq!(log.trials[0].spout, Some(Side::Left));
        assert_eq!(log.trials[0].field_count(), 5);
        assert_eq!(log.trials[1].outcome, Some(Outcome::Other));
        assert!(log.trials[2].is_stub());
        assert!(!log.trials[0].is_stub());
    }

    #[test]
    fn test_logged_duration() {
        let mut trial = TrialRecord::stub(4.0);
        assert_eq!(trial.logged_duration(), None);
        trial.end = Some(4.25);
        assert_eq!(trial.logged_duration(), Some(0.25));
    }

    #[test]
    fn test_recording_id_display() {
        assert_eq!(RecordingId::new("211027_VR49", 1).to_string(), "211027_VR49/1");
    }
}
