//! Boundary lines ("slit thresholds") drawn on each camera view.

use crate::error::LabelError;
use crate::taxonomy::ActionLabels;
use crate::tracking::geometry::Point;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Trial types that have a boundary line, in drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialType {
    CorrectLeft,
    CorrectRight,
}

impl TrialType {
    pub const ALL: [TrialType; 2] = [TrialType::CorrectLeft, TrialType::CorrectRight];

    /// Action label identifying trials of this type.
    pub fn action(self) -> ActionLabels {
        match self {
            TrialType::CorrectLeft => ActionLabels::CORRECT_LEFT,
            TrialType::CorrectRight => ActionLabels::CORRECT_RIGHT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrialType::CorrectLeft => "correct_left",
            TrialType::CorrectRight => "correct_right",
        }
    }
}

impl std::fmt::Display for TrialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line segment in image coordinates that the hand crosses when reaching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLine {
    pub start: Point,
    pub end: Point,
}

impl BoundaryLine {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// Boundary lines of one camera view, keyed by trial type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLines {
    pub correct_left: BoundaryLine,
    pub correct_right: BoundaryLine,
}

impl BoundaryLines {
    pub fn get(&self, trial_type: TrialType) -> BoundaryLine {
        match trial_type {
            TrialType::CorrectLeft => self.correct_left,
            TrialType::CorrectRight => self.correct_right,
        }
    }

    /// Where lines for `view` are stored within a session's processed directory.
    pub fn path(processed_dir: &Path, view: &str) -> PathBuf {
        processed_dir.join(format!("slit_thresholds_{view}.json"))
    }

    pub fn exists(processed_dir: &Path, view: &str) -> bool {
        Self::path(processed_dir, view).exists()
    }

    /// Load lines from a JSON file.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LabelError::Io(format!("{}: {e}", path.display())))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load lines for `view`, reporting a missing file as missing calibration.
    pub fn load_view(processed_dir: &Path, view: &str) -> Result<Self, LabelError> {
        let path = Self::path(processed_dir, view);
        if !path.exists() {
            return Err(LabelError::MissingCalibration {
                view: view.to_string(),
                path,
            });
        }
        Self::load(&path)
    }

    /// Save lines as JSON, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), LabelError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
