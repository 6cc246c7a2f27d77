//! Session layout and the per-session processing passes.
//!
//! A session directory holds a `session.json` manifest listing its
//! recordings. Derived files (label arrays, boundary lines, previews) go in
//! its `processed/` subdirectory.

use crate::calibration::{self, BoundaryLines, LineAnnotator, TrialType, VideoSource};
use crate::config::Config;
use crate::core::{
    extract_action_labels, ActionLabelArray, Extraction, RecordingId, TaskVariant, TrialLog,
};
use crate::error::LabelError;
use crate::signal::BehaviourFrame;
use crate::tracking::{
    check_scorers, detect_reach_onsets, get_reach_trajectories, LandmarkTable, TrackingQuery,
    TrackingSource, ViewTrajectories,
};
use crate::transparency::ProcessingLog;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the manifest file inside a session directory.
pub const MANIFEST_FILE: &str = "session.json";

/// One recording of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub index: usize,
    /// Behaviour trace CSV
    pub behaviour: PathBuf,
    /// Trial log JSON
    pub trial_log: PathBuf,
    /// File name of the label array within the processed directory
    pub labels_file: String,
}

/// A session: its recordings and where derived data lives.
#[derive(Debug, Clone)]
pub struct Session {
    pub name: String,
    pub variant: TaskVariant,
    pub processed_dir: PathBuf,
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Manifest {
    name: String,
    #[serde(default)]
    variant: TaskVariant,
    recordings: Vec<ManifestRecording>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ManifestRecording {
    behaviour: PathBuf,
    trial_log: PathBuf,
}

/// Counts from one reach onset injection pass over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionReport {
    /// True if the session was skipped for lack of calibration
    pub skipped: bool,
    pub trials: usize,
    pub injected: usize,
    pub without_crossing: usize,
}

impl Session {
    /// Load the manifest of the session stored in `dir`.
    pub fn load(dir: &Path) -> Result<Self, LabelError> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| LabelError::Io(format!("{}: {e}", path.display())))?;
        let manifest: Manifest = serde_json::from_str(&content)?;

        let recordings = manifest
            .recordings
            .into_iter()
            .enumerate()
            .map(|(index, rec)| Recording {
                index,
                behaviour: dir.join(rec.behaviour),
                trial_log: dir.join(rec.trial_log),
                labels_file: format!("action_labels_{index}.npy"),
            })
            .collect();

        Ok(Self {
            name: manifest.name,
            variant: manifest.variant,
            processed_dir: dir.join("processed"),
            recordings,
        })
    }

    pub fn recording_id(&self, recording: &Recording) -> RecordingId {
        RecordingId::new(self.name.clone(), recording.index)
    }

    pub fn labels_path(&self, recording: &Recording) -> PathBuf {
        self.processed_dir.join(&recording.labels_file)
    }

    /// Extract and save action labels for one recording.
    pub fn extract_recording(
        &self,
        recording: &Recording,
        config: &Config,
        log: &ProcessingLog,
    ) -> Result<Extraction, LabelError> {
        let id = self.recording_id(recording);
        let frame = BehaviourFrame::read_csv(&recording.behaviour)?;
        let trials = TrialLog::load(&recording.trial_log)?.trials;

        let extraction = extract_action_labels(frame, trials, &id, self.variant, config)?;
        let path = self.labels_path(recording);
        extraction.labels.save(&path)?;

        info!(
            recording = %id,
            trials = extraction.labelled_trials,
            repairs = ?extraction.repairs,
            path = %path.display(),
            "Saved action labels"
        );
        log.record_extraction(
            extraction.labelled_trials as u64,
            extraction.repairs.len() as u64,
        );
        Ok(extraction)
    }

    /// Extract every recording; a failure only affects its own recording.
    pub fn extract_all(
        &self,
        config: &Config,
        log: &ProcessingLog,
    ) -> Vec<(RecordingId, Result<Extraction, LabelError>)> {
        self.recordings
            .iter()
            .map(|rec| (self.recording_id(rec), self.extract_recording(rec, config, log)))
            .collect()
    }

    /// Load the saved label array of every recording.
    pub fn action_labels(&self) -> Result<Vec<ActionLabelArray>, LabelError> {
        self.recordings
            .iter()
            .map(|rec| ActionLabelArray::load(&self.labels_path(rec)))
            .collect()
    }

    /// Have the user draw boundary lines for `view`.
    pub fn draw_slit_thresholds<V, A>(
        &self,
        view: &str,
        videos: &V,
        annotator: &mut A,
        force: bool,
    ) -> Result<bool, LabelError>
    where
        V: VideoSource + ?Sized,
        A: LineAnnotator + ?Sized,
    {
        calibration::draw_slit_thresholds(&self.processed_dir, view, videos, annotator, force)
    }

    /// Add `reach_onset` events to every recording's saved label array.
    ///
    /// Skipped, without error, if any configured camera view has no boundary
    /// lines. Each label array is rewritten once, after both trial types have
    /// been processed. Must run only once per session, after extraction.
    pub fn inject_slit_crossings<S>(
        &self,
        config: &Config,
        source: &S,
        log: &ProcessingLog,
    ) -> Result<InjectionReport, LabelError>
    where
        S: TrackingSource + ?Sized,
    {
        let mut lines = Vec::with_capacity(config.camera_views.len());
        for view in &config.camera_views {
            match BoundaryLines::load_view(&self.processed_dir, &view.name) {
                Ok(view_lines) => lines.push(view_lines),
                Err(LabelError::MissingCalibration { view, .. }) => {
                    warn!(session = %self.name, view = %view, "Lines not drawn for session");
                    log.record_session_skipped();
                    return Ok(InjectionReport {
                        skipped: true,
                        ..Default::default()
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let mut all_labels = self.action_labels()?;
        let mut report = InjectionReport::default();

        for (recording, labels) in self.recordings.iter().zip(all_labels.iter_mut()) {
            let id = self.recording_id(recording);

            for trial_type in TrialType::ALL {
                // No tracking is exported for trial types the recording lacks
                if labels.trial_starts(trial_type.action()).is_empty() {
                    debug!(recording = %id, trial_type = %trial_type, "No trials of this type");
                    continue;
                }

                let mut views = Vec::with_capacity(config.camera_views.len());
                for (view, view_lines) in config.camera_views.iter().zip(&lines) {
                    let query = TrackingQuery::for_reach_onsets(trial_type, &view.name);
                    let table = source.aligned_tracking(&id, &query)?;
                    let tables = check_scorers(vec![table])?;
                    let trajectories = get_reach_trajectories(&tables)
                        .pop()
                        .unwrap_or_default();
                    views.push(ViewTrajectories {
                        view,
                        line: view_lines.get(trial_type),
                        trajectories,
                    });
                }

                let onsets =
                    detect_reach_onsets(labels, &id, trial_type, &views, config.sample_rate_hz)?;
                report.trials += onsets.trials;
                report.injected += onsets.injected;
                report.without_crossing += onsets.without_crossing;
                log.record_reach_onsets(onsets.injected as u64);
                log.record_trials_without_crossing(onsets.without_crossing as u64);
            }

            labels.save(&self.labels_path(recording))?;
            info!(recording = %id, "Saved action labels with reach onsets");
        }

        Ok(report)
    }
}

/// Reads trial-aligned tracking exported as CSV files named
/// `<view>_rec<index>_<trial type>.csv` from one directory.
#[derive(Debug, Clone)]
pub struct CsvTrackingSource {
    pub dir: PathBuf,
}

impl CsvTrackingSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, recording: &RecordingId, query: &TrackingQuery<'_>) -> PathBuf {
        self.dir.join(format!(
            "{}_rec{}_{}.csv",
            query.view, recording.index, query.action
        ))
    }
}

impl TrackingSource for CsvTrackingSource {
    fn aligned_tracking(
        &self,
        recording: &RecordingId,
        query: &TrackingQuery<'_>,
    ) -> Result<LandmarkTable, LabelError> {
        LandmarkTable::read_csv(&self.path(recording, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_manifest() {
        let dir = std::env::temp_dir().join("reach-labels-test-manifest");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(MANIFEST_FILE),
            r#"{
                "name": "211027_VR49",
                "recordings": [
                    {"behaviour": "rec0.csv", "trial_log": "rec0.json"},
                    {"behaviour": "rec1.csv", "trial_log": "rec1.json"}
                ]
            }"#,
        )
        .unwrap();

        let session = Session::load(&dir).unwrap();
        assert_eq!(session.variant, TaskVariant::Standard);
        assert_eq!(session.recordings.len(), 2);
        assert_eq!(session.recordings[1].behaviour, dir.join("rec1.csv"));
        assert_eq!(
            session.labels_path(&session.recordings[1]),
            dir.join("processed").join("action_labels_1.npy")
        );
        assert_eq!(
            session.recording_id(&session.recordings[1]).to_string(),
            "211027_VR49/1"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_csv_source_path() {
        let source = CsvTrackingSource::new("/data/tracking");
        let query = TrackingQuery::for_reach_onsets(TrialType::CorrectRight, "LeftCam");
        let path = source.path(&RecordingId::new("s", 2), &query);
        assert_eq!(path, PathBuf::from("/data/tracking/LeftCam_rec2_correct_right.csv"));
    }
}
