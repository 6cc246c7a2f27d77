//! Reach onset detection from boundary line crossings.
//!
//! For every correct trial the hand trajectory leading up to cue offset is
//! walked backward until it crosses the view's boundary line. The crossing
//! closest to cue offset across all camera views becomes the trial's
//! `reach_onset` event.

use crate::calibration::{BoundaryLine, TrialType};
use crate::config::{CameraView, ViewSide};
use crate::core::labels::ActionLabelArray;
use crate::core::trials::RecordingId;
use crate::error::LabelError;
use crate::taxonomy::{ActionLabels, Events};
use crate::tracking::geometry::segments_intersect;
use crate::tracking::table::LandmarkTable;
use crate::tracking::trajectory::{PawTracks, ReachTrajectories, Track};
use statrs::statistics::Statistics;
use tracing::{debug, warn};

/// How far after a trial start to look for its cue offset, in seconds.
pub const CENTRE_SEARCH_SECS: f64 = 6.0;

/// Number of samples before cue offset used to pick the reaching hand.
pub const HAND_SELECTION_SAMPLES: usize = 10;

/// A request for trial-aligned motion tracking data.
#[derive(Debug, Clone, Copy)]
pub struct TrackingQuery<'a> {
    /// Trials to align
    pub action: ActionLabels,
    /// Camera view whose tracking output is wanted
    pub view: &'a str,
}

impl<'a> TrackingQuery<'a> {
    /// The query used for reach onset detection.
    pub fn for_reach_onsets(trial_type: TrialType, view: &'a str) -> Self {
        Self {
            action: trial_type.action(),
            view,
        }
    }
}

/// Provides trial-aligned landmark tables.
///
/// Time is in seconds relative to each trial's `led_off` event. Trials in
/// the returned table are numbered in the order their action labels appear
/// in the recording, starting at 0.
pub trait TrackingSource {
    fn aligned_tracking(
        &self,
        recording: &RecordingId,
        query: &TrackingQuery<'_>,
    ) -> Result<LandmarkTable, LabelError>;
}

/// Hand trajectories of one camera view together with its boundary line.
#[derive(Debug, Clone)]
pub struct ViewTrajectories<'a> {
    pub view: &'a CameraView,
    pub line: BoundaryLine,
    pub trajectories: ReachTrajectories,
}

/// Which paw is reaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

/// Counts from one detection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnsetReport {
    pub trials: usize,
    pub injected: usize,
    /// Trials where no view saw the hand cross its line
    pub without_crossing: usize,
}

/// Pick the reaching hand from the mean x position over the last
/// [`HAND_SELECTION_SAMPLES`] samples of the window.
///
/// The left camera sees the reaching hand further right in the image, the
/// right camera further left. Ties and missing data pick the right hand.
pub fn select_hand(side: ViewSide, paws: &PawTracks, window_end: usize) -> Hand {
    let x_l = recent_mean_x(&paws.left_hand_median, window_end);
    let x_r = recent_mean_x(&paws.right_hand_median, window_end);
    let left = match side {
        ViewSide::Left => x_l > x_r,
        ViewSide::Right => x_r > x_l,
    };
    if left {
        Hand::Left
    } else {
        Hand::Right
    }
}

fn recent_mean_x(track: &Track, window_end: usize) -> f64 {
    let end = window_end.min(track.len());
    let begin = end.saturating_sub(HAND_SELECTION_SAMPLES);
    let finite: Vec<f64> = track.x[begin..end]
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .collect();
    if finite.is_empty() {
        f64::NAN
    } else {
        Statistics::mean(&finite)
    }
}

/// Time of the most recent crossing of `line` within the first `window_end`
/// samples of `track`.
///
/// Segments are tested from the end of the window backward; the crossing
/// time is that of the earlier endpoint of the first crossing segment.
pub fn last_crossing(
    track: &Track,
    time: &[f64],
    window_end: usize,
    line: BoundaryLine,
) -> Option<f64> {
    let end = window_end.min(track.len()).min(time.len());
    (1..end).rev().find_map(|k| {
        segments_intersect(line.start, line.end, track.point(k - 1), track.point(k))
            .then(|| time[k - 1])
    })
}

/// Number of leading samples at or before time 0.
fn window_end(time: &[f64]) -> usize {
    time.partition_point(|&t| t <= 0.0)
}

/// Crossing time seen by one view for trial `trial`, if any.
fn view_crossing(view: &ViewTrajectories<'_>, trial: usize) -> Option<f64> {
    let paws = view.trajectories.trial(trial)?;
    let end = window_end(&view.trajectories.time);
    let track = match select_hand(view.view.side, paws, end) {
        Hand::Left => &paws.left_hand_median,
        Hand::Right => &paws.right_hand_median,
    };
    last_crossing(track, &view.trajectories.time, end, view.line)
}

/// Add `reach_onset` events for every trial of `trial_type` in one recording.
///
/// Views without a crossing contribute nothing; a trial no view crosses on
/// is skipped with a warning. Fails if a trial start has no cue offset
/// within [`CENTRE_SEARCH_SECS`], as that means the action labels are wrong.
pub fn detect_reach_onsets(
    labels: &mut ActionLabelArray,
    recording: &RecordingId,
    trial_type: TrialType,
    views: &[ViewTrajectories<'_>],
    sample_rate_hz: f64,
) -> Result<OnsetReport, LabelError> {
    let search = (CENTRE_SEARCH_SECS * sample_rate_hz) as usize;
    let starts = labels.trial_starts(trial_type.action());
    let mut report = OnsetReport {
        trials: starts.len(),
        ..Default::default()
    };

    for (trial, &start) in starts.iter().enumerate() {
        let centre = labels
            .find_event(start, search, Events::LED_OFF)
            .ok_or_else(|| LabelError::MissingEvent {
                recording: recording.to_string(),
                start,
                event: "led_off".to_string(),
            })?;

        let onset = views
            .iter()
            .filter_map(|view| {
                let crossing = view_crossing(view, trial);
                debug!(
                    recording = %recording,
                    view = %view.view.name,
                    trial,
                    crossing = ?crossing,
                    "Boundary crossing"
                );
                crossing
            })
            .reduce(f64::max);

        let Some(onset) = onset else {
            warn!(
                recording = %recording,
                trial_type = %trial_type,
                trial,
                "Hand never crossed a boundary line, no reach onset"
            );
            report.without_crossing += 1;
            continue;
        };

        let sample = (centre as f64 + onset * sample_rate_hz).round();
        if sample < 0.0 || !labels.add_event(sample as usize, Events::REACH_ONSET) {
            warn!(
                recording = %recording,
                trial,
                sample,
                "Reach onset falls outside the recording"
            );
            report.without_crossing += 1;
            continue;
        }
        report.injected += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::geometry::Point;
    use std::collections::BTreeMap;

    const RATE: f64 = 1000.0;

    fn vertical_line(x: f64) -> BoundaryLine {
        BoundaryLine::new(Point::new(x, 0.0), Point::new(x, 100.0))
    }

    /// A hand moving right by 1 px per ms from `x0`, on a -20..=5 ms window.
    fn moving(x0: f64) -> (Vec<f64>, Track) {
        let time: Vec<f64> = (-20..=5).map(|ms| ms as f64 / 1000.0).collect();
        let x = (0..time.len()).map(|i| x0 + i as f64).collect();
        let y = vec![50.0; time.len()];
        (time, Track { x, y })
    }

    fn still(x: f64, len: usize) -> Track {
        Track {
            x: vec![x; len],
            y: vec![50.0; len],
        }
    }

    fn trajectories(time: Vec<f64>, left: Track, right: Track) -> ReachTrajectories {
        let mut sessions = BTreeMap::new();
        let mut trials = BTreeMap::new();
        trials.insert(
            0,
            PawTracks {
                left_hand_median: left,
                right_hand_median: right,
            },
        );
        sessions.insert(None, trials);
        ReachTrajectories { time, sessions }
    }

    #[test]
    fn test_select_hand() {
        let paws = PawTracks {
            left_hand_median: still(200.0, 20),
            right_hand_median: still(100.0, 20),
        };
        assert_eq!(select_hand(ViewSide::Left, &paws, 20), Hand::Left);
        assert_eq!(select_hand(ViewSide::Right, &paws, 20), Hand::Right);

        let tied = PawTracks {
            left_hand_median: still(100.0, 20),
            right_hand_median: still(100.0, 20),
        };
        assert_eq!(select_hand(ViewSide::Left, &tied, 20), Hand::Right);
        assert_eq!(select_hand(ViewSide::Right, &tied, 20), Hand::Right);

        let lost = PawTracks {
            left_hand_median: still(f64::NAN, 20),
            right_hand_median: still(100.0, 20),
        };
        assert_eq!(select_hand(ViewSide::Right, &lost, 20), Hand::Right);
    }

    #[test]
    fn test_last_crossing_scans_backward() {
        // Crosses x = 10.5 between samples 10 and 11, and never again
        let (time, track) = moving(0.0);
        let end = window_end(&time);
        assert_eq!(end, 21);
        assert_eq!(last_crossing(&track, &time, end, vertical_line(10.5)), Some(-0.010));

        // Crossing only after time 0 is outside the window
        assert_eq!(last_crossing(&track, &time, end, vertical_line(22.5)), None);
    }

    #[test]
    fn test_last_crossing_prefers_most_recent() {
        let time: Vec<f64> = (-4..=0).map(|ms| ms as f64 / 1000.0).collect();
        // Out across the line, back, and out again
        let track = Track {
            x: vec![0.0, 10.0, 0.0, 0.0, 10.0],
            y: vec![50.0; 5],
        };
        assert_eq!(last_crossing(&track, &time, 5, vertical_line(5.0)), Some(-0.001));
    }

    fn labels_with_trial(start: usize, offset: usize) -> ActionLabelArray {
        let mut labels = ActionLabelArray::zeros(10_000);
        labels.add_action(start, ActionLabels::CORRECT_LEFT);
        labels.add_event(start, Events::LED_ON);
        labels.add_event(offset, Events::LED_OFF);
        labels
    }

    #[test]
    fn test_consensus_is_closest_to_centre() {
        let left_cam = CameraView::new("LeftCam", ViewSide::Left);
        let right_cam = CameraView::new("RightCam", ViewSide::Right);

        // Left camera: left hand further right, crosses at -10 ms
        let (time, hand) = moving(100.0);
        let left_view = ViewTrajectories {
            view: &left_cam,
            line: vertical_line(110.5),
            trajectories: trajectories(time.clone(), hand, still(0.0, 26)),
        };
        // Right camera: right hand further left, crosses at -4 ms
        let (_, hand) = moving(0.0);
        let right_view = ViewTrajectories {
            view: &right_cam,
            line: vertical_line(16.5),
            trajectories: trajectories(time, still(500.0, 26), hand),
        };

        let mut labels = labels_with_trial(1000, 1500);
        let rec = RecordingId::new("220101_TEST", 0);
        let report = detect_reach_onsets(
            &mut labels,
            &rec,
            TrialType::CorrectLeft,
            &[left_view, right_view],
            RATE,
        )
        .unwrap();

        assert_eq!(report.injected, 1);
        assert_eq!(labels.event_samples(Events::REACH_ONSET), vec![1496]);
    }

    #[test]
    fn test_view_without_crossing_contributes_nothing() {
        let left_cam = CameraView::new("LeftCam", ViewSide::Left);
        let right_cam = CameraView::new("RightCam", ViewSide::Right);

        let (time, hand) = moving(100.0);
        let crossing = ViewTrajectories {
            view: &left_cam,
            line: vertical_line(110.5),
            trajectories: trajectories(time.clone(), hand, still(0.0, 26)),
        };
        let missing = ViewTrajectories {
            view: &right_cam,
            line: vertical_line(1000.0),
            trajectories: trajectories(time, still(500.0, 26), still(0.0, 26)),
        };

        let mut labels = labels_with_trial(1000, 1500);
        let rec = RecordingId::new("220101_TEST", 0);
        detect_reach_onsets(
            &mut labels,
            &rec,
            TrialType::CorrectLeft,
            &[crossing, missing],
            RATE,
        )
        .unwrap();
        assert_eq!(labels.event_samples(Events::REACH_ONSET), vec![1490]);
    }

    #[test]
    fn test_no_crossing_skips_trial() {
        let left_cam = CameraView::new("LeftCam", ViewSide::Left);
        let (time, _) = moving(0.0);
        let view = ViewTrajectories {
            view: &left_cam,
            line: vertical_line(1000.0),
            trajectories: trajectories(time, still(0.0, 26), still(0.0, 26)),
        };

        let mut labels = labels_with_trial(1000, 1500);
        let rec = RecordingId::new("220101_TEST", 0);
        let report =
            detect_reach_onsets(&mut labels, &rec, TrialType::CorrectLeft, &[view], RATE).unwrap();

        assert_eq!(report.trials, 1);
        assert_eq!(report.without_crossing, 1);
        assert!(labels.event_samples(Events::REACH_ONSET).is_empty());
    }

    #[test]
    fn test_missing_cue_offset_is_error() {
        // Cue offset 7 s after the trial start is outside the search window
        let mut labels = labels_with_trial(1000, 8000);
        let rec = RecordingId::new("220101_TEST", 0);
        let result = detect_reach_onsets(&mut labels, &rec, TrialType::CorrectLeft, &[], RATE);

        match result {
            Err(LabelError::MissingEvent { start, event, .. }) => {
                assert_eq!(start, 1000);
                assert_eq!(event, "led_off");
            }
            other => panic!("Expected MissingEvent, got {other:?}"),
        }
    }

    #[test]
    fn test_other_trial_type_untouched() {
        let mut labels = labels_with_trial(1000, 1500);
        let rec = RecordingId::new("220101_TEST", 0);
        let report =
            detect_reach_onsets(&mut labels, &rec, TrialType::CorrectRight, &[], RATE).unwrap();
        assert_eq!(report, OnsetReport::default());
    }
}
