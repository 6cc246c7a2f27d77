//! Writing action and cue event labels for one recording.

use crate::config::Config;
use crate::core::labels::ActionLabelArray;
use crate::core::reconcile::{reconcile, ReconcileState, Reconciled};
use crate::core::trials::{Outcome, RecordingId, Side, TrialRecord};
use crate::error::LabelError;
use crate::signal::{binarise, correct_sync_crosstalk, cue_channel, detect_edges};
use crate::signal::{BehaviourFrame, BinaryFrame};
use crate::taxonomy::{ActionLabels, Events};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Cues longer than this many milliseconds count as long in cue-only sessions.
pub const LONG_CUE_THRESHOLD_MS: f64 = 125.0;

/// Which labelling scheme a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskVariant {
    /// Reach task: labels by outcome and side
    #[default]
    Standard,
    /// Cue presentation without reaching: labels by side and cue duration
    CueOnly,
}

/// Labels and bookkeeping for one extracted recording.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub labels: ActionLabelArray,
    /// Trials that received an action label
    pub labelled_trials: usize,
    /// Reconciliation repairs that fired, in order
    pub repairs: Vec<&'static str>,
    pub onsets: Vec<usize>,
    pub offsets: Vec<usize>,
}

/// Correct the cue channel, binarise every channel and allocate an empty label array.
pub fn preprocess(mut frame: BehaviourFrame, config: &Config) -> (BinaryFrame, ActionLabelArray) {
    correct_sync_crosstalk(&mut frame, &config.channels);
    let binary = binarise(&frame, config.binarise);
    let labels = ActionLabelArray::zeros(binary.len());
    (binary, labels)
}

/// Action label for a reach-task trial, or `None` for unlabelled outcomes.
pub fn standard_label(outcome: Outcome, side: Side) -> Option<ActionLabels> {
    let label = match (outcome, side) {
        (Outcome::Missed, Side::Left) => ActionLabels::MISS_LEFT,
        (Outcome::Missed, Side::Right) => ActionLabels::MISS_RIGHT,
        (Outcome::Correct, Side::Left) => ActionLabels::CORRECT_LEFT,
        (Outcome::Correct, Side::Right) => ActionLabels::CORRECT_RIGHT,
        (Outcome::Incorrect, Side::Left) => ActionLabels::INCORRECT_LEFT,
        (Outcome::Incorrect, Side::Right) => ActionLabels::INCORRECT_RIGHT,
        (Outcome::Other, _) => return None,
    };
    Some(label)
}

/// Action label for a cue-only trial.
pub fn naive_label(side: Side, cue_duration_ms: f64) -> ActionLabels {
    let long = cue_duration_ms > LONG_CUE_THRESHOLD_MS;
    match (side, long) {
        (Side::Left, false) => ActionLabels::NAIVE_LEFT_SHORT,
        (Side::Left, true) => ActionLabels::NAIVE_LEFT_LONG,
        (Side::Right, false) => ActionLabels::NAIVE_RIGHT_SHORT,
        (Side::Right, true) => ActionLabels::NAIVE_RIGHT_LONG,
    }
}

fn trial_label(
    recording: &RecordingId,
    index: usize,
    trial: &TrialRecord,
    variant: TaskVariant,
) -> Result<Option<ActionLabels>, LabelError> {
    let incomplete = |field| LabelError::IncompleteTrial {
        recording: recording.to_string(),
        trial: index,
        field,
    };

    match variant {
        TaskVariant::Standard => {
            let Some(outcome) = trial.outcome else {
                return Ok(None);
            };
            if outcome == Outcome::Other {
                return Ok(None);
            }
            let side = trial.spout.ok_or_else(|| incomplete("spout"))?;
            Ok(standard_label(outcome, side))
        }
        TaskVariant::CueOnly => {
            let side = trial.spout.ok_or_else(|| incomplete("spout"))?;
            let duration = trial.cue_duration.ok_or_else(|| incomplete("cue_duration"))?;
            Ok(Some(naive_label(side, duration)))
        }
    }
}

/// Extract action labels for one recording.
///
/// Detects cue edges on the preprocessed trace, reconciles them against the
/// trial log, then writes one action label per trial at its cue onset and
/// `led_on` / `led_off` at every reconciled edge. Nothing is returned if any
/// step fails.
pub fn extract_action_labels(
    frame: BehaviourFrame,
    trials: Vec<TrialRecord>,
    recording: &RecordingId,
    variant: TaskVariant,
    config: &Config,
) -> Result<Extraction, LabelError> {
    let (binary, mut labels) = preprocess(frame, config);
    let edges = detect_edges(cue_channel(&binary, &config.channels)?);
    debug!(
        recording = %recording,
        onsets = edges.onsets.len(),
        offsets = edges.offsets.len(),
        trials = trials.len(),
        "Detected cue edges"
    );

    let state = ReconcileState::new(
        recording.clone(),
        edges.onsets,
        edges.offsets,
        trials,
        binary.len(),
        config.sample_rate_hz,
    );
    let Reconciled {
        onsets,
        offsets,
        trials,
        repairs,
        ..
    } = reconcile(state)?;

    // Resolve every label before writing so a bad trial leaves nothing behind
    let actions = trials
        .iter()
        .enumerate()
        .map(|(i, trial)| trial_label(recording, i, trial, variant))
        .collect::<Result<Vec<_>, _>>()?;

    let mut labelled_trials = 0;
    for (&onset, action) in onsets.iter().zip(actions) {
        if let Some(action) = action {
            labels.add_action(onset, action);
            labelled_trials += 1;
        }
    }

    for &onset in &onsets {
        labels.add_event(onset, Events::LED_ON);
    }
    for &offset in &offsets {
        if !labels.add_event(offset, Events::LED_OFF) {
            warn!(
                recording = %recording,
                offset,
                len = labels.len(),
                "Cue offset lies beyond the end of the trace, not labelled"
            );
        }
    }

    Ok(Extraction {
        labels,
        labelled_trials,
        repairs,
        onsets,
        offsets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUE: &str = "cue";

    fn config() -> Config {
        let mut config = Config::default();
        config.channels.cue = CUE.to_string();
        config.channels.cue_fallback = "old_cue".to_string();
        config.channels.sync = "sync".to_string();
        config
    }

    /// A 1 kHz trace with a 5 V cue for each `(onset, offset)` pair.
    fn trace(len: usize, cues: &[(usize, usize)]) -> BehaviourFrame {
        let mut cue = vec![0.0; len];
        for &(on, off) in cues {
            for v in &mut cue[on + 1..=off] {
                *v = 5.0;
            }
        }
        BehaviourFrame::new()
            .with_channel(CUE, cue)
            .unwrap()
            .with_channel("sync", vec![0.0; len])
            .unwrap()
    }

    fn trial(start: f64, outcome: Outcome, spout: Side) -> TrialRecord {
        let mut t = TrialRecord::stub(start);
        t.end = Some(start + 0.5);
        t.outcome = Some(outcome);
        t.spout = Some(spout);
        t
    }

    fn rec() -> RecordingId {
        RecordingId::new("220101_TEST", 0)
    }

    #[test]
    fn test_single_correct_right_trial() {
        let frame = trace(5000, &[(1000, 1500)]);
        let trials = vec![trial(30.0, Outcome::Correct, Side::Right)];

        let extraction =
            extract_action_labels(frame, trials, &rec(), TaskVariant::Standard, &config())
                .unwrap();
        let labels = &extraction.labels;

        assert_eq!(labels.action(1000), ActionLabels::CORRECT_RIGHT);
        for (i, row) in labels.rows().iter().enumerate() {
            if i != 1000 {
                assert_eq!(row[0], 0, "unexpected action at sample {i}");
            }
        }
        assert_eq!(labels.events(1000), Events::LED_ON);
        assert_eq!(labels.events(1500), Events::LED_OFF);
        assert_eq!(extraction.labelled_trials, 1);
    }

    #[test]
    fn test_unmapped_outcome_has_no_action() {
        let frame = trace(30_000, &[(1000, 1500), (11_000, 11_500), (21_000, 21_500)]);
        let mut early = TrialRecord::stub(20.0);
        early.end = Some(20.5);
        early.outcome = Some(Outcome::Other);
        let trials = vec![
            trial(10.0, Outcome::Missed, Side::Left),
            early,
            trial(30.0, Outcome::Incorrect, Side::Left),
        ];

        let extraction =
            extract_action_labels(frame, trials, &rec(), TaskVariant::Standard, &config())
                .unwrap();
        let labels = &extraction.labels;

        assert_eq!(labels.action(1000), ActionLabels::MISS_LEFT);
        assert!(labels.action(11_000).is_empty());
        assert!(labels.events(11_000).contains(Events::LED_ON));
        assert_eq!(labels.action(21_000), ActionLabels::INCORRECT_LEFT);
        assert_eq!(extraction.labelled_trials, 2);
    }

    #[test]
    fn test_missing_spout_is_incomplete() {
        let frame = trace(5000, &[(1000, 1500)]);
        let mut t = trial(30.0, Outcome::Correct, Side::Left);
        t.spout = None;

        let result = extract_action_labels(frame, vec![t], &rec(), TaskVariant::Standard, &config());
        match result {
            Err(LabelError::IncompleteTrial { trial, field, .. }) => {
                assert_eq!(trial, 0);
                assert_eq!(field, "spout");
            }
            other => panic!("Expected IncompleteTrial, got {other:?}"),
        }
    }

    #[test]
    fn test_cue_only_buckets_by_duration() {
        let frame = trace(30_000, &[(1000, 1100), (11_000, 11_200)]);
        let mut short = trial(10.0, Outcome::Other, Side::Left);
        short.end = Some(10.1);
        short.cue_duration = Some(100.0);
        let mut long = trial(20.0, Outcome::Other, Side::Right);
        long.end = Some(20.2);
        long.cue_duration = Some(200.0);

        let extraction = extract_action_labels(
            frame,
            vec![short, long],
            &rec(),
            TaskVariant::CueOnly,
            &config(),
        )
        .unwrap();

        assert_eq!(extraction.labels.action(1000), ActionLabels::NAIVE_LEFT_SHORT);
        assert_eq!(extraction.labels.action(11_000), ActionLabels::NAIVE_RIGHT_LONG);
    }

    #[test]
    fn test_naive_threshold_is_exclusive() {
        assert_eq!(naive_label(Side::Left, 125.0), ActionLabels::NAIVE_LEFT_SHORT);
        assert_eq!(naive_label(Side::Left, 125.5), ActionLabels::NAIVE_LEFT_LONG);
    }

    #[test]
    fn test_synthesised_offset_beyond_trace_is_skipped() {
        // Cue still on when the trace ends, so the offset is synthesised
        // at 1000 + 1500
        let frame = trace(2000, &[(1000, 1999)]);
        let mut t = trial(30.0, Outcome::Correct, Side::Left);
        t.end = Some(31.5);

        let extraction =
            extract_action_labels(frame, vec![t], &rec(), TaskVariant::Standard, &config())
                .unwrap();
        assert_eq!(extraction.repairs, vec!["missing_trailing_offset"]);
        assert_eq!(extraction.offsets, vec![2500]);
        assert!(extraction.labels.event_samples(Events::LED_OFF).is_empty());
    }
}
