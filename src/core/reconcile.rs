//! Reconciliation of hardware cue edges against the trial log.
//!
//! The behaviour trace is the source of truth for sample timing, the trial log
//! for which trials happened. The two are recorded independently and
//! disagree in a handful of well understood ways: the trace stopped before the
//! task did, the last cue offset was not captured, or the controller wrote a
//! final trial holding only its start time. Each of those is handled by a
//! named [`RepairStrategy`], tried in a fixed order. Anything the chain cannot
//! explain is an error, and so is a session where too many cue durations
//! disagree between the two logs.

use crate::core::trials::{RecordingId, TrialRecord};
use crate::error::LabelError;
use tracing::{debug, info, warn};

/// Fraction of trials allowed to have differing cue durations.
pub const DURATION_MISMATCH_TOLERANCE: f64 = 0.05;

/// Cue durations are compared at this resolution, in milliseconds.
pub const DURATION_RESOLUTION_MS: f64 = 100.0;

/// Recordings with a known trial-log defect: (session, recording index, trial to delete).
const KNOWN_SESSION_PATCHES: &[(&str, usize, usize)] = &[
    // Cue input dropped out for one trial
    ("211027_VR49", 1, 52),
];

/// Working state threaded through the repair chain.
#[derive(Debug, Clone)]
pub struct ReconcileState {
    pub recording: RecordingId,
    pub onsets: Vec<usize>,
    pub offsets: Vec<usize>,
    pub trials: Vec<TrialRecord>,
    /// Number of samples in the behaviour trace
    pub trace_len: usize,
    pub sample_rate_hz: f64,
    applied: Vec<&'static str>,
}

impl ReconcileState {
    pub fn new(
        recording: RecordingId,
        onsets: Vec<usize>,
        offsets: Vec<usize>,
        trials: Vec<TrialRecord>,
        trace_len: usize,
        sample_rate_hz: f64,
    ) -> Self {
        Self {
            recording,
            onsets,
            offsets,
            trials,
            trace_len,
            sample_rate_hz,
            applied: Vec::new(),
        }
    }

    /// Names of the repairs applied so far, in order.
    pub fn applied(&self) -> &[&'static str] {
        &self.applied
    }

    pub fn has_applied(&self, name: &str) -> bool {
        self.applied.iter().any(|n| *n == name)
    }

    fn counts_agree(&self) -> bool {
        self.onsets.len() == self.trials.len()
    }

    /// Trial start times projected onto the hardware sample clock, anchored
    /// at the first detected onset.
    pub fn projected_onsets(&self) -> Vec<i64> {
        let (Some(&first_onset), Some(first_trial)) = (self.onsets.first(), self.trials.first())
        else {
            return Vec::new();
        };
        self.trials
            .iter()
            .map(|t| ((t.start - first_trial.start) * self.sample_rate_hz) as i64 + first_onset as i64)
            .collect()
    }

    fn trial_count_error(&self) -> LabelError {
        LabelError::TrialCountMismatch {
            recording: self.recording.to_string(),
            hardware: self.onsets.len(),
            metadata: self.trials.len(),
            diagnosis: self.divergence(),
        }
    }

    /// Describe where the detected onsets and projected trial starts drift apart.
    fn divergence(&self) -> String {
        let projected = self.projected_onsets();
        let tolerance = (DURATION_RESOLUTION_MS * self.sample_rate_hz / 1000.0) as i64;
        let first = self
            .onsets
            .iter()
            .zip(&projected)
            .position(|(&o, &p)| (o as i64 - p).abs() > tolerance);

        match first {
            Some(i) => format!(
                "first divergence at trial {i}: onset at sample {} but trial log projects {}",
                self.onsets[i], projected[i]
            ),
            None => "detected onsets and trial log agree up to the shorter of the two".to_string(),
        }
    }

    fn edge_count_error(&self) -> LabelError {
        LabelError::EdgeCountMismatch {
            recording: self.recording.to_string(),
            onsets: self.onsets.len(),
            offsets: self.offsets.len(),
        }
    }
}

/// Result of trying one repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    Applied,
    NotApplicable,
}

/// One step of the reconciliation chain.
pub trait RepairStrategy {
    /// Name reported in logs and in the [`Reconciled`] result.
    fn name(&self) -> &'static str;

    /// Fix up `state` if this strategy's condition holds.
    fn apply(&self, state: &mut ReconcileState) -> Result<RepairOutcome, LabelError>;
}

/// The hardware trace stopped before the task did: trailing trials in the
/// log have no counterpart in the trace and are dropped.
pub struct TruncatedRecording;

impl RepairStrategy for TruncatedRecording {
    fn name(&self) -> &'static str {
        "truncated_recording"
    }

    fn apply(&self, state: &mut ReconcileState) -> Result<RepairOutcome, LabelError> {
        if state.counts_agree() {
            return Ok(RepairOutcome::NotApplicable);
        }
        let mut projected = state.projected_onsets();
        let trace_len = state.trace_len as i64;
        if !projected.last().is_some_and(|&p| p > trace_len) {
            return Ok(RepairOutcome::NotApplicable);
        }

        while projected.last().is_some_and(|&p| p > trace_len) {
            projected.pop();
            state.trials.pop();
        }
        if !state.counts_agree() {
            return Err(state.trial_count_error());
        }
        Ok(RepairOutcome::Applied)
    }
}

/// Hand-verified fixes for individual recordings.
pub struct KnownSessionPatch;

impl RepairStrategy for KnownSessionPatch {
    fn name(&self) -> &'static str {
        "known_session_patch"
    }

    fn apply(&self, state: &mut ReconcileState) -> Result<RepairOutcome, LabelError> {
        if state.counts_agree() {
            return Ok(RepairOutcome::NotApplicable);
        }
        let patch = KNOWN_SESSION_PATCHES.iter().find(|(session, index, _)| {
            *session == state.recording.session && *index == state.recording.index
        });
        match patch {
            Some(&(_, _, trial)) if trial < state.trials.len() => {
                state.trials.remove(trial);
                Ok(RepairOutcome::Applied)
            }
            _ => Ok(RepairOutcome::NotApplicable),
        }
    }
}

/// Trial counts must agree once the count repairs have run.
pub struct TrialCountGate;

impl RepairStrategy for TrialCountGate {
    fn name(&self) -> &'static str {
        "trial_count_gate"
    }

    fn apply(&self, state: &mut ReconcileState) -> Result<RepairOutcome, LabelError> {
        if state.counts_agree() {
            Ok(RepairOutcome::NotApplicable)
        } else {
            Err(state.trial_count_error())
        }
    }
}

/// The final cue offset was not captured. Its position is taken from the
/// trial log when the last trial has an end time; otherwise the last trial is
/// dropped.
pub struct MissingTrailingOffset;

impl RepairStrategy for MissingTrailingOffset {
    fn name(&self) -> &'static str {
        "missing_trailing_offset"
    }

    fn apply(&self, state: &mut ReconcileState) -> Result<RepairOutcome, LabelError> {
        if state.offsets.len() >= state.onsets.len() {
            return Ok(RepairOutcome::NotApplicable);
        }

        let logged = state.trials.last().and_then(TrialRecord::logged_duration);
        match (state.onsets.last(), logged) {
            (Some(&onset), Some(duration)) => {
                // A corrupt end time saturates here and fails the duration gate
                let offset = onset.saturating_add((duration * state.sample_rate_hz) as usize);
                debug!(onset, offset, "Synthesised final cue offset from trial log");
                state.offsets.push(offset);
            }
            _ => {
                state.onsets.pop();
                state.trials.pop();
            }
        }

        if state.onsets.len() != state.offsets.len() {
            return Err(state.edge_count_error());
        }
        Ok(RepairOutcome::Applied)
    }
}

/// The controller logged a final trial with nothing but its start time. It
/// cannot be characterised without reviewing video, so it is excluded.
pub struct IncompleteFinalTrial;

impl RepairStrategy for IncompleteFinalTrial {
    fn name(&self) -> &'static str {
        "incomplete_final_trial"
    }

    fn apply(&self, state: &mut ReconcileState) -> Result<RepairOutcome, LabelError> {
        if state.has_applied(MissingTrailingOffset.name())
            || state.offsets.len() != state.onsets.len()
            || !state.trials.last().is_some_and(TrialRecord::is_stub)
        {
            return Ok(RepairOutcome::NotApplicable);
        }
        state.trials.pop();
        state.onsets.pop();
        state.offsets.pop();
        Ok(RepairOutcome::Applied)
    }
}

/// Every onset needs exactly one offset.
pub struct EdgeCountGate;

impl RepairStrategy for EdgeCountGate {
    fn name(&self) -> &'static str {
        "edge_count_gate"
    }

    fn apply(&self, state: &mut ReconcileState) -> Result<RepairOutcome, LabelError> {
        if state.onsets.len() == state.offsets.len() {
            Ok(RepairOutcome::NotApplicable)
        } else {
            Err(state.edge_count_error())
        }
    }
}

/// The repair chain in the order it must run.
pub fn default_chain() -> Vec<Box<dyn RepairStrategy>> {
    vec![
        Box::new(TruncatedRecording),
        Box::new(KnownSessionPatch),
        Box::new(TrialCountGate),
        Box::new(MissingTrailingOffset),
        Box::new(IncompleteFinalTrial),
        Box::new(EdgeCountGate),
    ]
}

/// Paired onsets, offsets and trials, index `i` in each being the same trial.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub onsets: Vec<usize>,
    pub offsets: Vec<usize>,
    pub trials: Vec<TrialRecord>,
    /// Repairs that fired, in order
    pub repairs: Vec<&'static str>,
    /// Trials whose hardware and logged cue durations differ
    pub duration_mismatches: usize,
}

/// Run the default repair chain followed by the duration check.
pub fn reconcile(state: ReconcileState) -> Result<Reconciled, LabelError> {
    reconcile_with(state, &default_chain())
}

/// Run `chain` in order, then the duration check.
///
/// A strategy error aborts immediately; nothing is retried.
pub fn reconcile_with(
    mut state: ReconcileState,
    chain: &[Box<dyn RepairStrategy>],
) -> Result<Reconciled, LabelError> {
    if state.onsets.is_empty() {
        return Err(LabelError::NoCueOnsets {
            recording: state.recording.to_string(),
        });
    }

    for strategy in chain {
        if strategy.apply(&mut state)? == RepairOutcome::Applied {
            info!(
                recording = %state.recording,
                repair = strategy.name(),
                onsets = state.onsets.len(),
                trials = state.trials.len(),
                "Applied reconciliation repair"
            );
            state.applied.push(strategy.name());
        }
    }

    let duration_mismatches = check_durations(&state)?;

    Ok(Reconciled {
        onsets: state.onsets,
        offsets: state.offsets,
        trials: state.trials,
        repairs: state.applied,
        duration_mismatches,
    })
}

/// Compare cue durations between the two logs; returns the mismatch count.
fn check_durations(state: &ReconcileState) -> Result<usize, LabelError> {
    let total = state.onsets.len();
    if total == 0 {
        return Err(LabelError::NoTrials {
            recording: state.recording.to_string(),
        });
    }

    let samples_per_unit = DURATION_RESOLUTION_MS * state.sample_rate_hz / 1000.0;
    let mismatched = state
        .onsets
        .iter()
        .zip(&state.offsets)
        .zip(&state.trials)
        .filter(|((&on, &off), trial)| {
            let hardware = (off as f64 - on as f64) / samples_per_unit;
            match trial.logged_duration() {
                // Rounding to the nearest unit with ties to even makes an
                // exact half-unit difference a match.
                Some(logged) => (hardware - logged * 1000.0 / DURATION_RESOLUTION_MS).abs() > 0.5,
                None => true,
            }
        })
        .count();

    if mismatched > 0 {
        warn!(
            recording = %state.recording,
            mismatched,
            total,
            "Cue durations differ between behaviour trace and trial log"
        );
    }
    if mismatched as f64 / total as f64 > DURATION_MISMATCH_TOLERANCE {
        return Err(LabelError::DurationMismatch {
            recording: state.recording.to_string(),
            mismatched,
            total,
        });
    }
    Ok(mismatched)
}
