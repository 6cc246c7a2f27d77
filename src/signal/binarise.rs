//! Cue channel clean-up and binarisation.

use crate::config::{BinariseMode, ChannelConfig};
use crate::signal::frame::{BehaviourFrame, BinaryFrame};
use statrs::statistics::Statistics;
use tracing::debug;

/// A cue channel dipping below this level has picked up the sync signal.
pub const SYNC_CROSSTALK_LEVEL: f64 = -2.0;

/// Fraction of the sync channel that leaks into the cue channel.
const SYNC_CROSSTALK_GAIN: f64 = 0.5;

/// Cancel sync-channel interference on the cue channel.
///
/// Some sessions were recorded with the probe sync line bleeding into the LED
/// cue line, which shows up as large negative excursions. When that is the
/// case half of the sync signal is added back onto the cue. Returns whether
/// the correction was applied.
pub fn correct_sync_crosstalk(frame: &mut BehaviourFrame, channels: &ChannelConfig) -> bool {
    let cue_min = match frame.channel(&channels.cue) {
        Some(cue) => finite_min(cue),
        None => return false,
    };
    if !(cue_min < SYNC_CROSSTALK_LEVEL) {
        return false;
    }
    let sync = match frame.channel(&channels.sync) {
        Some(sync) => sync.to_vec(),
        None => return false,
    };

    if let Some(cue) = frame.channel_mut(&channels.cue) {
        for (c, s) in cue.iter_mut().zip(sync) {
            *c += SYNC_CROSSTALK_GAIN * s;
        }
    }
    debug!(cue_min, "Corrected sync cross-talk on cue channel");
    true
}

/// Minimum over the finite samples; NaN if there are none.
fn finite_min(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    Statistics::min(&finite)
}

/// Convert every channel to {0, 1}.
///
/// Samples strictly above the threshold become 1. With
/// [`BinariseMode::Midpoint`] the threshold sits halfway between the
/// channel's extremes and a flat channel maps to all zeros. NaN samples map
/// to 0.
pub fn binarise(frame: &BehaviourFrame, mode: BinariseMode) -> BinaryFrame {
    let mut names = Vec::with_capacity(frame.names().len());
    let mut channels = Vec::with_capacity(frame.names().len());

    for (name, values) in frame.iter() {
        let threshold = match mode {
            BinariseMode::Fixed(t) => Some(t),
            BinariseMode::Midpoint => midpoint(values),
        };
        let binary = match threshold {
            Some(t) => values.iter().map(|&v| u8::from(v > t)).collect(),
            None => vec![0; values.len()],
        };
        names.push(name.to_string());
        channels.push(binary);
    }

    BinaryFrame::from_parts(names, channels)
}

/// Midpoint between the finite extremes, or `None` for a flat or empty channel.
fn midpoint(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    let lo = Statistics::min(&finite);
    let hi = Statistics::max(&finite);
    if hi > lo {
        Some((lo + hi) / 2.0)
    } else {
        None
    }
}
