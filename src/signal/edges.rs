//! Cue onset / offset detection on a binary channel.

use crate::config::ChannelConfig;
use crate::error::LabelError;
use crate::signal::frame::BinaryFrame;
use tracing::debug;

/// Sample indices at which the cue switched on and off.
///
/// An onset is the last low sample before the cue goes high, an offset the
/// last high sample before it goes low. Both sequences are strictly
/// increasing, but nothing ties their lengths to each other or to the trial
/// log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueEdges {
    pub onsets: Vec<usize>,
    pub offsets: Vec<usize>,
}

/// Find every 0→1 and 1→0 transition.
pub fn detect_edges(cue: &[u8]) -> CueEdges {
    let mut edges = CueEdges::default();
    for (i, pair) in cue.windows(2).enumerate() {
        match (pair[0], pair[1]) {
            (0, 1) => edges.onsets.push(i),
            (1, 0) => edges.offsets.push(i),
            _ => {}
        }
    }
    edges
}

/// The binary cue channel, or the legacy channel older recordings used.
pub fn cue_channel<'a>(
    frame: &'a BinaryFrame,
    channels: &ChannelConfig,
) -> Result<&'a [u8], LabelError> {
    if let Some(cue) = frame.channel(&channels.cue) {
        return Ok(cue);
    }
    debug!(
        fallback = %channels.cue_fallback,
        "Cue channel missing, using legacy channel"
    );
    frame
        .channel(&channels.cue_fallback)
        .ok_or_else(|| LabelError::MissingChannel {
            name: channels.cue.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strictly_increasing(v: &[usize]) -> bool {
        v.windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn test_simple_pulse() {
        let edges = detect_edges(&[0, 0, 1, 1, 1, 0, 0]);
        assert_eq!(edges.onsets, vec![1]);
        assert_eq!(edges.offsets, vec![4]);
    }

    #[test]
    fn test_trace_starting_high_and_ending_high() {
        // Leading offset without onset, trailing onset without offset
        let edges = detect_edges(&[1, 0, 1, 0, 1, 1]);
        assert_eq!(edges.onsets, vec![1, 3]);
        assert_eq!(edges.offsets, vec![0, 2]);
    }

    #[test]
    fn test_all_short_sequences() {
        // Exhaustive over every binary sequence up to 12 samples
        for len in 0..=12usize {
            for bits in 0u32..(1 << len) {
                let seq: Vec<u8> = (0..len).map(|i| ((bits >> i) & 1) as u8).collect();
                let edges = detect_edges(&seq);

                let rising = seq.windows(2).filter(|w| w[0] == 0 && w[1] == 1).count();
                let falling = seq.windows(2).filter(|w| w[0] == 1 && w[1] == 0).count();
                assert_eq!(edges.onsets.len(), rising, "{seq:?}");
                assert_eq!(edges.offsets.len(), falling, "{seq:?}");
                assert!(strictly_increasing(&edges.onsets));
                assert!(strictly_increasing(&edges.offsets));
                for &i in &edges.onsets {
                    assert_eq!((seq[i], seq[i + 1]), (0, 1));
                }
            }
        }
    }

    #[test]
    fn test_cue_channel_fallback() {
        let channels = ChannelConfig {
            cue: "cue".to_string(),
            cue_fallback: "old_cue".to_string(),
            sync: "sync".to_string(),
        };
        let frame =
            BinaryFrame::from_parts(vec!["old_cue".to_string()], vec![vec![0, 1, 0]]);
        assert_eq!(cue_channel(&frame, &channels).unwrap(), &[0, 1, 0]);

        let empty = BinaryFrame::from_parts(vec!["other".to_string()], vec![vec![0]]);
        assert!(matches!(
            cue_channel(&empty, &channels),
            Err(LabelError::MissingChannel { .. })
        ));
    }
}
