//! Per-sample action and event label storage.

use crate::core::npy;
use crate::error::LabelError;
use crate::taxonomy::{ActionLabels, Events};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One row per behaviour sample: column 0 holds action bits, column 1 event bits.
///
/// Action bits are written once per trial at its cue onset. Event bits mark
/// sub-trial timepoints and may accumulate over several passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLabelArray {
    rows: Vec<[u64; 2]>,
}

impl ActionLabelArray {
    /// A zero-filled array covering `len` samples.
    pub fn zeros(len: usize) -> Self {
        Self {
            rows: vec![[0, 0]; len],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Action labels at `sample`, empty when out of range.
    pub fn action(&self, sample: usize) -> ActionLabels {
        self.rows
            .get(sample)
            .map(|row| ActionLabels::from_bits(row[0]))
            .unwrap_or_default()
    }

    /// Event labels at `sample`, empty when out of range.
    pub fn events(&self, sample: usize) -> Events {
        self.rows
            .get(sample)
            .map(|row| Events::from_bits(row[1]))
            .unwrap_or_default()
    }

    /// OR an action label into `sample`. Returns false if the sample is out of range.
    pub fn add_action(&mut self, sample: usize, label: ActionLabels) -> bool {
        match self.rows.get_mut(sample) {
            Some(row) => {
                row[0] |= label.bits();
                true
            }
            None => false,
        }
    }

    /// OR an event label into `sample`. Returns false if the sample is out of range.
    pub fn add_event(&mut self, sample: usize, event: Events) -> bool {
        match self.rows.get_mut(sample) {
            Some(row) => {
                row[1] |= event.bits();
                true
            }
            None => false,
        }
    }

    /// Samples whose action cell intersects `mask`, in order.
    pub fn trial_starts(&self, mask: ActionLabels) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row[0] & mask.bits() != 0)
            .map(|(i, _)| i)
            .collect()
    }

    /// First sample in `[from, from + window)` whose event cell intersects `mask`.
    pub fn find_event(&self, from: usize, window: usize, mask: Events) -> Option<usize> {
        let end = from.saturating_add(window).min(self.rows.len());
        (from..end).find(|&i| self.rows[i][1] & mask.bits() != 0)
    }

    /// Samples whose event cell intersects `mask`, in order.
    pub fn event_samples(&self, mask: Events) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row[1] & mask.bits() != 0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Raw rows as stored on disk.
    pub fn rows(&self) -> &[[u64; 2]] {
        &self.rows
    }

    /// Save as a `.npy` file readable by NumPy.
    pub fn save(&self, path: &Path) -> Result<(), LabelError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)
            .map_err(|e| LabelError::Io(format!("{}: {e}", path.display())))?;
        npy::write_pairs(BufWriter::new(file), &self.rows)
    }

    /// Load an array previously written by [`save`](Self::save) or NumPy.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let file = std::fs::File::open(path)
            .map_err(|e| LabelError::Io(format!("{}: {e}", path.display())))?;
        let rows = npy::read_pairs(BufReader::new(file))?;
        Ok(Self { rows })
    }
}
