//! Multi-channel behaviour traces.

use crate::error::LabelError;
use std::io::Read;
use std::path::Path;

/// Analog behaviour channels sampled on a shared clock.
///
/// Every channel holds the same number of samples; index `i` in one channel
/// refers to the same instant as index `i` in any other.
#[derive(Debug, Clone, Default)]
pub struct BehaviourFrame {
    names: Vec<String>,
    channels: Vec<Vec<f64>>,
}

impl BehaviourFrame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel, checking its length against the existing ones.
    pub fn push_channel(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), LabelError> {
        let name = name.into();
        if let Some(first) = self.channels.first() {
            if first.len() != values.len() {
                return Err(LabelError::ChannelLength {
                    name,
                    expected: first.len(),
                    found: values.len(),
                });
            }
        }
        self.names.push(name);
        self.channels.push(values);
        Ok(())
    }

    /// Builder-style variant of [`push_channel`](Self::push_channel).
    pub fn with_channel(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, LabelError> {
        self.push_channel(name, values)?;
        Ok(self)
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.index_of(name).map(|i| self.channels[i].as_slice())
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        self.index_of(name).map(move |i| &mut self.channels[i])
    }

    /// Iterate over `(name, samples)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.channels.iter().map(Vec::as_slice))
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Read a trace from a CSV file with one header row of channel names.
    pub fn read_csv(path: &Path) -> Result<Self, LabelError> {
        let file = std::fs::File::open(path)
            .map_err(|e| LabelError::Io(format!("{}: {e}", path.display())))?;
        Self::from_reader(file)
    }

    /// Read a trace from any CSV source. Empty cells become NaN.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LabelError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let names: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            for (index, value) in record.iter().enumerate() {
                let value = value.trim();
                let parsed = if value.is_empty() {
                    f64::NAN
                } else {
                    value.parse().map_err(|e| {
                        LabelError::Parse(format!("row {row}, column {index}: {value:?}: {e}"))
                    })?
                };
                columns[index].push(parsed);
            }
        }

        let mut frame = Self::new();
        for (name, values) in names.into_iter().zip(columns) {
            frame.push_channel(name, values)?;
        }
        Ok(frame)
    }
}

/// Binary behaviour channels produced by [`binarise`](super::binarise::binarise).
#[derive(Debug, Clone, Default)]
pub struct BinaryFrame {
    names: Vec<String>,
    channels: Vec<Vec<u8>>,
}

impl BinaryFrame {
    pub(crate) fn from_parts(names: Vec<String>, channels: Vec<Vec<u8>>) -> Self {
        Self { names, channels }
    }

    pub fn len(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn channel(&self, name: &str) -> Option<&[u8]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.channels[i].as_slice())
    }
}
