//! Trial-aligned motion tracking tables.

use crate::error::LabelError;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// One tracked coordinate series.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkColumn {
    /// Tracking model that produced the column, `None` once checked and stripped
    pub scorer: Option<String>,
    /// Session key for tables spanning several sessions
    pub session: Option<String>,
    pub trial: usize,
    pub bodypart: String,
    /// `x`, `y` or `likelihood`
    pub coord: String,
    pub values: Vec<f64>,
}

/// Landmark coordinates for every trial, on a shared time index.
///
/// Time is in seconds relative to the event trials were aligned to, so
/// negative times precede the event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkTable {
    pub time: Vec<f64>,
    pub columns: Vec<LandmarkColumn>,
}

impl LandmarkTable {
    pub fn new(time: Vec<f64>) -> Self {
        Self {
            time,
            columns: Vec::new(),
        }
    }

    /// Add a column, checking its length against the time index.
    pub fn push(&mut self, column: LandmarkColumn) -> Result<(), LabelError> {
        if column.values.len() != self.time.len() {
            return Err(LabelError::ChannelLength {
                name: format!("{}/{}", column.bodypart, column.coord),
                expected: self.time.len(),
                found: column.values.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Distinct scorers in the table.
    pub fn scorers(&self) -> BTreeSet<&str> {
        self.columns.iter().filter_map(|c| c.scorer.as_deref()).collect()
    }

    /// Distinct body part names, in first-seen order.
    pub fn bodyparts(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = Vec::new();
        for column in &self.columns {
            if !parts.contains(&column.bodypart.as_str()) {
                parts.push(&column.bodypart);
            }
        }
        parts
    }

    /// True when the table carries a session level.
    pub fn has_sessions(&self) -> bool {
        self.columns.iter().any(|c| c.session.is_some())
    }

    /// Read a DeepLabCut-style CSV file.
    pub fn read_csv(path: &Path) -> Result<Self, LabelError> {
        let file = std::fs::File::open(path)
            .map_err(|e| LabelError::Io(format!("{}: {e}", path.display())))?;
        Self::from_reader(file)
    }

    /// Parse a DeepLabCut-style CSV.
    ///
    /// The leading rows are column levels named by their first cell: `scorer`,
    /// optionally `session` and `trial`, then `bodyparts` and `coords`. Every
    /// following row starts with the time in seconds. Empty cells are NaN.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LabelError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader);

        let mut scorers = None;
        let mut sessions = None;
        let mut trials = None;
        let mut bodyparts = None;
        let mut coords: Option<Vec<String>> = None;
        let mut time = Vec::new();
        let mut values: Vec<Vec<f64>> = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let mut cells = record.iter();
            let first = cells.next().unwrap_or_default().trim();

            if coords.is_none() {
                let level: Vec<String> = cells.map(|c| c.trim().to_string()).collect();
                match first {
                    "scorer" => scorers = Some(level),
                    "session" => sessions = Some(level),
                    "trial" => trials = Some(level),
                    "bodyparts" => bodyparts = Some(level),
                    "coords" => {
                        values = vec![Vec::new(); level.len()];
                        coords = Some(level);
                    }
                    other => {
                        return Err(LabelError::Parse(format!(
                            "row {row}: unexpected header level {other:?}"
                        )))
                    }
                }
                continue;
            }

            time.push(parse_cell(first, row, 0)?);
            for (i, cell) in cells.enumerate() {
                let column = values.get_mut(i).ok_or_else(|| {
                    LabelError::Parse(format!("row {row} has more cells than the header"))
                })?;
                column.push(parse_cell(cell, row, i + 1)?);
            }
        }

        let coords =
            coords.ok_or_else(|| LabelError::Parse("missing 'coords' header row".to_string()))?;
        let bodyparts = bodyparts
            .ok_or_else(|| LabelError::Parse("missing 'bodyparts' header row".to_string()))?;

        let mut table = Self::new(time);
        for (i, (coord, values)) in coords.into_iter().zip(values).enumerate() {
            let level = |row: &Option<Vec<String>>| row.as_ref().and_then(|r| r.get(i)).cloned();
            let trial = match level(&trials) {
                Some(t) => t
                    .parse()
                    .map_err(|_| LabelError::Parse(format!("bad trial key {t:?}")))?,
                None => 0,
            };
            table.push(LandmarkColumn {
                scorer: level(&scorers),
                session: level(&sessions),
                trial,
                bodypart: bodyparts.get(i).cloned().unwrap_or_default(),
                coord,
                values,
            })?;
        }
        Ok(table)
    }
}

fn parse_cell(cell: &str, row: usize, column: usize) -> Result<f64, LabelError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse()
        .map_err(|e| LabelError::Parse(format!("row {row}, column {column}: {cell:?}: {e}")))
}

/// Require every table to come from the same single tracking model.
///
/// Returns the tables with the scorer level stripped.
pub fn check_scorers(tables: Vec<LandmarkTable>) -> Result<Vec<LandmarkTable>, LabelError> {
    let scorers: BTreeSet<String> = tables
        .iter()
        .flat_map(|t| t.scorers().into_iter().map(str::to_string))
        .collect();
    if scorers.len() != 1 {
        return Err(LabelError::ScorerMismatch {
            scorers: scorers.into_iter().collect(),
        });
    }

    Ok(tables
        .into_iter()
        .map(|mut table| {
            for column in &mut table.columns {
                column.scorer = None;
            }
            table
        })
        .collect())
}
