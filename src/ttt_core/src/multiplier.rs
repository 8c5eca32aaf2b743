#[cfg(feature = "python")]
use pyo3::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::EffortLevel;
use crate::error::{PacingError, Result};

/// Name of the optional CSV column holding each row's remaining-rider count
pub const RIDERS_COLUMN: &str = "riders";

/// Scales the lead rider's target power for a given number of riders still
/// in the line and a chosen effort level.
pub trait MultiplierSource {
    fn lookup(&self, remaining: usize, effort: EffortLevel) -> Result<f64>;
}

/// The effort level's own fixed multiplier, whatever the rider count.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarMultiplier;

impl MultiplierSource for ScalarMultiplier {
    fn lookup(&self, _remaining: usize, effort: EffortLevel) -> Result<f64> {
        Ok(effort.multiplier())
    }
}

/// Multipliers keyed by effort level and remaining-rider count.
///
/// Loaded once and only read afterwards.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiplierTable {
    /// effort key -> remaining riders -> multiplier
    columns: BTreeMap<u8, BTreeMap<usize, f64>>,
}

impl MultiplierTable {
    pub fn new() -> Self {
        MultiplierTable::default()
    }

    /// Add one multiplier. Counts must be at least 1 and multipliers positive;
    /// a count can only be set once per effort column.
    pub fn insert(&mut self, remaining: usize, effort_key: u8, multiplier: f64) -> Result<()> {
        if remaining == 0 {
            return Err(PacingError::Configuration(
                "multiplier rows start at 1 remaining rider".to_string(),
            ));
        }
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(PacingError::Configuration(format!(
                "multiplier for {} riders at effort {} must be positive, got {}",
                remaining, effort_key, multiplier
            )));
        }
        let column = self.columns.entry(effort_key).or_default();
        if column.insert(remaining, multiplier).is_some() {
            return Err(PacingError::Configuration(format!(
                "duplicate multiplier for {} riders at effort {}",
                remaining, effort_key
            )));
        }
        Ok(())
    }

    /// Parse a table from CSV.
    ///
    /// The header names one column per effort key (`1`, `2`, `3`). A `riders`
    /// column, when present, gives each row's remaining-rider count. Without
    /// it rows are read as counting down, the last row being 1 rider.
    /// An empty header cell marks an index column and is skipped.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);

        let headers = reader.headers()?.clone();
        let mut riders_col = None;
        let mut effort_cols = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            if header.eq_ignore_ascii_case(RIDERS_COLUMN) {
                riders_col = Some(index);
            } else if !header.is_empty() {
                let key: u8 = header.parse().map_err(|_| {
                    PacingError::Configuration(format!("invalid effort column `{}`", header))
                })?;
                effort_cols.push((index, key));
            }
        }
        if effort_cols.is_empty() {
            return Err(PacingError::Configuration(
                "multiplier table has no effort columns".to_string(),
            ));
        }

        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
        let row_count = records.len();

        let mut table = MultiplierTable::new();
        for (row, record) in records.iter().enumerate() {
            let remaining = match riders_col {
                Some(col) => parse_cell::<usize>(record, col, row)?,
                None => row_count - row,
            };
            for &(col, key) in &effort_cols {
                let multiplier = parse_cell::<f64>(record, col, row)?;
                table.insert(remaining, key, multiplier)?;
            }
        }

        tracing::debug!(
            rows = row_count,
            columns = table.columns.len(),
            "loaded multiplier table"
        );
        Ok(table)
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        tracing::info!(path = %path.display(), "reading multiplier table");
        Self::from_reader(file)
    }

    /// Effort keys with a column in the table.
    pub fn effort_keys(&self) -> Vec<u8> {
        self.columns.keys().copied().collect()
    }

    /// Largest remaining-rider count in any column.
    pub fn max_riders(&self) -> usize {
        self.columns
            .values()
            .filter_map(|c| c.keys().next_back().copied())
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl MultiplierSource for MultiplierTable {
    fn lookup(&self, remaining: usize, effort: EffortLevel) -> Result<f64> {
        let column = self.columns.get(&effort.key()).ok_or_else(|| {
            PacingError::Configuration(format!(
                "multiplier table has no column for effort level {}",
                effort.key()
            ))
        })?;
        column.get(&remaining).copied().ok_or_else(|| {
            PacingError::Configuration(format!(
                "multiplier table has no row for {} riders at effort level {}",
                remaining,
                effort.key()
            ))
        })
    }
}

fn parse_cell<T: std::str::FromStr>(record: &csv::StringRecord, col: usize, row: usize) -> Result<T> {
    let cell = record.get(col).ok_or_else(|| {
        PacingError::Configuration(format!("row {} is missing column {}", row + 1, col + 1))
    })?;
    cell.parse().map_err(|_| {
        PacingError::Configuration(format!(
            "row {} column {}: cannot parse `{}`",
            row + 1,
            col + 1,
            cell
        ))
    })
}

#[cfg(feature = "python")]
#[pymethods]
impl MultiplierTable {
    #[new]
    fn py_new() -> Self {
        MultiplierTable::new()
    }

    #[staticmethod]
    #[pyo3(name = "read_from_file")]
    fn py_read_from_file(filepath: &str) -> PyResult<Self> {
        Ok(MultiplierTable::read_from_file(filepath)?)
    }

    #[staticmethod]
    fn from_csv(data: &str) -> PyResult<Self> {
        Ok(MultiplierTable::from_reader(data.as_bytes())?)
    }

    #[pyo3(name = "insert")]
    fn py_insert(&mut self, remaining: usize, effort_key: u8, multiplier: f64) -> PyResult<()> {
        Ok(self.insert(remaining, effort_key, multiplier)?)
    }

    #[pyo3(name = "lookup")]
    fn py_lookup(&self, remaining: usize, effort: EffortLevel) -> PyResult<f64> {
        Ok(self.lookup(remaining, effort)?)
    }

    #[getter(max_riders)]
    fn py_max_riders(&self) -> usize {
        self.max_riders()
    }

    fn __repr__(&self) -> String {
        format!(
            "MultiplierTable(effort_keys={:?}, max_riders={})",
            self.effort_keys(),
            self.max_riders()
        )
    }
}
