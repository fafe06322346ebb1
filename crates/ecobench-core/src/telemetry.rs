//! Loading GPU power captures from CSV.
//!
//! A capture is one CSV file with a timestamp column plus power readings.
//! Every column is kept, not only the required ones, so that a merged table
//! carries the full context of both captures.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::{CompareError, Result};
use crate::table::{self, Column, ColumnData, TableView};
use crate::timestamp::{floor_to_second, parse_timestamp};

/// Default timestamp column name.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Default total GPU power column name.
pub const GPU_POWER_COLUMN: &str = "gpu_power_watts";
/// Default per-process GPU power column name.
pub const PROCESS_GPU_POWER_COLUMN: &str = "process_gpu_power_watts";

/// Which columns a capture must provide.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub timestamp_column: String,
    pub required_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timestamp_column: TIMESTAMP_COLUMN.to_string(),
            required_columns: vec![
                GPU_POWER_COLUMN.to_string(),
                PROCESS_GPU_POWER_COLUMN.to_string(),
            ],
        }
    }
}

/// One loaded capture.
#[derive(Debug, Clone)]
pub struct TelemetryTable {
    source: PathBuf,
    timestamp_column: String,
    rows: usize,
    columns: Vec<Column>,
}

impl TelemetryTable {
    /// Load a capture from a CSV file.
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CompareError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, path, options)
    }

    /// Load a capture from any reader; `source` is used in error messages.
    pub fn from_reader<R: Read>(reader: R, source: &Path, options: &LoadOptions) -> Result<Self> {
        let csv_err = |e: csv::Error| CompareError::Csv {
            path: source.to_path_buf(),
            source: e,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_string)
            .collect();

        for required in std::iter::once(&options.timestamp_column).chain(&options.required_columns)
        {
            if !headers.iter().any(|h| h == required) {
                return Err(CompareError::MissingColumn {
                    path: source.to_path_buf(),
                    column: required.clone(),
                });
            }
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            for (slot, value) in cells.iter_mut().zip(record.iter()) {
                slot.push(value.to_string());
            }
        }
        let rows = cells.first().map_or(0, Vec::len);

        let mut columns = Vec::with_capacity(headers.len());
        for (name, raw) in headers.into_iter().zip(cells) {
            let column = if name == options.timestamp_column {
                Column::new(name, ColumnData::Timestamp(parse_timestamp_cells(&raw, source)?))
            } else {
                infer_column(name, raw)
            };
            columns.push(column);
        }

        log::debug!(
            "loaded {} rows x {} columns from {}",
            rows,
            columns.len(),
            source.display()
        );

        Ok(Self {
            source: source.to_path_buf(),
            timestamp_column: options.timestamp_column.clone(),
            rows,
            columns,
        })
    }

    /// Add (or replace) `key` holding each timestamp floored to the second.
    pub fn with_floored_key(mut self, key: &str) -> Self {
        let floored: Vec<Option<NaiveDateTime>> = self
            .timestamps()
            .iter()
            .map(|ts| ts.map(floor_to_second))
            .collect();
        table::upsert(
            &mut self.columns,
            Column::new(key, ColumnData::Timestamp(floored)),
        );
        self
    }

    /// Parsed timestamp cells.
    pub fn timestamps(&self) -> &[Option<NaiveDateTime>] {
        table::find(&self.columns, &self.timestamp_column)
            .and_then(Column::timestamps)
            .unwrap_or(&[])
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        table::find(&self.columns, name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// View over every column.
    pub fn view(&self) -> TableView<'_> {
        TableView::all(&self.columns, self.rows)
    }
}

fn parse_timestamp_cells(raw: &[String], source: &Path) -> Result<Vec<Option<NaiveDateTime>>> {
    raw.iter()
        .enumerate()
        .map(|(i, value)| {
            parse_timestamp(value)
                .map(Some)
                .ok_or_else(|| CompareError::Timestamp {
                    path: source.to_path_buf(),
                    row: i + 1,
                    value: value.clone(),
                })
        })
        .collect()
}

/// Cells read as missing, as `pandas.read_csv` does by default.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(cell: &str) -> bool {
    NA_TOKENS.contains(&cell)
}

/// A column is numeric when every present cell parses as `f64`, and
/// integral when additionally no cell is missing and every cell is an
/// integer literal.
fn infer_column(name: String, raw: Vec<String>) -> Column {
    let numeric: Option<Vec<Option<f64>>> = raw
        .iter()
        .map(|v| {
            if is_missing(v) {
                Some(None)
            } else {
                v.parse::<f64>().ok().map(Some)
            }
        })
        .collect();
    match numeric {
        Some(values) if raw.iter().all(|v| v.parse::<i64>().is_ok()) => {
            Column::integer(name, values)
        }
        Some(values) => Column::new(name, ColumnData::Numeric(values)),
        None => Column::new(
            name,
            ColumnData::Text(
                raw.into_iter()
                    .map(|v| if is_missing(&v) { None } else { Some(v) })
                    .collect(),
            ),
        ),
    }
}
