//! File export of comparison tables: CSV rows or a JSON array of objects.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::error::{CompareError, Result};
use crate::table::{Column, ColumnData, TableView};

/// Timestamp layout used in exported files.
const EXPORT_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Parse a format name (`csv` or `json`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Infer a format from the file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_name)
            .unwrap_or(Self::Csv)
    }
}

/// Write `view` to `path` in the given format.
pub fn export_table(view: &TableView<'_>, path: &Path, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(view, path),
        ExportFormat::Json => write_json(view, path),
    }
}

/// Write a header row and one row per record. Missing cells are empty.
pub fn write_csv(view: &TableView<'_>, path: &Path) -> Result<()> {
    let export_err = |e: csv::Error| CompareError::Export {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(export_err)?;
    writer
        .write_record(view.column_names())
        .map_err(export_err)?;
    for row in 0..view.row_count() {
        let record: Vec<String> = view
            .columns()
            .iter()
            .map(|c| cell_text(&c.data, row))
            .collect();
        writer.write_record(&record).map_err(export_err)?;
    }
    writer.flush().map_err(|source| CompareError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a pretty-printed JSON array, one object per row.
///
/// Numbers stay numbers (integers for integer columns), timestamps become ISO-8601 strings, and missing or
/// non-finite cells become `null`.
pub fn write_json(view: &TableView<'_>, path: &Path) -> Result<()> {
    let rows = json_rows(view);
    let file = File::create(path).map_err(|source| CompareError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &rows).map_err(|e| CompareError::Export {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    writer.flush().map_err(|source| CompareError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the JSON representation of a view.
pub fn json_rows(view: &TableView<'_>) -> Vec<Value> {
    (0..view.row_count())
        .map(|row| {
            let mut obj = Map::new();
            for col in view.columns() {
                obj.insert(col.name.clone(), cell_json(col, row));
            }
            Value::Object(obj)
        })
        .collect()
}

fn cell_text(data: &ColumnData, row: usize) -> String {
    match data {
        ColumnData::Timestamp(v) => v
            .get(row)
            .copied()
            .flatten()
            .map(|ts| ts.format(EXPORT_TIMESTAMP).to_string())
            .unwrap_or_default(),
        ColumnData::Numeric(v) => v
            .get(row)
            .copied()
            .flatten()
            .map(|x| x.to_string())
            .unwrap_or_default(),
        ColumnData::Text(v) => v.get(row).cloned().flatten().unwrap_or_default(),
    }
}

fn cell_json(column: &Column, row: usize) -> Value {
    match &column.data {
        ColumnData::Timestamp(v) => v
            .get(row)
            .copied()
            .flatten()
            .map_or(Value::Null, |ts| Value::String(ts.format(EXPORT_TIMESTAMP).to_string())),
        ColumnData::Numeric(v) => match v.get(row).copied().flatten() {
            Some(x) if column.integral => Value::from(x as i64),
            Some(x) => Number::from_f64(x).map_or(Value::Null, Value::Number),
            None => Value::Null,
        },
        ColumnData::Text(v) => v
            .get(row)
            .cloned()
            .flatten()
            .map_or(Value::Null, Value::String),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn columns() -> Vec<Column> {
        let t = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        vec![
            Column::new("timestamp_sec", ColumnData::Timestamp(vec![Some(t), None])),
            Column::new("sum_process_gpu", ColumnData::Numeric(vec![Some(95.5), None])),
            Column::new("note", ColumnData::Text(vec![Some("a,b".into()), None])),
        ]
    }

    #[test]
    fn format_from_name_and_path() {
        assert_eq!(ExportFormat::from_name("JSON"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_name("csv"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_name("xml"), None);
        assert_eq!(
            ExportFormat::from_path(Path::new("out/merged.json")),
            ExportFormat::Json
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("merged")),
            ExportFormat::Csv
        );
    }

    #[test]
    fn csv_export_writes_header_and_quotes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("merged.csv");
        let cols = columns();
        write_csv(&TableView::all(&cols, 2), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp_sec,sum_process_gpu,note");
        assert_eq!(lines[1], "2025-03-10T12:00:00,95.5,\"a,b\"");
        assert_eq!(lines[2], ",,");
    }

    #[test]
    fn json_export_uses_nulls_for_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("merged.json");
        let cols = columns();
        write_json(&TableView::all(&cols, 2), &path).unwrap();

        let parsed: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["timestamp_sec"], "2025-03-10T12:00:00");
        assert_eq!(parsed[0]["sum_process_gpu"], 95.5);
        assert!(parsed[1]["sum_process_gpu"].is_null());
        assert!(parsed[1]["note"].is_null());
    }

    #[test]
    fn json_writes_integer_columns_as_integers() {
        let cols = vec![
            Column::integer("pid", vec![Some(4242.0)]),
            Column::new("watts", ColumnData::Numeric(vec![Some(150.0)])),
        ];
        let rows = json_rows(&TableView::all(&cols, 1));
        assert_eq!(rows[0]["pid"].to_string(), "4242");
        assert_eq!(rows[0]["watts"].to_string(), "150.0");
    }

    #[test]
    fn json_drops_non_finite_numbers() {
        let cols = vec![Column::new(
            "v",
            ColumnData::Numeric(vec![Some(f64::INFINITY)]),
        )];
        let rows = json_rows(&TableView::all(&cols, 1));
        assert!(rows[0]["v"].is_null());
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let cols = columns();
        let err = write_csv(
            &TableView::all(&cols, 2),
            Path::new("/definitely/not/here/out.csv"),
        )
        .unwrap_err();
        assert!(matches!(err, CompareError::Export { .. }));
    }
}
