//! Plain-text rendering of table views.
//!
//! Layout follows the familiar data-frame printout: a row index on the
//! left, every column right-aligned, numbers printed with one shared
//! precision per column (none for integer columns), and missing cells
//! shown as `NaN`/`NaT`.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};

use crate::table::{Column, ColumnData, TableView};

/// Maximum decimals printed for a float column.
const MAX_DECIMALS: usize = 6;

impl fmt::Display for TableView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            writeln!(f, "Empty table")?;
            writeln!(f, "Columns: [{}]", self.column_names().join(", "))?;
            return write!(f, "Index: []");
        }

        let rows = self.row_count();
        let index: Vec<String> = (0..rows).map(|i| i.to_string()).collect();
        let index_width = index.iter().map(String::len).max().unwrap_or(0);

        let rendered: Vec<(String, Vec<String>)> = self
            .columns()
            .iter()
            .map(|c| (c.name.clone(), render_cells(c, rows)))
            .collect();
        let widths: Vec<usize> = rendered
            .iter()
            .map(|(name, cells)| {
                cells
                    .iter()
                    .map(String::len)
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:>index_width$}", "")?;
        for ((name, _), width) in rendered.iter().zip(widths.iter().copied()) {
            write!(f, "  {name:>width$}")?;
        }
        for (row, label) in index.iter().enumerate() {
            writeln!(f)?;
            write!(f, "{label:>index_width$}")?;
            for ((_, cells), width) in rendered.iter().zip(widths.iter().copied()) {
                write!(f, "  {:>width$}", cells[row])?;
            }
        }
        Ok(())
    }
}

/// Render the first `rows` cells of a column for display.
fn render_cells(column: &Column, rows: usize) -> Vec<String> {
    match &column.data {
        ColumnData::Numeric(values) => {
            let decimals = if column.integral {
                0
            } else {
                float_decimals(values)
            };
            values
                .iter()
                .take(rows)
                .map(|v| match v {
                    Some(x) if x.is_finite() => format!("{x:.decimals$}"),
                    Some(x) => format!("{x}"),
                    None => "NaN".to_string(),
                })
                .collect()
        }
        ColumnData::Timestamp(values) => {
            let pattern = timestamp_pattern(values);
            values
                .iter()
                .take(rows)
                .map(|v| v.map_or_else(|| "NaT".to_string(), |ts| ts.format(pattern).to_string()))
                .collect()
        }
        ColumnData::Text(values) => values
            .iter()
            .take(rows)
            .map(|v| v.clone().unwrap_or_else(|| "NaN".to_string()))
            .collect(),
    }
}

/// Shared precision for a float column: enough to show every value
/// exactly up to [`MAX_DECIMALS`], and at least one decimal.
fn float_decimals(values: &[Option<f64>]) -> usize {
    values
        .iter()
        .flatten()
        .filter(|x| x.is_finite())
        .map(|x| {
            let s = format!("{x:.prec$}", prec = MAX_DECIMALS);
            let frac = s.split_once('.').map_or("", |(_, frac)| frac);
            frac.trim_end_matches('0').len()
        })
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Pick the shortest fraction that shows every timestamp in the column.
fn timestamp_pattern(values: &[Option<NaiveDateTime>]) -> &'static str {
    let nanos = values.iter().flatten().map(|ts| ts.nanosecond() % 1_000_000_000);
    let mut pattern = "%Y-%m-%d %H:%M:%S";
    for n in nanos {
        if n % 1_000 != 0 {
            return "%Y-%m-%d %H:%M:%S%.9f";
        } else if n % 1_000_000 != 0 {
            pattern = "%Y-%m-%d %H:%M:%S%.6f";
        } else if n != 0 && pattern == "%Y-%m-%d %H:%M:%S" {
            pattern = "%Y-%m-%d %H:%M:%S%.3f";
        }
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(s: u32, ms: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_milli_opt(12, 0, s, ms)
    }

    #[test]
    fn renders_aligned_table_with_index() {
        let cols = vec![
            Column::new("timestamp_sec", ColumnData::Timestamp(vec![ts(0, 0), ts(1, 0)])),
            Column::new(
                "gpu_power_watts_p1",
                ColumnData::Numeric(vec![Some(120.5), Some(99.25)]),
            ),
        ];
        let view = TableView::all(&cols, 2);
        let out = view.to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "         timestamp_sec  gpu_power_watts_p1");
        assert_eq!(lines[1], "0  2025-03-10 12:00:00              120.50");
        assert_eq!(lines[2], "1  2025-03-10 12:00:01               99.25");
    }

    #[test]
    fn integer_columns_render_without_decimals() {
        let cols = vec![
            Column::integer("gpu_power_watts_p1", vec![Some(150.0), Some(151.0)]),
            Column::new("gpu_power_watts_p2", ColumnData::Numeric(vec![Some(150.0), None])),
        ];
        let out = TableView::all(&cols, 2).to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "   gpu_power_watts_p1  gpu_power_watts_p2");
        assert_eq!(lines[1], "0                 150               150.0");
        assert_eq!(lines[2], "1                 151                 NaN");
    }

    #[test]
    fn missing_cells_render_as_nan() {
        let cols = vec![
            Column::new("k", ColumnData::Timestamp(vec![None])),
            Column::new("v", ColumnData::Numeric(vec![None])),
            Column::new("t", ColumnData::Text(vec![None])),
        ];
        let out = TableView::all(&cols, 1).to_string();
        assert!(out.contains("NaT"));
        assert_eq!(out.matches("NaN").count(), 2);
    }

    #[test]
    fn empty_view_lists_columns() {
        let cols = vec![
            Column::new("timestamp_sec", ColumnData::Timestamp(vec![])),
            Column::new("sum_process_gpu", ColumnData::Numeric(vec![])),
        ];
        let out = TableView::all(&cols, 0).to_string();
        assert_eq!(
            out,
            "Empty table\nColumns: [timestamp_sec, sum_process_gpu]\nIndex: []"
        );
    }

    #[test]
    fn float_precision_is_shared_per_column() {
        assert_eq!(float_decimals(&[Some(1.0), Some(2.0)]), 1);
        assert_eq!(float_decimals(&[Some(1.5), Some(2.125)]), 3);
        assert_eq!(float_decimals(&[Some(1.0 / 3.0)]), MAX_DECIMALS);
        assert_eq!(float_decimals(&[None, Some(f64::NAN)]), 1);
    }

    #[test]
    fn timestamp_fraction_shown_only_when_needed() {
        assert_eq!(timestamp_pattern(&[ts(0, 0), ts(1, 0)]), "%Y-%m-%d %H:%M:%S");
        assert_eq!(
            timestamp_pattern(&[ts(0, 0), ts(1, 3)]),
            "%Y-%m-%d %H:%M:%S%.3f"
        );
    }
}
