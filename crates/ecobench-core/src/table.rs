//! Column storage shared by loaded captures, merged tables, and printed views.

use chrono::NaiveDateTime;

use crate::error::{CompareError, Result};

/// Cell storage for one column. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Timestamp(Vec<Option<NaiveDateTime>>),
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Timestamp(v) => v.len(),
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_missing(&self) -> bool {
        match self {
            Self::Timestamp(v) => v.iter().any(Option::is_none),
            Self::Numeric(v) => v.iter().any(Option::is_none),
            Self::Text(v) => v.iter().any(Option::is_none),
        }
    }

    /// Gather cells by row index; `None` produces a missing cell.
    pub fn gather(&self, rows: &[Option<usize>]) -> Self {
        fn pick<T: Clone>(src: &[Option<T>], rows: &[Option<usize>]) -> Vec<Option<T>> {
            rows.iter()
                .map(|r| r.and_then(|i| src.get(i).cloned().flatten()))
                .collect()
        }
        match self {
            Self::Timestamp(v) => Self::Timestamp(pick(v, rows)),
            Self::Numeric(v) => Self::Numeric(pick(v, rows)),
            Self::Text(v) => Self::Text(pick(v, rows)),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
    /// Numeric column whose every cell was an integer literal. Printed
    /// without decimals; cleared once a missing cell appears.
    pub integral: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
            integral: false,
        }
    }

    /// A numeric column of whole numbers.
    pub fn integer(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let data = ColumnData::Numeric(values);
        Self {
            name: name.into(),
            integral: !data.has_missing(),
            data,
        }
    }

    /// Gather rows into a new column called `name`.
    pub fn gather_as(&self, name: impl Into<String>, rows: &[Option<usize>]) -> Self {
        let data = self.data.gather(rows);
        Self {
            name: name.into(),
            integral: self.integral && !data.has_missing(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Numeric cells, or `NotNumeric` for timestamp/text columns.
    pub fn numeric(&self) -> Result<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(v) => Ok(v),
            _ => Err(CompareError::NotNumeric(self.name.clone())),
        }
    }

    /// Timestamp cells, if this is a timestamp column.
    pub fn timestamps(&self) -> Option<&[Option<NaiveDateTime>]> {
        match &self.data {
            ColumnData::Timestamp(v) => Some(v),
            _ => None,
        }
    }
}

/// Find a column by exact name.
pub(crate) fn find<'a>(columns: &'a [Column], name: &str) -> Option<&'a Column> {
    columns.iter().find(|c| c.name == name)
}

/// Insert a column, replacing any existing column of the same name in place.
pub(crate) fn upsert(columns: &mut Vec<Column>, column: Column) {
    if let Some(slot) = columns.iter_mut().find(|c| c.name == column.name) {
        *slot = column;
    } else {
        columns.push(column);
    }
}

/// An ordered projection of columns for display or export.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    columns: Vec<&'a Column>,
    rows: usize,
}

impl<'a> TableView<'a> {
    /// Project `names` out of `columns`; every name must exist.
    pub fn select(columns: &'a [Column], names: &[&str], rows: usize) -> Result<Self> {
        let picked = names
            .iter()
            .map(|name| {
                find(columns, name).ok_or_else(|| CompareError::UnknownColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            columns: picked,
            rows,
        })
    }

    /// View over every column.
    pub fn all(columns: &'a [Column], rows: usize) -> Self {
        Self {
            columns: columns.iter().collect(),
            rows,
        }
    }

    pub fn columns(&self) -> &[&'a Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Column> {
        vec![
            Column::new("a", ColumnData::Numeric(vec![Some(1.0), None, Some(3.0)])),
            Column::new(
                "b",
                ColumnData::Text(vec![Some("x".into()), Some("y".into()), None]),
            ),
        ]
    }

    #[test]
    fn gather_with_missing_rows() {
        let cols = sample();
        let gathered = cols[0].data.gather(&[Some(2), None, Some(0), Some(1)]);
        assert_eq!(
            gathered,
            ColumnData::Numeric(vec![Some(3.0), None, Some(1.0), None])
        );
    }

    #[test]
    fn integral_flag_dropped_by_missing_rows() {
        let col = Column::integer("pid", vec![Some(10.0), Some(20.0)]);
        assert!(col.integral);
        assert!(col.gather_as("pid_p1", &[Some(1), Some(0)]).integral);
        let outer = col.gather_as("pid_p1", &[Some(0), None]);
        assert!(!outer.integral);
        assert_eq!(outer.data, ColumnData::Numeric(vec![Some(10.0), None]));
        assert!(!Column::integer("x", vec![Some(1.0), None]).integral);
    }

    #[test]
    fn numeric_rejects_text() {
        let cols = sample();
        assert!(cols[0].numeric().is_ok());
        assert!(matches!(
            cols[1].numeric(),
            Err(CompareError::NotNumeric(name)) if name == "b"
        ));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut cols = sample();
        upsert(&mut cols, Column::new("a", ColumnData::Numeric(vec![])));
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].name, "a");
        assert!(cols[0].is_empty());

        upsert(&mut cols, Column::new("c", ColumnData::Numeric(vec![])));
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[2].name, "c");
    }

    #[test]
    fn select_keeps_requested_order() {
        let cols = sample();
        let view = TableView::select(&cols, &["b", "a"], 3).unwrap();
        assert_eq!(view.column_names(), vec!["b", "a"]);
        assert_eq!(view.row_count(), 3);
    }

    #[test]
    fn select_unknown_column_fails() {
        let cols = sample();
        let err = TableView::select(&cols, &["a", "nope"], 3).unwrap_err();
        assert!(matches!(err, CompareError::UnknownColumn(name) if name == "nope"));
    }
}
