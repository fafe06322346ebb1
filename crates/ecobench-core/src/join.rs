//! Key-based merge of two captures.
//!
//! Inner joins keep only keys present on both sides, in left-table row
//! order. Every left row pairs with every right row sharing its key, so
//! duplicate keys multiply. Outer joins additionally keep unmatched rows
//! from both sides with missing cells and are ordered by key.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};
use crate::table::{self, Column, ColumnData, TableView};
use crate::telemetry::TelemetryTable;

/// Default join key column name.
pub const KEY_COLUMN: &str = "timestamp_sec";
/// Default suffix for overlapping left columns.
pub const LEFT_SUFFIX: &str = "_p1";
/// Default suffix for overlapping right columns.
pub const RIGHT_SUFFIX: &str = "_p2";

/// Join strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Outer,
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inner => write!(f, "inner"),
            Self::Outer => write!(f, "outer"),
        }
    }
}

/// Merge parameters.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub key: String,
    pub suffixes: (String, String),
    pub how: JoinKind,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            key: KEY_COLUMN.to_string(),
            suffixes: (LEFT_SUFFIX.to_string(), RIGHT_SUFFIX.to_string()),
            how: JoinKind::Inner,
        }
    }
}

/// Row accounting for one merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JoinStats {
    pub left_rows: usize,
    pub right_rows: usize,
    /// Output rows whose key appeared on both sides.
    pub matched_rows: usize,
    /// Left rows whose key never appeared on the right.
    pub left_unmatched: usize,
    /// Right rows whose key never appeared on the left.
    pub right_unmatched: usize,
    pub output_rows: usize,
}

impl JoinStats {
    pub fn dropped_rows(&self) -> usize {
        self.left_unmatched + self.right_unmatched
    }
}

/// Result of merging two captures.
#[derive(Debug, Clone)]
pub struct MergedTable {
    key: String,
    rows: usize,
    columns: Vec<Column>,
}

impl MergedTable {
    pub fn key(&self) -> &str {
        &self.key
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

    /// Numeric cells of `name`.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)
            .ok_or_else(|| CompareError::UnknownColumn(name.to_string()))?
            .numeric()
    }

    /// Add (or replace) `name` as the elementwise sum `a + b`.
    ///
    /// A missing operand makes the result cell missing. The sum of two
    /// integral columns stays integral while no cell is missing.
    pub fn add_sum_column(&mut self, name: &str, a: &str, b: &str) -> Result<()> {
        let integral = [a, b]
            .iter()
            .all(|n| self.column(n).is_some_and(|c| c.integral));
        let lhs = self.numeric(a)?;
        let rhs = self.numeric(b)?;
        let sum: Vec<Option<f64>> = lhs
            .iter()
            .zip(rhs)
            .map(|(x, y)| match (x, y) {
                (Some(x), Some(y)) => Some(x + y),
                _ => None,
            })
            .collect();
        let column = if integral {
            Column::integer(name, sum)
        } else {
            Column::new(name, ColumnData::Numeric(sum))
        };
        table::upsert(&mut self.columns, column);
        Ok(())
    }

    /// Project columns in the given order.
    pub fn select(&self, names: &[&str]) -> Result<TableView<'_>> {
        TableView::select(&self.columns, names, self.rows)
    }

    /// View over every column.
    pub fn view(&self) -> TableView<'_> {
        TableView::all(&self.columns, self.rows)
    }
}

/// Merge two captures on `options.key`.
///
/// Both tables must already carry the key column (see
/// [`TelemetryTable::with_floored_key`]). Column order follows the left
/// table (key in place), then the right table's non-key columns. Names that
/// occur on both sides get the suffix pair.
pub fn merge(
    left: &TelemetryTable,
    right: &TelemetryTable,
    options: &MergeOptions,
) -> Result<(MergedTable, JoinStats)> {
    let (ls, rs) = &options.suffixes;
    if ls == rs {
        return Err(CompareError::InvalidConfig(format!(
            "left and right suffixes must differ (both '{ls}')"
        )));
    }

    let left_keys = key_cells(left, &options.key)?;
    let right_keys = key_cells(right, &options.key)?;

    let mut right_index: HashMap<NaiveDateTime, Vec<usize>> = HashMap::new();
    for (j, key) in right_keys.iter().enumerate() {
        if let Some(k) = key {
            right_index.entry(*k).or_default().push(j);
        }
    }
    let left_set: HashSet<NaiveDateTime> = left_keys.iter().flatten().copied().collect();

    let mut pairs: Vec<(Option<usize>, Option<usize>)> = Vec::new();
    let mut left_unmatched = 0usize;
    for (i, key) in left_keys.iter().enumerate() {
        match key.and_then(|k| right_index.get(&k)) {
            Some(matches) => pairs.extend(matches.iter().map(|&j| (Some(i), Some(j)))),
            None => {
                left_unmatched += 1;
                if options.how == JoinKind::Outer {
                    pairs.push((Some(i), None));
                }
            }
        }
    }
    let matched_rows = pairs.iter().filter(|(l, r)| l.is_some() && r.is_some()).count();

    let mut right_unmatched = 0usize;
    for (j, key) in right_keys.iter().enumerate() {
        let seen = key.is_some_and(|k| left_set.contains(&k));
        if !seen {
            right_unmatched += 1;
            if options.how == JoinKind::Outer {
                pairs.push((None, Some(j)));
            }
        }
    }

    let pair_key = |(l, r): &(Option<usize>, Option<usize>)| -> Option<NaiveDateTime> {
        l.and_then(|i| left_keys[i]).or_else(|| r.and_then(|j| right_keys[j]))
    };
    if options.how == JoinKind::Outer {
        pairs.sort_by_key(|p| pair_key(p));
    }

    let left_rows: Vec<Option<usize>> = pairs.iter().map(|(l, _)| *l).collect();
    let right_rows: Vec<Option<usize>> = pairs.iter().map(|(_, r)| *r).collect();

    let left_names: HashSet<&str> = left
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .filter(|n| *n != options.key)
        .collect();
    let right_names: HashSet<&str> = right
        .columns()
        .iter()
        .map(|c| c.name.as_str())
        .filter(|n| *n != options.key)
        .collect();

    let mut columns = Vec::with_capacity(left.columns().len() + right.columns().len());
    for col in left.columns() {
        if col.name == options.key {
            let keys: Vec<Option<NaiveDateTime>> = pairs.iter().map(|p| pair_key(p)).collect();
            columns.push(Column::new(&options.key, ColumnData::Timestamp(keys)));
            continue;
        }
        let name = if right_names.contains(col.name.as_str()) {
            format!("{}{}", col.name, ls)
        } else {
            col.name.clone()
        };
        columns.push(col.gather_as(name, &left_rows));
    }
    for col in right.columns() {
        if col.name == options.key {
            continue;
        }
        let name = if left_names.contains(col.name.as_str()) {
            format!("{}{}", col.name, rs)
        } else {
            col.name.clone()
        };
        columns.push(col.gather_as(name, &right_rows));
    }

    let stats = JoinStats {
        left_rows: left.len(),
        right_rows: right.len(),
        matched_rows,
        left_unmatched,
        right_unmatched,
        output_rows: pairs.len(),
    };

    if options.how == JoinKind::Inner && stats.dropped_rows() > 0 {
        log::warn!(
            "inner join on '{}' dropped {} unmatched rows ({} from {}, {} from {})",
            options.key,
            stats.dropped_rows(),
            left_unmatched,
            left.source().display(),
            right_unmatched,
            right.source().display()
        );
    }

    Ok((
        MergedTable {
            key: options.key.clone(),
            rows: pairs.len(),
            columns,
        },
        stats,
    ))
}

fn key_cells<'a>(table: &'a TelemetryTable, key: &str) -> Result<&'a [Option<NaiveDateTime>]> {
    table
        .column(key)
        .ok_or_else(|| CompareError::UnknownColumn(key.to_string()))?
        .timestamps()
        .ok_or_else(|| {
            CompareError::InvalidConfig(format!("join key '{key}' is not a timestamp column"))
        })
}
