//! The comparison pipeline: load two captures, floor their timestamps to
//! the second, join on the floored key, and derive the per-process sum.
//!
//! Two views are produced for printing. The first shows total and
//! per-process GPU power from both captures side by side. The second sets
//! total GPU power against the sum of the two per-process readings. The
//! sum is expected to sit close to the total, but that is left to the
//! reader; nothing here asserts it.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{CompareError, Result};
use crate::join::{self, JoinKind, JoinStats, MergeOptions, MergedTable};
use crate::table::TableView;
use crate::telemetry::{self, LoadOptions, TelemetryTable};

/// Default first capture file.
pub const DEFAULT_LEFT_PATH: &str = "pytorch_energy.csv";
/// Default second capture file.
pub const DEFAULT_RIGHT_PATH: &str = "pytorch_energy2.csv";
/// Default derived sum column.
pub const SUM_COLUMN: &str = "sum_process_gpu";
/// Banner printed before the second view.
pub const VALIDATION_BANNER: &str = "--- Validation: Sum of process GPU vs Total GPU ---";

/// Everything that parameterizes one comparison.
#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub left_path: PathBuf,
    pub right_path: PathBuf,
    pub timestamp_column: String,
    pub key_column: String,
    pub total_column: String,
    pub process_column: String,
    pub suffixes: (String, String),
    pub sum_column: String,
    pub how: JoinKind,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            left_path: PathBuf::from(DEFAULT_LEFT_PATH),
            right_path: PathBuf::from(DEFAULT_RIGHT_PATH),
            timestamp_column: telemetry::TIMESTAMP_COLUMN.to_string(),
            key_column: join::KEY_COLUMN.to_string(),
            total_column: telemetry::GPU_POWER_COLUMN.to_string(),
            process_column: telemetry::PROCESS_GPU_POWER_COLUMN.to_string(),
            suffixes: (join::LEFT_SUFFIX.to_string(), join::RIGHT_SUFFIX.to_string()),
            sum_column: SUM_COLUMN.to_string(),
            how: JoinKind::Inner,
        }
    }
}

impl CompareConfig {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            timestamp_column: self.timestamp_column.clone(),
            required_columns: vec![self.total_column.clone(), self.process_column.clone()],
        }
    }

    fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            key: self.key_column.clone(),
            suffixes: self.suffixes.clone(),
            how: self.how,
        }
    }

    fn left_name(&self, column: &str) -> String {
        format!("{column}{}", self.suffixes.0)
    }

    fn right_name(&self, column: &str) -> String {
        format!("{column}{}", self.suffixes.1)
    }

    fn validate(&self) -> Result<()> {
        if self.total_column == self.process_column {
            return Err(CompareError::InvalidConfig(format!(
                "total and per-process columns are both '{}'",
                self.total_column
            )));
        }
        if self.key_column == self.total_column || self.key_column == self.process_column {
            return Err(CompareError::InvalidConfig(format!(
                "join key '{}' would overwrite a power column",
                self.key_column
            )));
        }
        Ok(())
    }
}

/// Summary counts that accompany a comparison.
#[derive(Debug, Clone, Serialize)]
pub struct CompareSummary {
    pub left_path: PathBuf,
    pub right_path: PathBuf,
    pub join: JoinKind,
    pub stats: JoinStats,
}

/// A finished comparison.
#[derive(Debug, Clone)]
pub struct Comparison {
    config: CompareConfig,
    merged: MergedTable,
    stats: JoinStats,
}

impl Comparison {
    pub fn merged(&self) -> &MergedTable {
        &self.merged
    }

    pub fn stats(&self) -> &JoinStats {
        &self.stats
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn summary(&self) -> CompareSummary {
        CompareSummary {
            left_path: self.config.left_path.clone(),
            right_path: self.config.right_path.clone(),
            join: self.config.how,
            stats: self.stats,
        }
    }

    /// Column names of the side-by-side power view.
    pub fn power_columns(&self) -> Vec<String> {
        let c = &self.config;
        vec![
            c.key_column.clone(),
            c.left_name(&c.total_column),
            c.right_name(&c.total_column),
            c.left_name(&c.process_column),
            c.right_name(&c.process_column),
        ]
    }

    /// Column names of the total-vs-sum view.
    pub fn validation_columns(&self) -> Vec<String> {
        let c = &self.config;
        vec![
            c.key_column.clone(),
            c.left_name(&c.total_column),
            c.sum_column.clone(),
        ]
    }

    /// Total and per-process GPU power from both captures.
    pub fn power_view(&self) -> Result<TableView<'_>> {
        let names = self.power_columns();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        self.merged.select(&refs)
    }

    /// Total GPU power of the first capture against the per-process sum.
    pub fn validation_view(&self) -> Result<TableView<'_>> {
        let names = self.validation_columns();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        self.merged.select(&refs)
    }
}

/// Load both captures named in `config` and compare them.
pub fn run_comparison(config: &CompareConfig) -> Result<Comparison> {
    config.validate()?;
    let options = config.load_options();
    let left = TelemetryTable::load(&config.left_path, &options)?;
    let right = TelemetryTable::load(&config.right_path, &options)?;
    compare_tables(&left, &right, config)
}

/// Compare two already-loaded captures.
pub fn compare_tables(
    left: &TelemetryTable,
    right: &TelemetryTable,
    config: &CompareConfig,
) -> Result<Comparison> {
    config.validate()?;
    let left = left.clone().with_floored_key(&config.key_column);
    let right = right.clone().with_floored_key(&config.key_column);
    log::debug!(
        "flooring '{}' to '{}' ({} + {} rows)",
        config.timestamp_column,
        config.key_column,
        left.len(),
        right.len()
    );

    let (mut merged, stats) = join::merge(&left, &right, &config.merge_options())?;
    merged.add_sum_column(
        &config.sum_column,
        &config.left_name(&config.process_column),
        &config.right_name(&config.process_column),
    )?;

    log::debug!(
        "{} join produced {} rows ({} matched)",
        config.how,
        stats.output_rows,
        stats.matched_rows
    );

    Ok(Comparison {
        config: config.clone(),
        merged,
        stats,
    })
}
