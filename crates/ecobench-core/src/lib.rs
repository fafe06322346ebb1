//! # ecobench-core
//!
//! **Line up two GPU power captures and see whether the per-process numbers
//! add up.**
//!
//! `ecobench-core` loads two CSV captures of GPU telemetry, floors their
//! timestamps to the second, joins them on that key and derives the sum of
//! the two per-process readings. It also ships the two busy-loop workloads
//! used to produce such captures: a CPU sum-of-squares loop and a GPU
//! multiply-and-reduce loop.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ecobench_core::{CompareConfig, VALIDATION_BANNER, run_comparison};
//!
//! let comparison = run_comparison(&CompareConfig::default()).unwrap();
//! println!("{}", comparison.power_view().unwrap());
//! println!("\n{VALIDATION_BANNER}");
//! println!("{}", comparison.validation_view().unwrap());
//! ```
//!
//! ## Architecture
//!
//! CSV → [`TelemetryTable`] → floor to second → [`merge`] → [`MergedTable`] → views
//!
//! - [`telemetry`] reads a capture, keeping every column.
//! - [`timestamp`] parses and floors timestamps.
//! - [`join`] merges two tables on the floored key, inner by default.
//! - [`compare`] wires the pipeline together and names the printed views.
//! - [`render`] and [`export`] turn a [`TableView`] into text, CSV or JSON.
//! - [`load`] holds the CPU and GPU workloads.

pub mod compare;
pub mod error;
pub mod export;
pub mod join;
pub mod load;
pub mod machine;
pub mod render;
pub mod table;
pub mod telemetry;
pub mod timestamp;

pub use compare::{
    CompareConfig, CompareSummary, Comparison, DEFAULT_LEFT_PATH, DEFAULT_RIGHT_PATH, SUM_COLUMN,
    VALIDATION_BANNER, compare_tables, run_comparison,
};
pub use error::{CompareError, GpuError, Result};
pub use export::{ExportFormat, export_table};
pub use join::{JoinKind, JoinStats, MergeOptions, MergedTable, merge};
pub use load::cpu::{CpuLoadConfig, run_cpu_load, square_sum};
pub use load::gpu::{
    AdapterSummary, GpuContext, GpuLoadConfig, cpu_multiply_sum, enumerate_adapters, run_gpu_load,
};
pub use load::{LoadKind, LoadReport};
pub use machine::{MachineInfo, detect_machine_info};
pub use table::{Column, ColumnData, TableView};
pub use telemetry::{LoadOptions, TelemetryTable};
pub use timestamp::{floor_to_second, parse_timestamp};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
