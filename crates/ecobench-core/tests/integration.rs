//! Integration tests for ecobench-core.
//!
//! These tests drive the comparison pipeline from files on disk:
//! CSV load → floor to second → join → sum column → views and export.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use ecobench_core::{
    CompareConfig, CompareError, CpuLoadConfig, ExportFormat, JoinKind, LoadOptions,
    TelemetryTable, VALIDATION_BANNER, export_table, run_comparison, run_cpu_load,
};
use tempfile::TempDir;

const FIRST: &str = "\
timestamp,gpu_power_watts,process_gpu_power_watts,gpu_util
2025-03-10 12:00:00.003,150.0,70.0,95
2025-03-10 12:00:01.004,152.0,71.5,97
2025-03-10 12:00:02.002,149.0,69.0,94
";

const SECOND: &str = "\
timestamp,gpu_power_watts,process_gpu_power_watts
2025-03-10 12:00:00.007,151.0,68.0
2025-03-10 12:00:01.500,153.0,72.0
2025-03-10 12:00:03.100,150.0,70.0
";

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn config_for(dir: &TempDir, first: &str, second: &str) -> CompareConfig {
    CompareConfig {
        left_path: write(dir.path(), "pytorch_energy.csv", first),
        right_path: write(dir.path(), "pytorch_energy2.csv", second),
        ..CompareConfig::default()
    }
}

#[test]
fn comparison_joins_on_floored_seconds() {
    let dir = TempDir::new().unwrap();
    let comparison = run_comparison(&config_for(&dir, FIRST, SECOND)).unwrap();

    let stats = comparison.stats();
    assert_eq!(stats.left_rows, 3);
    assert_eq!(stats.right_rows, 3);
    assert_eq!(stats.output_rows, 2);
    assert_eq!(stats.left_unmatched, 1);
    assert_eq!(stats.right_unmatched, 1);

    let sums = comparison.merged().numeric("sum_process_gpu").unwrap();
    assert_eq!(sums, &[Some(138.0), Some(143.5)]);

    // Columns unique to one side keep their name.
    assert!(comparison.merged().column("gpu_util").is_some());
}

#[test]
fn views_print_expected_headers() {
    let dir = TempDir::new().unwrap();
    let comparison = run_comparison(&config_for(&dir, FIRST, SECOND)).unwrap();

    let power = comparison.power_view().unwrap().to_string();
    let header = power.lines().next().unwrap();
    for name in [
        "timestamp_sec",
        "gpu_power_watts_p1",
        "gpu_power_watts_p2",
        "process_gpu_power_watts_p1",
        "process_gpu_power_watts_p2",
    ] {
        assert!(header.contains(name), "missing {name} in {header:?}");
    }
    assert_eq!(power.lines().count(), 3);
    assert!(power.contains("2025-03-10 12:00:01"));

    let validation = comparison.validation_view().unwrap().to_string();
    assert!(validation.lines().next().unwrap().ends_with("sum_process_gpu"));
    assert!(validation.contains("143.5"));
    assert!(VALIDATION_BANNER.starts_with("--- Validation"));
}

#[test]
fn disjoint_captures_render_empty_tables() {
    let dir = TempDir::new().unwrap();
    let later = SECOND.replace("12:00:0", "13:00:0");
    let comparison = run_comparison(&config_for(&dir, FIRST, &later)).unwrap();

    assert!(comparison.merged().is_empty());
    let power = comparison.power_view().unwrap().to_string();
    assert!(power.starts_with("Empty table"));
    let validation = comparison.validation_view().unwrap().to_string();
    assert!(validation.contains("sum_process_gpu"));
}

#[test]
fn outer_join_keeps_unmatched_rows() {
    let dir = TempDir::new().unwrap();
    let config = CompareConfig {
        how: JoinKind::Outer,
        ..config_for(&dir, FIRST, SECOND)
    };
    let comparison = run_comparison(&config).unwrap();
    assert_eq!(comparison.merged().len(), 4);

    let sums = comparison.merged().numeric("sum_process_gpu").unwrap();
    assert_eq!(sums, &[Some(138.0), Some(143.5), None, None]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let config = CompareConfig {
        left_path: dir.path().join("absent.csv"),
        right_path: write(dir.path(), "b.csv", SECOND),
        ..CompareConfig::default()
    };
    let err = run_comparison(&config).unwrap_err();
    assert!(matches!(err, CompareError::Io { .. }), "{err}");
}

#[test]
fn missing_column_is_reported() {
    let dir = TempDir::new().unwrap();
    let no_process = "timestamp,gpu_power_watts\n2025-03-10 12:00:00,150.0\n";
    let err = run_comparison(&config_for(&dir, FIRST, no_process)).unwrap_err();
    match err {
        CompareError::MissingColumn { column, .. } => {
            assert_eq!(column, "process_gpu_power_watts")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_timestamp_is_reported() {
    let dir = TempDir::new().unwrap();
    let bad = "timestamp,gpu_power_watts,process_gpu_power_watts\nnot-a-time,1,2\n";
    let err = run_comparison(&config_for(&dir, bad, SECOND)).unwrap_err();
    assert!(matches!(err, CompareError::Timestamp { row: 1, .. }), "{err}");
}

#[test]
fn csv_export_reloads_with_same_columns() {
    let dir = TempDir::new().unwrap();
    let comparison = run_comparison(&config_for(&dir, FIRST, SECOND)).unwrap();
    let out = dir.path().join("merged.csv");
    export_table(&comparison.merged().view(), &out, ExportFormat::Csv).unwrap();

    let options = LoadOptions {
        timestamp_column: "timestamp_sec".into(),
        required_columns: vec!["sum_process_gpu".into()],
    };
    let reloaded = TelemetryTable::load(&out, &options).unwrap();
    assert_eq!(reloaded.column_names(), comparison.merged().column_names());
    assert_eq!(reloaded.len(), 2);
    let sums = reloaded.column("sum_process_gpu").unwrap().numeric().unwrap();
    assert_eq!(sums, &[Some(138.0), Some(143.5)]);
}

#[test]
fn json_export_writes_one_object_per_row() {
    let dir = TempDir::new().unwrap();
    let comparison = run_comparison(&config_for(&dir, FIRST, SECOND)).unwrap();
    let out = dir.path().join("merged.json");
    let view = comparison.validation_view().unwrap();
    export_table(&view, &out, ExportFormat::from_path(&out)).unwrap();

    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["timestamp_sec"], "2025-03-10T12:00:00");
    assert_eq!(rows[0]["gpu_power_watts_p1"], 150.0);
    assert_eq!(rows[1]["sum_process_gpu"], 143.5);
}

#[test]
fn cpu_load_completes_small_run() {
    let stop = AtomicBool::new(false);
    let report = run_cpu_load(
        &CpuLoadConfig {
            iterations: 50,
            inner: 1_000,
        },
        &stop,
    );
    assert_eq!(report.iterations_completed, 50);
    assert_eq!(report.checksum, 332_833_500.0);
    assert!(!report.interrupted);
}
