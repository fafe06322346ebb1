pub mod adapters;
pub mod compare;
pub mod cpu_load;
pub mod gpu_load;

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ecobench_core::{AdapterSummary, LoadReport, MachineInfo};
use serde::Serialize;

/// What every command returns; `main` prints the error and exits 1.
pub type CommandResult = Result<(), Box<dyn Error>>;

/// Print `Error: ...` followed by each underlying cause.
pub fn report_error(err: &dyn Error) {
    eprintln!("Error: {err}");
    let mut cause = err.source();
    while let Some(c) = cause {
        eprintln!("  caused by: {c}");
        cause = c.source();
    }
}

/// Parse `LEFT,RIGHT` into a suffix pair. Both must be non-empty and differ.
pub fn parse_suffixes(s: &str) -> Result<(String, String), String> {
    let (left, right) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LEFT,RIGHT, got '{s}'"))?;
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() || right.is_empty() {
        return Err("suffixes must not be empty".to_string());
    }
    if left == right {
        return Err(format!("suffixes must differ, both are '{left}'"));
    }
    Ok((left.to_string(), right.to_string()))
}

/// Install a Ctrl+C handler that raises the returned flag.
pub fn install_stop_handler() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }
    stop
}

/// Serialize `value` as pretty JSON to `path`.
pub fn write_json<T: Serialize>(value: &T, path: &str, label: &str) -> CommandResult {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| format!("failed to write {path}: {e}"))?;
    println!("\n{label} written to {path}");
    Ok(())
}

/// JSON shape of a load run.
#[derive(Serialize)]
pub struct LoadRun<'a> {
    pub machine: &'a MachineInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter: Option<&'a AdapterSummary>,
    pub report: &'a LoadReport,
}

/// Human summary printed after a load run.
pub fn format_report(report: &LoadReport) -> String {
    let mut out = format!(
        "Completed {}/{} iterations in {:.2}s ({:.1} it/s)\nChecksum: {}",
        report.iterations_completed,
        report.iterations_requested,
        report.elapsed_secs,
        report.iterations_per_sec(),
        report.checksum,
    );
    if report.interrupted {
        out.push_str("\nStopped early by Ctrl+C");
    }
    out
}
