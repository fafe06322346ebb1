//! `ecobench cpu-load`: run the sum-of-squares busy loop.

use ecobench_core::{CpuLoadConfig, detect_machine_info, run_cpu_load};

use super::{CommandResult, LoadRun};

/// Run the cpu-load command.
pub fn run(iterations: u64, inner: u64, output: Option<&str>) -> CommandResult {
    let machine = detect_machine_info();
    println!("Machine: {machine}");
    println!("  Iterations: {iterations} x {inner} terms");
    println!();
    println!("Starting long-running task...");

    let stop = super::install_stop_handler();
    let report = run_cpu_load(&CpuLoadConfig { iterations, inner }, &stop);
    println!("{}", super::format_report(&report));

    if let Some(path) = output {
        let run = LoadRun {
            machine: &machine,
            adapter: None,
            report: &report,
        };
        super::write_json(&run, path, "Load report")?;
    }
    Ok(())
}
