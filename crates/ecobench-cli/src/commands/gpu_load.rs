//! `ecobench gpu-load`: run the tensor multiply-and-sum busy loop.

use ecobench_core::{GpuContext, GpuLoadConfig, detect_machine_info, run_gpu_load};

use super::{CommandResult, LoadRun};

/// Run the gpu-load command.
pub fn run(
    iterations: u64,
    elements: usize,
    adapter: Option<&str>,
    output: Option<&str>,
) -> CommandResult {
    let config = GpuLoadConfig {
        iterations,
        elements,
    };
    config.validate()?;

    let machine = detect_machine_info();
    println!("Machine: {machine}");
    let ctx = GpuContext::new(adapter)?;
    println!("  Adapter:    {}", ctx.adapter());
    println!("  Iterations: {iterations} x {elements} elements");
    println!();
    println!("Starting GPU tensor loop...");

    let stop = super::install_stop_handler();
    let report = run_gpu_load(&ctx, &config, &stop)?;
    println!("{}", super::format_report(&report));

    if let Some(path) = output {
        let run = LoadRun {
            machine: &machine,
            adapter: Some(ctx.adapter()),
            report: &report,
        };
        super::write_json(&run, path, "Load report")?;
    }
    Ok(())
}
