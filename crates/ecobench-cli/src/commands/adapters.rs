//! `ecobench adapters`: list the GPU adapters wgpu can see.

use ecobench_core::enumerate_adapters;

use super::CommandResult;

/// Run the adapters command.
pub fn run() -> CommandResult {
    let adapters = enumerate_adapters();
    if adapters.is_empty() {
        println!("No GPU adapters found.");
        return Ok(());
    }
    println!("{} adapter(s):", adapters.len());
    for adapter in &adapters {
        println!("  {adapter}");
    }
    println!();
    println!("Select one with: ecobench gpu-load --adapter <index|name>");
    Ok(())
}
