//! CLI for ecobench: line up GPU power captures and generate CPU/GPU load.

mod commands;

use clap::{Parser, Subcommand};
use ecobench_core::load::{cpu, gpu};
use ecobench_core::telemetry::{GPU_POWER_COLUMN, PROCESS_GPU_POWER_COLUMN, TIMESTAMP_COLUMN};
use ecobench_core::{DEFAULT_LEFT_PATH, DEFAULT_RIGHT_PATH, SUM_COLUMN};

#[derive(Parser)]
#[command(name = "ecobench")]
#[command(about = "ecobench: compare GPU power captures and run CPU/GPU load loops")]
#[command(version = ecobench_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join two telemetry captures on the whole second and print total vs.
    /// per-process GPU power side by side.
    Compare {
        /// First capture (columns get the left suffix)
        #[arg(default_value = DEFAULT_LEFT_PATH)]
        left: String,

        /// Second capture (columns get the right suffix)
        #[arg(default_value = DEFAULT_RIGHT_PATH)]
        right: String,

        /// Timestamp column present in both captures
        #[arg(long, default_value = TIMESTAMP_COLUMN)]
        timestamp_column: String,

        /// Total GPU power column
        #[arg(long, default_value = GPU_POWER_COLUMN)]
        total_column: String,

        /// Per-process GPU power column
        #[arg(long, default_value = PROCESS_GPU_POWER_COLUMN)]
        process_column: String,

        /// Left and right suffixes for columns present in both captures
        #[arg(long, default_value = "_p1,_p2", value_parser = commands::parse_suffixes)]
        suffixes: (String, String),

        /// Name of the derived per-process sum column
        #[arg(long, default_value = SUM_COLUMN)]
        sum_column: String,

        /// Keep rows without a partner in the other capture and report them
        #[arg(long)]
        outer: bool,

        /// Write the merged table (with the sum column) to this file
        #[arg(long)]
        output: Option<String>,

        /// Export format; inferred from the --output extension when omitted
        #[arg(long, value_parser = ["csv", "json"])]
        format: Option<String>,

        /// Write join row counts as JSON
        #[arg(long)]
        summary: Option<String>,
    },

    /// Busy-loop the CPU with repeated sums of squares
    CpuLoad {
        /// Outer iterations
        #[arg(long, default_value_t = cpu::DEFAULT_ITERATIONS)]
        iterations: u64,

        /// Terms in each sum of squares
        #[arg(long, default_value_t = cpu::DEFAULT_INNER)]
        inner: u64,

        /// Write the run report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Busy-loop the GPU with random tensor multiply-and-sum passes
    GpuLoad {
        /// Outer iterations
        #[arg(long, default_value_t = gpu::DEFAULT_ITERATIONS)]
        iterations: u64,

        /// Elements per tensor
        #[arg(long, default_value_t = gpu::DEFAULT_ELEMENTS)]
        elements: usize,

        /// Adapter index or name substring (see `ecobench adapters`)
        #[arg(long)]
        adapter: Option<String>,

        /// Write the run report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// List GPU adapters visible to wgpu
    Adapters,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare {
            left,
            right,
            timestamp_column,
            total_column,
            process_column,
            suffixes,
            sum_column,
            outer,
            output,
            format,
            summary,
        } => commands::compare::run(commands::compare::CompareCommandConfig {
            left: &left,
            right: &right,
            timestamp_column: &timestamp_column,
            total_column: &total_column,
            process_column: &process_column,
            suffixes,
            sum_column: &sum_column,
            outer,
            output_path: output.as_deref(),
            format: format.as_deref(),
            summary_path: summary.as_deref(),
        }),
        Commands::CpuLoad {
            iterations,
            inner,
            output,
        } => commands::cpu_load::run(iterations, inner, output.as_deref()),
        Commands::GpuLoad {
            iterations,
            elements,
            adapter,
            output,
        } => commands::gpu_load::run(iterations, elements, adapter.as_deref(), output.as_deref()),
        Commands::Adapters => commands::adapters::run(),
    };

    if let Err(e) = result {
        commands::report_error(e.as_ref());
        std::process::exit(1);
    }
}
