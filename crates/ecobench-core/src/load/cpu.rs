//! CPU busy loop: repeated sums of squares.

use std::convert::Infallible;
use std::hint::black_box;
use std::sync::atomic::AtomicBool;

use super::{LoadKind, LoadReport, drive};

/// Default outer iteration count.
pub const DEFAULT_ITERATIONS: u64 = 10_000;
/// Default length of each sum of squares.
pub const DEFAULT_INNER: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuLoadConfig {
    pub iterations: u64,
    pub inner: u64,
}

impl Default for CpuLoadConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            inner: DEFAULT_INNER,
        }
    }
}

/// `Σ i·i` for `i in 0..n`, wrapping on overflow.
///
/// Each term goes through `black_box` so the loop is not folded into the
/// closed form at compile time.
pub fn square_sum(n: u64) -> u64 {
    (0..n).fold(0u64, |acc, i| {
        let i = black_box(i);
        acc.wrapping_add(i.wrapping_mul(i))
    })
}

/// Run the CPU loop on the calling thread until done or `stop` is raised.
pub fn run_cpu_load(config: &CpuLoadConfig, stop: &AtomicBool) -> LoadReport {
    let inner = config.inner;
    let result = drive::<Infallible>(LoadKind::Cpu, config.iterations, stop, |_| {
        Ok(black_box(square_sum(inner)) as f64)
    });
    match result {
        Ok(report) => report,
        Err(never) => match never {},
    }
}
