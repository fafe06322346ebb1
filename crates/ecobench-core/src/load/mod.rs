//! Busy-loop load generators.
//!
//! Both generators exist to keep one device busy for a while so that its
//! power draw can be captured and compared. They have no contract beyond
//! running the requested number of iterations, or stopping early when the
//! caller raises the stop flag.

pub mod cpu;
pub mod gpu;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Which device a load run targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadKind {
    Cpu,
    Gpu,
}

impl fmt::Display for LoadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Gpu => write!(f, "gpu"),
        }
    }
}

/// Outcome of one load run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub kind: LoadKind,
    pub iterations_requested: u64,
    pub iterations_completed: u64,
    pub elapsed_secs: f64,
    /// Result of the last iteration's computation, kept so the work is observable.
    pub checksum: f64,
    pub interrupted: bool,
}

impl LoadReport {
    pub fn iterations_per_sec(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.iterations_completed as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

/// Drive `iterations` calls of `step`, checking `stop` before each one.
///
/// `step` returns the iteration's checksum or an error that aborts the run.
pub(crate) fn drive<E>(
    kind: LoadKind,
    iterations: u64,
    stop: &AtomicBool,
    mut step: impl FnMut(u64) -> Result<f64, E>,
) -> Result<LoadReport, E> {
    let started = Instant::now();
    let log_every = (iterations / 10).max(1);
    let mut completed = 0u64;
    let mut checksum = 0.0;
    let mut interrupted = false;

    for i in 0..iterations {
        if stop.load(Ordering::Relaxed) {
            interrupted = true;
            break;
        }
        checksum = step(i)?;
        completed += 1;
        if completed % log_every == 0 {
            log::debug!(
                "{kind} load: {completed}/{iterations} iterations in {:.2}s",
                started.elapsed().as_secs_f64()
            );
        }
    }

    if interrupted {
        log::warn!("{kind} load interrupted after {completed}/{iterations} iterations");
    }

    Ok(LoadReport {
        kind,
        iterations_requested: iterations,
        iterations_completed: completed,
        elapsed_secs: started.elapsed().as_secs_f64(),
        checksum,
        interrupted,
    })
}
