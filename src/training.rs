//! Training control: options, cancellation and reports.
//!
//! Every `train` call runs whole sweeps over a [`PatternSet`](crate::PatternSet)
//! until the network converges, the sweep budget of this call runs out, or a
//! [`StopFlag`] is raised. The flag is checked once at the top of every sweep;
//! when it is seen raised, training returns immediately and the weights stay
//! as last committed. Calling `train` again continues from those weights.
//!
//! # Examples
//!
//! ```
//! use neuronet::training::{StopFlag, TrainOptions};
//!
//! let stop = StopFlag::new();
//! let options = TrainOptions::new()
//!     .with_max_sweeps(5_000)
//!     .with_stop_flag(stop.clone())
//!     .with_progress_interval(500);
//!
//! assert_eq!(options.max_sweeps, Some(5_000));
//! assert!(!stop.is_raised());
//! ```

use crate::codec::NetworkType;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Default per-output tolerance of the backprop convergence test.
pub const DEFAULT_TOLERANCE: f64 = 0.2;

/// Shared termination request.
///
/// Clones observe the same flag, so one clone can be handed to the training
/// call and another kept by whoever wants to stop it.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options of a single `train` call.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Upper bound on sweeps performed by this call (`None` = unbounded)
    pub max_sweeps: Option<u64>,
    /// Cancellation flag checked before every sweep
    pub stop: Option<StopFlag>,
    /// Log an `info!` progress line every this many sweeps
    pub progress_interval: Option<u64>,
    /// Per-output tolerance for backprop convergence
    pub tolerance: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            max_sweeps: None,
            stop: None,
            progress_interval: None,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl TrainOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_sweeps(mut self, sweeps: u64) -> Self {
        self.max_sweeps = Some(sweeps);
        self
    }

    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Outcome of a `train` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrainReport {
    /// Sweeps performed by this call
    pub sweeps: u64,
    /// Convergence criterion met
    pub converged: bool,
    /// Returned because the stop flag was raised
    pub stopped: bool,
    /// Patterns counted as good in the last sweep
    pub last_good: usize,
}

/// Sweep bookkeeping shared by every training loop.
pub(crate) struct SweepTracker<'a> {
    options: &'a TrainOptions,
    network: NetworkType,
    patterns: usize,
    sweeps: u64,
    last_good: usize,
    stopped: bool,
}

impl<'a> SweepTracker<'a> {
    pub(crate) fn new(options: &'a TrainOptions, network: NetworkType, patterns: usize) -> Self {
        debug!(?network, patterns, max_sweeps = ?options.max_sweeps, "training started");
        Self {
            options,
            network,
            patterns,
            sweeps: 0,
            last_good: 0,
            stopped: false,
        }
    }

    /// Whether another sweep may start.
    pub(crate) fn begin_sweep(&mut self) -> bool {
        if let Some(stop) = &self.options.stop {
            if stop.is_raised() {
                self.stopped = true;
                return false;
            }
        }
        match self.options.max_sweeps {
            Some(max) => self.sweeps < max,
            None => true,
        }
    }

    pub(crate) fn end_sweep(&mut self, good: usize) {
        self.sweeps += 1;
        self.last_good = good;
        debug!(
            network = ?self.network,
            sweep = self.sweeps,
            good,
            total = self.patterns,
            "sweep finished"
        );
        if let Some(interval) = self.options.progress_interval {
            if interval > 0 && self.sweeps % interval == 0 {
                info!(
                    network = ?self.network,
                    sweep = self.sweeps,
                    "{}/{} patterns good",
                    good,
                    self.patterns
                );
            }
        }
    }

    pub(crate) fn finish(self, converged: bool) -> TrainReport {
        let report = TrainReport {
            sweeps: self.sweeps,
            converged,
            stopped: self.stopped,
            last_good: self.last_good,
        };
        info!(
            network = ?self.network,
            sweeps = report.sweeps,
            converged = report.converged,
            stopped = report.stopped,
            "training finished"
        );
        report
    }
}
