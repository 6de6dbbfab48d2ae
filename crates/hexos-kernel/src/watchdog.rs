//! [`TickWatchdog`] – control-loop liveness monitor.
//!
//! The control loop brackets every tick with [`TickWatchdog::tick_started`]
//! and [`TickWatchdog::tick_finished`]. When the wall-clock duration of a
//! tick exceeds the configured budget the watchdog reports an overrun; the
//! loop responds by forcing the gait sequencer into the known-safe seated
//! pose before continuing. This is a liveness safeguard, not a correctness
//! one: an overrun tick still produced a well-formed command.

use std::time::{Duration, Instant};

use tracing::warn;

/// Verdict for one completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickVerdict {
    /// The tick finished inside its budget.
    WithinBudget,
    /// The tick exceeded its budget by the given amount.
    Overrun(Duration),
}

/// Tracks per-tick wall-clock duration against a fixed budget.
pub struct TickWatchdog {
    budget: Duration,
    tick_start: Option<Instant>,
    overruns: u64,
}

impl TickWatchdog {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            tick_start: None,
            overruns: 0,
        }
    }

    /// Mark the start of a tick. Starting a new tick while one is open
    /// simply resets the clock.
    pub fn tick_started(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    /// Close the current tick and judge its duration. Calling this without a
    /// matching [`tick_started`][Self::tick_started] is a no-overrun no-op.
    pub fn tick_finished(&mut self) -> TickVerdict {
        let Some(start) = self.tick_start.take() else {
            return TickVerdict::WithinBudget;
        };
        let elapsed = start.elapsed();
        if elapsed > self.budget {
            let over = elapsed - self.budget;
            self.overruns += 1;
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = self.budget.as_millis() as u64,
                "tick exceeded its time budget"
            );
            TickVerdict::Overrun(over)
        } else {
            TickVerdict::WithinBudget
        }
    }

    /// Total overruns observed since construction.
    pub fn overrun_count(&self) -> u64 {
        self.overruns
    }
}
