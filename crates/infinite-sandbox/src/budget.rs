//! Execution limits for one sandbox run.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::SandboxError;

/// Wall-clock checks happen once per this many steps (a power of two).
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Limits applied to one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Evaluation steps (one per statement and expression evaluated).
    pub max_steps: u64,
    /// Nested user function calls.
    pub max_call_depth: u32,
    /// Lines written by `console.log` and `console.error`.
    pub max_output_lines: u32,
    /// Wall-clock limit in milliseconds.
    pub timeout_ms: u64,
    /// Array elements and string bytes created over the whole run, counted
    /// when built and never released.
    pub max_allocation: u64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_steps: 200_000,
            max_call_depth: 256,
            max_output_lines: 500,
            timeout_ms: 2_000,
            max_allocation: 4_000_000,
        }
    }
}

impl Budget {
    /// The wall-clock limit.
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Which limit a run hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Exhausted {
    /// Too many evaluation steps.
    #[error("step limit of {0}")]
    Steps(u64),
    /// Calls nested too deeply.
    #[error("call depth limit of {0}")]
    CallDepth(u32),
    /// Too much output.
    #[error("output limit of {0} lines")]
    OutputLines(u32),
    /// Ran too long.
    #[error("time limit of {0} ms")]
    Timeout(u64),
    /// Built too many values.
    #[error("allocation limit of {0} units")]
    Allocation(u64),
}

/// Running totals checked against a [`Budget`].
#[derive(Debug)]
pub struct Meter {
    budget: Budget,
    started: Instant,
    steps: u64,
    depth: u32,
    lines: u32,
    allocated: u64,
}

impl Meter {
    /// Start metering now.
    pub fn start(budget: Budget) -> Self {
        Self {
            budget,
            started: Instant::now(),
            steps: 0,
            depth: 0,
            lines: 0,
            allocated: 0,
        }
    }

    /// Count one evaluation step.
    pub fn tick(&mut self) -> Result<(), SandboxError> {
        self.steps = self.steps.saturating_add(1);
        if self.steps > self.budget.max_steps {
            return Err(SandboxError::Budget(Exhausted::Steps(self.budget.max_steps)));
        }
        if self.steps & (CLOCK_CHECK_INTERVAL.saturating_sub(1)) == 0
            && self.started.elapsed() > self.budget.timeout()
        {
            return Err(SandboxError::Budget(Exhausted::Timeout(self.budget.timeout_ms)));
        }
        Ok(())
    }

    /// Enter a user function call.
    pub fn enter_call(&mut self) -> Result<(), SandboxError> {
        if self.depth >= self.budget.max_call_depth {
            return Err(SandboxError::Budget(Exhausted::CallDepth(
                self.budget.max_call_depth,
            )));
        }
        self.depth = self.depth.saturating_add(1);
        Ok(())
    }

    /// Leave a user function call.
    pub const fn exit_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Account for one line of output.
    pub fn emit_line(&mut self) -> Result<(), SandboxError> {
        if self.lines >= self.budget.max_output_lines {
            return Err(SandboxError::Budget(Exhausted::OutputLines(
                self.budget.max_output_lines,
            )));
        }
        self.lines = self.lines.saturating_add(1);
        Ok(())
    }

    /// Account for `units` newly built array elements or string bytes.
    pub fn allocate(&mut self, units: usize) -> Result<(), SandboxError> {
        let units = u64::try_from(units).unwrap_or(u64::MAX);
        self.allocated = self.allocated.saturating_add(units);
        if self.allocated > self.budget.max_allocation {
            return Err(SandboxError::Budget(Exhausted::Allocation(
                self.budget.max_allocation,
            )));
        }
        Ok(())
    }

    /// Steps taken so far.
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Time since metering started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
