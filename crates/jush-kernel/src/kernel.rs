//! The Kernel — owns the job table and the signal tasks.
//!
//! The read-eval loop talks to the shell core exclusively through this
//! type: `start` wires up the table and the signal streams, `eval` runs one
//! line, `shutdown` tears everything down in the order the teardown
//! contract requires (tasks first, then dispositions, then the table).

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::dispatch;
use crate::jobs::JobTable;
use crate::signals::{self, SignalDriver};

/// Outcome of evaluating one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalOutcome {
    /// Keep reading input.
    Continue,
    /// `quit` was issued; the caller runs teardown and exits.
    Quit,
}

/// The shell core: job table plus the reaper and forwarder tasks.
#[derive(Debug)]
pub struct Kernel {
    table: Arc<JobTable>,
    driver: SignalDriver,
}

impl Kernel {
    /// Create the table, ignore terminal I/O control signals, and spawn the
    /// signal tasks. Must be called inside a tokio runtime. Any failure
    /// here is a fatal setup error.
    pub fn start() -> Result<Self> {
        signals::ignore_tty_signals().context("signal setup failed")?;
        let table = Arc::new(JobTable::new());
        let driver = SignalDriver::spawn(&table)?;
        tracing::debug!("kernel started");
        Ok(Self { table, driver })
    }

    /// Evaluate one raw input line (trailing newline already stripped).
    pub async fn eval(&self, line: &str) -> EvalOutcome {
        dispatch::eval(&self.table, line).await
    }

    /// The shared job table. Exposed for integration tests and embedders
    /// that inspect job state.
    pub fn table(&self) -> &Arc<JobTable> {
        &self.table
    }

    /// Normal-exit teardown: stop the signal tasks, reset the
    /// SIGINT/SIGTSTP/SIGCHLD dispositions to default, then drop the
    /// table. A signal task must never touch the table during or after
    /// its destruction, hence the ordering.
    ///
    /// Dropping a `Kernel` without calling this still aborts the tasks
    /// but leaves dispositions alone; abnormal exits skip teardown
    /// entirely and leave cleanup to the OS.
    pub fn shutdown(self) {
        let Kernel { table, driver } = self;
        driver.stop();
        signals::restore_default_dispositions();
        drop(table);
        tracing::debug!("kernel shut down");
    }
}
