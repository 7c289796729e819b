//! Command dispatch — evaluates one input line.
//!
//! The single execution path for a line: tokenize, hand builtins to the
//! builtin handler, otherwise resolve redirections, launch the external
//! command in its own process group, register the job, and either wait
//! (foreground) or print the start line and return (background).
//!
//! The table lock is taken before any fd is opened or any process spawned
//! and held until the job record exists. That closes the registration race:
//! a child that exits instantly cannot be drained by the reaper before its
//! record is in the table, because the drain needs the same lock.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use nix::unistd::Pid;

use jush_types::{JobId, JobState, ShellError};

use crate::builtin;
use crate::jobs::JobTable;
use crate::kernel::EvalOutcome;
use crate::parse::{parse, Builtin};
use crate::sio;

/// Evaluate one raw input line. Empty and malformed lines are silently
/// ignored; per-command errors are printed and swallowed. Only `quit`
/// changes the outcome.
pub(crate) async fn eval(table: &JobTable, line: &str) -> EvalOutcome {
    let Some(cmd) = parse(line) else {
        return EvalOutcome::Continue;
    };

    // A command is never both builtin and externally executed.
    if cmd.builtin != Builtin::None {
        return builtin::run(table, &cmd).await;
    }

    // Registration race: hold the lock from before the first fd touch
    // until the job record exists.
    let mut jobs = table.lock().await;

    let stdin_file = match &cmd.infile {
        Some(path) => match open_input(path) {
            Ok(file) => Some(file),
            Err(e) => {
                sio::puts(&format!("{e}\n"));
                return EvalOutcome::Continue;
            }
        },
        None => None,
    };
    let stdout_file = match &cmd.outfile {
        Some(path) => match open_output(path) {
            Ok(file) => Some(file),
            Err(e) => {
                sio::puts(&format!("{e}\n"));
                return EvalOutcome::Continue;
            }
        },
        None => None,
    };

    // Child setup: own process group (group id = child pid), redirections
    // by descriptor duplication, default signal dispositions and mask, the
    // shell's environment inherited. PATH resolution happens here for bare
    // command names.
    let mut command = Command::new(&cmd.argv[0]);
    command.args(&cmd.argv[1..]).process_group(0);
    if let Some(file) = stdin_file {
        command.stdin(Stdio::from(file));
    }
    if let Some(file) = stdout_file {
        command.stdout(Stdio::from(file));
    }

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            // Same two-way message split as the redirection opens.
            sio::puts(&format!("{}\n", classify_open_error(&cmd.argv[0], &e)));
            return EvalOutcome::Continue;
        }
    };
    let pid = Pid::from_raw(child.id() as i32);

    let state = if cmd.background {
        JobState::Background
    } else {
        JobState::Foreground
    };
    let id = jobs.add(pid, state, line);
    drop(jobs);

    if cmd.background {
        sio::puts(&format!("[{}] ({}) {}\n", id, pid, line));
    } else {
        wait_foreground(table, id).await;
    }
    EvalOutcome::Continue
}

/// Block until the foreground job `id` is deleted (it exited), loses the
/// foreground, or becomes Stopped. Shared by eval and the `fg` builtin.
///
/// Interest in the change notification is registered before the condition
/// check; a reaper wakeup landing between check and await would otherwise
/// be lost.
pub(crate) async fn wait_foreground(table: &JobTable, id: JobId) {
    loop {
        let notified = table.changed();
        tokio::pin!(notified);
        notified.as_mut().enable();
        {
            let jobs = table.lock().await;
            match jobs.state(id) {
                None => break,
                Some(JobState::Stopped) => {
                    sio::puts("job is stopped\n");
                    break;
                }
                Some(_) if jobs.foreground() != Some(id) => break,
                Some(_) => {}
            }
        }
        notified.await;
    }
}

/// Open an input redirection target read-only.
fn open_input(path: &str) -> Result<File, ShellError> {
    File::open(path).map_err(|e| classify_open_error(path, &e))
}

/// Open an output redirection target write/create/truncate, mode 0644.
/// Also used by `jobs > file`.
pub(crate) fn open_output(path: &str) -> Result<File, ShellError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
        .map_err(|e| classify_open_error(path, &e))
}

/// The original reports exactly two open failures: absent, or everything
/// else as a permission problem.
fn classify_open_error(path: &str, e: &io::Error) -> ShellError {
    if e.kind() == io::ErrorKind::NotFound {
        ShellError::NotFound(path.to_string())
    } else {
        ShellError::PermissionDenied(path.to_string())
    }
}
