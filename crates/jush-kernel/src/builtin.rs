//! Builtin commands — `quit`, `jobs`, `bg`, `fg`.
//!
//! A command is exactly one of the four builtins or not builtin at all, per
//! the tokenizer's classification; dispatch is a closed match. All table
//! access happens under the table lock; `fg` additionally runs the shared
//! foreground wait.

use std::io::{self, Write};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;

use jush_types::{JobId, JobState, ShellError};

use crate::dispatch;
use crate::jobs::{JobMap, JobTable};
use crate::kernel::EvalOutcome;
use crate::parse::{Builtin, CommandLine};
use crate::sio;

/// Run a builtin command line. No-op for non-builtins.
pub(crate) async fn run(table: &JobTable, cmd: &CommandLine) -> EvalOutcome {
    match cmd.builtin {
        Builtin::Quit => EvalOutcome::Quit,
        Builtin::Jobs => {
            list_jobs(table, cmd).await;
            EvalOutcome::Continue
        }
        Builtin::Bg => {
            resume(table, cmd, JobState::Background).await;
            EvalOutcome::Continue
        }
        Builtin::Fg => {
            resume(table, cmd, JobState::Foreground).await;
            EvalOutcome::Continue
        }
        Builtin::None => EvalOutcome::Continue,
    }
}

/// `jobs [> file]`: enumerate the table to stdout or a redirected file.
async fn list_jobs(table: &JobTable, cmd: &CommandLine) {
    let jobs = table.lock().await;
    match &cmd.outfile {
        Some(path) => match dispatch::open_output(path) {
            Ok(mut file) => {
                if let Err(e) = jobs.enumerate(&mut file) {
                    tracing::warn!(path = %path, error = %e, "failed to write jobs listing");
                }
            }
            Err(e) => sio::puts(&format!("{e}\n")),
        },
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            if jobs.enumerate(&mut out).is_ok() {
                let _ = out.flush();
            }
        }
    }
}

/// Shared body of `bg` and `fg`: resolve the job reference, flip the state,
/// resend SIGCONT to the job's process group, then either print the resume
/// line (`bg`) or wait in the foreground (`fg`).
async fn resume(table: &JobTable, cmd: &CommandLine, target: JobState) {
    let name = if target == JobState::Background {
        "bg"
    } else {
        "fg"
    };
    let Some(arg) = cmd.argv.get(1) else {
        sio::puts(&format!("{}\n", ShellError::MissingJobRef(name)));
        return;
    };

    let mut jobs = table.lock().await;
    let id = match resolve_job_ref(&jobs, name, arg) {
        Ok(id) => id,
        Err(e @ ShellError::NoSuchJob(_)) => {
            println!("{e}");
            return;
        }
        Err(e) => {
            sio::puts(&format!("{e}\n"));
            return;
        }
    };
    let Some(pid) = jobs.pid(id) else {
        return;
    };

    jobs.set_state(id, target);
    if let Err(e) = killpg(pid, Signal::SIGCONT) {
        tracing::warn!(%pid, error = %e, "failed to continue job group");
    }

    if target == JobState::Background {
        let cmdline = jobs.cmdline(id).unwrap_or_default().to_string();
        sio::puts(&format!("[{}] ({}) {}\n", id, pid, cmdline));
    } else {
        drop(jobs);
        dispatch::wait_foreground(table, id).await;
    }
}

/// Resolve a `bg`/`fg` argument to a live job id.
///
/// Strips an optional leading `%`, requires a positive decimal, then checks
/// live job ids before pids regardless of the prefix, matching the
/// original's resolution order.
fn resolve_job_ref(jobs: &JobMap, name: &'static str, arg: &str) -> Result<JobId, ShellError> {
    let digits = arg.strip_prefix('%').unwrap_or(arg);
    let n: i32 = match digits.parse() {
        Ok(n) if n > 0 => n,
        _ => return Err(ShellError::MalformedJobRef(name)),
    };

    if jobs.exists(JobId(n as u32)) {
        return Ok(JobId(n as u32));
    }
    if let Some(id) = jobs.id_of(Pid::from_raw(n)) {
        return Ok(id);
    }
    Err(ShellError::NoSuchJob(arg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(entries: &[(i32, JobState)]) -> JobMap {
        let mut map = JobMap::default();
        for (pid, state) in entries {
            map.add(Pid::from_raw(*pid), *state, "cmd &");
        }
        map
    }

    #[test]
    fn resolves_job_id_with_percent() {
        let map = map_with(&[(5000, JobState::Background)]);
        assert_eq!(resolve_job_ref(&map, "bg", "%1"), Ok(JobId(1)));
    }

    #[test]
    fn resolves_pid_without_percent() {
        let map = map_with(&[(5000, JobState::Stopped)]);
        assert_eq!(resolve_job_ref(&map, "fg", "5000"), Ok(JobId(1)));
    }

    #[test]
    fn live_job_id_wins_over_pid_interpretation() {
        // Jobs 1 and 2 exist; the bare argument "2" names job 2, not a pid.
        let map = map_with(&[(5000, JobState::Background), (5001, JobState::Background)]);
        assert_eq!(resolve_job_ref(&map, "bg", "2"), Ok(JobId(2)));
    }

    #[test]
    fn missing_reference_reports_original_argument() {
        let map = map_with(&[]);
        assert_eq!(
            resolve_job_ref(&map, "fg", "%7"),
            Err(ShellError::NoSuchJob("%7".into()))
        );
        assert_eq!(
            resolve_job_ref(&map, "fg", "1234"),
            Err(ShellError::NoSuchJob("1234".into()))
        );
    }

    #[test]
    fn non_numeric_arguments_are_malformed() {
        let map = map_with(&[(5000, JobState::Background)]);
        for bad in ["abc", "%x", "12abc", "-3", "0", "%"] {
            assert_eq!(
                resolve_job_ref(&map, "bg", bad),
                Err(ShellError::MalformedJobRef("bg")),
                "argument {bad:?} should be malformed"
            );
        }
    }
}
