//! Job-control integration tests with real child processes.
//!
//! The reaper drains `waitpid(-1, ...)`, which is process-global state, so
//! only one kernel may be live at a time: every test takes `TEST_LOCK`
//! first. Kernels are dropped (not `shutdown`) at the end of each test,
//! which aborts their signal tasks but leaves the process-wide signal
//! streams usable for the next test.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::getpid;
use tokio::sync::Mutex;
use tokio::time::sleep;

use jush_kernel::{EvalOutcome, JobTable, Kernel};
use jush_types::{JobId, JobState};

static TEST_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn test_lock() -> &'static Mutex<()> {
    TEST_LOCK.get_or_init(|| Mutex::new(()))
}

/// Poll an async condition until it holds or ~4 seconds elapse.
async fn eventually<F, Fut>(mut cond: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..400 {
        if cond().await {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn job_count(table: &JobTable) -> usize {
    table.lock().await.len()
}

/// Kill a job's process group and wait for the reaper to delete it.
async fn reap_group(table: &Arc<JobTable>, id: JobId) {
    let pid = table.lock().await.pid(id);
    if let Some(pid) = pid {
        let _ = killpg(pid, Signal::SIGKILL);
    }
    let table = table.clone();
    assert!(
        eventually(|| {
            let table = table.clone();
            async move { !table.lock().await.exists(id) }
        })
        .await,
        "job {id} was never reaped"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_job_registers_then_reaps_on_exit() {
    let _guard = test_lock().lock().await;
    let kernel = Kernel::start().unwrap();
    let table = kernel.table().clone();

    let outcome = kernel.eval("sleep 1 &").await;
    assert_eq!(outcome, EvalOutcome::Continue);

    {
        let jobs = table.lock().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs.state(JobId(1)), Some(JobState::Background));
        assert_eq!(jobs.cmdline(JobId(1)), Some("sleep 1 &"));
        assert_eq!(jobs.foreground(), None);
    }

    // The reaper deletes the record when the sleep exits.
    let t = table.clone();
    assert!(
        eventually(|| {
            let t = t.clone();
            async move { t.lock().await.is_empty() }
        })
        .await
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn foreground_job_blocks_until_exit_and_redirects_output() {
    let _guard = test_lock().lock().await;
    let kernel = Kernel::start().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let line = format!("echo hi > {}", path.display());

    let outcome = kernel.eval(&line).await;
    assert_eq!(outcome, EvalOutcome::Continue);

    // eval returned, so the job finished and was deleted.
    assert_eq!(job_count(kernel.table()).await, 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_input_redirection_spawns_nothing() {
    let _guard = test_lock().lock().await;
    let kernel = Kernel::start().unwrap();

    let outcome = kernel.eval("cat < /no/such/file/anywhere.txt").await;
    assert_eq!(outcome, EvalOutcome::Continue);
    assert_eq!(job_count(kernel.table()).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spawn_failure_registers_no_job() {
    let _guard = test_lock().lock().await;
    let kernel = Kernel::start().unwrap();

    let outcome = kernel.eval("/no/such/binary/exists").await;
    assert_eq!(outcome, EvalOutcome::Continue);
    assert_eq!(job_count(kernel.table()).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn quit_ends_the_loop_without_touching_jobs() {
    let _guard = test_lock().lock().await;
    let kernel = Kernel::start().unwrap();
    let table = kernel.table().clone();

    kernel.eval("sleep 5 &").await;
    assert_eq!(kernel.eval("quit").await, EvalOutcome::Quit);
    // quit does not wait for or delete background jobs.
    assert_eq!(job_count(&table).await, 1);

    reap_group(&table, JobId(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn jobs_listing_redirects_to_file() {
    let _guard = test_lock().lock().await;
    let kernel = Kernel::start().unwrap();
    let table = kernel.table().clone();

    kernel.eval("sleep 5 &").await;
    let pid = table.lock().await.pid(JobId(1)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("listing.txt");
    kernel.eval(&format!("jobs > {}", path.display())).await;

    let listing = std::fs::read_to_string(&path).unwrap();
    assert_eq!(listing, format!("[1] ({pid}) Running sleep 5 &\n"));

    reap_group(&table, JobId(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn interrupt_reaches_only_the_foreground_group() {
    let _guard = test_lock().lock().await;
    let kernel = Arc::new(Kernel::start().unwrap());
    let table = kernel.table().clone();

    // Background job B must survive the interrupt.
    kernel.eval("sleep 5 &").await;
    let bg_id = JobId(1);
    let bg_pid = table.lock().await.pid(bg_id).unwrap();

    // Foreground job A blocks eval until a signal ends it.
    let k = kernel.clone();
    let fg_eval = tokio::spawn(async move { k.eval("sleep 5").await });

    let t = table.clone();
    assert!(
        eventually(|| {
            let t = t.clone();
            async move { t.lock().await.foreground().is_some() }
        })
        .await,
        "foreground job never registered"
    );
    let fg_id = table.lock().await.foreground().unwrap();

    // Deliver SIGINT to the shell process; the forwarder relays it to A's
    // process group only.
    kill(getpid(), Signal::SIGINT).unwrap();

    fg_eval.await.unwrap();
    assert!(!table.lock().await.exists(fg_id));

    // B is unaffected: still tracked, process still alive.
    assert!(table.lock().await.exists(bg_id));
    assert!(kill(bg_pid, None).is_ok());

    reap_group(&table, bg_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn suspend_stops_foreground_job_and_bg_resumes_it() {
    let _guard = test_lock().lock().await;
    let kernel = Arc::new(Kernel::start().unwrap());
    let table = kernel.table().clone();

    let k = kernel.clone();
    let fg_eval = tokio::spawn(async move { k.eval("sleep 5").await });

    let t = table.clone();
    assert!(
        eventually(|| {
            let t = t.clone();
            async move { t.lock().await.foreground().is_some() }
        })
        .await
    );
    let id = table.lock().await.foreground().unwrap();

    // Ctrl-Z: the forwarder relays SIGTSTP; the reaper marks the job
    // Stopped; the foreground wait returns with the record retained.
    kill(getpid(), Signal::SIGTSTP).unwrap();
    fg_eval.await.unwrap();

    {
        let jobs = table.lock().await;
        assert!(jobs.exists(id));
        assert_eq!(jobs.state(id), Some(JobState::Stopped));
        assert_eq!(jobs.foreground(), None);
    }

    // bg resumes it in the background.
    kernel.eval(&format!("bg %{id}")).await;
    assert_eq!(table.lock().await.state(id), Some(JobState::Background));

    reap_group(&table, id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fg_on_stopped_job_waits_until_it_ends() {
    let _guard = test_lock().lock().await;
    let kernel = Arc::new(Kernel::start().unwrap());
    let table = kernel.table().clone();

    let k = kernel.clone();
    let fg_eval = tokio::spawn(async move { k.eval("sleep 5").await });

    let t = table.clone();
    assert!(
        eventually(|| {
            let t = t.clone();
            async move { t.lock().await.foreground().is_some() }
        })
        .await
    );
    let id = table.lock().await.foreground().unwrap();
    let pid = table.lock().await.pid(id).unwrap();

    kill(getpid(), Signal::SIGTSTP).unwrap();
    fg_eval.await.unwrap();
    assert_eq!(table.lock().await.state(id), Some(JobState::Stopped));

    // fg flips it back to Foreground and blocks again.
    let k = kernel.clone();
    let line = format!("fg %{id}");
    let fg_again = tokio::spawn(async move { k.eval(&line).await });

    let t = table.clone();
    assert!(
        eventually(|| {
            let t = t.clone();
            async move { t.lock().await.state(id) == Some(JobState::Foreground) }
        })
        .await
    );

    // Ending the job releases the second wait and deletes the record.
    let _ = killpg(pid, Signal::SIGKILL);
    fg_again.await.unwrap();
    assert!(!table.lock().await.exists(id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bg_fg_argument_errors_leave_table_unchanged() {
    let _guard = test_lock().lock().await;
    let kernel = Kernel::start().unwrap();
    let table = kernel.table().clone();

    kernel.eval("sleep 5 &").await;

    for line in ["bg", "fg", "bg nonsense", "fg %x", "bg %42", "fg 99999"] {
        assert_eq!(kernel.eval(line).await, EvalOutcome::Continue);
        let jobs = table.lock().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs.state(JobId(1)), Some(JobState::Background));
    }

    reap_group(&table, JobId(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_and_malformed_lines_are_ignored() {
    let _guard = test_lock().lock().await;
    let kernel = Kernel::start().unwrap();

    for line in ["", "   ", "echo 'unterminated", "cat <"] {
        assert_eq!(kernel.eval(line).await, EvalOutcome::Continue);
    }
    assert_eq!(job_count(kernel.table()).await, 0);
}
