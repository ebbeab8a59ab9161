//! One-shot close worker.
//!
//! Port release runs on a freshly spawned thread that the caller joins, so
//! the caller's own context (possibly the owning UI thread) never performs
//! the release itself and the port is gone by the time `close` returns.

use parking_lot::Mutex;
use std::thread;
use tracing::{error, warn};

/// Run `job` on a new named thread and wait for it.
///
/// If the thread cannot be spawned the job runs inline instead.
pub(crate) fn run_on_close_worker<F>(label: &str, job: F)
where
    F: FnOnce() + Send,
{
    let job = Mutex::new(Some(job));
    let run = || {
        let taken = job.lock().take();
        if let Some(job) = taken {
            job();
        }
    };

    thread::scope(|scope| {
        let spawned = thread::Builder::new()
            .name(format!("scanner-close-{label}"))
            .spawn_scoped(scope, &run);

        match spawned {
            Ok(worker) => {
                if worker.join().is_err() {
                    error!(worker = %label, "Close worker panicked");
                }
            }
            Err(e) => {
                warn!(worker = %label, error = %e, "Could not spawn close worker, closing inline");
                run();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_job_runs_on_another_thread_before_returning() {
        let caller = thread::current().id();
        let done = AtomicBool::new(false);
        let mut worker_id = None;

        run_on_close_worker("test", || {
            worker_id = Some(thread::current().id());
            done.store(true, Ordering::SeqCst);
        });

        assert!(done.load(Ordering::SeqCst));
        assert_ne!(worker_id, Some(caller));
        assert!(worker_id.is_some());
    }

    #[test]
    fn test_worker_names_the_thread() {
        let mut name = None;
        run_on_close_worker("COM3", || {
            name = thread::current().name().map(str::to_string);
        });
        assert_eq!(name.as_deref(), Some("scanner-close-COM3"));
    }

    #[test]
    fn test_panicking_job_does_not_escape() {
        run_on_close_worker("boom", || panic!("release failed"));
    }
}
