//! Fixed-size worker pool for one parallel evaluation.
//!
//! ```text
//!             job queue (crossbeam, unbounded)
//! caller ──► [(0, leaf) (1, leaf) ...] ──► lazyflow-worker-0 ─┐
//!                                      ──► lazyflow-worker-1 ─┼─► result queue ──► caller
//!                                      ──► ...               ─┘
//! ```
//!
//! Workers pull jobs until the queue is drained. A panic inside a job is caught
//! and reported; it also raises the abort flag so queued jobs are skipped. The
//! caller then discards every partial and returns the fault.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::unbounded;
use tracing::{trace, warn};

use crate::error::{Result, StreamError};

/// Thread pool sized once, started per [`run`](WorkerPool::run) call.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    size: usize,
    #[cfg(test)]
    fail_spawn_at: Option<usize>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            #[cfg(test)]
            fail_spawn_at: None,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `task` over every job on up to `size` threads.
    ///
    /// Returns `(job index, result)` pairs in completion order, all jobs
    /// accounted for, or the first fault.
    pub fn run<J, R, F>(&self, jobs: Vec<J>, task: F) -> Result<Vec<(usize, R)>>
    where
        J: Send + 'static,
        R: Send + 'static,
        F: Fn(J) -> R + Send + Sync + 'static,
    {
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (job_tx, job_rx) = unbounded::<(usize, J)>();
        for job in jobs.into_iter().enumerate() {
            // The receiver is held below, so the queue cannot be disconnected.
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let (result_tx, result_rx) = unbounded::<(usize, thread::Result<R>)>();
        let abort = Arc::new(AtomicBool::new(false));
        let task = Arc::new(task);

        let workers = self.size.min(total);
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let worker_abort = Arc::clone(&abort);
            let task = Arc::clone(&task);

            let spawned = self.spawn_worker(worker_id, move || {
                while let Ok((index, job)) = job_rx.recv() {
                    if worker_abort.load(Ordering::Acquire) {
                        break;
                    }
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| (*task)(job)));
                    if outcome.is_err() {
                        worker_abort.store(true, Ordering::Release);
                    }
                    if result_tx.send((index, outcome)).is_err() {
                        break;
                    }
                }
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    // Workers already running stop at their next job.
                    abort.store(true, Ordering::Release);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    warn!("worker {} failed to start: {}", worker_id, err);
                    return Err(StreamError::Spawn(err));
                }
            }
        }
        drop(result_tx);
        drop(job_rx);

        let mut partials = Vec::with_capacity(total);
        let mut fault = None;
        for (index, outcome) in result_rx.iter() {
            match outcome {
                Ok(partial) => {
                    trace!("partition {} complete", index);
                    partials.push((index, partial));
                }
                Err(payload) => {
                    if fault.is_none() {
                        fault = Some(StreamError::worker_fault(index, payload));
                    }
                }
            }
        }
        for handle in handles {
            let _ = handle.join();
        }

        if let Some(err) = fault {
            warn!("parallel evaluation aborted: {}", err);
            return Err(err);
        }
        if partials.len() != total {
            return Err(StreamError::Disconnected {
                missing: total - partials.len(),
            });
        }
        Ok(partials)
    }

    fn spawn_worker<F>(&self, worker_id: usize, body: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        #[cfg(test)]
        if self.fail_spawn_at == Some(worker_id) {
            return Err(io::Error::other("worker start refused"));
        }
        thread::Builder::new()
            .name(format!("lazyflow-worker-{worker_id}"))
            .spawn(body)
    }
}

#[cfg(test)]
#[path = "tests/pool_tests.rs"]
mod tests;
