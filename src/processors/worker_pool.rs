use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, Scope, ScopedJoinHandle};
use tracing::debug;

use crate::error::{ProcessingError, Result};

/// How submitted jobs were executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub submitted: u64,
    /// Handed to a worker through the queue
    pub queued: u64,
    /// Run on the submitting thread because the queue was full
    pub inline: u64,
}

/// Fixed-size pool of scoped worker threads fed through a bounded queue.
///
/// When the queue is full, `submit` runs the job on the calling thread
/// instead of blocking, so at most `workers + queue_capacity` jobs are ever
/// outstanding. The pool lives inside a `std::thread::scope`; its threads are
/// joined by `finish`, or by `Drop` when a run is abandoned early. A panicking
/// job, on a worker or on the caller, surfaces as `WorkerFailure`.
pub struct WorkerPool<'scope, J, O> {
    jobs: Option<Sender<J>>,
    results: Receiver<O>,
    completed: Vec<O>,
    work: &'scope (dyn Fn(J) -> O + Sync),
    handles: Vec<ScopedJoinHandle<'scope, ()>>,
    stats: DispatchStats,
}

impl<'scope, J, O> WorkerPool<'scope, J, O>
where
    J: Send + 'scope,
    O: Send + 'scope,
{
    pub fn start<'env, F>(
        scope: &'scope Scope<'scope, 'env>,
        workers: usize,
        queue_capacity: usize,
        work: &'scope F,
    ) -> Result<Self>
    where
        F: Fn(J) -> O + Sync,
    {
        if workers == 0 || queue_capacity == 0 {
            return Err(ProcessingError::Config(format!(
                "worker pool needs at least one worker and one queue slot (workers={}, queue_capacity={})",
                workers, queue_capacity
            )));
        }

        let (job_tx, job_rx) = channel::bounded::<J>(queue_capacity);
        let (result_tx, result_rx) = channel::unbounded::<O>();

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("chunk-worker-{index}"))
                .spawn_scoped(scope, move || {
                    for job in jobs.iter() {
                        if results.send(work(job)).is_err() {
                            break;
                        }
                    }
                })?;
            handles.push(handle);
        }

        debug!(workers, queue_capacity, "Worker pool started");

        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            completed: Vec::new(),
            work,
            handles,
            stats: DispatchStats::default(),
        })
    }

    /// Queue a job, or run it here if every worker is busy and the queue is full.
    pub fn submit(&mut self, job: J) -> Result<()> {
        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| ProcessingError::WorkerFailure("pool is shut down".to_string()))?;

        self.stats.submitted += 1;
        match jobs.try_send(job) {
            Ok(()) => {
                self.stats.queued += 1;
                Ok(())
            }
            Err(TrySendError::Full(job)) => {
                self.stats.inline += 1;
                debug!("Job queue full, running job on submitting thread");
                let work = self.work;
                let output = panic::catch_unwind(AssertUnwindSafe(|| work(job))).map_err(|_| {
                    ProcessingError::WorkerFailure("job panicked on submitting thread".to_string())
                })?;
                self.completed.push(output);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(ProcessingError::WorkerFailure(
                "all workers have exited".to_string(),
            )),
        }
    }

    /// Outputs finished so far, without waiting for running jobs.
    pub fn drain_completed(&mut self) -> Vec<O> {
        let mut outputs = std::mem::take(&mut self.completed);
        outputs.extend(self.results.try_iter());
        outputs
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Close the queue, wait for every worker and return the remaining outputs.
    pub fn finish(mut self) -> Result<(Vec<O>, DispatchStats)> {
        drop(self.jobs.take());

        let mut outputs = std::mem::take(&mut self.completed);
        outputs.extend(self.results.iter());

        for handle in self.handles.drain(..) {
            handle
                .join()
                .map_err(|_| ProcessingError::WorkerFailure("worker thread panicked".to_string()))?;
        }

        debug!(
            submitted = self.stats.submitted,
            inline = self.stats.inline,
            "Worker pool finished"
        );
        Ok((outputs, self.stats))
    }
}

impl<J, O> Drop for WorkerPool<'_, J, O> {
    fn drop(&mut self) {
        drop(self.jobs.take());
        // joined here so a panicked worker does not re-panic the enclosing scope
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_all_jobs_produce_outputs() {
        let work = |n: u64| n * 2;

        let (mut outputs, stats) = thread::scope(|scope| {
            let mut pool = WorkerPool::start(scope, 3, 4, &work).unwrap();
            let mut outputs = Vec::new();
            for n in 0..100 {
                pool.submit(n).unwrap();
                outputs.extend(pool.drain_completed());
            }
            let (rest, stats) = pool.finish().unwrap();
            outputs.extend(rest);
            (outputs, stats)
        });

        outputs.sort_unstable();
        assert_eq!(outputs, (0..100).map(|n| n * 2).collect::<Vec<_>>());
        assert_eq!(stats.submitted, 100);
        assert_eq!(stats.queued + stats.inline, 100);
    }

    #[test]
    fn test_full_queue_runs_job_on_caller() {
        let caller = thread::current().id();
        let work = |_: u32| {
            thread::sleep(Duration::from_millis(50));
            thread::current().id()
        };

        let (outputs, stats) = thread::scope(|scope| {
            let mut pool = WorkerPool::start(scope, 1, 1, &work).unwrap();
            for n in 0..5 {
                pool.submit(n).unwrap();
            }
            pool.finish().unwrap()
        });

        assert_eq!(outputs.len(), 5);
        assert!(stats.inline >= 1);
        assert_eq!(
            outputs.iter().filter(|id| **id == caller).count() as u64,
            stats.inline
        );
    }

    #[test]
    fn test_panicking_jobs_become_worker_failures() {
        let work = |_: u32| -> u32 {
            thread::sleep(Duration::from_millis(10));
            panic!("job failed");
        };

        let outcome = thread::scope(|scope| -> Result<Vec<u32>> {
            let mut pool = WorkerPool::start(scope, 1, 1, &work)?;
            for n in 0..10 {
                pool.submit(n)?;
            }
            Ok(pool.finish()?.0)
        });

        assert!(matches!(outcome, Err(ProcessingError::WorkerFailure(_))));
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let work = |n: u32| n;

        thread::scope(|scope| {
            assert!(matches!(
                WorkerPool::start(scope, 0, 1, &work),
                Err(ProcessingError::Config(_))
            ));
        });
    }

    #[test]
    fn test_outstanding_jobs_are_bounded() {
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let work = |_: u32| {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            running.fetch_sub(1, Ordering::SeqCst);
        };

        thread::scope(|scope| {
            let mut pool = WorkerPool::start(scope, 2, 2, &work).unwrap();
            for n in 0..40 {
                pool.submit(n).unwrap();
            }
            pool.finish().unwrap();
        });

        // two workers plus the submitting thread
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
