use crate::error::{AnnotationError, AnnotationResult};
use crate::types::{Job, JobResult};
use crate::utils::cancellation::CancellationToken;
use crossbeam_channel::{unbounded, Receiver};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Body of a job, run on a worker thread.
pub trait JobExecutor: Send + Sync + 'static {
    fn execute(&self, job: &Job, cancel: &CancellationToken) -> AnnotationResult<JobResult>;
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Fixed-size pool of worker threads. All jobs are queued up front and
/// results are yielded in completion order through the `Iterator` impl.
pub struct WorkerPool {
    handles: Vec<thread::JoinHandle<()>>,
    results: Receiver<AnnotationResult<JobResult>>,
    cancel: CancellationToken,
    total: usize,
    completed: usize,
}

impl WorkerPool {
    pub fn new<E: JobExecutor>(
        jobs: Vec<Job>,
        parallel: usize,
        executor: E,
        cancel: CancellationToken,
    ) -> AnnotationResult<Self> {
        if parallel == 0 {
            return Err(AnnotationError::Argument(
                "parallel must be at least 1".to_string(),
            ));
        }

        let total = jobs.len();
        let (job_tx, job_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        for job in jobs {
            // receiver is alive, cannot fail
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let executor = Arc::new(executor);
        let num_workers = parallel.min(total.max(1));
        let mut handles = Vec::with_capacity(num_workers);
        let cancel_on_error = cancel.clone();

        for worker in 0..num_workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let executor = Arc::clone(&executor);
            let cancel = cancel.clone();

            let handle = thread::Builder::new()
                .name(format!("anno-worker-{}", worker))
                .spawn(move || {
                    while let Ok(job) = job_rx.recv() {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let outcome =
                            panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&job, &cancel)))
                                .unwrap_or_else(|payload| {
                                    Err(AnnotationError::JobPanicked {
                                        job_id: job.id.clone(),
                                        message: panic_message(payload),
                                    })
                                });
                        if result_tx.send(outcome).is_err() {
                            break;
                        }
                    }
                    debug!(worker, "worker finished");
                })
                .map_err(|e| {
                    cancel_on_error.cancel();
                    AnnotationError::ToolIo {
                        tool: "worker thread".to_string(),
                        source: e,
                    }
                })?;
            handles.push(handle);
        }

        Ok(WorkerPool {
            handles,
            results: result_rx,
            cancel,
            total,
            completed: 0,
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Stops workers from taking new jobs and kills running predictors.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancels outstanding work and waits for every worker to exit.
    pub fn shutdown(mut self) {
        self.join_workers();
    }

    fn join_workers(&mut self) {
        self.cancel.cancel();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread terminated abnormally");
            }
        }
    }
}

impl Iterator for WorkerPool {
    type Item = AnnotationResult<JobResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.completed == self.total {
            return None;
        }
        match self.results.recv() {
            Ok(outcome) => {
                self.completed += 1;
                Some(outcome)
            }
            // every worker exited early after cancellation
            Err(_) => None,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_workers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PredictorConfig;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn jobs(n: usize) -> Vec<Job> {
        let predictors = Arc::new(PredictorConfig::new("porter"));
        (0..n)
            .map(|index| Job {
                index,
                id: format!("seq{}", index),
                sequence: "M".repeat(index + 1),
                batch_dir: PathBuf::from("/unused"),
                predictors: Arc::clone(&predictors),
                cpus: 1,
            })
            .collect()
    }

    struct Echo;

    impl JobExecutor for Echo {
        fn execute(&self, job: &Job, _cancel: &CancellationToken) -> AnnotationResult<JobResult> {
            // later jobs finish first
            thread::sleep(Duration::from_millis(5 * (8 - job.index.min(8)) as u64));
            Ok(JobResult {
                id: job.id.clone(),
                ss3: "C".repeat(job.sequence.len()),
                ss8: "C".repeat(job.sequence.len()),
                disorder: None,
            })
        }
    }

    struct PanicOn(&'static str);

    impl JobExecutor for PanicOn {
        fn execute(&self, job: &Job, cancel: &CancellationToken) -> AnnotationResult<JobResult> {
            if job.id == self.0 {
                panic!("predictor wrapper crashed");
            }
            Echo.execute(job, cancel)
        }
    }

    struct Counting(Arc<AtomicUsize>);

    impl JobExecutor for Counting {
        fn execute(&self, job: &Job, _cancel: &CancellationToken) -> AnnotationResult<JobResult> {
            self.0.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Err(AnnotationError::Argument(format!("{} failed", job.id)))
        }
    }

    #[test]
    fn test_every_job_yields_one_result() {
        for parallel in [1, 4] {
            let pool = WorkerPool::new(jobs(8), parallel, Echo, CancellationToken::new()).unwrap();
            assert_eq!(pool.total(), 8);
            let results: Vec<JobResult> = pool.map(|r| r.unwrap()).collect();

            assert_eq!(results.len(), 8);
            let ids: HashSet<String> = results.iter().map(|r| r.id.clone()).collect();
            let expected: HashSet<String> = (0..8).map(|i| format!("seq{}", i)).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn test_zero_parallel_is_rejected() {
        let err = WorkerPool::new(jobs(1), 0, Echo, CancellationToken::new())
            .err()
            .unwrap();
        assert!(matches!(err, AnnotationError::Argument(_)));
    }

    #[test]
    fn test_empty_job_list_finishes_immediately() {
        let mut pool = WorkerPool::new(Vec::new(), 2, Echo, CancellationToken::new()).unwrap();
        assert!(pool.next().is_none());
    }

    #[test]
    fn test_panic_is_isolated_to_its_job() {
        let pool = WorkerPool::new(jobs(4), 2, PanicOn("seq1"), CancellationToken::new()).unwrap();
        let outcomes: Vec<_> = pool.collect();

        assert_eq!(outcomes.len(), 4);
        let failures: Vec<&AnnotationError> =
            outcomes.iter().filter_map(|o| o.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].job_id(), Some("seq1"));
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 3);
    }

    #[test]
    fn test_cancel_stops_new_work() {
        let started = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(
            jobs(16),
            1,
            Counting(Arc::clone(&started)),
            CancellationToken::new(),
        )
        .unwrap();

        let first = pool.next().unwrap();
        assert!(first.is_err());
        pool.cancel();
        pool.shutdown();

        assert!(started.load(Ordering::SeqCst) < 16);
    }
}
