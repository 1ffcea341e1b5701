//! Fan-out of per-length aggregation over a bounded worker pool.
//!
//! Results come back in completion order, which varies between runs. Callers
//! that need a stable order must sort.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
    mpsc,
};

use crate::{
    aggregate::{AggregatedResult, TrialRunner, aggregate},
    error::{BenchError, Result},
};

/// Shared flag that stops in-flight invocations and queued lengths.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct TaskFailure {
    pub length: u64,
    pub error: BenchError,
}

#[derive(Debug, Default)]
pub struct SweepReport {
    /// Successful lengths, in completion order.
    pub results: Vec<AggregatedResult>,
    pub failures: Vec<TaskFailure>,
}

/// Aggregates every length with at most `workers` running at once.
///
/// A failing length is logged and reported in [`SweepReport::failures`]
/// without affecting the others. A fatal failure (the tool cannot be
/// launched) cancels `cancel`, lets the in-flight lengths wind down and is
/// returned as the error of the whole sweep.
pub fn run_sweep<R: TrialRunner + ?Sized>(
    runner: &R,
    lengths: &[u64],
    samples: usize,
    workers: usize,
    cancel: &CancelToken,
) -> Result<SweepReport> {
    if workers == 0 {
        return Err(BenchError::InvalidConfig(
            "workers must be greater than zero".to_string(),
        ));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|idx| format!("bufbench-worker-{idx}"))
        .build()
        .map_err(|e| BenchError::InvalidConfig(format!("failed to start worker pool: {e}")))?;

    log::info!(
        "sweeping {} lengths with {samples} samples each on {workers} workers",
        lengths.len()
    );

    let total = lengths.len();
    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    pool.scope(|scope| {
        for &length in lengths {
            let tx = tx.clone();
            let completed = &completed;
            scope.spawn(move |_| {
                let outcome = if cancel.is_cancelled() {
                    Err(BenchError::NotStarted { length })
                } else {
                    aggregate(runner, length, samples)
                };

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                match &outcome {
                    Ok(result) => log::info!(
                        "[{done}/{total}] length {length}: time={} rat={}",
                        result.mean_elapsed_time,
                        result.quality
                    ),
                    Err(e) => {
                        if e.is_fatal() {
                            cancel.cancel();
                        }
                        log::error!("[{done}/{total}] length {length} failed: {e}");
                    }
                }

                let _ = tx.send((length, outcome));
            });
        }
    });
    drop(tx);

    let mut report = SweepReport::default();
    for (length, outcome) in rx {
        match outcome {
            Ok(result) => report.results.push(result),
            Err(error) => report.failures.push(TaskFailure { length, error }),
        }
    }

    if let Some(pos) = report.failures.iter().position(|f| f.error.is_fatal()) {
        return Err(report.failures.swap_remove(pos).error);
    }

    if !report.failures.is_empty() {
        log::warn!(
            "{} of {total} lengths failed: {:?}",
            report.failures.len(),
            report.failures.iter().map(|f| f.length).collect::<Vec<_>>()
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::MeasurementSample;
    use std::{
        io,
        sync::Mutex,
        thread,
        time::Duration,
    };

    /// time = length, rat = length / 10; lengths in `broken` never parse.
    struct Synthetic {
        broken: Vec<u64>,
        running: AtomicUsize,
        peak: AtomicUsize,
        seen: Mutex<Vec<u64>>,
    }

    impl Synthetic {
        fn new(broken: &[u64]) -> Self {
            Self {
                broken: broken.to_vec(),
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl TrialRunner for Synthetic {
        #[allow(clippy::cast_precision_loss)]
        fn run_trial(&self, length: u64) -> Result<MeasurementSample> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(length);

            if self.broken.contains(&length) {
                return Err(BenchError::Parse {
                    command: format!("tool tech.json test{length}.json"),
                    output: "garbage".to_string(),
                    reason: "pattern not found".to_string(),
                });
            }
            Ok(MeasurementSample {
                length,
                elapsed_time: length,
                quality: length as f64 / 10.0,
            })
        }
    }

    #[test]
    fn failing_length_is_isolated() {
        let runner = Synthetic::new(&[2]);
        let report = run_sweep(&runner, &[1, 2, 3], 3, 2, &CancelToken::new()).unwrap();

        let mut lengths: Vec<u64> = report.results.iter().map(|r| r.length).collect();
        lengths.sort_unstable();
        assert_eq!(lengths, vec![1, 3]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].length, 2);
        assert!(matches!(report.failures[0].error, BenchError::Parse { .. }));
    }

    #[test]
    fn pool_size_bounds_concurrency() {
        let runner = Synthetic::new(&[]);
        let lengths: Vec<u64> = (1..=16).collect();
        let report = run_sweep(&runner, &lengths, 2, 3, &CancelToken::new()).unwrap();
        assert_eq!(report.results.len(), 16);
        assert!(report.failures.is_empty());
        assert!(runner.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(runner.seen.lock().unwrap().len(), 32);
    }

    #[test]
    fn single_worker_sweep_is_complete() {
        let runner = Synthetic::new(&[]);
        let report = run_sweep(&runner, &[5, 6, 7], 1, 1, &CancelToken::new()).unwrap();
        assert_eq!(runner.peak.load(Ordering::SeqCst), 1);
        let mut results = report.results;
        results.sort_by_key(|r| r.length);
        assert!((results[2].mean_elapsed_time - 7.0).abs() < f64::EPSILON);
        assert!((results[2].quality - 0.7).abs() < 1e-12);
    }

    #[test]
    fn launch_failure_aborts_the_sweep() {
        struct Missing;
        impl TrialRunner for Missing {
            fn run_trial(&self, _length: u64) -> Result<MeasurementSample> {
                Err(BenchError::ProcessLaunch {
                    command: "/missing/tool".to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "not found"),
                })
            }
        }

        let cancel = CancelToken::new();
        let err = run_sweep(&Missing, &[1, 2, 3, 4], 2, 1, &cancel).unwrap_err();
        assert!(matches!(err, BenchError::ProcessLaunch { .. }));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn cancelled_sweep_runs_nothing() {
        let runner = Synthetic::new(&[]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = run_sweep(&runner, &[1, 2], 1, 2, &cancel).unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.error, BenchError::NotStarted { length } if length == f.length)));
        assert!(runner.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let runner = Synthetic::new(&[]);
        assert!(matches!(
            run_sweep(&runner, &[1], 1, 0, &CancelToken::new()),
            Err(BenchError::InvalidConfig(_))
        ));
    }
}
