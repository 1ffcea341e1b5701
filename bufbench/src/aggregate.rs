use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// One trial of the tool for one wire length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSample {
    pub length: u64,
    /// Tool-reported `AlgoTime`.
    pub elapsed_time: u64,
    /// Tool-reported `RAT`.
    pub quality: f64,
}

/// One row of the result table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub length: u64,
    pub mean_elapsed_time: f64,
    pub quality: f64,
}

/// Something that can measure a wire length, one trial at a time.
pub trait TrialRunner: Sync {
    /// Called once per length before its trials.
    fn prepare(&self, _length: u64) -> Result<()> {
        Ok(())
    }

    fn run_trial(&self, length: u64) -> Result<MeasurementSample>;
}

/// Runs `samples` trials for `length` back to back and averages the elapsed
/// time. RAT is deterministic for a given length so the last trial's value is
/// kept. The first failing trial aborts the remaining ones.
#[allow(clippy::cast_precision_loss)]
pub fn aggregate<R: TrialRunner + ?Sized>(
    runner: &R,
    length: u64,
    samples: usize,
) -> Result<AggregatedResult> {
    if samples == 0 {
        return Err(BenchError::InvalidConfig(
            "samples must be greater than zero".to_string(),
        ));
    }

    runner.prepare(length)?;

    let mut total_time: u64 = 0;
    let mut quality = f64::NAN;
    for trial in 0..samples {
        let sample = runner.run_trial(length)?;
        log::trace!(
            "length {length} trial {}/{samples}: time={} rat={}",
            trial + 1,
            sample.elapsed_time,
            sample.quality
        );
        total_time = total_time
            .checked_add(sample.elapsed_time)
            .ok_or(BenchError::TimeOverflow {
                length,
                trials: trial + 1,
            })?;
        quality = sample.quality;
    }

    Ok(AggregatedResult {
        length,
        mean_elapsed_time: total_time as f64 / samples as f64,
        quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::VecDeque, sync::Mutex};

    /// Replays a fixed list of (time, rat) pairs, or fails once exhausted.
    struct Scripted {
        replies: Mutex<VecDeque<(u64, f64)>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(replies: &[(u64, f64)]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().copied().collect()),
                calls: Mutex::new(0),
            }
        }
    }

    impl TrialRunner for Scripted {
        fn run_trial(&self, length: u64) -> Result<MeasurementSample> {
            *self.calls.lock().unwrap() += 1;
            match self.replies.lock().unwrap().pop_front() {
                Some((elapsed_time, quality)) => Ok(MeasurementSample {
                    length,
                    elapsed_time,
                    quality,
                }),
                None => Err(BenchError::Parse {
                    command: format!("tool tech.json test{length}.json"),
                    output: String::new(),
                    reason: "pattern not found".to_string(),
                }),
            }
        }
    }

    #[test]
    fn averages_time_and_keeps_last_rat() {
        let runner = Scripted::new(&[(10, 1.0), (20, 2.0), (10, 3.0), (20, 4.0), (10, 5.5)]);
        let result = aggregate(&runner, 25, 5).unwrap();
        assert_eq!(result.length, 25);
        assert!((result.mean_elapsed_time - 14.0).abs() < f64::EPSILON);
        assert!((result.quality - 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn first_failure_aborts_remaining_trials() {
        let runner = Scripted::new(&[(10, 1.0), (20, 2.0)]);
        let err = aggregate(&runner, 25, 5).unwrap_err();
        assert!(matches!(err, BenchError::Parse { .. }));
        assert_eq!(*runner.calls.lock().unwrap(), 3);
    }

    #[test]
    fn overflowing_total_time_is_an_error() {
        let runner = Scripted::new(&[(u64::MAX - 1, 1.0), (2, 1.0), (3, 1.0)]);
        let err = aggregate(&runner, 25, 3).unwrap_err();
        assert!(matches!(
            err,
            BenchError::TimeOverflow {
                length: 25,
                trials: 2
            }
        ));
        assert_eq!(*runner.calls.lock().unwrap(), 2);
    }

    #[test]
    fn zero_samples_is_rejected() {
        let runner = Scripted::new(&[(10, 1.0)]);
        assert!(matches!(
            aggregate(&runner, 25, 0),
            Err(BenchError::InvalidConfig(_))
        ));
        assert_eq!(*runner.calls.lock().unwrap(), 0);
    }

    #[test]
    fn prepare_failure_skips_trials() {
        struct Unwritable(Scripted);
        impl TrialRunner for Unwritable {
            fn prepare(&self, _length: u64) -> Result<()> {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
            }
            fn run_trial(&self, length: u64) -> Result<MeasurementSample> {
                self.0.run_trial(length)
            }
        }
        let runner = Unwritable(Scripted::new(&[(1, 1.0)]));
        assert!(matches!(aggregate(&runner, 1, 1), Err(BenchError::Io(_))));
        assert_eq!(*runner.0.calls.lock().unwrap(), 0);
    }
}
