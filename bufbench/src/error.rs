use std::{io, time::Duration};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BenchError>;

#[derive(Debug, Error)]
pub enum BenchError {
    /// The external program could not be started at all. Fatal for a sweep.
    #[error("failed to launch `{command}`: {source}")]
    ProcessLaunch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("missing `Resulting RAT`/`Resulting AlgoTime` lines ({reason}) from `{command}`; output:\n{output}")]
    Parse {
        command: String,
        output: String,
        reason: String,
    },

    #[error("empty `{field}` value from `{command}`; output:\n{output}")]
    EmptyMatch {
        command: String,
        output: String,
        field: &'static str,
    },

    #[error("`{command}` did not finish within {timeout:?}; output so far:\n{output}")]
    Timeout {
        command: String,
        timeout: Duration,
        output: String,
    },

    #[error("`{command}` was cancelled")]
    Cancelled { command: String },

    /// The sweep was cancelled before this length got a worker.
    #[error("length {length} was not started, sweep cancelled")]
    NotStarted { length: u64 },

    #[error("total AlgoTime for length {length} overflowed after {trials} trials")]
    TimeOverflow { length: u64, trials: usize },

    #[error("malformed row {line} ({reason}): {row:?}")]
    MalformedRow {
        line: usize,
        row: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to render plot: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    /// Whether this error should stop the whole sweep rather than just the
    /// parameter it occurred for.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, BenchError::ProcessLaunch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_launch_failures_are_fatal() {
        let launch = BenchError::ProcessLaunch {
            command: "tool a b".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let parse = BenchError::Parse {
            command: "tool a b".to_string(),
            output: String::new(),
            reason: "no match".to_string(),
        };
        assert!(launch.is_fatal());
        assert!(!parse.is_fatal());
        assert!(!BenchError::Cancelled { command: "tool".to_string() }.is_fatal());
        assert!(!BenchError::NotStarted { length: 25 }.is_fatal());
    }

    #[test]
    fn diagnostics_carry_command_and_output() {
        let err = BenchError::EmptyMatch {
            command: "/opt/tool tech.json test25.json".to_string(),
            output: "Resulting RAT = \nResulting AlgoTime = 3\n".to_string(),
            field: "RAT",
        };
        let msg = err.to_string();
        assert!(msg.contains("/opt/tool tech.json test25.json"));
        assert!(msg.contains("Resulting AlgoTime = 3"));
        assert!(msg.contains("RAT"));
    }
}
