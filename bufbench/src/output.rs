//! Scanner for the two lines the tool prints at the end of a run:
//!
//! ```text
//! Resulting RAT = <float>
//! Resulting AlgoTime = <int>
//! ```

use crate::error::BenchError;

const RAT_PREFIX: &str = "Resulting RAT = ";
const ALGO_TIME_PREFIX: &str = "Resulting AlgoTime = ";

/// Values reported by a single run of the tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolReport {
    pub rat: f64,
    pub algo_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    MissingPattern,
    EmptyField(&'static str),
    InvalidField { field: &'static str, value: String },
}

impl ScanError {
    /// Attaches the invocation details needed to diagnose the failure.
    #[must_use]
    pub fn into_bench_error(self, command: &str, output: &str) -> BenchError {
        let command = command.to_string();
        let output = output.to_string();
        match self {
            ScanError::MissingPattern => BenchError::Parse {
                command,
                output,
                reason: "pattern not found".to_string(),
            },
            ScanError::EmptyField(field) => BenchError::EmptyMatch {
                command,
                output,
                field,
            },
            ScanError::InvalidField { field, value } => BenchError::Parse {
                command,
                output,
                reason: format!("{field} value {value:?} is not a number"),
            },
        }
    }
}

/// Finds the first `Resulting RAT` line that is immediately followed by a
/// `Resulting AlgoTime` line and extracts both values.
pub fn scan(text: &str) -> Result<ToolReport, ScanError> {
    let mut lines = text.lines().peekable();
    while let Some(line) = lines.next() {
        let Some(pos) = line.find(RAT_PREFIX) else {
            continue;
        };
        let Some(algo_time) = lines
            .peek()
            .and_then(|next| next.strip_prefix(ALGO_TIME_PREFIX))
        else {
            continue;
        };
        let rat = &line[pos + RAT_PREFIX.len()..];
        return parse_fields(rat, algo_time);
    }
    Err(ScanError::MissingPattern)
}

fn parse_fields(rat: &str, algo_time: &str) -> Result<ToolReport, ScanError> {
    let rat = rat.trim();
    let algo_time = algo_time.trim();
    if rat.is_empty() {
        return Err(ScanError::EmptyField("RAT"));
    }
    if algo_time.is_empty() {
        return Err(ScanError::EmptyField("AlgoTime"));
    }
    let rat = rat.parse().map_err(|_| ScanError::InvalidField {
        field: "RAT",
        value: rat.to_string(),
    })?;
    let algo_time = algo_time.parse().map_err(|_| ScanError::InvalidField {
        field: "AlgoTime",
        value: algo_time.to_string(),
    })?;
    Ok(ToolReport { rat, algo_time })
}

/// [`scan`] with failures reported against `command`.
pub fn parse_report(text: &str, command: &str) -> crate::Result<ToolReport> {
    scan(text).map_err(|e| e.into_bench_error(command, text))
}
