//! Flat result table: one `length time rat` row per line, no header.

use std::{fmt::Write, fs, path::Path};

use crate::{
    aggregate::AggregatedResult,
    error::{BenchError, Result},
};

/// Renders rows in the given order.
#[must_use]
pub fn format_table(results: &[AggregatedResult]) -> String {
    let mut table = String::new();
    for row in results {
        let _ = writeln!(
            table,
            "{} {} {}",
            row.length, row.mean_elapsed_time, row.quality
        );
    }
    table
}

/// Replaces whatever is at `path` with the table for `results`.
pub fn write_table(path: &Path, results: &[AggregatedResult]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format_table(results))?;
    log::info!("wrote {} rows to {}", results.len(), path.display());
    Ok(())
}

/// Parses table text. Any line without exactly three numeric fields is an error.
pub fn parse_table(contents: &str) -> Result<Vec<AggregatedResult>> {
    contents
        .lines()
        .enumerate()
        .map(|(idx, line)| parse_row(idx + 1, line))
        .collect()
}

pub fn read_table(path: &Path) -> Result<Vec<AggregatedResult>> {
    let rows = parse_table(&fs::read_to_string(path)?)?;
    log::debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn parse_row(line: usize, row: &str) -> Result<AggregatedResult> {
    let malformed = |reason: String| BenchError::MalformedRow {
        line,
        row: row.to_string(),
        reason,
    };

    let fields: Vec<&str> = row.split_whitespace().collect();
    let &[length, time, rat] = fields.as_slice() else {
        return Err(malformed(format!("expected 3 fields, found {}", fields.len())));
    };

    Ok(AggregatedResult {
        length: length
            .parse()
            .map_err(|_| malformed(format!("length {length:?} is not an integer")))?,
        mean_elapsed_time: time
            .parse()
            .map_err(|_| malformed(format!("time {time:?} is not a number")))?,
        quality: rat
            .parse()
            .map_err(|_| malformed(format!("rat {rat:?} is not a number")))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(length: u64, time: f64, rat: f64) -> AggregatedResult {
        AggregatedResult {
            length,
            mean_elapsed_time: time,
            quality: rat,
        }
    }

    #[test]
    fn written_table_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res").join("table.txt");
        let rows = vec![row(25, 14.0, 3.5), row(125, 9.0, 4.2)];

        write_table(&path, &rows).unwrap();
        let read = read_table(&path).unwrap();

        assert_eq!(read.len(), 2);
        for (a, b) in rows.iter().zip(&read) {
            assert_eq!(a.length, b.length);
            assert!((a.mean_elapsed_time - b.mean_elapsed_time).abs() < 1e-9);
            assert!((a.quality - b.quality).abs() < 1e-9);
        }
    }

    #[test]
    fn rows_keep_given_order_and_layout() {
        let rows = vec![row(225, 1.5, -0.25), row(25, 10.0, 3.0)];
        assert_eq!(format_table(&rows), "225 1.5 -0.25\n25 10 3\n");
    }

    #[test]
    fn write_overwrites_existing_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.txt");
        write_table(&path, &[row(1, 1.0, 1.0), row(2, 2.0, 2.0)]).unwrap();
        write_table(&path, &[row(3, 3.0, 3.0)]).unwrap();
        assert_eq!(read_table(&path).unwrap(), vec![row(3, 3.0, 3.0)]);
    }

    #[test]
    fn accepts_python_style_floats_and_extra_spacing() {
        let rows = parse_table("25   14.0\t3.5\n125 9.0 4.2\n").unwrap();
        assert_eq!(rows, vec![row(25, 14.0, 3.5), row(125, 9.0, 4.2)]);
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let err = parse_table("abc def\n").unwrap_err();
        assert!(matches!(err, BenchError::MalformedRow { line: 1, .. }));

        let err = parse_table("25 14.0 3.5\n125 9.0 4.2 7\n").unwrap_err();
        assert!(matches!(err, BenchError::MalformedRow { line: 2, .. }));

        let err = parse_table("25 14.0 3.5\n\n").unwrap_err();
        assert!(matches!(err, BenchError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        for text in ["x 1 2\n", "25 fast 2\n", "25 1 slow\n", "2.5 1 2\n"] {
            let err = parse_table(text).unwrap_err();
            assert!(
                matches!(err, BenchError::MalformedRow { line: 1, .. }),
                "{text:?} gave {err}"
            );
        }
    }

    #[test]
    fn empty_table_is_empty() {
        assert!(parse_table("").unwrap().is_empty());
    }
}
