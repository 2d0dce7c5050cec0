//! Whitespace-delimited numeric tables.
//!
//! All model inputs share one plain-text format: one row per line, columns
//! separated by whitespace, `#` starting a comment. Every data row must have
//! the same column count so downstream "second-to-last column" indexing is
//! well defined.

use std::fs;
use std::path::Path;

use crate::error::AppError;

/// Read a numeric table; rows are returned in file order.
///
/// Fails (fatal for the caller) if the file is missing, contains a
/// non-numeric token, or has ragged rows.
pub fn read_table(path: &Path) -> Result<Vec<Vec<f64>>, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read table '{}': {e}", path.display())))?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut row = Vec::new();
        for tok in line.split_whitespace() {
            let v: f64 = tok.parse().map_err(|_| {
                AppError::data(format!(
                    "Bad numeric value '{tok}' at {}:{}.",
                    path.display(),
                    lineno + 1
                ))
            })?;
            row.push(v);
        }

        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(AppError::data(format!(
                    "Ragged table '{}': row {} has {} columns, expected {}.",
                    path.display(),
                    lineno + 1,
                    row.len(),
                    first.len()
                )));
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(AppError::data(format!("Table '{}' contains no data rows.", path.display())));
    }
    Ok(rows)
}

/// Extract one column from a table read by [`read_table`].
pub fn column(rows: &[Vec<f64>], idx: usize) -> Vec<f64> {
    rows.iter().map(|r| r[idx]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{content}").unwrap();
        f
    }

    #[test]
    fn reads_rows_and_skips_comments() {
        let f = write_temp("# header\n1.0 2.0 3.0\n\n4.0 5.0 6.0 # trailing\n");
        let rows = read_table(f.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![4.0, 5.0, 6.0]);
        assert_eq!(column(&rows, 1), vec![2.0, 5.0]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let f = write_temp("1 2 3\n4 5\n");
        assert!(read_table(f.path()).is_err());
    }

    #[test]
    fn rejects_missing_file() {
        let err = read_table(Path::new("/nonexistent/profile.dat")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
