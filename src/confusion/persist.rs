//! Persisted confusion matrices.
//!
//! A finished matrix is written as `{dataset}_{n_sup}_cm.csv` (21 headerless
//! rows of 21 integers) and optionally as JSON. The plotting side reads the
//! CSV back and labels its axes with [`CLASS_NAMES`](crate::palette::CLASS_NAMES).

use std::path::{Path, PathBuf};

use crate::confusion::ConfusionMatrix;
use crate::error::{Error, Result};
use crate::palette::NUM_CLASSES;

/// File stem for a persisted matrix, e.g. `pascal_1464_cm`.
#[must_use]
pub fn cm_stem(dataset_type: &str, labeled_samples: usize) -> String {
    format!("{}_{}_cm", dataset_type, labeled_samples)
}

/// Path of the CSV artifact for `stem` inside `dir`.
#[must_use]
pub fn csv_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.csv", stem))
}

/// Write a matrix as headerless CSV.
pub fn write_csv(matrix: &ConfusionMatrix, path: impl AsRef<Path>) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;

    for row in matrix.counts() {
        wtr.write_record(row.iter().map(|c| c.to_string()))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Read a matrix written by [`write_csv`].
pub fn read_csv(path: impl AsRef<Path>) -> Result<ConfusionMatrix> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let mut counts = [[0u64; NUM_CLASSES]; NUM_CLASSES];
    let mut rows = 0;

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = i + 1;
        if i >= NUM_CLASSES {
            return Err(Error::MatrixFormat {
                line,
                reason: format!("more than {} rows", NUM_CLASSES),
            });
        }
        if record.len() != NUM_CLASSES {
            return Err(Error::MatrixFormat {
                line,
                reason: format!("expected {} columns, got {}", NUM_CLASSES, record.len()),
            });
        }
        for (j, field) in record.iter().enumerate() {
            counts[i][j] = parse_count(field).ok_or_else(|| Error::MatrixFormat {
                line,
                reason: format!("invalid count {:?} in column {}", field, j + 1),
            })?;
        }
        rows += 1;
    }

    if rows != NUM_CLASSES {
        return Err(Error::MatrixFormat {
            line: rows,
            reason: format!("expected {} rows, got {}", NUM_CLASSES, rows),
        });
    }

    Ok(ConfusionMatrix::from_counts(counts))
}

/// Accept plain integers as well as integral floats (`"16.0"`), which is
/// how float-typed matrix dumps render whole counts.
fn parse_count(field: &str) -> Option<u64> {
    if let Ok(v) = field.parse::<u64>() {
        return Some(v);
    }
    let v = field.parse::<f64>().ok()?;
    (v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64).then_some(v as u64)
}

/// Write a matrix as pretty JSON.
pub fn write_json(matrix: &ConfusionMatrix, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(matrix)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a matrix from JSON.
pub fn read_json(path: impl AsRef<Path>) -> Result<ConfusionMatrix> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a matrix, choosing the format from the file extension.
pub fn read(path: impl AsRef<Path>) -> Result<ConfusionMatrix> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => read_json(path),
        _ => read_csv(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> ConfusionMatrix {
        let mut counts = [[0u64; NUM_CLASSES]; NUM_CLASSES];
        for (i, row) in counts.iter_mut().enumerate() {
            for (j, c) in row.iter_mut().enumerate() {
                *c = (i * 100 + j) as u64;
            }
        }
        ConfusionMatrix::from_counts(counts)
    }

    #[test]
    fn test_cm_stem() {
        assert_eq!(cm_stem("pascal", 1464), "pascal_1464_cm");
        assert_eq!(
            csv_path(Path::new("out"), "pascal_92_cm"),
            PathBuf::from("out/pascal_92_cm.csv")
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pascal_92_cm.csv");
        let matrix = sample_matrix();

        write_csv(&matrix, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), NUM_CLASSES);
        assert!(content.starts_with("0,1,2,"));

        assert_eq!(read(&path).unwrap(), matrix);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let matrix = sample_matrix();
        write_json(&matrix, &path).unwrap();
        assert_eq!(read(&path).unwrap(), matrix);
    }

    #[test]
    fn test_float_counts_accepted() {
        assert_eq!(parse_count("16"), Some(16));
        assert_eq!(parse_count("16.0"), Some(16));
        assert_eq!(parse_count("1.5"), None);
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("abc"), None);
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "1,2,3\n4,5,6\n").unwrap();

        let err = read_csv(&path).unwrap_err();
        assert!(matches!(err, Error::MatrixFormat { line: 1, .. }));
    }

    #[test]
    fn test_too_few_rows_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        let row = vec!["0"; NUM_CLASSES].join(",");
        std::fs::write(&path, format!("{row}\n{row}\n")).unwrap();

        let err = read_csv(&path).unwrap_err();
        assert!(matches!(err, Error::MatrixFormat { line: 2, .. }));
    }
}
