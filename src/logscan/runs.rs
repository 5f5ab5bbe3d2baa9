//! Log discovery and best-of-many-runs selection.
//!
//! Experiments keep one log per independent run under
//! `{root}/{split}/{ours|suponly}/log/`. Logs are listed in natural order
//! (`run2` before `run10`), scanned in parallel, and can be collapsed to the
//! single best run with [`best_only`].

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::logscan::{LogScanner, ScanOutcome, ScoreFormat};

/// Training variant of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Semi-supervised runs.
    Ours,
    /// Supervised-only baseline runs.
    SupOnly,
}

impl Variant {
    /// Directory name used in the experiment layout.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Ours => "ours",
            Self::SupOnly => "suponly",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ours" | "semi" => Ok(Self::Ours),
            "suponly" | "sup" => Ok(Self::SupOnly),
            other => Err(format!("unknown variant: {} (expected ours or suponly)", other)),
        }
    }
}

/// Root of an experiment tree.
#[derive(Debug, Clone)]
pub struct ExperimentLayout {
    root: PathBuf,
}

impl ExperimentLayout {
    /// Layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `{root}/{split}/{variant}/log`.
    #[must_use]
    pub fn log_dir(&self, split: usize, variant: Variant) -> PathBuf {
        self.root
            .join(split.to_string())
            .join(variant.dir_name())
            .join("log")
    }
}

/// List the regular files in `dir`, naturally sorted by file name.
pub fn discover_logs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(Error::NoLogFiles(dir.to_path_buf()));
    }

    paths.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
    debug!(dir = %dir.display(), count = paths.len(), "discovered logs");
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compare strings treating runs of ASCII digits as numbers.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut x, mut y) = (a, b);
    loop {
        match (x.is_empty(), y.is_empty()) {
            (true, true) => return a.cmp(b),
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        let (cx, rx) = split_chunk(x);
        let (cy, ry) = split_chunk(y);
        let ord = if is_digits(cx) && is_digits(cy) {
            cmp_numeric(cx, cy)
        } else {
            cx.cmp(cy)
        };
        if ord != Ordering::Equal {
            return ord;
        }
        x = rx;
        y = ry;
    }
}

fn is_digits(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit())
}

fn split_chunk(s: &str) -> (&str, &str) {
    let digits = is_digits(s);
    let end = s
        .find(|c: char| c.is_ascii_digit() != digits)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Scan result for one log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Log file path.
    pub path: PathBuf,
    /// What the scanner found.
    pub outcome: ScanOutcome,
}

impl RunReport {
    /// File name of the log.
    #[must_use]
    pub fn name(&self) -> String {
        file_name(&self.path)
    }
}

impl<F: ScoreFormat> LogScanner<F> {
    /// Read and scan one log file.
    pub fn scan_file(&self, path: impl AsRef<Path>) -> Result<RunReport> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let outcome = self.scan_text(&text)?;

        match &outcome {
            ScanOutcome::Best(record) => {
                debug!(path = %path.display(), score = record.score, "best epoch found");
            }
            ScanOutcome::NoBestEpoch => {
                warn!("Can't find best epoch from {}", path.display());
            }
            ScanOutcome::InsufficientContext { line, available, .. } => {
                warn!(
                    "Best epoch at line {} of {} has only {} preceding lines",
                    line,
                    path.display(),
                    available
                );
            }
            ScanOutcome::Failed { reason } => {
                warn!("Failed to scan {}: {}", path.display(), reason);
            }
        }

        Ok(RunReport {
            path: path.to_path_buf(),
            outcome,
        })
    }
}

impl<F: ScoreFormat + Sync> LogScanner<F> {
    /// Scan many logs in parallel, keeping input order.
    ///
    /// A log that can't be read or parsed is reported as
    /// [`ScanOutcome::Failed`] and the remaining logs are still scanned.
    pub fn scan_runs(&self, paths: &[PathBuf]) -> Vec<RunReport> {
        paths
            .par_iter()
            .map(|p| {
                self.scan_file(p).unwrap_or_else(|e| {
                    warn!("Failed to scan {}: {}", p.display(), e);
                    RunReport {
                        path: p.clone(),
                        outcome: ScanOutcome::Failed {
                            reason: e.to_string(),
                        },
                    }
                })
            })
            .collect()
    }
}

/// The run with the highest aggregate score.
///
/// Runs without a recovered best epoch are skipped; on ties the earliest
/// run wins. That includes [`ScanOutcome::InsufficientContext`] runs, whose
/// class scores are unusable even when their aggregate score is higher; a
/// warning is logged for each one that would otherwise have won.
#[must_use]
pub fn best_only(runs: &[RunReport]) -> Option<&RunReport> {
    let mut best: Option<(&RunReport, f64)> = None;
    for run in runs {
        if let Some(score) = run.outcome.score() {
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((run, score));
            }
        }
    }

    let best_score = best.map(|(_, score)| score);
    for run in runs {
        if let ScanOutcome::InsufficientContext { score, .. } = run.outcome {
            if best_score.is_none_or(|b| score > b) {
                warn!(
                    "Skipping {} (score {:.2}): best epoch lacks class score lines",
                    run.path.display(),
                    score
                );
            }
        }
    }

    best.map(|(run, _)| run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logscan::EpochRecord;
    use crate::palette::NUM_CLASSES;

    fn write_log(dir: &Path, name: &str, scores: &[&str]) -> PathBuf {
        let mut text = String::new();
        for (epoch, score) in scores.iter().enumerate() {
            for c in 0..NUM_CLASSES {
                text.push_str(&format!(" * class [{}] IoU {}.50\n", c, 40 + c));
            }
            text.push_str(&format!(" * epoch [{}] mIoU {}\n", epoch, score));
        }
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn run(name: &str, outcome: ScanOutcome) -> RunReport {
        RunReport {
            path: PathBuf::from(name),
            outcome,
        }
    }

    fn best(score: f64) -> ScanOutcome {
        ScanOutcome::Best(EpochRecord {
            line: 21,
            score,
            class_scores: vec![0.0; NUM_CLASSES],
        })
    }

    #[test]
    fn test_natural_cmp() {
        let mut names = vec!["run10.log", "run2.log", "run1.log", "Run3.log", "run02a.log"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["Run3.log", "run1.log", "run2.log", "run02a.log", "run10.log"]);

        assert_eq!(natural_cmp("a", "a"), Ordering::Equal);
        assert_eq!(natural_cmp("a", "ab"), Ordering::Less);
        assert_eq!(natural_cmp("x007", "x7"), "x007".cmp("x7"));
    }

    #[test]
    fn test_layout_log_dir() {
        let layout = ExperimentLayout::new("experiments/pascal");
        assert_eq!(
            layout.log_dir(183, Variant::SupOnly),
            PathBuf::from("experiments/pascal/183/suponly/log")
        );
        assert_eq!("ours".parse::<Variant>().unwrap(), Variant::Ours);
        assert!("both".parse::<Variant>().is_err());
    }

    #[test]
    fn test_discover_logs_natural_order_files_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["seed10.txt", "seed2.txt", "seed1.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("seed3")).unwrap();

        let logs = discover_logs(dir.path()).unwrap();
        let names: Vec<String> = logs.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["seed1.txt", "seed2.txt", "seed10.txt"]);
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_logs(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NoLogFiles(_)));
    }

    #[test]
    fn test_scan_runs_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_log(dir.path(), "a.log", &["60.10", "70.20"]),
            write_log(dir.path(), "b.log", &[]),
            write_log(dir.path(), "c.log", &["71.00", "65.00"]),
        ];

        let runs = LogScanner::new().scan_runs(&paths);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].name(), "a.log");
        assert_eq!(runs[0].outcome.score(), Some(70.0 + 20.0 / 100.0));
        assert_eq!(runs[1].outcome, ScanOutcome::NoBestEpoch);
        assert_eq!(runs[2].outcome.best().unwrap().line, NUM_CLASSES);

        let record = runs[0].outcome.best().unwrap();
        assert_eq!(record.class_scores[0], 40.5);
        assert_eq!(record.class_scores[20], 60.5);

        assert_eq!(best_only(&runs).unwrap().name(), "c.log");
    }

    #[test]
    fn test_best_only_first_tie_wins() {
        let runs = vec![
            run("a", ScanOutcome::NoBestEpoch),
            run("b", best(72.5)),
            run("c", best(74.25)),
            run("d", best(74.25)),
        ];
        assert_eq!(best_only(&runs).unwrap().name(), "c");
    }

    #[test]
    fn test_best_only_none_when_nothing_found() {
        let runs = vec![
            run("a", ScanOutcome::NoBestEpoch),
            run(
                "b",
                ScanOutcome::InsufficientContext {
                    line: 3,
                    score: 50.0,
                    available: 3,
                },
            ),
        ];
        assert!(best_only(&runs).is_none());
        assert!(best_only(&[]).is_none());
    }

    #[test]
    fn test_scan_runs_continues_past_bad_logs() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.log");
        fs::write(&bad, " * epoch [0] mIoU pending\n").unwrap();
        let paths = vec![
            write_log(dir.path(), "good.log", &["68.40"]),
            bad,
            dir.path().join("missing.log"),
        ];

        let runs = LogScanner::new().scan_runs(&paths);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].outcome.score(), Some(68.0 + 40.0 / 100.0));
        assert!(matches!(&runs[1].outcome, ScanOutcome::Failed { reason } if reason.contains("line 0")));
        assert!(matches!(runs[2].outcome, ScanOutcome::Failed { .. }));
        assert!(runs[1].outcome.score().is_none());

        assert_eq!(best_only(&runs).unwrap().name(), "good.log");
    }

    #[test]
    fn test_best_only_skips_higher_insufficient_context() {
        let runs = vec![
            run(
                "short",
                ScanOutcome::InsufficientContext {
                    line: 5,
                    score: 90.0,
                    available: 5,
                },
            ),
            run("full", best(71.5)),
        ];
        assert_eq!(best_only(&runs).unwrap().name(), "full");
    }
}
