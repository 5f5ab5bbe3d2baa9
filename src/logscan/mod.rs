//! Training-log scanning.
//!
//! Training runs write one validation summary per epoch. The summary line
//! contains the tag `* epoch` and the aggregate score (mean IoU), and the
//! 21 lines right before it hold the per-class scores:
//!
//! ```text
//!  * class [0] IoU 92.41
//!  * class [1] IoU 81.07
//!  ...
//!  * class [20] IoU 70.12
//!  * epoch [3] mIoU 78.64
//! ```
//!
//! [`LogScanner::scan`] finds the best epoch in one log. Scores are read by a
//! [`ScoreFormat`]; the default [`PositionalScore`] takes the two characters
//! on either side of the first `.`, so `mIoU 78.64` reads as `78.64`, and
//! `78.6` reads as `78.06`. Keep that in mind before "fixing" it: existing
//! reports were produced with exactly this derivation.
//!
//! See [`runs`] for log discovery and best-of-many-runs selection.

pub mod runs;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::palette::NUM_CLASSES;

/// Tag identifying an epoch summary line.
pub const EPOCH_MARKER: &str = "* epoch";

/// Reads a score out of a single log line.
pub trait ScoreFormat {
    /// Extract the score, or `None` when the line doesn't carry one.
    fn extract(&self, line: &str) -> Option<f64>;
}

/// Fixed-offset score extraction around the first period.
///
/// Splits the line on `.`, takes the last two characters before the first
/// period as the integer part and the first two characters after it as
/// hundredths. Each piece is whitespace-trimmed before parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalScore;

impl ScoreFormat for PositionalScore {
    fn extract(&self, line: &str) -> Option<f64> {
        let mut parts = line.split('.');
        let before = parts.next()?;
        let after = parts.next()?;

        let whole: f64 = last_two(before).trim().parse().ok()?;
        let hundredths: f64 = first_two(after).trim().parse().ok()?;
        Some(whole + hundredths / 100.0)
    }
}

fn last_two(s: &str) -> &str {
    s.char_indices().rev().nth(1).map_or(s, |(i, _)| &s[i..])
}

fn first_two(s: &str) -> &str {
    s.char_indices().nth(2).map_or(s, |(i, _)| &s[..i])
}

/// The best validation epoch of one log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Zero-based index of the marker line.
    pub line: usize,
    /// Aggregate score from the marker line.
    pub score: f64,
    /// Per-class scores, in log order (class 0 first).
    pub class_scores: Vec<f64>,
}

/// Result of scanning one log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// A best epoch with a full set of class scores.
    Best(EpochRecord),
    /// No marker line reached the starting score (e.g. no markers at all).
    NoBestEpoch,
    /// The best marker has fewer preceding lines than there are classes.
    InsufficientContext {
        /// Zero-based index of the marker line.
        line: usize,
        /// Aggregate score of that marker.
        score: f64,
        /// Lines available before the marker.
        available: usize,
    },
    /// The log could not be read or holds an unparsable score line.
    ///
    /// Only batch scanning reports this; a single [`LogScanner::scan`]
    /// returns the error instead.
    Failed {
        /// The error, rendered.
        reason: String,
    },
}

impl ScanOutcome {
    /// The record, when a best epoch was fully recovered.
    #[must_use]
    pub fn best(&self) -> Option<&EpochRecord> {
        match self {
            Self::Best(record) => Some(record),
            _ => None,
        }
    }

    /// Aggregate score of the best epoch, when fully recovered.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.best().map(|r| r.score)
    }
}

/// Finds the best epoch in a training log.
#[derive(Debug, Clone)]
pub struct LogScanner<F = PositionalScore> {
    marker: String,
    context_lines: usize,
    format: F,
}

impl Default for LogScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl LogScanner {
    /// Scanner for the standard log layout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_format(PositionalScore)
    }
}

impl<F: ScoreFormat> LogScanner<F> {
    /// Scanner with a custom score format.
    #[must_use]
    pub fn with_format(format: F) -> Self {
        Self {
            marker: EPOCH_MARKER.to_string(),
            context_lines: NUM_CLASSES,
            format,
        }
    }

    /// Override the marker tag.
    #[must_use]
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Whether `line` is an epoch summary line.
    #[must_use]
    pub fn is_marker(&self, line: &str) -> bool {
        line.contains(&self.marker)
    }

    fn score_at(&self, index: usize, line: &str) -> Result<f64> {
        self.format.extract(line).ok_or_else(|| Error::ScoreParse {
            line: index,
            text: line.to_string(),
        })
    }

    /// Scan log text split into lines.
    pub fn scan_text(&self, text: &str) -> Result<ScanOutcome> {
        let lines: Vec<&str> = text.lines().collect();
        self.scan(&lines)
    }

    /// Scan a log and return its best epoch.
    ///
    /// The best score starts at 0 and is replaced only by a strictly higher
    /// marker score, so the first epoch to reach the maximum wins. Its class
    /// scores are the lines immediately preceding it.
    pub fn scan<S: AsRef<str>>(&self, lines: &[S]) -> Result<ScanOutcome> {
        let mut markers = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if self.is_marker(line) {
                markers.push((i, self.score_at(i, line)?));
            }
        }

        let best = markers
            .iter()
            .fold(0.0_f64, |best, &(_, score)| if score > best { score } else { best });

        let Some(&(line, score)) = markers.iter().find(|&&(_, s)| s == best) else {
            debug!(markers = markers.len(), "no best epoch");
            return Ok(ScanOutcome::NoBestEpoch);
        };

        if line < self.context_lines {
            debug!(line, score, "not enough lines before best epoch");
            return Ok(ScanOutcome::InsufficientContext {
                line,
                score,
                available: line,
            });
        }

        let start = line - self.context_lines;
        let class_scores = lines[start..line]
            .iter()
            .enumerate()
            .map(|(k, l)| self.score_at(start + k, l.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        debug!(line, score, "best epoch");
        Ok(ScanOutcome::Best(EpochRecord {
            line,
            score,
            class_scores,
        }))
    }
}
