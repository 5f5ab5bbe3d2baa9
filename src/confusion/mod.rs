//! Confusion matrix accumulation.
//!
//! - [`ConfusionMatrix`]: 21×21 count table, rows = true class, columns =
//!   predicted class
//! - [`ConfusionAccumulator`]: consumes (prediction, ground truth) grid pairs
//! - [`persist`]: CSV/JSON artifacts named `{dataset}_{n_sup}_cm`
//! - [`summary`]: accuracy, per-class recall and IoU derived from the counts
//!
//! Counting is additive and order-independent, so partial matrices built
//! by parallel workers combine with `+`.

pub mod persist;
pub mod summary;

use std::ops::{Add, AddAssign};

use imgref::ImgRef;
use rgb::RGB8;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::palette::{NUM_CLASSES, Palette};

pub use summary::MatrixSummary;

/// 21×21 table of pixel counts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[u64; NUM_CLASSES]; NUM_CLASSES],
}

impl ConfusionMatrix {
    /// An all-zero matrix.
    #[must_use]
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Build from raw rows (row = true class).
    #[must_use]
    pub fn from_counts(counts: [[u64; NUM_CLASSES]; NUM_CLASSES]) -> Self {
        Self { counts }
    }

    /// Raw rows.
    #[must_use]
    pub fn counts(&self) -> &[[u64; NUM_CLASSES]; NUM_CLASSES] {
        &self.counts
    }

    /// Count of pixels with true class `truth` predicted as `pred`.
    #[must_use]
    pub fn get(&self, truth: usize, pred: usize) -> u64 {
        self.counts[truth][pred]
    }

    /// Total number of counted pixels.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Sum of the diagonal (correctly classified pixels).
    #[must_use]
    pub fn trace(&self) -> u64 {
        (0..NUM_CLASSES).map(|i| self.counts[i][i]).sum()
    }

    /// Pixels whose true class is `class`.
    #[must_use]
    pub fn row_sum(&self, class: usize) -> u64 {
        self.counts[class].iter().sum()
    }

    /// Pixels predicted as `class`.
    #[must_use]
    pub fn col_sum(&self, class: usize) -> u64 {
        self.counts.iter().map(|row| row[class]).sum()
    }

    #[inline]
    fn increment(&mut self, truth: u8, pred: u8) {
        self.counts[truth as usize][pred as usize] += 1;
    }
}

impl AddAssign<&ConfusionMatrix> for ConfusionMatrix {
    fn add_assign(&mut self, rhs: &ConfusionMatrix) {
        for (row, other) in self.counts.iter_mut().zip(&rhs.counts) {
            for (count, add) in row.iter_mut().zip(other) {
                *count += add;
            }
        }
    }
}

impl Add for ConfusionMatrix {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += &rhs;
        self
    }
}

/// Accumulates prediction/ground-truth pairs into a [`ConfusionMatrix`].
///
/// # Example
///
/// ```
/// use imgref::ImgVec;
/// use seg_eval::ConfusionAccumulator;
///
/// let truth = ImgVec::new(vec![0u8, 1, 1, 2], 2, 2);
/// let pred = ImgVec::new(vec![0u8, 1, 2, 2], 2, 2);
///
/// let mut acc = ConfusionAccumulator::new();
/// acc.update(pred.as_ref(), truth.as_ref())?;
///
/// assert_eq!(acc.result().get(1, 2), 1);
/// assert_eq!(acc.result().total(), 4);
/// # Ok::<(), seg_eval::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfusionAccumulator {
    matrix: ConfusionMatrix,
}

impl ConfusionAccumulator {
    /// Start from an all-zero matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one pair of class grids.
    ///
    /// Both grids must have the same shape and hold only values below
    /// [`NUM_CLASSES`]. On error the matrix is left untouched.
    pub fn update(&mut self, pred: ImgRef<'_, u8>, truth: ImgRef<'_, u8>) -> Result<()> {
        let expected = (truth.width(), truth.height());
        let actual = (pred.width(), pred.height());
        if expected != actual {
            return Err(Error::ShapeMismatch { expected, actual });
        }

        if let Some(value) = truth
            .pixels()
            .chain(pred.pixels())
            .find(|&v| v as usize >= NUM_CLASSES)
        {
            return Err(Error::ClassOutOfRange { value });
        }

        for (t, p) in truth.pixels().zip(pred.pixels()) {
            self.matrix.increment(t, p);
        }
        Ok(())
    }

    /// Decode an RGB ground-truth image through `palette`, then count it.
    pub fn update_rgb(
        &mut self,
        pred: ImgRef<'_, u8>,
        truth: ImgRef<'_, RGB8>,
        palette: &Palette,
    ) -> Result<()> {
        let expected = (truth.width(), truth.height());
        let actual = (pred.width(), pred.height());
        if expected != actual {
            return Err(Error::ShapeMismatch { expected, actual });
        }
        let truth = palette.decode_grid(truth);
        self.update(pred, truth.as_ref())
    }

    /// Add another accumulator's counts into this one.
    pub fn merge(&mut self, other: &ConfusionAccumulator) {
        self.matrix += &other.matrix;
    }

    /// Current matrix.
    #[must_use]
    pub fn result(&self) -> &ConfusionMatrix {
        &self.matrix
    }

    /// Consume the accumulator, returning its matrix.
    #[must_use]
    pub fn into_matrix(self) -> ConfusionMatrix {
        self.matrix
    }
}

impl From<ConfusionMatrix> for ConfusionAccumulator {
    fn from(matrix: ConfusionMatrix) -> Self {
        Self { matrix }
    }
}
