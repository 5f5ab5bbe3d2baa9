//! Scores derived from raw confusion counts.

use serde::{Deserialize, Serialize};

use crate::confusion::ConfusionMatrix;
use crate::palette::{CLASS_NAMES, NUM_CLASSES};

/// Per-class breakdown of a confusion matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassScore {
    /// Class name.
    pub name: String,
    /// Ground-truth pixels of this class.
    pub support: u64,
    /// Fraction of this class's pixels predicted correctly (row-normalized diagonal).
    pub recall: f64,
    /// Intersection over union, `None` when the class never occurs in
    /// either truth or prediction.
    pub iou: Option<f64>,
}

/// Overall scores for a confusion matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixSummary {
    /// Total counted pixels.
    pub total: u64,
    /// Pixel accuracy (`trace / total`).
    pub accuracy: f64,
    /// `1 - accuracy`.
    pub misclass: f64,
    /// Mean of the defined per-class IoUs.
    pub mean_iou: f64,
    /// One entry per class, in palette order.
    pub classes: Vec<ClassScore>,
}

impl MatrixSummary {
    /// Compute all derived scores.
    #[must_use]
    pub fn compute(matrix: &ConfusionMatrix) -> Self {
        let total = matrix.total();
        let accuracy = if total == 0 {
            0.0
        } else {
            matrix.trace() as f64 / total as f64
        };

        let normalized = matrix.normalized();
        let ious = matrix.class_iou();

        let classes = (0..NUM_CLASSES)
            .map(|i| ClassScore {
                name: CLASS_NAMES[i].to_string(),
                support: matrix.row_sum(i),
                recall: normalized[i][i],
                iou: ious[i],
            })
            .collect();

        Self {
            total,
            accuracy,
            misclass: 1.0 - accuracy,
            mean_iou: matrix.mean_iou(),
            classes,
        }
    }
}

impl ConfusionMatrix {
    /// Row-normalized matrix: each row divided by its sum.
    ///
    /// Rows with no pixels stay all-zero.
    #[must_use]
    pub fn normalized(&self) -> [[f64; NUM_CLASSES]; NUM_CLASSES] {
        let mut out = [[0.0; NUM_CLASSES]; NUM_CLASSES];
        for (i, row) in self.counts().iter().enumerate() {
            let sum = self.row_sum(i);
            if sum == 0 {
                continue;
            }
            for (j, &count) in row.iter().enumerate() {
                out[i][j] = count as f64 / sum as f64;
            }
        }
        out
    }

    /// Per-class intersection over union.
    #[must_use]
    pub fn class_iou(&self) -> [Option<f64>; NUM_CLASSES] {
        let mut out = [None; NUM_CLASSES];
        for (i, iou) in out.iter_mut().enumerate() {
            let tp = self.get(i, i);
            let union = self.row_sum(i) + self.col_sum(i) - tp;
            if union > 0 {
                *iou = Some(tp as f64 / union as f64);
            }
        }
        out
    }

    /// Mean IoU over classes that occur in truth or prediction.
    #[must_use]
    pub fn mean_iou(&self) -> f64 {
        let defined: Vec<f64> = self.class_iou().into_iter().flatten().collect();
        if defined.is_empty() {
            0.0
        } else {
            defined.iter().sum::<f64>() / defined.len() as f64
        }
    }
}
