//! Label statistics over segmentation datasets.
//!
//! [`PixelDistribution`] counts how many pixels of each class a set of
//! label masks contains. It is the usual first look at class imbalance
//! before reading per-class scores.

use std::fs;
use std::path::{Path, PathBuf};

use imgref::ImgRef;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decode::load_label_grid;
use crate::error::Result;
use crate::palette::{NUM_CLASSES, Palette};

/// Per-class pixel counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelDistribution {
    /// Pixels per class, in palette order.
    pub counts: [u64; NUM_CLASSES],
    /// Pixels outside the palette (VOC marks void/boundary with 255).
    pub ignored: u64,
    /// Number of masks counted.
    pub images: usize,
}

impl PixelDistribution {
    /// Empty distribution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one class-index mask.
    pub fn add_grid(&mut self, grid: ImgRef<'_, u8>) {
        for v in grid.pixels() {
            match self.counts.get_mut(v as usize) {
                Some(count) => *count += 1,
                None => self.ignored += 1,
            }
        }
        self.images += 1;
    }

    /// Add another distribution's counts.
    pub fn merge(&mut self, other: &Self) {
        for (count, add) in self.counts.iter_mut().zip(&other.counts) {
            *count += add;
        }
        self.ignored += other.ignored;
        self.images += other.images;
    }

    /// Labeled pixels, excluding ignored ones.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Fraction of labeled pixels per class.
    #[must_use]
    pub fn normalized(&self) -> Vec<f64> {
        normalize(&self.counts)
    }

    /// Fraction per foreground class (classes 1..=20), background excluded.
    #[must_use]
    pub fn normalized_without_background(&self) -> Vec<f64> {
        normalize(&self.counts[1..])
    }

    /// Count every image file in `dir`, in parallel.
    ///
    /// Color labels are matched exactly against `palette`; colors outside it
    /// (the VOC void border) are counted as ignored, not as background.
    pub fn from_dir(dir: &Path, palette: &Palette) -> Result<Self> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        debug!(dir = %dir.display(), files = paths.len(), "counting label pixels");

        paths
            .par_iter()
            .map(|path| -> Result<Self> {
                let grid = load_label_grid(path, palette)?;
                let mut dist = Self::new();
                dist.add_grid(grid.as_ref());
                Ok(dist)
            })
            .try_reduce(Self::new, |mut a, b| {
                a.merge(&b);
                Ok(a)
            })
    }
}

fn normalize(counts: &[u64]) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    counts
        .iter()
        .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{save_class_grid, save_rgb};
    use crate::palette::ClassId;
    use imgref::ImgVec;

    #[test]
    fn test_counts_and_ignored() {
        let mut dist = PixelDistribution::new();
        dist.add_grid(ImgVec::new(vec![0u8, 0, 1, 255, 20, 21], 3, 2).as_ref());

        assert_eq!(dist.counts[0], 2);
        assert_eq!(dist.counts[1], 1);
        assert_eq!(dist.counts[20], 1);
        assert_eq!(dist.ignored, 2);
        assert_eq!(dist.total(), 4);
        assert_eq!(dist.images, 1);
    }

    #[test]
    fn test_normalized() {
        let mut dist = PixelDistribution::new();
        dist.add_grid(ImgVec::new(vec![0u8, 0, 1, 2], 2, 2).as_ref());

        let all = dist.normalized();
        assert_eq!(all.len(), NUM_CLASSES);
        assert!((all[0] - 0.5).abs() < 1e-12);
        assert!((all[1] - 0.25).abs() < 1e-12);

        let fg = dist.normalized_without_background();
        assert_eq!(fg.len(), NUM_CLASSES - 1);
        assert!((fg[0] - 0.5).abs() < 1e-12);
        assert!((fg[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_normalizes_to_zero() {
        let dist = PixelDistribution::new();
        assert!(dist.normalized().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_from_dir_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let masks = [
            ImgVec::new(vec![0u8, 1, 1, 255], 2, 2),
            ImgVec::new(vec![15u8, 15, 15, 0, 0, 3], 3, 2),
        ];

        let mut expected = PixelDistribution::new();
        for (i, mask) in masks.iter().enumerate() {
            save_class_grid(dir.path().join(format!("{i}.png")), mask.as_ref()).unwrap();
            expected.add_grid(mask.as_ref());
        }

        let dist = PixelDistribution::from_dir(dir.path(), &Palette::pascal_voc()).unwrap();
        assert_eq!(dist, expected);
    }

    #[test]
    fn test_from_dir_counts_void_color_as_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let palette = Palette::pascal_voc();
        let void = rgb::RGB8::new(224, 224, 192);
        let label = vec![
            void,
            void,
            palette.encode(ClassId::new(15).unwrap()),
            palette.encode(ClassId::BACKGROUND),
        ];
        save_rgb(dir.path().join("2007_000033.png"), ImgVec::new(label, 2, 2).as_ref()).unwrap();

        let dist = PixelDistribution::from_dir(dir.path(), &palette).unwrap();
        assert_eq!(dist.counts[0], 1);
        assert_eq!(dist.counts[15], 1);
        assert_eq!(dist.ignored, 2);
        assert_eq!(dist.images, 1);
    }
}
