//! Evaluation session with a pluggable prediction source.
//!
//! This module provides [`EvalSession`], the main entry point for
//! evaluating a segmentation model. Inference lives outside this crate: a
//! [`Predictor`] hands back a class-index mask per sample, and the session
//! decodes the ground truth, counts the pair, and builds the report.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::confusion::ConfusionAccumulator;
use crate::decode::{load_class_grid, load_rgb};
use crate::error::Result;
use crate::eval::report::EvalReport;
use crate::palette::{ClassGrid, Palette};

/// One evaluation sample: an input image and its color-coded label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Sample id, e.g. `2007_000033`.
    pub name: String,
    /// Input image path.
    pub image: PathBuf,
    /// Ground-truth label path.
    pub label: PathBuf,
}

impl Sample {
    /// Create a sample.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<PathBuf>, label: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            label: label.into(),
        }
    }
}

/// Map a PASCAL VOC split list to samples.
///
/// Each non-empty line is a sample id `id`, resolved to
/// `{data_root}/JPEGImages/{id}.jpg` and
/// `{data_root}/SegmentationClass/{id}.png`.
#[must_use]
pub fn parse_voc_list(data_root: &Path, list: &str) -> Vec<Sample> {
    list.lines()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            Sample::new(
                id,
                data_root.join("JPEGImages").join(format!("{}.jpg", id)),
                data_root.join("SegmentationClass").join(format!("{}.png", id)),
            )
        })
        .collect()
}

/// Read a split list file and map it with [`parse_voc_list`].
pub fn load_voc_list(data_root: &Path, list_path: &Path) -> Result<Vec<Sample>> {
    let list = std::fs::read_to_string(list_path)?;
    Ok(parse_voc_list(data_root, &list))
}

/// Source of predicted class masks.
///
/// Implementations must return masks at ground-truth resolution; resizing
/// model output is their job.
pub trait Predictor: Sync {
    /// Predict the class mask for `sample`.
    fn predict(&self, sample: &Sample) -> Result<ClassGrid>;
}

impl<F> Predictor for F
where
    F: Fn(&Sample) -> Result<ClassGrid> + Sync,
{
    fn predict(&self, sample: &Sample) -> Result<ClassGrid> {
        self(sample)
    }
}

/// How precomputed prediction masks are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskFormat {
    /// Grayscale images whose values are class indices.
    #[default]
    Index,
    /// Palette-colored images, decoded like ground truth.
    Color,
}

/// Reads precomputed masks from `{dir}/{sample}.png`.
#[derive(Debug, Clone)]
pub struct MaskDirPredictor {
    dir: PathBuf,
    format: MaskFormat,
    palette: Palette,
}

impl MaskDirPredictor {
    /// Predictor over a mask directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, format: MaskFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            palette: Palette::default(),
        }
    }

    /// Path of the mask for `sample`.
    #[must_use]
    pub fn mask_path(&self, sample: &Sample) -> PathBuf {
        self.dir.join(format!("{}.png", sample.name))
    }
}

impl Predictor for MaskDirPredictor {
    fn predict(&self, sample: &Sample) -> Result<ClassGrid> {
        let path = self.mask_path(sample);
        match self.format {
            MaskFormat::Index => load_class_grid(&path, &self.palette),
            MaskFormat::Color => {
                let rgb = load_rgb(&path)?;
                Ok(self.palette.decode_grid(rgb.as_ref()))
            }
        }
    }
}

/// Configuration for an evaluation session.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Report name, used as the output file stem.
    pub name: String,

    /// Directory for report output (CSV, JSON).
    pub report_dir: PathBuf,

    /// Palette used to decode ground truth.
    pub palette: Palette,

    /// Evaluate samples on the rayon thread pool.
    pub parallel: bool,
}

impl EvalConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> EvalConfigBuilder {
        EvalConfigBuilder::default()
    }
}

/// Builder for [`EvalConfig`].
#[derive(Debug, Default)]
pub struct EvalConfigBuilder {
    name: Option<String>,
    report_dir: Option<PathBuf>,
    palette: Option<Palette>,
    parallel: Option<bool>,
}

impl EvalConfigBuilder {
    /// Set the report name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the report output directory.
    #[must_use]
    pub fn report_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(path.into());
        self
    }

    /// Set the ground-truth palette.
    #[must_use]
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Enable or disable parallel evaluation.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> EvalConfig {
        EvalConfig {
            name: self.name.unwrap_or_else(|| "eval_cm".to_string()),
            report_dir: self.report_dir.unwrap_or_else(|| PathBuf::from(".")),
            palette: self.palette.unwrap_or_default(),
            parallel: self.parallel.unwrap_or(true),
        }
    }
}

/// Evaluation session.
///
/// # Example
///
/// ```rust,ignore
/// use seg_eval::{EvalConfig, EvalSession, MaskDirPredictor, MaskFormat};
///
/// let config = EvalConfig::builder()
///     .name("pascal_1464_cm")
///     .report_dir("./reports")
///     .build();
///
/// let session = EvalSession::new(config, MaskDirPredictor::new("masks", MaskFormat::Index));
/// let report = session.evaluate(&samples)?;
/// session.write_report(&report)?;
/// ```
pub struct EvalSession {
    config: EvalConfig,
    predictor: Box<dyn Predictor>,
}

impl EvalSession {
    /// Create a new evaluation session.
    #[must_use]
    pub fn new(config: EvalConfig, predictor: impl Predictor + 'static) -> Self {
        Self {
            config,
            predictor: Box::new(predictor),
        }
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Count one sample into `acc`.
    fn accumulate(&self, acc: &mut ConfusionAccumulator, sample: &Sample) -> Result<()> {
        let truth = load_rgb(&sample.label)?;
        let pred = self.predictor.predict(sample)?;

        acc.update_rgb(pred.as_ref(), truth.as_ref(), &self.config.palette)
            .inspect_err(|e| warn!(sample = %sample.name, "{}", e))?;

        debug!(sample = %sample.name, width = truth.width(), height = truth.height(), "counted");
        Ok(())
    }

    /// Evaluate all samples into one report.
    ///
    /// In parallel mode every rayon job counts into its own accumulator and
    /// the partials are summed, which gives the same matrix as a sequential
    /// pass.
    pub fn evaluate(&self, samples: &[Sample]) -> Result<EvalReport> {
        info!(samples = samples.len(), parallel = self.config.parallel, "evaluating");

        let acc = if self.config.parallel {
            samples
                .par_iter()
                .try_fold(ConfusionAccumulator::new, |mut acc, sample| -> Result<_> {
                    self.accumulate(&mut acc, sample)?;
                    Ok(acc)
                })
                .try_reduce(ConfusionAccumulator::new, |mut a, b| {
                    a.merge(&b);
                    Ok(a)
                })?
        } else {
            let mut acc = ConfusionAccumulator::new();
            for sample in samples {
                self.accumulate(&mut acc, sample)?;
            }
            acc
        };

        let report = EvalReport::new(self.config.name.clone(), samples.len(), acc.into_matrix());
        info!(
            pixels = report.pixels,
            accuracy = report.summary.accuracy,
            mean_iou = report.summary.mean_iou,
            "evaluation done"
        );
        Ok(report)
    }

    /// Write a report to the configured report directory.
    pub fn write_report(&self, report: &EvalReport) -> Result<PathBuf> {
        let path = report.write(&self.config.report_dir)?;
        info!("Write confusion matrix at {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{save_class_grid, save_rgb};
    use crate::error::Error;
    use crate::palette::ClassId;
    use imgref::ImgVec;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        samples: Vec<Sample>,
    }

    /// Two samples: a 4x4 all-background image and a 3x2 image with people
    /// and one void pixel.
    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let palette = Palette::pascal_voc();
        let bg = palette.encode(ClassId::BACKGROUND);
        let person = palette.encode(ClassId::new(15).unwrap());
        let void = rgb::RGB8::new(224, 224, 192);

        std::fs::create_dir_all(root.join("SegmentationClass")).unwrap();
        std::fs::create_dir_all(root.join("pred")).unwrap();

        save_rgb(
            root.join("SegmentationClass/a.png"),
            ImgVec::new(vec![bg; 16], 4, 4).as_ref(),
        )
        .unwrap();
        save_class_grid(root.join("pred/a.png"), ImgVec::new(vec![0u8; 16], 4, 4).as_ref()).unwrap();

        save_rgb(
            root.join("SegmentationClass/b.png"),
            ImgVec::new(vec![person, person, bg, void, person, bg], 3, 2).as_ref(),
        )
        .unwrap();
        save_class_grid(
            root.join("pred/b.png"),
            ImgVec::new(vec![15u8, 0, 0, 0, 15, 15], 3, 2).as_ref(),
        )
        .unwrap();

        let samples = parse_voc_list(&root, "a\n\nb\n");
        Fixture {
            _dir: dir,
            root,
            samples,
        }
    }

    #[test]
    fn test_parse_voc_list() {
        let samples = parse_voc_list(Path::new("data/VOC2012"), "2007_000033\n  2007_000042 \n\n");
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].name, "2007_000042");
        assert_eq!(samples[0].image, PathBuf::from("data/VOC2012/JPEGImages/2007_000033.jpg"));
        assert_eq!(
            samples[0].label,
            PathBuf::from("data/VOC2012/SegmentationClass/2007_000033.png")
        );
    }

    #[test]
    fn test_eval_config_builder() {
        let config = EvalConfig::builder()
            .name("pascal_92_cm")
            .report_dir("/tmp/reports")
            .parallel(false)
            .build();

        assert_eq!(config.name, "pascal_92_cm");
        assert_eq!(config.report_dir, PathBuf::from("/tmp/reports"));
        assert!(!config.parallel);
        assert!(EvalConfig::builder().build().parallel);
    }

    #[test]
    fn test_evaluate_mask_dir() {
        let fx = fixture();
        let config = EvalConfig::builder().parallel(false).build();
        let session = EvalSession::new(config, MaskDirPredictor::new(fx.root.join("pred"), MaskFormat::Index));

        let report = session.evaluate(&fx.samples).unwrap();
        let m = &report.matrix;

        // a: 16 background pixels. b: person->15 x2, person->0, bg->0,
        // void (decoded as bg)->0, bg->15
        assert_eq!(report.samples, 2);
        assert_eq!(report.pixels, 22);
        assert_eq!(m.get(0, 0), 16 + 2);
        assert_eq!(m.get(0, 15), 1);
        assert_eq!(m.get(15, 15), 2);
        assert_eq!(m.get(15, 0), 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let fx = fixture();
        let predictor = MaskDirPredictor::new(fx.root.join("pred"), MaskFormat::Index);

        let seq = EvalSession::new(EvalConfig::builder().parallel(false).build(), predictor.clone());
        let par = EvalSession::new(EvalConfig::builder().parallel(true).build(), predictor);

        let a = seq.evaluate(&fx.samples).unwrap();
        let b = par.evaluate(&fx.samples).unwrap();
        assert_eq!(a.matrix, b.matrix);
    }

    #[test]
    fn test_color_masks() {
        let fx = fixture();
        let palette = Palette::pascal_voc();
        let color_dir = fx.root.join("color");
        std::fs::create_dir_all(&color_dir).unwrap();
        // Colorized prediction identical to the ground truth of `a`
        let (colored, _) = palette.colorize(ImgVec::new(vec![0u8; 16], 4, 4).as_ref());
        save_rgb(color_dir.join("a.png"), colored.as_ref()).unwrap();

        let session = EvalSession::new(
            EvalConfig::builder().build(),
            MaskDirPredictor::new(&color_dir, MaskFormat::Color),
        );
        let report = session.evaluate(&fx.samples[..1]).unwrap();
        assert_eq!(report.matrix.get(0, 0), 16);
        assert_eq!(report.pixels, 16);
    }

    #[test]
    fn test_shape_mismatch_aborts() {
        let fx = fixture();
        let predictor = |_: &Sample| -> Result<ClassGrid> { Ok(ImgVec::new(vec![0u8; 4], 2, 2)) };
        let session = EvalSession::new(EvalConfig::builder().parallel(false).build(), predictor);

        let err = session.evaluate(&fx.samples).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: (4, 4), actual: (2, 2) }));
    }

    #[test]
    fn test_write_report() {
        let fx = fixture();
        let out = fx.root.join("reports");
        let config = EvalConfig::builder()
            .name("pascal_2_cm")
            .report_dir(&out)
            .build();
        let session = EvalSession::new(config, MaskDirPredictor::new(fx.root.join("pred"), MaskFormat::Index));

        let report = session.evaluate(&fx.samples).unwrap();
        let path = session.write_report(&report).unwrap();
        assert_eq!(path, out.join("pascal_2_cm.csv"));
        assert_eq!(crate::confusion::persist::read(&path).unwrap(), report.matrix);
    }
}
