//! # seg-eval
//!
//! Semantic-segmentation evaluation and training-log scanning.
//!
//! The library decodes color-coded ground-truth labels, accumulates a
//! 21-class confusion matrix against predicted class masks, and recovers
//! the best validation epoch (with its per-class scores) from training logs.
//! Inference itself stays outside: predictions come in through the
//! [`Predictor`] trait.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use seg_eval::{EvalConfig, EvalSession, MaskDirPredictor, MaskFormat};
//! use seg_eval::eval::session::load_voc_list;
//!
//! let samples = load_voc_list("data/VOC2012".as_ref(), "val.txt".as_ref())?;
//! let config = EvalConfig::builder()
//!     .name("pascal_1464_cm")
//!     .report_dir("./reports")
//!     .build();
//!
//! let session = EvalSession::new(config, MaskDirPredictor::new("pred", MaskFormat::Index));
//! let report = session.evaluate(&samples)?;
//! session.write_report(&report)?;
//! ```
//!
//! ## Modules
//!
//! - [`palette`]: Class palette and color/index codec
//! - [`confusion`]: Confusion matrix accumulation, persistence, and summaries
//! - [`logscan`]: Best-epoch recovery from training logs
//! - [`eval`]: Evaluation session and report generation
//! - [`stats`]: Pixel class distribution over label masks
//! - [`decode`]: Image loading and saving
//! - [`config`]: Experiment YAML configuration
//! - [`error`]: Error types for the library

pub mod config;
pub mod confusion;
pub mod decode;
pub mod error;
pub mod eval;
pub mod logscan;
pub mod palette;
pub mod stats;

// Re-export commonly used types
pub use config::ExperimentConfig;
pub use confusion::{ConfusionAccumulator, ConfusionMatrix, MatrixSummary};
pub use error::{Error, Result};
pub use eval::{
    report::EvalReport,
    session::{EvalConfig, EvalSession, MaskDirPredictor, MaskFormat, Predictor, Sample},
};
pub use logscan::{EpochRecord, LogScanner, PositionalScore, ScanOutcome, ScoreFormat};
pub use palette::{CLASS_NAMES, ClassGrid, ClassId, NUM_CLASSES, Palette};
pub use stats::PixelDistribution;
