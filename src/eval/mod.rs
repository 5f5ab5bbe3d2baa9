//! Evaluation session and report generation.
//!
//! - [`session::EvalSession`]: Runs a [`session::Predictor`] over samples and
//!   accumulates the confusion matrix
//! - [`session::EvalConfig`]: Configuration for evaluation
//! - [`report`]: The finished report and its on-disk artifacts

pub mod report;
pub mod session;

pub use report::EvalReport;
pub use session::{EvalConfig, EvalSession, MaskDirPredictor, MaskFormat, Predictor, Sample};
