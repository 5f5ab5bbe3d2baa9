//! Confusion matrix evaluation command.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use seg_eval::eval::session::load_voc_list;
use seg_eval::{EvalConfig, EvalSession, ExperimentConfig, MaskDirPredictor, MaskFormat};
use tracing::info;

pub struct Args {
    pub config: Option<PathBuf>,
    pub data_root: Option<PathBuf>,
    pub list: Option<PathBuf>,
    pub predictions: PathBuf,
    pub mask_format: MaskFormat,
    pub name: Option<String>,
    pub output: PathBuf,
    pub sequential: bool,
}

pub fn run(args: Args) -> Result<()> {
    let experiment = args
        .config
        .as_ref()
        .map(|path| {
            ExperimentConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        })
        .transpose()?;

    let val = experiment.as_ref().and_then(|c| c.val_split());
    let Some(data_root) = args
        .data_root
        .or_else(|| val.and_then(|v| v.data_root.clone()))
    else {
        bail!("No dataset root: pass --data-root or set dataset.val.data_root");
    };
    let Some(list) = args.list.or_else(|| val.and_then(|v| v.data_list.clone())) else {
        bail!("No split list: pass --list or set dataset.val.data_list");
    };

    let name = args
        .name
        .or_else(|| experiment.as_ref().map(ExperimentConfig::cm_stem))
        .unwrap_or_else(|| "eval_cm".to_string());

    let samples = load_voc_list(&data_root, &list)
        .with_context(|| format!("Failed to read split list {}", list.display()))?;
    if samples.is_empty() {
        bail!("Split list {} is empty", list.display());
    }
    info!("Evaluating {} samples from {}", samples.len(), list.display());

    let config = EvalConfig::builder()
        .name(name)
        .report_dir(&args.output)
        .parallel(!args.sequential)
        .build();
    let session = EvalSession::new(
        config,
        MaskDirPredictor::new(&args.predictions, args.mask_format),
    );

    let report = session.evaluate(&samples).context("Evaluation failed")?;
    let path = session
        .write_report(&report)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    println!("Samples:    {}", report.samples);
    println!("Pixels:     {}", report.pixels);
    println!("Accuracy:   {:.4}", report.summary.accuracy);
    println!("Mean IoU:   {:.4}", report.summary.mean_iou);
    println!("Saved to:   {}", path.display());

    Ok(())
}
