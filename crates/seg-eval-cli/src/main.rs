//! seg-eval CLI - segmentation evaluation and training-log tool

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use seg_eval::MaskFormat;
use seg_eval::logscan::runs::Variant;
use tracing_subscriber::EnvFilter;

mod commands;

/// Segmentation evaluation and training-log scanning tool.
#[derive(Parser)]
#[command(name = "seg-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Encoding of precomputed prediction masks.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MaskArg {
    /// Grayscale, pixel value = class index
    Index,
    /// Palette colors
    Color,
}

impl From<MaskArg> for MaskFormat {
    fn from(arg: MaskArg) -> Self {
        match arg {
            MaskArg::Index => MaskFormat::Index,
            MaskArg::Color => MaskFormat::Color,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build a confusion matrix from predicted masks and ground truth
    Evaluate {
        /// Experiment YAML config (names the matrix, supplies the val split)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dataset root containing SegmentationClass/
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Split list, one sample id per line
        #[arg(long)]
        list: Option<PathBuf>,

        /// Directory of predicted masks named {id}.png
        #[arg(short, long)]
        predictions: PathBuf,

        /// How prediction masks are encoded
        #[arg(long, value_enum, default_value = "index")]
        mask_format: MaskArg,

        /// Report name (defaults to {type}_{n_sup}_cm from the config)
        #[arg(long)]
        name: Option<String>,

        /// Output directory for the matrix and report
        #[arg(short, long, default_value = "confusion_matrix")]
        output: PathBuf,

        /// Evaluate samples one at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Find the best validation epoch in training logs
    Logs {
        /// Experiment root ({root}/{split}/{variant}/log/)
        #[arg(short, long)]
        root: PathBuf,

        /// Labeled split sizes to scan
        #[arg(short, long, required = true)]
        split: Vec<usize>,

        /// Training variants to scan (ours, suponly)
        #[arg(long, default_value = "ours")]
        variant: Vec<Variant>,

        /// Keep only the best run per split and variant
        #[arg(long)]
        best_only: bool,

        /// Write results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show accuracy, recall, and IoU for a saved confusion matrix
    Matrix {
        /// Matrix file (CSV or JSON)
        path: PathBuf,

        /// Print the row-normalized matrix
        #[arg(long)]
        normalized: bool,
    },

    /// Count label pixels per class over a directory of masks
    Pixels {
        /// Directory of label masks
        path: PathBuf,

        /// Write the distribution as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Paint a class-index mask with the palette
    Colorize {
        /// Grayscale class-index mask
        input: PathBuf,

        /// Output image
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "seg_eval=debug,info" } else { "seg_eval=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Evaluate {
            config,
            data_root,
            list,
            predictions,
            mask_format,
            name,
            output,
            sequential,
        } => commands::evaluate::run(commands::evaluate::Args {
            config,
            data_root,
            list,
            predictions,
            mask_format: mask_format.into(),
            name,
            output,
            sequential,
        }),
        Commands::Logs { root, split, variant, best_only, output } => {
            commands::logs::run(root, &split, &variant, best_only, output)
        }
        Commands::Matrix { path, normalized } => commands::matrix::run(path, normalized),
        Commands::Pixels { path, output } => commands::pixels::run(path, output),
        Commands::Colorize { input, output } => commands::colorize::run(input, output),
    }
}
