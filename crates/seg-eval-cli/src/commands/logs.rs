//! Best-epoch log analysis command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use seg_eval::logscan::runs::{ExperimentLayout, RunReport, Variant, best_only, discover_logs};
use seg_eval::{LogScanner, ScanOutcome};
use serde::Serialize;
use tracing::warn;

/// Scan results for one split/variant directory.
#[derive(Serialize)]
struct GroupReport {
    split: usize,
    variant: Variant,
    runs: Vec<RunReport>,
}

pub fn run(
    root: PathBuf,
    splits: &[usize],
    variants: &[Variant],
    keep_best: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let layout = ExperimentLayout::new(root);
    let scanner = LogScanner::new();
    let mut groups = Vec::new();

    for &split in splits {
        for &variant in variants {
            let dir = layout.log_dir(split, variant);
            let paths = discover_logs(&dir)
                .with_context(|| format!("Failed to list logs in {}", dir.display()))?;
            let runs = scanner.scan_runs(&paths);

            let runs = if keep_best {
                match best_only(&runs) {
                    Some(best) => vec![best.clone()],
                    None => {
                        warn!("No run in {} has a best epoch", dir.display());
                        Vec::new()
                    }
                }
            } else {
                runs
            };

            print_group(split, variant, &runs);
            groups.push(GroupReport { split, variant, runs });
        }
    }

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&groups)?;
        std::fs::write(&output_path, json)
            .with_context(|| format!("Failed to write to {}", output_path.display()))?;
        println!("Saved to: {}", output_path.display());
    }

    Ok(())
}

fn print_group(split: usize, variant: Variant, runs: &[RunReport]) {
    println!("{} / {}", split, variant);
    println!("{:-<60}", "");

    for run in runs {
        match &run.outcome {
            ScanOutcome::Best(record) => {
                println!("{:<40} {:>8.2}  (line {})", run.name(), record.score, record.line + 1);
                let scores: Vec<String> = record
                    .class_scores
                    .iter()
                    .map(|s| format!("{:.2}", s))
                    .collect();
                println!("  {}", scores.join(" "));
            }
            ScanOutcome::NoBestEpoch => {
                println!("{:<40} {:>8}", run.name(), "-");
            }
            ScanOutcome::InsufficientContext { score, available, .. } => {
                println!(
                    "{:<40} {:>8.2}  (only {} lines before best epoch)",
                    run.name(),
                    score,
                    available
                );
            }
            ScanOutcome::Failed { reason } => {
                println!("{:<40} {:>8}  ({})", run.name(), "failed", reason);
            }
        }
    }
    println!();
}
