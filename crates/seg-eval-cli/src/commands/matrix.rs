//! Saved confusion matrix summary command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use seg_eval::confusion::persist;
use seg_eval::{CLASS_NAMES, MatrixSummary};

pub fn run(path: PathBuf, normalized: bool) -> Result<()> {
    let matrix = persist::read(&path)
        .with_context(|| format!("Failed to read confusion matrix {}", path.display()))?;
    let summary = MatrixSummary::compute(&matrix);

    println!("Pixels:     {}", summary.total);
    println!("Accuracy:   {:.4}", summary.accuracy);
    println!("Misclass:   {:.4}", summary.misclass);
    println!("Mean IoU:   {:.4}", summary.mean_iou);
    println!();

    println!("{:<16} {:>12} {:>8} {:>8}", "Class", "Support", "Recall", "IoU");
    println!("{:-<48}", "");
    for class in &summary.classes {
        let iou = class
            .iou
            .map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));
        println!(
            "{:<16} {:>12} {:>8.4} {:>8}",
            class.name, class.support, class.recall, iou
        );
    }

    if normalized {
        println!();
        let rows = matrix.normalized();
        for (name, row) in CLASS_NAMES.iter().zip(rows.iter()) {
            let cells: Vec<String> = row.iter().map(|v| format!("{:.2}", v)).collect();
            println!("{:<16} {}", name, cells.join(" "));
        }
    }

    Ok(())
}
