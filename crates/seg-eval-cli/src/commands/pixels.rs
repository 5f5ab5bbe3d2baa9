//! Label pixel distribution command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use seg_eval::{CLASS_NAMES, Palette, PixelDistribution};

pub fn run(path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let dist = PixelDistribution::from_dir(&path, &Palette::pascal_voc())
        .with_context(|| format!("Failed to count pixels in {}", path.display()))?;

    println!("Masks:      {}", dist.images);
    println!("Labeled:    {}", dist.total());
    println!("Ignored:    {}", dist.ignored);
    println!();

    let all = dist.normalized();
    let foreground = dist.normalized_without_background();

    println!("{:<16} {:>14} {:>8} {:>8}", "Class", "Pixels", "Share", "FG");
    println!("{:-<50}", "");
    for (i, name) in CLASS_NAMES.iter().enumerate() {
        let fg = if i == 0 {
            "-".to_string()
        } else {
            format!("{:.4}", foreground[i - 1])
        };
        println!("{:<16} {:>14} {:>8.4} {:>8}", name, dist.counts[i], all[i], fg);
    }

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&dist)?;
        std::fs::write(&output_path, json)
            .with_context(|| format!("Failed to write to {}", output_path.display()))?;
        println!("Saved to: {}", output_path.display());
    }

    Ok(())
}
