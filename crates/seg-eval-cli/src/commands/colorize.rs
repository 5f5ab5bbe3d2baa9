//! Mask colorization command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use seg_eval::Palette;
use seg_eval::decode::{load_class_grid, save_rgb};

pub fn run(input: PathBuf, output: PathBuf) -> Result<()> {
    let palette = Palette::pascal_voc();

    let mask = load_class_grid(&input, &palette)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    let (colored, present) = palette.colorize(mask.as_ref());
    save_rgb(&output, colored.as_ref())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let names: Vec<&str> = present.iter().map(|c| c.name()).collect();
    println!("Classes: {}", names.join(", "));
    println!("Saved to: {}", output.display());

    Ok(())
}
