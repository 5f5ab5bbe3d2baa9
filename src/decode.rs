//! Image loading and saving for label and prediction masks.
//!
//! Thin wrappers over the `image` crate that convert to and from `imgref`
//! grids. Ground truth is loaded as RGB and decoded through the palette;
//! class-index masks are loaded as raw gray values.

use std::path::Path;

use image::{ColorType, DynamicImage, GrayImage, RgbImage};
use imgref::{ImgRef, ImgVec};
use rgb::RGB8;

use crate::error::{Error, Result};
use crate::palette::{ClassGrid, Palette};

fn open(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Class value given to label pixels that carry no class (VOC void/boundary).
pub const IGNORE_INDEX: u8 = 255;

fn rgb_grid(img: &DynamicImage) -> ImgVec<RGB8> {
    let rgb = img.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let pixels = rgb
        .into_raw()
        .chunks_exact(3)
        .map(|c| RGB8::new(c[0], c[1], c[2]))
        .collect();
    ImgVec::new(pixels, width, height)
}

/// Raw gray values of a grayscale image, or `None` for color images.
///
/// 16-bit values are read unscaled; anything above 255 becomes
/// [`IGNORE_INDEX`].
fn gray_grid(img: &DynamicImage) -> Option<ImgVec<u8>> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    match img.color() {
        ColorType::L8 | ColorType::La8 => Some(ImgVec::new(img.to_luma8().into_raw(), width, height)),
        ColorType::L16 | ColorType::La16 => {
            let values = img
                .to_luma16()
                .into_raw()
                .into_iter()
                .map(|v| u8::try_from(v).unwrap_or(IGNORE_INDEX))
                .collect();
            Some(ImgVec::new(values, width, height))
        }
        _ => None,
    }
}

/// Load an image as 8-bit RGB.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<ImgVec<RGB8>> {
    Ok(rgb_grid(&open(path.as_ref())?))
}

/// Load a class-index mask.
///
/// Grayscale images are read as raw class indices. Color images are
/// treated as color-coded masks and decoded through `palette`, with
/// unmatched colors falling back to background.
pub fn load_class_grid(path: impl AsRef<Path>, palette: &Palette) -> Result<ClassGrid> {
    let img = open(path.as_ref())?;
    Ok(gray_grid(&img).unwrap_or_else(|| palette.decode_grid(rgb_grid(&img).as_ref())))
}

/// Load a ground-truth label mask for counting.
///
/// Like [`load_class_grid`], except that colors outside the palette
/// (indexed VOC labels expand their void entry to (224,224,192)) become
/// [`IGNORE_INDEX`] instead of background.
pub fn load_label_grid(path: impl AsRef<Path>, palette: &Palette) -> Result<ClassGrid> {
    let img = open(path.as_ref())?;
    if let Some(gray) = gray_grid(&img) {
        return Ok(gray);
    }
    let rgb = rgb_grid(&img);
    let values = rgb
        .pixels()
        .map(|p| palette.lookup(p).map_or(IGNORE_INDEX, |c| c.index()))
        .collect();
    Ok(ImgVec::new(values, rgb.width(), rgb.height()))
}

/// Save an RGB grid. The format is inferred from the file extension.
pub fn save_rgb(path: impl AsRef<Path>, image: ImgRef<'_, RGB8>) -> Result<()> {
    let path = path.as_ref();
    let raw: Vec<u8> = image.pixels().flat_map(|p| [p.r, p.g, p.b]).collect();
    let buffer = RgbImage::from_raw(image.width() as u32, image.height() as u32, raw)
        .ok_or_else(|| Error::ImageLoad {
            path: path.to_path_buf(),
            reason: "pixel buffer does not match dimensions".to_string(),
        })?;
    buffer.save(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Save a class-index grid as an 8-bit grayscale image.
pub fn save_class_grid(path: impl AsRef<Path>, grid: ImgRef<'_, u8>) -> Result<()> {
    let path = path.as_ref();
    let raw: Vec<u8> = grid.pixels().collect();
    let buffer = GrayImage::from_raw(grid.width() as u32, grid.height() as u32, raw)
        .ok_or_else(|| Error::ImageLoad {
            path: path.to_path_buf(),
            reason: "pixel buffer does not match dimensions".to_string(),
        })?;
    buffer.save(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
