//! Color palette and class-index codec.
//!
//! Segmentation labels are stored as color-coded images where each of the
//! 21 PASCAL VOC classes has a fixed RGB color. This module maps between
//! those colors and class indices.
//!
//! Decoding is an exact match against the palette. Pixels that match no
//! entry (anti-aliased borders, the VOC void color) decode to background.
//!
//! ```
//! use seg_eval::palette::{ClassId, Palette};
//! use rgb::RGB8;
//!
//! let palette = Palette::pascal_voc();
//! let person = ClassId::new(15).unwrap();
//! assert_eq!(palette.encode(person), RGB8::new(192, 128, 128));
//! assert_eq!(palette.decode(RGB8::new(192, 128, 128)), person);
//! assert_eq!(palette.decode(RGB8::new(224, 224, 192)), ClassId::BACKGROUND);
//! ```

use std::fmt;

use imgref::{ImgRef, ImgVec};
use rgb::RGB8;
use serde::{Deserialize, Serialize};

/// Number of classes in the palette, background included.
pub const NUM_CLASSES: usize = 21;

/// Class names, index-aligned with the palette.
pub const CLASS_NAMES: [&str; NUM_CLASSES] = [
    "background",
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "dining table",
    "dog",
    "horse",
    "motorbike",
    "person",
    "potted plant",
    "sheep",
    "sofa",
    "train",
    "tv/monitor",
];

/// A 2-D grid of class indices, row-major.
pub type ClassGrid = ImgVec<u8>;

/// A validated class index in `0..NUM_CLASSES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ClassId(u8);

impl ClassId {
    /// The background class (index 0).
    pub const BACKGROUND: Self = Self(0);

    /// Wrap a raw index, returning `None` when it is outside the palette.
    #[must_use]
    pub fn new(index: u8) -> Option<Self> {
        ((index as usize) < NUM_CLASSES).then_some(Self(index))
    }

    /// Raw index value.
    #[must_use]
    pub fn index(self) -> u8 {
        self.0
    }

    /// Human-readable class name.
    #[must_use]
    pub fn name(self) -> &'static str {
        CLASS_NAMES[self.0 as usize]
    }

    /// Iterate over every class in index order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..NUM_CLASSES as u8).map(Self)
    }
}

impl TryFrom<u8> for ClassId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("class index {} out of range", value))
    }
}

impl From<ClassId> for u8 {
    fn from(id: ClassId) -> Self {
        id.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

/// Ordered mapping from class index to RGB color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [RGB8; NUM_CLASSES],
}

impl Default for Palette {
    fn default() -> Self {
        Self::pascal_voc()
    }
}

impl Palette {
    /// The PASCAL VOC segmentation benchmark colormap.
    #[must_use]
    pub fn pascal_voc() -> Self {
        Self {
            colors: [
                RGB8::new(0, 0, 0),
                RGB8::new(128, 0, 0),
                RGB8::new(0, 128, 0),
                RGB8::new(128, 128, 0),
                RGB8::new(0, 0, 128),
                RGB8::new(128, 0, 128),
                RGB8::new(0, 128, 128),
                RGB8::new(128, 128, 128),
                RGB8::new(64, 0, 0),
                RGB8::new(192, 0, 0),
                RGB8::new(64, 128, 0),
                RGB8::new(192, 128, 0),
                RGB8::new(64, 0, 128),
                RGB8::new(192, 0, 128),
                RGB8::new(64, 128, 128),
                RGB8::new(192, 128, 128),
                RGB8::new(0, 64, 0),
                RGB8::new(128, 64, 0),
                RGB8::new(0, 192, 0),
                RGB8::new(128, 192, 0),
                RGB8::new(0, 64, 128),
            ],
        }
    }

    /// All palette colors in class order.
    #[must_use]
    pub fn colors(&self) -> &[RGB8; NUM_CLASSES] {
        &self.colors
    }

    /// Find the class whose color exactly equals `pixel`.
    #[must_use]
    pub fn lookup(&self, pixel: RGB8) -> Option<ClassId> {
        self.colors
            .iter()
            .position(|&c| c == pixel)
            .map(|i| ClassId(i as u8))
    }

    /// Decode a pixel to its class, falling back to background on a miss.
    #[must_use]
    pub fn decode(&self, pixel: RGB8) -> ClassId {
        self.lookup(pixel).unwrap_or(ClassId::BACKGROUND)
    }

    /// Color for a class.
    #[must_use]
    pub fn encode(&self, class: ClassId) -> RGB8 {
        self.colors[class.0 as usize]
    }

    /// Decode every pixel of an RGB image into a class grid of the same shape.
    #[must_use]
    pub fn decode_grid(&self, image: ImgRef<'_, RGB8>) -> ClassGrid {
        let classes: Vec<u8> = image.pixels().map(|p| self.decode(p).0).collect();
        ImgVec::new(classes, image.width(), image.height())
    }

    /// Paint a class-index mask with palette colors.
    ///
    /// Returns the colored image and the distinct classes present, in
    /// ascending order. Values outside the palette are painted black and
    /// left out of the class list.
    #[must_use]
    pub fn colorize(&self, mask: ImgRef<'_, u8>) -> (ImgVec<RGB8>, Vec<ClassId>) {
        let mut seen = [false; NUM_CLASSES];
        let pixels: Vec<RGB8> = mask
            .pixels()
            .map(|v| match ClassId::new(v) {
                Some(class) => {
                    seen[v as usize] = true;
                    self.encode(class)
                }
                None => RGB8::new(0, 0, 0),
            })
            .collect();

        let present = ClassId::all().filter(|c| seen[c.0 as usize]).collect();
        (ImgVec::new(pixels, mask.width(), mask.height()), present)
    }
}
