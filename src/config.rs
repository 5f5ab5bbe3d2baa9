//! Experiment configuration.
//!
//! Training writes a YAML config per experiment. Evaluation only reads the
//! handful of fields it needs; everything else in the file is ignored.
//!
//! ```yaml
//! dataset:
//!   type: pascal_semi
//!   n_sup: 1464
//!   val:
//!     data_root: data/VOC2012
//!     data_list: data/splits/pascal/val.txt
//! net:
//!   num_classes: 21
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::confusion::persist::cm_stem;
use crate::error::{Error, Result};
use crate::palette::NUM_CLASSES;

/// Top-level experiment config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Dataset section.
    pub dataset: DatasetConfig,
    /// Network section.
    pub net: NetConfig,
}

/// `dataset:` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Dataset type, e.g. `pascal_semi`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Number of labeled training samples.
    pub n_sup: usize,
    /// Validation split.
    #[serde(default)]
    pub val: Option<SplitConfig>,
}

/// A dataset split location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Dataset root directory.
    pub data_root: Option<PathBuf>,
    /// File listing sample ids, one per line.
    pub data_list: Option<PathBuf>,
}

/// `net:` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetConfig {
    /// Number of output classes.
    pub num_classes: usize,
}

impl ExperimentConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the config against the fixed palette.
    pub fn validate(&self) -> Result<()> {
        if self.net.num_classes != NUM_CLASSES {
            return Err(Error::Config(format!(
                "net.num_classes is {}, but the palette has {} classes",
                self.net.num_classes, NUM_CLASSES
            )));
        }
        Ok(())
    }

    /// Stem of the persisted confusion matrix, `{type}_{n_sup}_cm`.
    #[must_use]
    pub fn cm_stem(&self) -> String {
        cm_stem(&self.dataset.kind, self.dataset.n_sup)
    }

    /// Validation split location, if configured.
    #[must_use]
    pub fn val_split(&self) -> Option<&SplitConfig> {
        self.dataset.val.as_ref()
    }
}
