//! Run configuration
//!
//! All tunables that used to be module-level defaults live here and are
//! passed explicitly to the reducers and the summarizer.

use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Edge masking window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Bases masked at the beginning of the genome
    pub mask_start: u64,
    /// Bases masked at the end of the genome
    pub mask_end: u64,
    /// Coordinate of the first genome base
    pub genome_start: u64,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            mask_start: 100,
            mask_end: 50,
            genome_start: 1,
        }
    }
}

impl MaskConfig {
    pub fn new(mask_start: u64, mask_end: u64) -> Self {
        Self {
            mask_start,
            mask_end,
            ..Self::default()
        }
    }
}

/// Column labels used in the metadata table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataColumns {
    pub sample: String,
    pub ct: String,
    pub date: String,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            sample: "sample".to_string(),
            ct: "ct".to_string(),
            date: "date".to_string(),
        }
    }
}

/// Full configuration for a summary run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConfig {
    pub mask: MaskConfig,
    /// Include indels in the variant counts; off unless requested
    pub count_indels: bool,
    /// Indel length unit considered frameshift-neutral
    pub codon_size: usize,
    pub metadata_columns: MetadataColumns,
    /// File name suffix stripped from nanopore consensus files to get the sample name
    pub consensus_suffix: String,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            mask: MaskConfig::default(),
            count_indels: false,
            codon_size: 3,
            metadata_columns: MetadataColumns::default(),
            consensus_suffix: ".consensus.fa".to_string(),
        }
    }
}

impl QcConfig {
    /// Load a configuration from a JSON file. Keys that are absent keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| QcError::from_io(path, e))?;
        let config: QcConfig = serde_json::from_str(&content)
            .map_err(|e| QcError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.codon_size == 0 {
            return Err(QcError::Config("codon_size must be greater than 0".to_string()));
        }
        Ok(())
    }
}
