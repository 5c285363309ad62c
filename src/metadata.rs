//! Sample metadata table (Ct value and collection date)

use crate::config::MetadataColumns;
use crate::error::{QcError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub ct: String,
    pub date: String,
}

impl SampleMetadata {
    /// Both fields `NA`
    pub fn unknown() -> Self {
        Self {
            ct: crate::NA.to_string(),
            date: crate::NA.to_string(),
        }
    }
}

/// Metadata for every sample in a tab-delimited table
#[derive(Debug, Clone)]
pub struct MetadataTable {
    path: PathBuf,
    samples: HashMap<String, SampleMetadata>,
}

impl MetadataTable {
    pub fn from_file<P: AsRef<Path>>(path: P, columns: &MetadataColumns) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .from_path(path)
            .map_err(|e| QcError::from_csv(path, e))?;

        let headers = reader
            .headers()
            .map_err(|e| QcError::from_csv(path, e))?
            .clone();
        let index_of = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| QcError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        };
        let sample_idx = index_of(&columns.sample)?;
        let ct_idx = index_of(&columns.ct)?;
        let date_idx = index_of(&columns.date)?;

        let mut samples = HashMap::new();
        for result in reader.records() {
            let record = result.map_err(|e| QcError::from_csv(path, e))?;
            let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
            samples.insert(
                field(sample_idx),
                SampleMetadata {
                    ct: field(ct_idx),
                    date: field(date_idx),
                },
            );
        }

        debug!("{}: metadata for {} samples", path.display(), samples.len());
        Ok(Self {
            path: path.to_path_buf(),
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, sample: &str) -> Result<&SampleMetadata> {
        self.samples
            .get(sample)
            .ok_or_else(|| QcError::UnknownSample {
                path: self.path.clone(),
                sample: sample.to_string(),
            })
    }
}
