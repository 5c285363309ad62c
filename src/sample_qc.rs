//! Base QC record: sample name, N and coverage percentages, pass flag
//!
//! Illumina runs produce a `<sample>.qc.csv` file with these values. Nanopore
//! runs do not, so the record is derived from the consensus and reference.

use crate::consensus::ConsensusComposition;
use crate::coverage::format_rounded;
use crate::error::{QcError, Result};
use crate::reference::ReferenceGenome;
use crate::NA;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseQc {
    pub sample_name: String,
    #[serde(rename = "pct_N_bases")]
    pub pct_n_bases: String,
    pub pct_covered_bases: String,
    pub qc_pass: String,
}

impl BaseQc {
    /// Read a `<sample>.qc.csv` file. The last data row is used.
    pub fn from_qc_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .from_path(path)
            .map_err(|e| QcError::from_csv(path, e))?;

        let mut last = None;
        for result in reader.deserialize::<BaseQc>() {
            last = Some(result.map_err(|e| QcError::from_csv(path, e))?);
        }
        last.ok_or_else(|| QcError::EmptyInput {
            path: path.to_path_buf(),
        })
    }

    /// Derive the record for a nanopore sample.
    ///
    /// The sample name is the consensus file name without `consensus_suffix`.
    /// `pct_n_bases` is the N count over the reference length, to two
    /// decimals, always written with a decimal point (`0.0`); coverage and
    /// pass status are not available.
    pub fn from_consensus(
        consensus: &Path,
        composition: &ConsensusComposition,
        reference: &ReferenceGenome,
        consensus_suffix: &str,
    ) -> Self {
        let pct_n_bases = match composition.total_n {
            Some(total_n) if reference.is_known() => {
                format_rounded(total_n as f64 / reference.length as f64 * 100.0, 2)
            }
            _ => {
                warn!(
                    "Cannot compute pct_n_bases for {}: consensus or reference unavailable",
                    consensus.display()
                );
                NA.to_string()
            }
        };

        Self {
            sample_name: crate::sample_name_from_path(consensus, consensus_suffix),
            pct_n_bases,
            pct_covered_bases: NA.to_string(),
            qc_pass: NA.to_string(),
        }
    }
}
