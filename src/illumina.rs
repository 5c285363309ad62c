//! Variant counts from iVar variant tables (Illumina workflow)
//!
//! The table is tab-delimited with a header row. Only `POS` and `ALT` are
//! read; indels carry a leading `+`/`-` in `ALT`.

use crate::config::MaskConfig;
use crate::error::{QcError, Result};
use crate::variants::{
    is_frameshift_neutral, VariantClass, VariantCountSummary, VariantRecord, VariantSource,
    VariantTally,
};
use log::debug;
use serde::Deserialize;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 2] = ["POS", "ALT"];

#[derive(Debug, Deserialize)]
struct IvarRow {
    #[serde(rename = "POS")]
    pos: u64,
    #[serde(rename = "REF", default)]
    reference: String,
    #[serde(rename = "ALT")]
    alt: String,
}

impl From<IvarRow> for VariantRecord {
    fn from(row: IvarRow) -> Self {
        VariantRecord {
            position: row.pos,
            reference_allele: row.reference,
            alternate_allele: row.alt,
        }
    }
}

/// Reader for iVar `<sample>.variants.tsv` tables
#[derive(Debug, Clone, Copy)]
pub struct IvarTableSource {
    pub codon_size: usize,
}

impl Default for IvarTableSource {
    fn default() -> Self {
        Self { codon_size: 3 }
    }
}

impl IvarTableSource {
    pub fn new(codon_size: usize) -> Self {
        Self { codon_size }
    }
}

impl VariantSource for IvarTableSource {
    fn reduce(
        &self,
        path: &Path,
        genome_length: u64,
        mask: &MaskConfig,
        count_indels: bool,
    ) -> Result<VariantCountSummary> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .from_path(path)
            .map_err(|e| QcError::from_csv(path, e))?;

        let headers = reader.headers().map_err(|e| QcError::from_csv(path, e))?;
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(QcError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
        }

        let mut tally = VariantTally::new(genome_length, *mask);
        for result in reader.deserialize::<IvarRow>() {
            let variant: VariantRecord = result.map_err(|e| QcError::from_csv(path, e))?.into();
            match variant.classify() {
                VariantClass::Snv => {
                    tally.record();
                    tally.snv(variant.position);
                }
                VariantClass::Indel if count_indels => {
                    let triplet =
                        is_frameshift_neutral(&variant.alternate_allele, self.codon_size) == Some(true);
                    tally.record();
                    tally.indel(variant.position, triplet);
                }
                VariantClass::Indel => {}
            }
        }

        let summary = tally.finish();
        debug!(
            "{}: {} variants ({} SNV, {} indel)",
            path.display(),
            summary.total_variants,
            summary.total_snv,
            summary.total_indel
        );
        Ok(summary)
    }
}
