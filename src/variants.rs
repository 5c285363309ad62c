//! Variant classification, edge masking and per-sample variant counts
//!
//! The two instrument-specific readers live in [`crate::illumina`] and
//! [`crate::nanopore`]; both implement [`VariantSource`] and accumulate into
//! a [`VariantTally`].

use crate::config::MaskConfig;
use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Whether `position` lies inside the masked genome edges.
///
/// True iff `position < genome_start + mask_start` or
/// `position > genome_length - mask_end`. Callers must not consult this
/// when the genome length is unknown (0).
pub fn is_masked(
    position: u64,
    genome_length: u64,
    mask_start: u64,
    mask_end: u64,
    genome_start: u64,
) -> bool {
    let position = i128::from(position);
    position < i128::from(genome_start) + i128::from(mask_start)
        || position > i128::from(genome_length) - i128::from(mask_end)
}

impl MaskConfig {
    pub fn is_masked(&self, position: u64, genome_length: u64) -> bool {
        is_masked(
            position,
            genome_length,
            self.mask_start,
            self.mask_end,
            self.genome_start,
        )
    }
}

/// Variant type as counted in the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantClass {
    Snv,
    Indel,
}

/// Single-character alleles are SNVs, anything longer is an indel.
///
/// Multi-base substitutions therefore count as indels.
pub fn classify(alternate_allele: &str) -> VariantClass {
    if alternate_allele.chars().count() == 1 {
        VariantClass::Snv
    } else {
        VariantClass::Indel
    }
}

/// Whether an indel keeps the reading frame.
///
/// One leading `+`/`-` is stripped, then the remaining length must be a
/// multiple of `unit`. Returns `None` when nothing remains (or `unit` is 0);
/// that is never a triplet.
pub fn is_frameshift_neutral(raw_indel: &str, unit: usize) -> Option<bool> {
    let bases = raw_indel
        .strip_prefix('+')
        .or_else(|| raw_indel.strip_prefix('-'))
        .unwrap_or(raw_indel);
    let len = bases.chars().count();
    if len == 0 || unit == 0 {
        return None;
    }
    Some(len % unit == 0)
}

/// A single variant call, as handed to the counters.
///
/// Also the identity used to drop repeated VCF calls: two records are the
/// same call when all three fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantRecord {
    pub position: u64,
    /// Empty when the source does not report it
    pub reference_allele: String,
    /// Multi-allelic calls carry their alleles concatenated
    pub alternate_allele: String,
}

impl VariantRecord {
    pub fn classify(&self) -> VariantClass {
        classify(&self.alternate_allele)
    }
}

/// Variant counts for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariantCountSummary {
    /// Number of counted records, incremented per record
    pub total_variants: u64,
    pub total_snv: u64,
    pub total_indel: u64,
    pub total_snv_masked: u64,
    pub total_indel_masked: u64,
    pub total_indel_triplet: u64,
    pub genome_length: u64,
}

impl VariantCountSummary {
    /// Sum of the SNV and indel counters
    pub fn counted_variants(&self) -> u64 {
        self.total_snv + self.total_indel
    }
}

/// Single-pass accumulator shared by the variant readers
#[derive(Debug)]
pub(crate) struct VariantTally {
    genome_length: u64,
    mask: MaskConfig,
    counts: VariantCountSummary,
}

impl VariantTally {
    pub(crate) fn new(genome_length: u64, mask: MaskConfig) -> Self {
        Self {
            genome_length,
            mask,
            counts: VariantCountSummary {
                genome_length,
                ..Default::default()
            },
        }
    }

    fn masked(&self, position: u64) -> bool {
        self.genome_length > 0 && self.mask.is_masked(position, self.genome_length)
    }

    pub(crate) fn record(&mut self) {
        self.counts.total_variants += 1;
    }

    pub(crate) fn snv(&mut self, position: u64) {
        self.counts.total_snv += 1;
        if self.masked(position) {
            self.counts.total_snv_masked += 1;
        }
    }

    pub(crate) fn indel(&mut self, position: u64, triplet: bool) {
        self.counts.total_indel += 1;
        if triplet {
            self.counts.total_indel_triplet += 1;
        }
        if self.masked(position) {
            self.counts.total_indel_masked += 1;
        }
    }

    pub(crate) fn finish(self) -> VariantCountSummary {
        self.counts
    }
}

/// A variant call file that can be reduced to per-sample counts
pub trait VariantSource {
    fn reduce(
        &self,
        path: &Path,
        genome_length: u64,
        mask: &MaskConfig,
        count_indels: bool,
    ) -> Result<VariantCountSummary>;
}

/// Sequencing platform, which decides the variant file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// iVar variant table
    Illumina,
    /// VCF from the nanopore workflow
    #[serde(alias = "ont")]
    Nanopore,
}

impl FromStr for Instrument {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "illumina" => Ok(Instrument::Illumina),
            "ont" | "nanopore" => Ok(Instrument::Nanopore),
            other => Err(QcError::Config(format!("unknown instrument '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_masked_window() {
        // 129bp genome, 10bp masked at each end
        assert!(is_masked(10, 129, 10, 10, 1));
        assert!(is_masked(125, 129, 10, 10, 1));
        assert!(!is_masked(66, 129, 10, 10, 1));
        assert!(!is_masked(11, 129, 10, 10, 1));
        assert!(!is_masked(119, 129, 10, 10, 1));
        assert!(is_masked(120, 129, 10, 10, 1));
    }

    #[test]
    fn test_is_masked_exhaustive_boundaries() {
        let (length, mask_start, mask_end) = (1000u64, 100u64, 50u64);
        for position in 1..=length + 5 {
            let expected = position < 1 + mask_start || position > length - mask_end;
            assert_eq!(
                is_masked(position, length, mask_start, mask_end, 1),
                expected,
                "position {position}"
            );
        }
    }

    #[test]
    fn test_is_masked_zero_based_start() {
        // Positions 0..=9 fall in the start window, 119 is the last unmasked
        assert!(is_masked(0, 129, 10, 10, 0));
        assert!(is_masked(9, 129, 10, 10, 0));
        assert!(!is_masked(10, 129, 10, 10, 0));
        assert!(!is_masked(119, 129, 10, 10, 0));
        assert!(is_masked(120, 129, 10, 10, 0));
    }

    #[test]
    fn test_is_masked_extreme_windows() {
        assert!(is_masked(500, 1000, u64::MAX, 0, 1));
        assert!(is_masked(500, 1000, 0, u64::MAX, 1));
        assert!(is_masked(u64::MAX, u64::MAX, u64::MAX, u64::MAX, u64::MAX));
        assert!(!is_masked(u64::MAX, u64::MAX, 0, 0, 0));
    }

    #[test]
    fn test_short_genome_masks_everything() {
        // Window [101, 79] is empty
        for position in 1..=129 {
            assert!(MaskConfig::default().is_masked(position, 129));
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("A"), VariantClass::Snv);
        assert_eq!(classify("n"), VariantClass::Snv);
        assert_eq!(classify("+A"), VariantClass::Indel);
        assert_eq!(classify("-AAT"), VariantClass::Indel);
        assert_eq!(classify("AC"), VariantClass::Indel);
    }

    #[test]
    fn test_record_classify() {
        let record = VariantRecord {
            position: 60,
            reference_allele: "A".to_string(),
            alternate_allele: "+AAT".to_string(),
        };
        assert_eq!(record.classify(), VariantClass::Indel);
    }

    #[test]
    fn test_frameshift_neutral() {
        assert_eq!(is_frameshift_neutral("+AAGGG", 3), Some(false));
        assert_eq!(is_frameshift_neutral("-AAT", 3), Some(true));
        assert_eq!(is_frameshift_neutral("TTT", 3), Some(true));
        assert_eq!(is_frameshift_neutral("+AAGGGC", 3), Some(true));
    }

    #[test]
    fn test_frameshift_neutral_strips_one_marker_only() {
        assert_eq!(is_frameshift_neutral("+-AA", 3), Some(true));
        assert_eq!(is_frameshift_neutral("--A", 3), Some(false));
    }

    #[test]
    fn test_frameshift_neutral_undefined() {
        assert_eq!(is_frameshift_neutral("+", 3), None);
        assert_eq!(is_frameshift_neutral("", 3), None);
        assert_eq!(is_frameshift_neutral("AAA", 0), None);
    }

    #[test]
    fn test_tally_skips_masking_without_genome() {
        let mut tally = VariantTally::new(0, MaskConfig::default());
        tally.record();
        tally.snv(5);
        tally.record();
        tally.indel(5, true);
        let summary = tally.finish();
        assert_eq!(summary.total_variants, 2);
        assert_eq!(summary.counted_variants(), 2);
        assert_eq!(summary.total_snv_masked, 0);
        assert_eq!(summary.total_indel_masked, 0);
        assert_eq!(summary.total_indel_triplet, 1);
        assert_eq!(summary.genome_length, 0);
    }

    #[test]
    fn test_instrument_from_str() {
        assert_eq!("illumina".parse::<Instrument>().unwrap(), Instrument::Illumina);
        assert_eq!("ONT".parse::<Instrument>().unwrap(), Instrument::Nanopore);
        assert_eq!("nanopore".parse::<Instrument>().unwrap(), Instrument::Nanopore);
        assert!("pacbio".parse::<Instrument>().is_err());
    }
}
