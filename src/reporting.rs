//! Per-sample QC summary
//!
//! Merges variant counts, consensus composition, coverage statistics, the
//! base QC record and the metadata overlay into one flat record.

use crate::config::QcConfig;
use crate::consensus::ConsensusComposition;
use crate::coverage::{CoverageStats, Depth};
use crate::error::{QcError, Result};
use crate::illumina::IvarTableSource;
use crate::metadata::{MetadataTable, SampleMetadata};
use crate::nanopore::VcfSource;
use crate::reference::ReferenceGenome;
use crate::sample_qc::BaseQc;
use crate::serialize_na;
use crate::variants::{Instrument, VariantCountSummary, VariantSource};
use log::{info, warn};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One output line. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleQcSummary {
    pub sample_name: String,
    pub pct_n_bases: String,
    pub pct_covered_bases: String,
    pub total_variants: u64,
    pub total_snv: u64,
    pub total_snv_masked: u64,
    pub total_indel: u64,
    pub total_indel_masked: u64,
    pub total_indel_triplet: u64,
    #[serde(serialize_with = "serialize_na")]
    pub total_n: Option<u64>,
    #[serde(serialize_with = "serialize_na")]
    pub total_iupac: Option<u64>,
    #[serde(serialize_with = "serialize_na")]
    pub consensus_length: Option<u64>,
    pub genome_length: u64,
    pub mean_depth: Depth,
    pub median_depth: Depth,
    pub ct: String,
    pub date: String,
    pub qc_pass: String,
}

impl SampleQcSummary {
    pub const COLUMNS: [&'static str; 18] = [
        "sample_name",
        "pct_n_bases",
        "pct_covered_bases",
        "total_variants",
        "total_snv",
        "total_snv_masked",
        "total_indel",
        "total_indel_masked",
        "total_indel_triplet",
        "total_n",
        "total_iupac",
        "consensus_length",
        "genome_length",
        "mean_depth",
        "median_depth",
        "ct",
        "date",
        "qc_pass",
    ];

    fn merge(
        base: BaseQc,
        variants: VariantCountSummary,
        composition: ConsensusComposition,
        coverage: CoverageStats,
        metadata: SampleMetadata,
    ) -> Self {
        Self {
            sample_name: base.sample_name,
            pct_n_bases: base.pct_n_bases,
            pct_covered_bases: base.pct_covered_bases,
            total_variants: variants.total_variants,
            total_snv: variants.total_snv,
            total_snv_masked: variants.total_snv_masked,
            total_indel: variants.total_indel,
            total_indel_masked: variants.total_indel_masked,
            total_indel_triplet: variants.total_indel_triplet,
            total_n: composition.total_n,
            total_iupac: composition.total_iupac,
            consensus_length: composition.consensus_length,
            genome_length: variants.genome_length,
            mean_depth: coverage.mean_depth,
            median_depth: coverage.median_depth,
            ct: metadata.ct,
            date: metadata.date,
            qc_pass: base.qc_pass,
        }
    }
}

/// Input files for one sample
#[derive(Debug, Clone, Default)]
pub struct SampleInputs {
    /// iVar variant table or VCF, depending on the instrument
    pub variants: PathBuf,
    pub coverage: PathBuf,
    /// `<sample>.qc.csv`; nanopore samples usually have none
    pub qc: Option<PathBuf>,
    pub consensus: Option<PathBuf>,
    pub reference: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
}

/// Builds per-sample QC summaries
#[derive(Debug, Clone, Default)]
pub struct QcSummarizer {
    pub config: QcConfig,
}

impl QcSummarizer {
    pub fn new(config: QcConfig) -> Self {
        Self { config }
    }

    /// Summarize a sample, reading the base QC record from the inputs.
    ///
    /// The base record comes from `inputs.qc` when given, otherwise it is
    /// derived from the consensus FASTA.
    pub fn summarize_sample(
        &self,
        instrument: Instrument,
        inputs: &SampleInputs,
    ) -> Result<SampleQcSummary> {
        let reference = ReferenceGenome::load(inputs.reference.as_deref());
        let composition = ConsensusComposition::analyze(inputs.consensus.as_deref());

        let base = match (&inputs.qc, &inputs.consensus) {
            (Some(qc), _) => BaseQc::from_qc_csv(qc)?,
            (None, Some(consensus)) => BaseQc::from_consensus(
                consensus,
                &composition,
                &reference,
                &self.config.consensus_suffix,
            ),
            (None, None) => {
                return Err(QcError::Config(
                    "a QC file or a consensus FASTA is required to identify the sample".to_string(),
                ))
            }
        };

        self.merge(instrument, inputs, &reference, composition, base)
    }

    /// Summarize a sample with an externally supplied base QC record.
    pub fn summarize(
        &self,
        instrument: Instrument,
        inputs: &SampleInputs,
        base: BaseQc,
    ) -> Result<SampleQcSummary> {
        let reference = ReferenceGenome::load(inputs.reference.as_deref());
        let composition = ConsensusComposition::analyze(inputs.consensus.as_deref());
        self.merge(instrument, inputs, &reference, composition, base)
    }

    fn merge(
        &self,
        instrument: Instrument,
        inputs: &SampleInputs,
        reference: &ReferenceGenome,
        composition: ConsensusComposition,
        base: BaseQc,
    ) -> Result<SampleQcSummary> {
        self.config.validate()?;

        let variants = self.count_variants(instrument, &inputs.variants, reference.length)?;
        let coverage = CoverageStats::from_file(&inputs.coverage)?;
        let metadata = self.lookup_metadata(inputs.metadata.as_deref(), &base.sample_name);

        info!(
            "{}: {} variants, mean depth {}",
            base.sample_name, variants.total_variants, coverage.mean_depth
        );
        Ok(SampleQcSummary::merge(
            base,
            variants,
            composition,
            coverage,
            metadata,
        ))
    }

    /// Reduce the variant file with the reader for `instrument`.
    pub fn count_variants(
        &self,
        instrument: Instrument,
        path: &Path,
        genome_length: u64,
    ) -> Result<VariantCountSummary> {
        let mask = &self.config.mask;
        let count_indels = self.config.count_indels;
        match instrument {
            Instrument::Illumina => IvarTableSource::new(self.config.codon_size).reduce(
                path,
                genome_length,
                mask,
                count_indels,
            ),
            Instrument::Nanopore => {
                VcfSource::new(self.config.codon_size).reduce(path, genome_length, mask, count_indels)
            }
        }
    }

    /// Ct value and collection date for a sample; `NA` for both when unavailable.
    pub fn lookup_metadata(&self, path: Option<&Path>, sample: &str) -> SampleMetadata {
        let Some(path) = path else {
            return SampleMetadata::unknown();
        };

        let result = MetadataTable::from_file(path, &self.config.metadata_columns)
            .and_then(|table| table.get(sample).cloned());
        match result {
            Ok(metadata) => metadata,
            Err(e @ QcError::UnknownSample { .. }) => {
                warn!("{e}; ct and date set to NA");
                SampleMetadata::unknown()
            }
            Err(e @ (QcError::NotFound { .. } | QcError::Io { .. })) => {
                warn!("Metadata unavailable ({e}); ct and date set to NA");
                SampleMetadata::unknown()
            }
            Err(e) => {
                warn!("Metadata could not be parsed ({e}); ct and date set to NA");
                SampleMetadata::unknown()
            }
        }
    }
}

/// Write summaries as a tab-delimited table with a header line.
pub fn write_tsv<W: Write>(writer: W, summaries: &[SampleQcSummary]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(SampleQcSummary::COLUMNS)?;
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(())
}

/// Export summaries to JSON
pub fn export_json<P: AsRef<Path>>(summaries: &[SampleQcSummary], path: P) -> anyhow::Result<()> {
    let json_content = serde_json::to_string_pretty(summaries)?;
    std::fs::write(path, json_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary() -> SampleQcSummary {
        SampleQcSummary {
            sample_name: "sampleA".to_string(),
            pct_n_bases: "10.08".to_string(),
            pct_covered_bases: "68.01".to_string(),
            total_variants: 10,
            total_snv: 9,
            total_snv_masked: 9,
            total_indel: 1,
            total_indel_masked: 1,
            total_indel_triplet: 1,
            total_n: None,
            total_iupac: Some(9),
            consensus_length: Some(129),
            genome_length: 129,
            mean_depth: Depth::Fractional(679.5),
            median_depth: Depth::Whole(682),
            ct: "17.4".to_string(),
            date: "NA".to_string(),
            qc_pass: "FALSE".to_string(),
        }
    }

    #[test]
    fn test_tsv_header_and_line() {
        let mut out = Vec::new();
        write_tsv(&mut out, &[summary()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], SampleQcSummary::COLUMNS.join("\t"));
        assert_eq!(
            lines[1],
            "sampleA\t10.08\t68.01\t10\t9\t9\t1\t1\t1\tNA\t9\t129\t129\t679.5\t682\t17.4\tNA\tFALSE"
        );
    }

    #[test]
    fn test_columns_follow_field_order() {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::new());
        writer.serialize(summary()).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            SampleQcSummary::COLUMNS.join("\t")
        );
    }

    #[test]
    fn test_empty_table_has_header() {
        let mut out = Vec::new();
        write_tsv(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap().trim_end(),
            SampleQcSummary::COLUMNS.join("\t")
        );
    }

    #[test]
    fn test_metadata_without_path_is_na() {
        let summarizer = QcSummarizer::default();
        assert_eq!(
            summarizer.lookup_metadata(None, "sampleA"),
            SampleMetadata::unknown()
        );
        assert_eq!(
            summarizer.lookup_metadata(Some(Path::new("/nonexistent/metadata.tsv")), "sampleA"),
            SampleMetadata::unknown()
        );
    }

    #[test]
    fn test_json_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        export_json(&[summary()], &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["sample_name"], "sampleA");
        assert_eq!(value[0]["total_n"], "NA");
        assert_eq!(value[0]["total_iupac"], 9);
    }
}
