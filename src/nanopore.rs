//! Variant counts from VCF files (nanopore workflow)
//!
//! Variant callers in this workflow can emit the same call more than once,
//! so records are de-duplicated on `(POS, REF, ALT)` before counting.

use crate::config::MaskConfig;
use crate::error::{QcError, Result};
use crate::variants::{
    is_frameshift_neutral, VariantCountSummary, VariantRecord, VariantSource, VariantTally,
};
use log::debug;
use std::collections::HashSet;
use std::path::Path;

const POS: usize = 1;
const REF: usize = 3;
const ALT: usize = 4;
const INFO: usize = 7;

const SNP_BASES: [&str; 6] = ["A", "C", "G", "T", "N", "*"];

/// One ALT allele
#[derive(Debug, Clone, PartialEq, Eq)]
enum Allele {
    /// `.`
    Missing,
    /// `<DEL>`, breakends and other non-sequence alleles
    Symbolic(String),
    Sequence(String),
}

impl Allele {
    fn parse(s: &str) -> Self {
        if s == "." {
            Allele::Missing
        } else if s.starts_with('<')
            || s.contains('[')
            || s.contains(']')
            || (s.len() > 1 && (s.starts_with('.') || s.ends_with('.')))
        {
            Allele::Symbolic(s.to_string())
        } else {
            Allele::Sequence(s.to_string())
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Allele::Missing => ".",
            Allele::Symbolic(s) | Allele::Sequence(s) => s,
        }
    }
}

/// The columns of a VCF data line needed for counting
#[derive(Debug, Clone)]
pub struct VcfRecord {
    pub position: u64,
    pub reference: String,
    alternates: Vec<Allele>,
    structural: bool,
}

impl VcfRecord {
    fn from_fields(record: &csv::StringRecord, path: &Path) -> Result<Self> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let malformed = |reason: String| QcError::Malformed {
            path: path.to_path_buf(),
            line,
            reason,
        };

        if record.len() <= ALT {
            return Err(malformed(format!(
                "expected at least {} columns, found {}",
                ALT + 1,
                record.len()
            )));
        }

        let position = record[POS]
            .parse::<u64>()
            .map_err(|e| malformed(format!("invalid POS '{}': {e}", &record[POS])))?;
        let alternates = record[ALT].split(',').map(Allele::parse).collect();
        let structural = record
            .get(INFO)
            .map(|info| info.split(';').any(|kv| kv.starts_with("SVTYPE=")))
            .unwrap_or(false);

        Ok(Self {
            position,
            reference: record[REF].to_string(),
            alternates,
            structural,
        })
    }

    /// Identity of the call: position, REF and the concatenated ALT alleles
    pub fn dedup_key(&self) -> VariantRecord {
        VariantRecord {
            position: self.position,
            reference_allele: self.reference.clone(),
            alternate_allele: self.alternates.iter().map(Allele::as_str).collect(),
        }
    }

    /// Single-base REF and every ALT a single base
    pub fn is_snp(&self) -> bool {
        if self.reference.len() > 1 {
            return false;
        }
        self.alternates.iter().all(|alt| match alt {
            Allele::Sequence(s) => SNP_BASES.iter().any(|b| s.eq_ignore_ascii_case(b)),
            _ => false,
        })
    }

    /// Length-changing call; symbolic alleles are not indels
    pub fn is_indel(&self) -> bool {
        if self.reference.len() > 1 && !self.structural {
            return true;
        }
        for alt in &self.alternates {
            match alt {
                Allele::Missing => return true,
                Allele::Symbolic(_) => return false,
                Allele::Sequence(s) if s.len() != self.reference.len() => return true,
                Allele::Sequence(_) => {}
            }
        }
        false
    }

    /// Either the first ALT or the REF, minus its anchor base, is a whole number of codons.
    fn is_triplet(&self, codon_size: usize) -> bool {
        let trimmed = |s: &str| s.chars().skip(1).collect::<String>();
        let alt = self
            .alternates
            .first()
            .map(|a| match a {
                Allele::Missing => String::new(),
                other => trimmed(other.as_str()),
            })
            .unwrap_or_default();

        is_frameshift_neutral(&alt, codon_size) == Some(true)
            || is_frameshift_neutral(&trimmed(&self.reference), codon_size) == Some(true)
    }
}

/// Reader for `<sample>.pass.vcf` files
#[derive(Debug, Clone, Copy)]
pub struct VcfSource {
    pub codon_size: usize,
}

impl Default for VcfSource {
    fn default() -> Self {
        Self { codon_size: 3 }
    }
}

impl VcfSource {
    pub fn new(codon_size: usize) -> Self {
        Self { codon_size }
    }

    /// Parse every data line of a VCF, keeping the first copy of each call.
    pub fn read_unique_records(&self, path: &Path) -> Result<Vec<VcfRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .quoting(false)
            .from_path(path)
            .map_err(|e| QcError::from_csv(path, e))?;

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut duplicates = 0usize;
        for result in reader.records() {
            let fields = result.map_err(|e| QcError::from_csv(path, e))?;
            let record = VcfRecord::from_fields(&fields, path)?;
            if seen.insert(record.dedup_key()) {
                records.push(record);
            } else {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            debug!("{}: dropped {} duplicate calls", path.display(), duplicates);
        }
        Ok(records)
    }
}

impl VariantSource for VcfSource {
    fn reduce(
        &self,
        path: &Path,
        genome_length: u64,
        mask: &MaskConfig,
        count_indels: bool,
    ) -> Result<VariantCountSummary> {
        let mut tally = VariantTally::new(genome_length, *mask);

        for record in self.read_unique_records(path)? {
            // A record flagged as both is counted in both branches
            if count_indels {
                tally.record();
                if record.is_indel() {
                    tally.indel(record.position, record.is_triplet(self.codon_size));
                }
                if record.is_snp() {
                    tally.snv(record.position);
                }
            } else if record.is_snp() {
                tally.record();
                tally.snv(record.position);
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
