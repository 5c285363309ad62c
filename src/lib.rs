//! nCoV QC Tools
//!
//! Per-sample QC metrics for viral amplicon (Illumina) and nanopore
//! sequencing runs.
//!
//! This library provides:
//! - Variant counts with edge masking and frameshift-neutral indel detection
//! - VCF call de-duplication for nanopore runs
//! - Consensus ambiguity counts (N and other IUPAC codes)
//! - Depth of coverage statistics
//! - A flat per-sample summary with Ct value and collection date

pub mod config;
pub mod consensus;
pub mod coverage;
pub mod error;
pub mod illumina;
pub mod metadata;
pub mod nanopore;
pub mod reference;
pub mod reporting;
pub mod sample_qc;
pub mod variants;

pub use config::{MaskConfig, MetadataColumns, QcConfig};
pub use error::{QcError, Result};
pub use reporting::{QcSummarizer, SampleInputs, SampleQcSummary};
pub use variants::{Instrument, VariantCountSummary, VariantRecord, VariantSource};

use serde::{Serialize, Serializer};
use std::path::Path;

/// Sentinel written for values that could not be determined
pub const NA: &str = "NA";

/// Serialize `None` as [`NA`]
pub fn serialize_na<S, T>(value: &Option<T>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(NA),
    }
}

/// Sample name from a file path: the file name with `suffix` removed, or the
/// file stem when the suffix does not match.
pub fn sample_name_from_path<P: AsRef<Path>>(path: P, suffix: &str) -> String {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    match file_name.strip_suffix(suffix) {
        Some(name) if !suffix.is_empty() && !name.is_empty() => name.to_string(),
        _ => path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string(),
    }
}
