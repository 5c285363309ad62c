//! Consensus sequence composition
//!
//! Counts ambiguous positions in a consensus FASTA. `N` is reported on its
//! own; the remaining IUPAC ambiguity codes are pooled.

use crate::reference::read_last_sequence;
use crate::serialize_na;
use log::warn;
use serde::Serialize;
use std::path::Path;

/// IUPAC ambiguity codes other than N
pub const IUPAC_CODES: &[u8] = b"RYSWKMBDHV";

/// Ambiguity counts for one consensus sequence; `None` is reported as `NA`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConsensusComposition {
    #[serde(serialize_with = "serialize_na")]
    pub total_n: Option<u64>,
    #[serde(serialize_with = "serialize_na")]
    pub total_iupac: Option<u64>,
    #[serde(serialize_with = "serialize_na")]
    pub consensus_length: Option<u64>,
}

impl ConsensusComposition {
    /// Count bases in a sequence
    pub fn from_sequence(sequence: &[u8]) -> Self {
        let mut total_n = 0u64;
        let mut total_iupac = 0u64;
        for base in sequence.iter().map(u8::to_ascii_uppercase) {
            if base == b'N' {
                total_n += 1;
            } else if IUPAC_CODES.contains(&base) {
                total_iupac += 1;
            }
        }
        Self {
            total_n: Some(total_n),
            total_iupac: Some(total_iupac),
            consensus_length: Some(sequence.len() as u64),
        }
    }

    /// Analyze a consensus FASTA. Never fails: unreadable input gives all `NA`.
    pub fn analyze<P: AsRef<Path>>(path: Option<P>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        let path = path.as_ref();

        match read_last_sequence(path) {
            Ok(Some((sequence, n_records))) => {
                if n_records > 1 {
                    warn!(
                        "Consensus {} has {} records; only the last is reported",
                        path.display(),
                        n_records
                    );
                }
                Self::from_sequence(&sequence)
            }
            Ok(None) => {
                warn!("Consensus {} is empty", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Consensus unavailable: {e}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_counts_n_separately() {
        let composition = ConsensusComposition::from_sequence(b"ACGTNNnRYswkmBDHVX");
        assert_eq!(composition.total_n, Some(3));
        assert_eq!(composition.total_iupac, Some(10));
        assert_eq!(composition.consensus_length, Some(18));
    }

    #[test]
    fn test_missing_file_is_na() {
        let composition = ConsensusComposition::analyze(Some("/nonexistent/consensus.fa"));
        assert_eq!(composition, ConsensusComposition::default());
        assert_eq!(composition.total_n, None);
    }

    #[test]
    fn test_empty_file_is_na() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            ConsensusComposition::analyze(Some(file.path())),
            ConsensusComposition::default()
        );
    }

    #[test]
    fn test_not_fasta_is_na() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not a fasta file").unwrap();
        assert_eq!(
            ConsensusComposition::analyze(Some(file.path())),
            ConsensusComposition::default()
        );
    }

    #[test]
    fn test_serializes_na() {
        let json = serde_json::to_string(&ConsensusComposition::default()).unwrap();
        assert_eq!(
            json,
            r#"{"total_n":"NA","total_iupac":"NA","consensus_length":"NA"}"#
        );
    }
}
