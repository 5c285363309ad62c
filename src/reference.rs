//! FASTA access for reference genomes and consensus sequences

use crate::error::{QcError, Result};
use log::{debug, warn};
use noodles::fasta;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Sequence of the last record in a FASTA file, with the number of records seen.
///
/// Reference and consensus files are expected to hold a single record. When
/// more are present the last one is returned, matching how the pipeline
/// consumes these files.
pub fn read_last_sequence(path: &Path) -> Result<Option<(Vec<u8>, usize)>> {
    let file = File::open(path).map_err(|e| QcError::from_io(path, e))?;
    let mut reader = fasta::io::Reader::new(BufReader::new(file));

    let mut last = None;
    let mut n_records = 0usize;
    for result in reader.records() {
        let record = result.map_err(|e| QcError::Malformed {
            path: path.to_path_buf(),
            line: 0,
            reason: e.to_string(),
        })?;
        n_records += 1;
        let sequence: &[u8] = record.sequence().as_ref();
        last = Some(sequence.to_vec());
    }

    Ok(last.map(|seq| (seq, n_records)))
}

/// Reference genome length, derived per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferenceGenome {
    /// 0 means unknown; masking is skipped
    pub length: u64,
}

impl ReferenceGenome {
    /// Load the reference length. Any failure gives a length of 0.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Self {
        let Some(path) = path else {
            debug!("No reference supplied, masked counts will not be computed");
            return Self::default();
        };
        let path = path.as_ref();

        match read_last_sequence(path) {
            Ok(Some((sequence, n_records))) => {
                if n_records > 1 {
                    warn!(
                        "Reference {} has {} records, using the last one",
                        path.display(),
                        n_records
                    );
                }
                Self {
                    length: sequence.len() as u64,
                }
            }
            Ok(None) => {
                warn!("Reference {} has no sequence records", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Reference unavailable, masked counts skipped: {e}");
                Self::default()
            }
        }
    }

    pub fn is_known(&self) -> bool {
        self.length > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fasta_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_multiline_reference_length() {
        let file = fasta_file(">ref\nACGTACGTAC\nACGTA\n");
        let genome = ReferenceGenome::load(Some(file.path()));
        assert_eq!(genome.length, 15);
        assert!(genome.is_known());
    }

    #[test]
    fn test_missing_reference_is_zero() {
        let genome = ReferenceGenome::load(Some(Path::new("/nonexistent/reference.fa")));
        assert_eq!(genome.length, 0);
        assert!(!genome.is_known());
    }

    #[test]
    fn test_no_reference_is_zero() {
        assert_eq!(ReferenceGenome::load(None::<&Path>).length, 0);
    }

    #[test]
    fn test_empty_reference_is_zero() {
        let file = fasta_file("");
        assert_eq!(ReferenceGenome::load(Some(file.path())).length, 0);
    }

    #[test]
    fn test_last_record_wins() {
        let file = fasta_file(">a\nACGT\n>b\nACGTACGT\n");
        let (sequence, n_records) = read_last_sequence(file.path()).unwrap().unwrap();
        assert_eq!(sequence.len(), 8);
        assert_eq!(n_records, 2);
    }
}
