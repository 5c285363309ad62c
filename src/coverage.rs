//! Depth of coverage statistics from per-base coverage tables

use crate::error::{QcError, Result};
use log::debug;
use serde::{Serialize, Serializer};
use std::path::Path;

/// Column holding the read depth
pub const DEPTH_COLUMN: usize = 7;

const HEADER_PREFIX: [&str; 3] = ["reference_name", "start", "end"];

/// A depth statistic.
///
/// Statistics that land exactly on a depth value are whole numbers and are
/// written without a decimal point (`682`); anything else is written as a
/// float rounded to one place (`680.1`, `2.0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Depth {
    Whole(u64),
    Fractional(f64),
}

impl Depth {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Depth::Whole(d) => d as f64,
            Depth::Fractional(d) => d,
        }
    }
}

impl Serialize for Depth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            Depth::Whole(d) => serializer.serialize_u64(d),
            Depth::Fractional(d) => serializer.serialize_f64(d),
        }
    }
}

impl std::fmt::Display for Depth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Depth::Whole(d) => write!(f, "{d}"),
            Depth::Fractional(d) => f.write_str(&format_rounded(d, 1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageStats {
    pub mean_depth: Depth,
    pub median_depth: Depth,
}

impl CoverageStats {
    /// Mean and median of a depth series. `None` for an empty series.
    ///
    /// The mean is whole when the sum divides evenly. The median of an odd
    /// series is its middle depth; an even series averages the middle pair.
    pub fn from_depths(depths: &[u64]) -> Option<Self> {
        if depths.is_empty() {
            return None;
        }
        let n = depths.len() as u128;
        let sum: u128 = depths.iter().map(|&d| d as u128).sum();
        let mean_depth = if sum % n == 0 {
            Depth::Whole((sum / n) as u64)
        } else {
            Depth::Fractional(round_to(sum as f64 / n as f64, 1))
        };

        let mut sorted = depths.to_vec();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median_depth = if sorted.len() % 2 == 0 {
            Depth::Fractional(round_to(
                (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0,
                1,
            ))
        } else {
            Depth::Whole(sorted[mid])
        };

        Some(Self {
            mean_depth,
            median_depth,
        })
    }

    /// Read a per-base coverage table and reduce it.
    ///
    /// An optional header starting `reference_name\tstart\tend` is skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(path)
            .map_err(|e| QcError::from_csv(path, e))?;

        let mut depths = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| QcError::from_csv(path, e))?;
            if record.iter().take(HEADER_PREFIX.len()).eq(HEADER_PREFIX) {
                continue;
            }

            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let field = record.get(DEPTH_COLUMN).ok_or_else(|| QcError::Malformed {
                path: path.to_path_buf(),
                line,
                reason: format!(
                    "expected at least {} columns, found {}",
                    DEPTH_COLUMN + 1,
                    record.len()
                ),
            })?;
            let depth = field.trim().parse::<u64>().map_err(|e| QcError::Malformed {
                path: path.to_path_buf(),
                line,
                reason: format!("invalid depth '{field}': {e}"),
            })?;
            depths.push(depth);
        }

        debug!("{}: {} positions", path.display(), depths.len());
        Self::from_depths(&depths).ok_or_else(|| QcError::EmptyInput {
            path: path.to_path_buf(),
        })
    }
}

/// Round to `decimals` places.
///
/// Goes through decimal formatting, so ties are resolved on the exact binary
/// value and exact halves round to even (2.25 becomes 2.2).
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

/// [`round_to`] rendered as text. Whole results keep one decimal (`10.0`).
pub fn format_rounded(value: f64, decimals: usize) -> String {
    let rounded = round_to(value, decimals);
    if rounded.is_finite() && rounded.fract() == 0.0 {
        format!("{rounded:.1}")
    } else {
        rounded.to_string()
    }
}
