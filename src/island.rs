//! Candidate island records.

use crate::interval::Interval;
use std::fmt;

/// Fold change of observed over expected chip reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FoldChange {
    Finite(f64),
    /// Expected count was zero while reads were observed
    Unbounded,
}

impl FoldChange {
    /// Ratio of `observed` to `expected`, with the zero-expectation sentinel.
    pub fn ratio(observed: u64, expected: f64) -> Self {
        if expected > 0.0 {
            FoldChange::Finite(observed as f64 / expected)
        } else if observed > 0 {
            FoldChange::Unbounded
        } else {
            FoldChange::Finite(0.0)
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, FoldChange::Unbounded)
    }
}

impl Default for FoldChange {
    fn default() -> Self {
        FoldChange::Finite(0.0)
    }
}

impl fmt::Display for FoldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoldChange::Finite(v) => write!(f, "{}", v),
            FoldChange::Unbounded => write!(f, "inf"),
        }
    }
}

/// A run of gap-merged enriched windows on one chromosome.
///
/// Coordinates and score come from clustering. The read counts and
/// statistics are filled in by the significance stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Island {
    pub interval: Interval,
    /// Sum of member window scores
    pub score: f64,
    /// Sum of member window counts; advisory only
    pub window_reads: u64,
    pub chip: u64,
    pub control: u64,
    pub pvalue: f64,
    pub fold_change: FoldChange,
    /// Benjamini-Hochberg adjusted p-value
    pub alpha: f64,
}

impl Island {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            interval: Interval::new(chrom, start, end),
            score: 0.0,
            window_reads: 0,
            chip: 0,
            control: 0,
            pvalue: 1.0,
            fold_change: FoldChange::default(),
            alpha: 1.0,
        }
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        &self.interval.chrom
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.interval.start
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.interval.end
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.interval.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.interval.is_empty()
    }
}

/// Summary line: chrom, start, end, chip, control, pvalue, fold change, alpha.
impl fmt::Display for Island {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.interval, self.chip, self.control, self.pvalue, self.fold_change, self.alpha
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_change_ratio() {
        assert_eq!(FoldChange::ratio(10, 2.0), FoldChange::Finite(5.0));
        assert_eq!(FoldChange::ratio(3, 0.0), FoldChange::Unbounded);
        assert_eq!(FoldChange::ratio(0, 0.0), FoldChange::Finite(0.0));
        assert!(FoldChange::ratio(3, 0.0).is_unbounded());
    }

    #[test]
    fn test_summary_display() {
        let mut island = Island::new("chr1", 200, 600);
        island.chip = 10;
        island.control = 0;
        island.pvalue = 0.5;
        island.fold_change = FoldChange::Unbounded;
        island.alpha = 1.0;
        assert_eq!(island.to_string(), "chr1\t200\t600\t10\t0\t0.5\tinf\t1");
    }
}
