//! Core coordinate types: intervals, strands and aligned reads.

use std::fmt;

/// A genomic interval with chromosome, start, and end positions.
/// Uses 0-based, half-open coordinates (BED format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Create a new interval.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Returns the length of the interval.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the interval has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
    }
}

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }

    pub fn from_byte(b: u8) -> Self {
        match b {
            b'+' => Strand::Plus,
            b'-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }

    /// Slot used by per-position strand counters.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Strand::Plus => 0,
            Strand::Minus => 1,
            Strand::Unknown => 2,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Strand::Plus => b'+',
            Strand::Minus => b'-',
            Strand::Unknown => b'.',
        }
    }
}

/// A single aligned read.
///
/// Only the coordinates and strand take part in island calling. The name and
/// score columns are carried through so filtered reads can be written back
/// out unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Read {
    pub interval: Interval,
    pub strand: Strand,
    pub name: Option<String>,
    pub score: Option<f64>,
}

impl Read {
    /// Create a read without name or score.
    pub fn new(chrom: impl Into<String>, start: u64, end: u64, strand: Strand) -> Self {
        Self {
            interval: Interval::new(chrom, start, end),
            strand,
            name: None,
            score: None,
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

    /// Position of the fragment center implied by this read.
    ///
    /// Plus-strand (and unstranded) reads move `shift` bp downstream of the
    /// 5' start; minus-strand reads move `shift` bp upstream of their last
    /// base. Returns `None` when a minus-strand shift runs off the start of
    /// the chromosome.
    #[inline]
    pub fn shifted_position(&self, shift: u64) -> Option<u64> {
        match self.strand {
            Strand::Minus => self
                .interval
                .end
                .checked_sub(1)
                .and_then(|last| last.checked_sub(shift)),
            Strand::Plus | Strand::Unknown => Some(self.interval.start + shift),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifted_position_by_strand() {
        let plus = Read::new("chr1", 100, 150, Strand::Plus);
        let minus = Read::new("chr1", 100, 150, Strand::Minus);
        let unknown = Read::new("chr1", 100, 150, Strand::Unknown);

        assert_eq!(plus.shifted_position(75), Some(175));
        assert_eq!(minus.shifted_position(75), Some(74));
        assert_eq!(unknown.shifted_position(75), Some(175));
    }

    #[test]
    fn test_minus_shift_off_chromosome_start() {
        let minus = Read::new("chr1", 0, 30, Strand::Minus);
        assert_eq!(minus.shifted_position(75), None);
        assert_eq!(minus.shifted_position(29), Some(0));
    }
}
