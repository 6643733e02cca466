//! Sort validation for read streams.
//!
//! Deduplication and windowing require reads sorted by chromosome and start.
//! Sort validation checks that:
//! 1. All records for a chromosome are contiguous (no interleaving)
//! 2. Within a chromosome, start positions are non-decreasing
//!
//! Any consistent chromosome ordering is accepted (lexicographic or genome
//! order).

use crate::error::IslandError;
use crate::interval::Read;
use std::collections::HashSet;

/// Inline sort validator for use within streaming loops.
///
/// Validates as records are processed, so a file never has to be read twice.
#[derive(Debug, Default)]
pub struct SortValidator {
    prev_chrom: Option<String>,
    prev_start: u64,
    seen_chroms: HashSet<String>,
    record_count: usize,
}

impl SortValidator {
    /// Create a new sort validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that the given record maintains sort order.
    #[inline]
    pub fn validate(&mut self, chrom: &str, start: u64) -> Result<(), IslandError> {
        self.record_count += 1;

        match self.prev_chrom {
            Some(ref pc) if pc == chrom => {
                if start < self.prev_start {
                    return Err(IslandError::UnsortedInput {
                        record: self.record_count,
                        message: format!(
                            "position {} comes after {} on {}",
                            start, self.prev_start, chrom
                        ),
                    });
                }
            }
            Some(_) => {
                // Switching chromosomes - check we haven't seen this one before
                if self.seen_chroms.contains(chrom) {
                    return Err(IslandError::UnsortedInput {
                        record: self.record_count,
                        message: format!(
                            "chromosome '{}' was seen earlier (chromosomes must be contiguous)",
                            chrom
                        ),
                    });
                }
                if let Some(prev) = self.prev_chrom.replace(chrom.to_string()) {
                    self.seen_chroms.insert(prev);
                }
            }
            None => self.prev_chrom = Some(chrom.to_string()),
        }

        self.prev_start = start;
        Ok(())
    }

    /// Get the number of records validated.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}

/// Verify that an in-memory read set is sorted by chromosome and start.
pub fn verify_sorted_reads(reads: &[Read]) -> Result<(), IslandError> {
    let mut validator = SortValidator::new();
    for read in reads {
        validator.validate(read.chrom(), read.start())?;
    }
    Ok(())
}
