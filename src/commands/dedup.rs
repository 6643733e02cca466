//! Redundant read removal.
//!
//! Single pass over coordinate-sorted reads. Reads sharing a chromosome,
//! start and strand are identical for clustering purposes; at most
//! `redundancy` of them are kept.

use crate::bed::BedReader;
use crate::error::IslandError;
use crate::interval::Read;
use crate::streaming::output::RecordWriter;
use crate::streaming::validation::SortValidator;
use log::{debug, info};
use std::fmt;
use std::io::{self, Read as IoRead, Write};

/// Deduplication command configuration.
#[derive(Debug, Clone)]
pub struct DedupCommand {
    /// Maximum reads retained per (chromosome, start, strand)
    pub redundancy: u32,
}

impl Default for DedupCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-position duplicate counters. Input is sorted by start, so only the
/// counters for the current position are ever needed.
#[derive(Debug, Default)]
struct PositionCounter {
    chrom: String,
    start: u64,
    per_strand: [u32; 3],
    active: bool,
}

impl PositionCounter {
    /// Record one more read at this key; returns whether it may be kept.
    #[inline]
    fn admit(&mut self, read: &Read, limit: u32) -> bool {
        if !self.active || read.start() != self.start || read.chrom() != self.chrom {
            if read.chrom() != self.chrom {
                self.chrom.clear();
                self.chrom.push_str(read.chrom());
            }
            self.start = read.start();
            self.per_strand = [0; 3];
            self.active = true;
        }
        let slot = &mut self.per_strand[read.strand.slot()];
        *slot += 1;
        *slot <= limit
    }
}

impl DedupCommand {
    pub fn new() -> Self {
        Self { redundancy: 1 }
    }

    /// Set the redundancy threshold.
    pub fn with_redundancy(mut self, r: u32) -> Self {
        self.redundancy = r;
        self
    }

    /// Remove redundant reads from a sorted read sequence.
    ///
    /// Fails with `UnsortedInput` on the first read that breaks sort order.
    pub fn dedup<I>(&self, reads: I) -> Result<(Vec<Read>, DedupStats), IslandError>
    where
        I: IntoIterator<Item = Read>,
    {
        let mut validator = SortValidator::new();
        let mut counter = PositionCounter::default();
        let mut stats = DedupStats::default();
        let mut kept = Vec::new();

        for read in reads {
            validator.validate(read.chrom(), read.start())?;
            stats.total += 1;
            if counter.admit(&read, self.redundancy) {
                stats.retained += 1;
                kept.push(read);
            }
        }

        debug!("Deduplication: {}", stats);
        Ok((kept, stats))
    }

    /// Stream a sorted BED source to `output`, dropping redundant reads.
    pub fn run_reader<R: IoRead, W: Write>(
        &self,
        reader: BedReader<R>,
        output: W,
    ) -> Result<DedupStats, IslandError> {
        let mut validator = SortValidator::new();
        let mut counter = PositionCounter::default();
        let mut stats = DedupStats::default();
        let mut writer = RecordWriter::new(output);

        for result in reader.records() {
            let read = result?;
            validator.validate(read.chrom(), read.start())?;
            stats.total += 1;
            if counter.admit(&read, self.redundancy) {
                stats.retained += 1;
                writer.write_read(&read)?;
            }
        }

        writer.flush()?;
        info!("Deduplication: {}", stats);
        Ok(stats)
    }

    /// Deduplicate stdin to `output`.
    pub fn run_stdin<W: Write>(&self, output: W) -> Result<DedupStats, IslandError> {
        let stdin = io::stdin();
        self.run_reader(BedReader::new(stdin.lock()), output)
    }
}

/// Statistics from deduplication.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    pub total: u64,
    pub retained: u64,
}

impl DedupStats {
    pub fn removed(&self) -> u64 {
        self.total - self.retained
    }
}

impl fmt::Display for DedupStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={}, retained={}, removed={}",
            self.total,
            self.retained,
            self.removed()
        )
    }
}
