//! Window aggregation: sparse per-chromosome read counts.
//!
//! Every read is reduced to its shifted position, binned into
//! `position / window_size`, and counted. Only windows holding at least one
//! read are materialized.

use crate::config::IslandConfig;
use crate::genome::Genome;
use crate::interval::Read;
use crate::parallel::{process_chromosomes, sort_by_genome_order};
use log::{debug, info};
use rustc_hash::FxHashMap;
use std::fmt;

/// One non-empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub index: u64,
    pub count: u64,
}

impl Window {
    #[inline]
    pub fn start(&self, window_size: u64) -> u64 {
        self.index * window_size
    }

    #[inline]
    pub fn end(&self, window_size: u64) -> u64 {
        self.start(window_size) + window_size
    }
}

/// A normalized coverage record, ready for a bedgraph writer.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRecord<'a> {
    pub chrom: &'a str,
    pub start: u64,
    pub end: u64,
    pub value: f64,
}

/// Sparse window counts for one sample.
#[derive(Debug, Clone, Default)]
pub struct WindowCounts {
    /// Window size in bp
    pub window_size: u64,
    /// Chromosome -> windows strictly increasing by index
    pub windows: FxHashMap<String, Vec<Window>>,
    /// Chromosomes in genome order
    pub chroms: Vec<String>,
    /// Length of each chromosome holding windows
    pub chrom_sizes: FxHashMap<String, u64>,
    /// Reads counted into windows
    pub total_reads: u64,
    /// Reads dropped: unknown chromosome, or shifted off the chromosome
    pub out_of_bounds: u64,
}

impl WindowCounts {
    /// Windows of one chromosome (empty when it has no reads).
    pub fn chrom_windows(&self, chrom: &str) -> &[Window] {
        self.windows.get(chrom).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Length of a chromosome, unbounded when it holds no windows.
    pub fn chrom_size(&self, chrom: &str) -> u64 {
        self.chrom_sizes.get(chrom).copied().unwrap_or(u64::MAX)
    }

    /// Number of non-empty windows.
    pub fn window_count(&self) -> usize {
        self.windows.values().map(Vec::len).sum()
    }

    /// Iterate `(chrom, windows)` in genome order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Window])> {
        self.chroms
            .iter()
            .map(move |c| (c.as_str(), self.chrom_windows(c)))
    }

    /// Normalized records: `count * scale / total_reads`, window ends clipped
    /// to the chromosome length.
    pub fn normalized<'a>(
        &'a self,
        genome: &'a Genome,
        scale: f64,
    ) -> impl Iterator<Item = CoverageRecord<'a>> + 'a {
        let factor = if self.total_reads == 0 {
            0.0
        } else {
            scale / self.total_reads as f64
        };
        let w = self.window_size;
        self.iter().flat_map(move |(chrom, windows)| {
            let chrom_end = genome.chrom_size(chrom).unwrap_or(u64::MAX);
            windows.iter().map(move |win| CoverageRecord {
                chrom,
                start: win.start(w),
                end: win.end(w).min(chrom_end),
                value: win.count as f64 * factor,
            })
        })
    }
}

/// Sorted shifted read positions per chromosome, for exact range counts.
#[derive(Debug, Clone, Default)]
pub struct ReadPositions {
    positions: FxHashMap<String, Vec<u64>>,
    total: u64,
}

impl ReadPositions {
    /// Number of reads with shifted position in `[start, end)`.
    pub fn count_in(&self, chrom: &str, start: u64, end: u64) -> u64 {
        match self.positions.get(chrom) {
            Some(pos) => {
                let lo = pos.partition_point(|&p| p < start);
                let hi = pos.partition_point(|&p| p < end);
                (hi - lo) as u64
            }
            None => 0,
        }
    }

    /// Total positions held.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub counts: WindowCounts,
    pub positions: ReadPositions,
}

/// Window aggregation command.
#[derive(Debug, Clone)]
pub struct WindowCommand {
    /// Window size in bp
    pub window_size: u64,
    /// Shift applied to each read (half the fragment size)
    pub shift: u64,
}

impl Default for WindowCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-chromosome aggregation result.
struct ChromBins {
    windows: Vec<Window>,
    positions: Vec<u64>,
    dropped: u64,
}

impl WindowCommand {
    pub fn new() -> Self {
        Self {
            window_size: 200,
            shift: 75,
        }
    }

    pub fn from_config(config: &IslandConfig) -> Self {
        Self::new()
            .with_window_size(config.window_size)
            .with_shift(config.shift())
    }

    pub fn with_window_size(mut self, w: u64) -> Self {
        self.window_size = w;
        self
    }

    pub fn with_shift(mut self, shift: u64) -> Self {
        self.shift = shift;
        self
    }

    /// Shifted position of a read if it lands inside a chromosome of
    /// `chrom_size` bp.
    #[inline]
    pub fn position_in_bounds(&self, read: &Read, chrom_size: u64) -> Option<u64> {
        read.shifted_position(self.shift)
            .filter(|&pos| pos < chrom_size)
    }

    /// Bin one chromosome's reads.
    fn bin_chromosome(&self, reads: &[Read], chrom_size: Option<u64>) -> ChromBins {
        let Some(chrom_size) = chrom_size else {
            return ChromBins {
                windows: Vec::new(),
                positions: Vec::new(),
                dropped: reads.len() as u64,
            };
        };

        let mut positions: Vec<u64> = reads
            .iter()
            .filter_map(|r| self.position_in_bounds(r, chrom_size))
            .collect();
        let dropped = (reads.len() - positions.len()) as u64;

        // Minus-strand shifts can reorder neighbours
        positions.sort_unstable();

        let mut windows: Vec<Window> = Vec::new();
        for &pos in &positions {
            let index = pos / self.window_size;
            match windows.last_mut() {
                Some(last) if last.index == index => last.count += 1,
                _ => windows.push(Window { index, count: 1 }),
            }
        }

        ChromBins {
            windows,
            positions,
            dropped,
        }
    }

    /// Aggregate chromosome-grouped reads into sparse windows.
    pub fn aggregate(&self, reads: &[Read], genome: &Genome) -> Aggregation {
        let per_chrom = process_chromosomes(reads, |chrom, chunk| {
            self.bin_chromosome(chunk, genome.chrom_size(chrom))
        });

        let mut agg = Aggregation::default();
        agg.counts.window_size = self.window_size;

        for (chrom, bins) in per_chrom {
            agg.counts.out_of_bounds += bins.dropped;
            if bins.windows.is_empty() {
                continue;
            }
            let counted = bins.positions.len() as u64;
            if let Some(size) = genome.chrom_size(chrom) {
                agg.counts.chrom_sizes.insert(chrom.to_string(), size);
            }
            debug!(
                "{}: {} reads in {} windows",
                chrom,
                counted,
                bins.windows.len()
            );
            agg.counts.total_reads += counted;
            agg.positions.total += counted;

            match agg.counts.windows.get_mut(chrom) {
                // A chromosome split across two runs (unsorted input);
                // fold it back in
                Some(existing) => {
                    merge_windows(existing, &bins.windows);
                    let pos = agg.positions.positions.entry(chrom.to_string()).or_default();
                    pos.extend_from_slice(&bins.positions);
                    pos.sort_unstable();
                }
                None => {
                    agg.counts.chroms.push(chrom.to_string());
                    agg.counts.windows.insert(chrom.to_string(), bins.windows);
                    agg.positions
                        .positions
                        .insert(chrom.to_string(), bins.positions);
                }
            }
        }

        sort_by_genome_order(&mut agg.counts.chroms, genome);

        if agg.counts.out_of_bounds > 0 {
            info!(
                "{} reads fell outside the genome after shifting and were skipped",
                agg.counts.out_of_bounds
            );
        }
        agg
    }
}

/// Merge `extra` into `target`, keeping indices strictly increasing.
fn merge_windows(target: &mut Vec<Window>, extra: &[Window]) {
    let mut merged = Vec::with_capacity(target.len() + extra.len());
    let (mut i, mut j) = (0, 0);
    while i < target.len() || j < extra.len() {
        let next = match (target.get(i), extra.get(j)) {
            (Some(a), Some(b)) if a.index == b.index => {
                i += 1;
                j += 1;
                Window {
                    index: a.index,
                    count: a.count + b.count,
                }
            }
            (Some(a), Some(b)) if a.index < b.index => {
                i += 1;
                *a
            }
            (Some(a), None) => {
                i += 1;
                *a
            }
            (_, Some(b)) => {
                j += 1;
                *b
            }
            (None, None) => break,
        };
        merged.push(next);
    }
    *target = merged;
}

impl fmt::Display for WindowCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reads={}, windows={}, chromosomes={}, out_of_bounds={}",
            self.total_reads,
            self.window_count(),
            self.chroms.len(),
            self.out_of_bounds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Strand;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn genome() -> Genome {
        [("chr1", 1000u64), ("chr2", 500)].into_iter().collect()
    }

    fn plus(chrom: &str, start: u64) -> Read {
        Read::new(chrom, start, start + 25, Strand::Plus)
    }

    #[test]
    fn test_basic_binning() {
        let reads = vec![plus("chr1", 10), plus("chr1", 50), plus("chr1", 250)];
        let cmd = WindowCommand::new().with_window_size(100).with_shift(0);

        let agg = cmd.aggregate(&reads, &genome());

        assert_eq!(
            agg.counts.chrom_windows("chr1"),
            &[Window { index: 0, count: 2 }, Window { index: 2, count: 1 }]
        );
        assert_eq!(agg.counts.total_reads, 3);
        assert_eq!(agg.positions.count_in("chr1", 0, 100), 2);
    }

    #[test]
    fn test_strand_aware_shift() {
        // Plus read at 80 shifts to 130; minus read ending at 250 shifts to 199
        let reads = vec![
            Read::new("chr1", 80, 100, Strand::Plus),
            Read::new("chr1", 200, 250, Strand::Minus),
        ];
        let cmd = WindowCommand::new().with_window_size(100).with_shift(50);

        let agg = cmd.aggregate(&reads, &genome());

        assert_eq!(agg.counts.chrom_windows("chr1"), &[Window { index: 1, count: 2 }]);
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        let reads = vec![
            plus("chr1", 990),                           // shifts past 1000
            Read::new("chr1", 0, 10, Strand::Minus),     // shifts below 0
            plus("chrUn", 10),                           // not in genome
            plus("chr2", 100),
        ];
        let cmd = WindowCommand::new().with_window_size(100).with_shift(20);

        let agg = cmd.aggregate(&reads, &genome());

        assert_eq!(agg.counts.total_reads, 1);
        assert_eq!(agg.counts.out_of_bounds, 3);
        assert!(agg.counts.chrom_windows("chr1").is_empty());
        assert_eq!(agg.counts.chroms, vec!["chr2"]);
    }

    #[test]
    fn test_normalized_values_and_clipping() {
        let reads = vec![plus("chr2", 10), plus("chr2", 20), plus("chr2", 480), plus("chr2", 490)];
        let cmd = WindowCommand::new().with_window_size(200).with_shift(0);
        let g = genome();

        let agg = cmd.aggregate(&reads, &g);
        let records: Vec<_> = agg.counts.normalized(&g, 1_000_000.0).collect();

        assert_eq!(records.len(), 2);
        assert_eq!((records[0].start, records[0].end), (0, 200));
        assert!((records[0].value - 500_000.0).abs() < 1e-9);
        // Last window clipped to the 500bp chromosome
        assert_eq!((records[1].start, records[1].end), (400, 500));
    }

    #[test]
    fn test_split_chromosome_runs_are_merged() {
        let reads = vec![plus("chr1", 10), plus("chr2", 10), plus("chr1", 15), plus("chr1", 300)];
        let cmd = WindowCommand::new().with_window_size(100).with_shift(0);

        let agg = cmd.aggregate(&reads, &genome());

        assert_eq!(
            agg.counts.chrom_windows("chr1"),
            &[Window { index: 0, count: 2 }, Window { index: 3, count: 1 }]
        );
        assert_eq!(agg.positions.count_in("chr1", 0, 1000), 3);
    }

    #[test]
    fn test_random_reads_conserve_counts() {
        let mut rng = SmallRng::seed_from_u64(11);
        let g: Genome = [("chr1", 100_000u64), ("chr2", 50_000)].into_iter().collect();
        let mut reads = Vec::new();
        for (chrom, len) in [("chr1", 100_000u64), ("chr2", 50_000)] {
            let mut starts: Vec<u64> = (0..3000).map(|_| rng.gen_range(0..len)).collect();
            starts.sort_unstable();
            for s in starts {
                let strand = if rng.gen_bool(0.5) { Strand::Plus } else { Strand::Minus };
                reads.push(Read::new(chrom, s, (s + 36).min(len), strand));
            }
        }

        let agg = WindowCommand::new().aggregate(&reads, &g);

        let sum: u64 = agg.counts.iter().flat_map(|(_, w)| w.iter()).map(|w| w.count).sum();
        assert_eq!(sum, agg.counts.total_reads);
        assert_eq!(agg.counts.total_reads + agg.counts.out_of_bounds, reads.len() as u64);
        assert_eq!(agg.positions.total(), agg.counts.total_reads);
        for (_, windows) in agg.counts.iter() {
            assert!(windows.iter().all(|w| w.count > 0));
            assert!(windows.windows(2).all(|p| p[0].index < p[1].index));
        }
    }

    #[test]
    fn test_merge_windows() {
        let mut target = vec![Window { index: 1, count: 1 }, Window { index: 4, count: 2 }];
        merge_windows(
            &mut target,
            &[Window { index: 0, count: 1 }, Window { index: 4, count: 1 }],
        );
        assert_eq!(
            target,
            vec![
                Window { index: 0, count: 1 },
                Window { index: 1, count: 1 },
                Window { index: 4, count: 3 }
            ]
        );
    }
}
