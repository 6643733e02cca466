//! Read re-attribution: keep reads whose shifted position falls inside a
//! significant island and re-window them.

use crate::commands::windows::{Aggregation, WindowCommand};
use crate::genome::Genome;
use crate::index::IslandIndex;
use crate::interval::Read;
use crate::parallel::process_chromosomes;
use log::info;
use std::fmt;

/// Re-attribution command.
#[derive(Debug, Clone)]
pub struct ReattributeCommand {
    pub windows: WindowCommand,
}

/// Reads retained inside significant islands and their window counts.
#[derive(Debug, Clone, Default)]
pub struct Reattribution {
    pub reads: Vec<Read>,
    pub aggregation: Aggregation,
    pub discarded: u64,
}

impl Reattribution {
    pub fn retained(&self) -> u64 {
        self.reads.len() as u64
    }
}

impl fmt::Display for Reattribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "retained={}, discarded={}",
            self.retained(),
            self.discarded
        )
    }
}

impl ReattributeCommand {
    pub fn new(windows: WindowCommand) -> Self {
        Self { windows }
    }

    /// Whether the read's shifted position lies in an indexed island.
    #[inline]
    fn is_inside(&self, read: &Read, index: &IslandIndex, genome: &Genome) -> bool {
        genome
            .chrom_size(read.chrom())
            .and_then(|size| self.windows.position_in_bounds(read, size))
            .is_some_and(|pos| index.contains(read.chrom(), pos))
    }

    /// Partition `reads` by island membership and aggregate the retained
    /// ones. Normalized values of the result are relative to the retained
    /// count.
    pub fn run(&self, reads: &[Read], index: &IslandIndex, genome: &Genome) -> Reattribution {
        let per_chrom = process_chromosomes(reads, |_, chunk| {
            chunk
                .iter()
                .filter(|r| self.is_inside(r, index, genome))
                .cloned()
                .collect::<Vec<Read>>()
        });

        let kept: Vec<Read> = per_chrom.into_iter().flat_map(|(_, r)| r).collect();
        let discarded = (reads.len() - kept.len()) as u64;
        let aggregation = self.windows.aggregate(&kept, genome);

        let result = Reattribution {
            reads: kept,
            aggregation,
            discarded,
        };
        info!("Re-attribution: {}", result);
        result
    }
}
