//! Parallel processing utilities using Rayon.

use crate::bed::Result as BedResult;
use crate::bed::{BedError, FastReadParser};
use crate::genome::Genome;
use crate::interval::Read;
use crate::streaming::parsing::should_skip_line;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Minimum number of reads before enabling parallelization.
/// Below this threshold, sequential processing is faster due to
/// thread spawn overhead.
pub const PARALLEL_THRESHOLD: usize = 10_000;

/// Split chromosome-sorted reads into one contiguous slice per chromosome.
///
/// Reads must be grouped by chromosome (any chromosome order).
pub fn chromosome_slices(reads: &[Read]) -> Vec<(&str, &[Read])> {
    reads
        .chunk_by(|a, b| a.chrom() == b.chrom())
        .map(|chunk| (chunk[0].chrom(), chunk))
        .collect()
}

/// Apply `f` to each chromosome's reads, in parallel for large inputs.
///
/// Results keep the input chromosome order.
pub fn process_chromosomes<'a, F, T>(reads: &'a [Read], f: F) -> Vec<(&'a str, T)>
where
    F: Fn(&'a str, &'a [Read]) -> T + Sync + Send,
    T: Send,
{
    let slices = chromosome_slices(reads);
    if reads.len() < PARALLEL_THRESHOLD {
        slices
            .into_iter()
            .map(|(chrom, chunk)| (chrom, f(chrom, chunk)))
            .collect()
    } else {
        slices
            .into_par_iter()
            .map(|(chrom, chunk)| (chrom, f(chrom, chunk)))
            .collect()
    }
}

/// Sort chromosome names by genome order; unknown chromosomes go last,
/// alphabetically.
pub fn sort_by_genome_order(chroms: &mut [String], genome: &Genome) {
    chroms.sort_by(|a, b| {
        let ra = genome.chrom_rank(a).unwrap_or(usize::MAX);
        let rb = genome.chrom_rank(b).unwrap_or(usize::MAX);
        ra.cmp(&rb).then_with(|| a.cmp(b))
    });
}

/// Parallel sort of reads by chromosome, start, end and strand.
///
/// The sort is stable so reads sharing a key keep their input order.
pub fn parallel_sort_reads(mut reads: Vec<Read>) -> Vec<Read> {
    reads.par_sort_by(|a, b| {
        a.chrom()
            .cmp(b.chrom())
            .then(a.start().cmp(&b.start()))
            .then(a.end().cmp(&b.end()))
            .then(a.strand.slot().cmp(&b.strand.slot()))
    });
    reads
}

/// Read a BED file and parse its lines in parallel.
///
/// Only coordinates and strand are kept. A malformed line is an error.
pub fn parallel_read_reads<P: AsRef<Path>>(path: P) -> BedResult<Vec<Read>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let lines: Vec<String> = reader
        .lines()
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|l| !should_skip_line(l.trim().as_bytes()))
        .collect();

    let parser = FastReadParser::new();
    lines
        .par_iter()
        .enumerate()
        .map(|(i, line)| {
            parser
                .parse_read(line.as_bytes())
                .ok_or_else(|| BedError::InvalidFormat(format!("Malformed read line {}: {}", i + 1, line)))
        })
        .collect()
}
