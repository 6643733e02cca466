//! Island indexing for fast point membership queries.

use crate::interval::Interval;
use crate::island::Island;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Retained islands organized by chromosome.
/// Each chromosome holds disjoint `[start, end)` ranges sorted by start, so
/// membership is one binary search.
#[derive(Debug, Clone, Default)]
pub struct IslandIndex {
    ranges_by_chrom: HashMap<String, Vec<(u64, u64)>>,
    len: usize,
}

impl IslandIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from intervals. Overlapping or touching intervals on a
    /// chromosome are coalesced.
    pub fn from_intervals<'a, I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        let mut by_chrom: HashMap<String, Vec<(u64, u64)>> = HashMap::new();
        let mut len = 0;

        for interval in intervals {
            by_chrom
                .entry(interval.chrom.clone())
                .or_default()
                .push((interval.start, interval.end));
            len += 1;
        }

        for ranges in by_chrom.values_mut() {
            ranges.sort_unstable();
            let mut merged: Vec<(u64, u64)> = Vec::with_capacity(ranges.len());
            for &(start, end) in ranges.iter() {
                match merged.last_mut() {
                    Some(last) if start <= last.1 => last.1 = last.1.max(end),
                    _ => merged.push((start, end)),
                }
            }
            *ranges = merged;
        }

        Self {
            ranges_by_chrom: by_chrom,
            len,
        }
    }

    /// Build an index from islands.
    pub fn from_islands(islands: &[Island]) -> Self {
        Self::from_intervals(islands.iter().map(|i| &i.interval))
    }

    /// Check if `pos` lies inside any indexed island on `chrom`.
    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        let Some(ranges) = self.ranges_by_chrom.get(chrom) else {
            return false;
        };
        ranges
            .binary_search_by(|&(start, end)| {
                if end <= pos {
                    Ordering::Less
                } else if start > pos {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Number of intervals the index was built from.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
