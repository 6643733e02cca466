//! Island clustering.
//!
//! Single sweep per chromosome over windows in index order, like an
//! interval merge with a maximum distance. Only windows passing the
//! calibrated threshold open or extend an island; weaker windows lying in
//! a bridged gap are absorbed for their reads but add no score.

use crate::background::{BackgroundModel, WindowThreshold};
use crate::commands::windows::{Window, WindowCounts};
use crate::config::IslandConfig;
use crate::island::Island;
use log::{debug, info};
use rayon::prelude::*;
use std::fmt;

/// Island clustering configuration.
#[derive(Debug, Clone)]
pub struct IslandCommand {
    /// Maximum bp between an island's end and the next eligible window
    pub gap_size: u64,
    /// Window size in bp
    pub window_size: u64,
}

impl Default for IslandCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Islands in genome order with clustering statistics.
#[derive(Debug, Clone, Default)]
pub struct CandidateIslands {
    pub islands: Vec<Island>,
    pub eligible_windows: u64,
    pub absorbed_windows: u64,
}

impl CandidateIslands {
    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }
}

impl fmt::Display for CandidateIslands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "islands={}, eligible_windows={}, absorbed_windows={}",
            self.islands.len(),
            self.eligible_windows,
            self.absorbed_windows
        )
    }
}

/// Island under construction.
struct OpenIsland {
    start: u64,
    end: u64,
    score: f64,
    reads: u64,
    /// Reads of ineligible windows seen since `end`
    pending_reads: u64,
    pending_windows: u64,
}

impl IslandCommand {
    pub fn new() -> Self {
        Self {
            gap_size: 600,
            window_size: 200,
        }
    }

    pub fn from_config(config: &IslandConfig) -> Self {
        Self {
            gap_size: config.gap_size,
            window_size: config.window_size,
        }
    }

    /// Set the maximum merge gap.
    pub fn with_gap_size(mut self, g: u64) -> Self {
        self.gap_size = g;
        self
    }

    pub fn with_window_size(mut self, w: u64) -> Self {
        self.window_size = w;
        self
    }

    /// Cluster one chromosome's windows.
    ///
    /// Island ends are clipped to `chrom_size`. Returns islands in start
    /// order, the number of eligible windows and the number of absorbed
    /// below-threshold windows.
    pub fn cluster_chromosome(
        &self,
        chrom: &str,
        chrom_size: u64,
        windows: &[Window],
        model: &BackgroundModel,
        threshold: &WindowThreshold,
    ) -> (Vec<Island>, u64, u64) {
        let w = self.window_size;
        let mut islands = Vec::new();
        let mut current: Option<OpenIsland> = None;
        let mut eligible = 0u64;
        let mut absorbed = 0u64;

        for win in windows {
            let start = win.start(w);

            if !threshold.is_eligible(win.count) {
                if let Some(ref mut open) = current {
                    open.pending_reads += win.count;
                    open.pending_windows += 1;
                }
                continue;
            }

            eligible += 1;
            let score = model.window_score(win.count);

            match current {
                Some(ref mut open) if start - open.end <= self.gap_size => {
                    open.end = win.end(w);
                    open.score += score;
                    open.reads += open.pending_reads + win.count;
                    absorbed += open.pending_windows;
                    open.pending_reads = 0;
                    open.pending_windows = 0;
                }
                _ => {
                    if let Some(done) = current.take() {
                        islands.push(Self::close(chrom, chrom_size, done));
                    }
                    current = Some(OpenIsland {
                        start,
                        end: win.end(w),
                        score,
                        reads: win.count,
                        pending_reads: 0,
                        pending_windows: 0,
                    });
                }
            }
        }

        if let Some(done) = current {
            islands.push(Self::close(chrom, chrom_size, done));
        }

        (islands, eligible, absorbed)
    }

    fn close(chrom: &str, chrom_size: u64, open: OpenIsland) -> Island {
        let mut island = Island::new(chrom, open.start, open.end.min(chrom_size));
        island.score = open.score;
        island.window_reads = open.reads;
        island
    }

    /// Cluster every chromosome in parallel; islands come back in genome
    /// order.
    pub fn find_islands(
        &self,
        counts: &WindowCounts,
        model: &BackgroundModel,
        threshold: &WindowThreshold,
    ) -> CandidateIslands {
        let per_chrom: Vec<(Vec<Island>, u64, u64)> = counts
            .chroms
            .par_iter()
            .map(|chrom| {
                self.cluster_chromosome(
                    chrom,
                    counts.chrom_size(chrom),
                    counts.chrom_windows(chrom),
                    model,
                    threshold,
                )
            })
            .collect();

        let mut result = CandidateIslands::default();
        for (chrom, (islands, eligible, absorbed)) in counts.chroms.iter().zip(per_chrom) {
            debug!("{}: {} islands from {} eligible windows", chrom, islands.len(), eligible);
            result.eligible_windows += eligible;
            result.absorbed_windows += absorbed;
            result.islands.extend(islands);
        }

        info!("Clustering: {}", result);
        result
    }
}
