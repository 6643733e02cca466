//! Island significance: exact read attribution, Poisson p-values, fold
//! change and Benjamini-Hochberg correction.

use crate::background::{poisson, upper_tail};
use crate::commands::windows::ReadPositions;
use crate::error::IslandError;
use crate::island::{FoldChange, Island};
use log::{info, warn};
use rayon::prelude::*;
use std::fmt;

/// Significance scoring for candidate islands.
#[derive(Debug, Clone)]
pub struct SignificanceCommand {
    /// Sample reads counted into windows
    pub chip_total: u64,
    /// Control reads counted into windows
    pub control_total: u64,
    /// Effective genome size in bp
    pub effective_genome_size: u64,
}

/// Totals over all scored islands.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignificanceStats {
    pub islands: usize,
    pub chip_in_islands: u64,
    pub control_in_islands: u64,
    pub background_only: usize,
    pub unbounded_fold: usize,
}

impl fmt::Display for SignificanceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "islands={}, chip_in_islands={}, control_in_islands={}, background_only={}, unbounded_fold={}",
            self.islands,
            self.chip_in_islands,
            self.control_in_islands,
            self.background_only,
            self.unbounded_fold
        )
    }
}

/// `P(X >= observed)` for `X ~ Poisson(expected)`.
pub fn poisson_pvalue(observed: u64, expected: f64) -> Result<f64, IslandError> {
    if observed == 0 {
        return Ok(1.0);
    }
    if expected <= 0.0 {
        return Ok(0.0);
    }
    Ok(upper_tail(&poisson(expected)?, observed))
}

impl SignificanceCommand {
    pub fn new(chip_total: u64, control_total: u64, effective_genome_size: u64) -> Self {
        Self {
            chip_total,
            control_total,
            effective_genome_size,
        }
    }

    /// Sample-to-control library size ratio.
    pub fn scaling_factor(&self) -> f64 {
        if self.control_total == 0 {
            0.0
        } else {
            self.chip_total as f64 / self.control_total as f64
        }
    }

    /// Expected chip reads over `length` bp under a uniform genome-wide rate.
    pub fn background_expectation(&self, length: u64) -> f64 {
        if self.effective_genome_size == 0 {
            return 0.0;
        }
        self.chip_total as f64 * length as f64 / self.effective_genome_size as f64
    }

    /// Expected chip reads for an island holding `control` control reads.
    ///
    /// Local control density, scaled to the sample library, when any
    /// control read falls inside; otherwise the genome-wide rate.
    pub fn expected_count(&self, control: u64, length: u64) -> f64 {
        if control > 0 {
            control as f64 * self.scaling_factor()
        } else {
            self.background_expectation(length)
        }
    }

    /// Fill in p-value and fold change for an island with known counts.
    pub fn score_island(&self, island: &mut Island) -> Result<(), IslandError> {
        let expected = self.expected_count(island.control, island.len());
        island.pvalue = poisson_pvalue(island.chip, expected)?;
        island.fold_change = FoldChange::ratio(island.chip, expected);
        Ok(())
    }

    /// Attribute reads, score every island, then apply BH correction.
    ///
    /// Counts use the exact shifted read positions inside each island, not
    /// the clustered window sums.
    pub fn run(
        &self,
        islands: &mut [Island],
        chip: &ReadPositions,
        control: &ReadPositions,
    ) -> Result<SignificanceStats, IslandError> {
        if self.control_total == 0 {
            warn!("Control library is empty; every island is tested against the genome-wide background");
        }

        islands.par_iter_mut().try_for_each(|island| {
            island.chip = chip.count_in(island.chrom(), island.start(), island.end());
            island.control = control.count_in(island.chrom(), island.start(), island.end());
            self.score_island(island)
        })?;

        let mut stats = SignificanceStats {
            islands: islands.len(),
            ..Default::default()
        };
        for island in islands.iter() {
            stats.chip_in_islands += island.chip;
            stats.control_in_islands += island.control;
            if island.control == 0 {
                stats.background_only += 1;
            }
            if island.fold_change.is_unbounded() {
                stats.unbounded_fold += 1;
                warn!(
                    "Island {} has zero expected reads; fold change reported as inf",
                    island.interval
                );
            }
        }

        benjamini_hochberg(islands);
        info!("Significance: {}", stats);
        Ok(stats)
    }
}

/// Benjamini-Hochberg adjustment of island p-values into `alpha`.
///
/// Islands are ranked by p-value with a stable sort, so equal p-values keep
/// coordinate order. `alpha_i = min(1, p_i * M / i)` followed by a running
/// minimum from the largest rank down, which also gives tied p-values the
/// same alpha.
pub fn benjamini_hochberg(islands: &mut [Island]) {
    let m = islands.len();
    if m == 0 {
        return;
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| islands[a].pvalue.total_cmp(&islands[b].pvalue));

    let mut running = 1.0_f64;
    for (rank0, &idx) in order.iter().enumerate().rev() {
        let rank = (rank0 + 1) as f64;
        let adjusted = (islands[idx].pvalue * m as f64 / rank).min(1.0);
        running = running.min(adjusted);
        islands[idx].alpha = running;
    }
}
