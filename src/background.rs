//! Poisson background model for window read counts.
//!
//! Under the null hypothesis reads fall uniformly over the effective genome,
//! so the count in any window is Poisson with rate
//! `lambda = total_reads * window_size / effective_genome_size`.
//! A window's score is the negative log of its upper-tail probability.

use crate::error::IslandError;
use statrs::distribution::{Discrete, DiscreteCDF, Poisson};
use std::fmt;

/// Tail probabilities below this are recomputed in log space.
const LOG_SPACE_CUTOFF: f64 = 1e-250;

/// Series terms smaller than this fraction of the running sum are dropped.
const SERIES_TOLERANCE: f64 = 1e-17;

/// Build a Poisson distribution, mapping the statrs error into ours.
pub(crate) fn poisson(lambda: f64) -> Result<Poisson, IslandError> {
    Poisson::new(lambda)
        .map_err(|e| IslandError::Statistics(format!("Poisson rate {}: {}", lambda, e)))
}

/// Natural log of `P(X >= k)` for `X ~ dist`.
///
/// Falls back to summing the tail in log space when the direct survival
/// function underflows, so very large counts keep a finite score.
pub(crate) fn ln_upper_tail(dist: &Poisson, k: u64) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let sf = dist.sf(k - 1);
    if sf > LOG_SPACE_CUTOFF {
        return sf.ln();
    }

    // P(X >= k) = pmf(k) * sum_j prod_{i=1..j} lambda / (k + i)
    let lambda = dist.lambda();
    let mut term = 1.0_f64;
    let mut sum = 1.0_f64;
    let mut j = 1u64;
    loop {
        term *= lambda / (k + j) as f64;
        sum += term;
        if term < sum * SERIES_TOLERANCE || j > 100_000 {
            break;
        }
        j += 1;
    }
    dist.ln_pmf(k) + sum.ln()
}

/// `P(X >= k)`.
#[inline]
pub(crate) fn upper_tail(dist: &Poisson, k: u64) -> f64 {
    ln_upper_tail(dist, k).exp()
}

/// Calibrated per-window eligibility threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowThreshold {
    /// Smallest read count a window needs to seed or extend an island
    pub min_count: u64,
    /// Score of a window holding exactly `min_count` reads
    pub score: f64,
}

impl WindowThreshold {
    #[inline]
    pub fn is_eligible(&self, count: u64) -> bool {
        count >= self.min_count
    }
}

impl fmt::Display for WindowThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min_count={}, score={:.4}", self.min_count, self.score)
    }
}

/// Genome-wide background rate and window scoring.
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    total_reads: u64,
    window_size: u64,
    effective_genome_size: u64,
    lambda: f64,
    dist: Poisson,
}

impl BackgroundModel {
    /// Build the model from the sample's read total.
    pub fn new(
        total_reads: u64,
        window_size: u64,
        effective_genome_size: u64,
    ) -> Result<Self, IslandError> {
        if window_size == 0 || effective_genome_size == 0 {
            return Err(IslandError::Configuration(format!(
                "background needs a positive window size and genome size (got {} and {})",
                window_size, effective_genome_size
            )));
        }
        if total_reads == 0 {
            return Err(IslandError::EmptyInput(
                "no reads to estimate the background rate".to_string(),
            ));
        }

        let lambda = total_reads as f64 * window_size as f64 / effective_genome_size as f64;
        Ok(Self {
            total_reads,
            window_size,
            effective_genome_size,
            lambda,
            dist: poisson(lambda)?,
        })
    }

    /// Expected reads per window under the null.
    #[inline]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn total_reads(&self) -> u64 {
        self.total_reads
    }

    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    pub fn effective_genome_size(&self) -> u64 {
        self.effective_genome_size
    }

    /// Number of windows tiling the effective genome.
    pub fn num_windows(&self) -> u64 {
        self.effective_genome_size.div_ceil(self.window_size)
    }

    /// `P(X >= count)` under the background rate.
    #[inline]
    pub fn tail_probability(&self, count: u64) -> f64 {
        upper_tail(&self.dist, count)
    }

    /// `-ln P(X >= count)`. Zero for an empty window, increasing in count.
    #[inline]
    pub fn window_score(&self, count: u64) -> f64 {
        -ln_upper_tail(&self.dist, count)
    }

    /// Smallest count whose window score reaches `score`.
    pub fn min_count_for_score(&self, score: f64) -> u64 {
        if score <= 0.0 {
            return 0;
        }
        if !score.is_finite() {
            return u64::MAX;
        }
        let mut k = 0;
        while self.window_score(k) < score {
            k += 1;
        }
        k
    }

    /// Expected number of null windows, out of `num_windows`, whose score is
    /// at least `score_threshold`.
    pub fn expected_island_count(&self, score_threshold: f64, num_windows: u64) -> f64 {
        let k = self.min_count_for_score(score_threshold);
        if k == u64::MAX {
            return 0.0;
        }
        num_windows as f64 * self.tail_probability(k)
    }

    /// Lowest window threshold whose expected false-positive window count
    /// over the effective genome is at most `e_value`.
    pub fn calibrate(&self, e_value: f64) -> WindowThreshold {
        let num_windows = self.num_windows() as f64;
        let mut k = 1;
        while num_windows * self.tail_probability(k) > e_value {
            k += 1;
        }
        WindowThreshold {
            min_count: k,
            score: self.window_score(k),
        }
    }
}

impl fmt::Display for BackgroundModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reads={}, window={}bp, effective_genome={}bp, lambda={:.6}",
            self.total_reads, self.window_size, self.effective_genome_size, self.lambda
        )
    }
}
