//! Run configuration for island calling.
//!
//! All scalars are carried explicitly in an [`IslandConfig`] that every stage
//! receives by reference. Nothing is process-global.

use crate::error::IslandError;

/// Normalization denominator for window coverage (reads per million).
pub const NORMALIZATION_SCALE: f64 = 1_000_000.0;

/// Island-calling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandConfig {
    /// Window size in bp (200 for histone marks, 50 for factors)
    pub window_size: u64,
    /// Maximum base-pair gap between windows of one island
    pub gap_size: u64,
    /// Fragment size; reads are shifted by half of it
    pub fragment_size: u64,
    /// Maximum reads kept per (chromosome, start, strand)
    pub redundancy: u32,
    /// Fraction of the genome that is mappable
    pub genome_fraction: f64,
    /// False discovery rate cutoff on island alpha
    pub fdr: f64,
    /// Expected number of null windows passing the window threshold
    pub e_value: f64,
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl IslandConfig {
    pub fn new() -> Self {
        Self {
            window_size: 200,
            gap_size: 600,
            fragment_size: 150,
            redundancy: 1,
            genome_fraction: 0.74,
            fdr: 0.01,
            e_value: 1000.0,
        }
    }

    pub fn with_window_size(mut self, w: u64) -> Self {
        self.window_size = w;
        self
    }

    pub fn with_gap_size(mut self, g: u64) -> Self {
        self.gap_size = g;
        self
    }

    pub fn with_fragment_size(mut self, f: u64) -> Self {
        self.fragment_size = f;
        self
    }

    pub fn with_redundancy(mut self, r: u32) -> Self {
        self.redundancy = r;
        self
    }

    pub fn with_genome_fraction(mut self, p: f64) -> Self {
        self.genome_fraction = p;
        self
    }

    pub fn with_fdr(mut self, q: f64) -> Self {
        self.fdr = q;
        self
    }

    pub fn with_e_value(mut self, e: f64) -> Self {
        self.e_value = e;
        self
    }

    /// Shift applied to each read before binning.
    #[inline]
    pub fn shift(&self) -> u64 {
        self.fragment_size / 2
    }

    /// Reject parameter combinations the statistics are undefined for.
    pub fn validate(&self) -> Result<(), IslandError> {
        if self.window_size == 0 {
            return Err(IslandError::Configuration(
                "window size must be positive".to_string(),
            ));
        }
        if !(self.genome_fraction > 0.0 && self.genome_fraction <= 1.0) {
            return Err(IslandError::Configuration(format!(
                "genome fraction must be in (0, 1], got {}",
                self.genome_fraction
            )));
        }
        if !(self.fdr > 0.0 && self.fdr <= 1.0) {
            return Err(IslandError::Configuration(format!(
                "FDR must be in (0, 1], got {}",
                self.fdr
            )));
        }
        if !(self.e_value > 0.0 && self.e_value.is_finite()) {
            return Err(IslandError::Configuration(format!(
                "E-value must be positive, got {}",
                self.e_value
            )));
        }
        Ok(())
    }
}
