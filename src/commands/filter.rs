//! FDR filtering of scored islands.

use crate::error::IslandError;
use crate::index::IslandIndex;
use crate::island::Island;
use log::info;

/// Keeps islands whose BH-adjusted p-value is at most `fdr`.
#[derive(Debug, Clone)]
pub struct SignificanceFilter {
    pub fdr: f64,
}

impl Default for SignificanceFilter {
    fn default() -> Self {
        Self { fdr: 0.01 }
    }
}

impl SignificanceFilter {
    pub fn new(fdr: f64) -> Result<Self, IslandError> {
        if !(fdr > 0.0 && fdr <= 1.0) {
            return Err(IslandError::Configuration(format!(
                "FDR must be in (0, 1], got {}",
                fdr
            )));
        }
        Ok(Self { fdr })
    }

    #[inline]
    pub fn passes(&self, island: &Island) -> bool {
        island.alpha <= self.fdr
    }

    /// Retained islands, in the order they were given.
    pub fn filter(&self, islands: &[Island]) -> Vec<Island> {
        let kept: Vec<Island> = islands.iter().filter(|i| self.passes(i)).cloned().collect();
        info!(
            "FDR {}: {} of {} islands retained",
            self.fdr,
            kept.len(),
            islands.len()
        );
        kept
    }

    /// Filter and index the retained islands.
    pub fn filter_indexed(&self, islands: &[Island]) -> (Vec<Island>, IslandIndex) {
        let kept = self.filter(islands);
        let index = IslandIndex::from_islands(&kept);
        (kept, index)
    }
}
