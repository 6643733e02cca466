// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]

//! islander: broad ChIP-seq island detection
//!
//! Finds genomic regions of significant read enrichment in a ChIP-seq sample
//! relative to a control library, controlling the false discovery rate
//! across all candidate regions.
//!
//! # Pipeline
//!
//! - **Deduplication**: at most `R` reads per chromosome, start and strand
//! - **Windowing**: shifted reads counted in fixed-size, sparse windows
//! - **Background**: Poisson window model calibrated to an E-value
//! - **Clustering**: eligible windows gap-merged into candidate islands
//! - **Significance**: exact read attribution, Poisson p-value, fold change
//!   and Benjamini-Hochberg correction
//! - **Filtering** and **re-attribution** of reads to significant islands
//!
//! Chromosomes are processed in parallel with Rayon.
//!
//! # Example
//!
//! ```rust,no_run
//! use islander::{bed, commands::CallCommand, config::IslandConfig, genome::Genome};
//!
//! let genome = Genome::from_file("hg38.chrom.sizes").unwrap();
//! let sample = bed::read_reads("H3K27me3.bed").unwrap();
//! let control = bed::read_reads("input.bed").unwrap();
//!
//! let cmd = CallCommand::new(IslandConfig::default());
//! let result = cmd.call_reads(sample, control, &genome).unwrap();
//! for island in &result.significant {
//!     println!("{}", island);
//! }
//! ```

pub mod background;
pub mod bed;
pub mod commands;
pub mod config;
pub mod error;
pub mod genome;
pub mod index;
pub mod interval;
pub mod island;
pub mod parallel;
pub mod streaming;

// Re-export commonly used types
pub use bed::{read_reads, BedReader};
pub use error::IslandError;
pub use index::IslandIndex;
pub use interval::{Interval, Read, Strand};
pub use island::{FoldChange, Island};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::background::{BackgroundModel, WindowThreshold};
    pub use crate::bed::{read_reads, BedReader};
    pub use crate::commands::{
        CallCommand, DedupCommand, IslandCommand, ReattributeCommand, SignificanceCommand,
        SignificanceFilter, WindowCommand,
    };
    pub use crate::config::IslandConfig;
    pub use crate::error::IslandError;
    pub use crate::genome::Genome;
    pub use crate::index::IslandIndex;
    pub use crate::interval::{Interval, Read, Strand};
    pub use crate::island::{FoldChange, Island};
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_basic_workflow() {
        use crate::bed::parse_reads;

        let content = "chr1\t100\t136\tr1\t0\t+\nchr1\t100\t136\tr2\t0\t+\nchr1\t300\t336\tr3\t0\t-\n";
        let reads = parse_reads(content).unwrap();

        let (kept, stats) = DedupCommand::new().dedup(reads).unwrap();

        assert_eq!(kept.len(), 2);
        assert_eq!(stats.removed(), 1);
    }

    #[test]
    fn test_stage_by_stage_workflow() {
        let genome: Genome = [("chr1", 20_000u64)].into_iter().collect();
        let mut sample = Vec::new();
        for i in 0..40 {
            sample.push(Read::new("chr1", 5_000 + i * 10, 5_036 + i * 10, Strand::Plus));
        }
        sample.push(Read::new("chr1", 15_000, 15_036, Strand::Plus));

        let windows = WindowCommand::new().with_window_size(200).with_shift(0);
        let chip = windows.aggregate(&sample, &genome);
        let control = windows.aggregate(&[], &genome);

        let model = BackgroundModel::new(chip.counts.total_reads, 200, 20_000).unwrap();
        let threshold = model.calibrate(1.0);
        let mut candidates = IslandCommand::new()
            .with_window_size(200)
            .find_islands(&chip.counts, &model, &threshold);
        SignificanceCommand::new(chip.counts.total_reads, 0, 20_000)
            .run(&mut candidates.islands, &chip.positions, &control.positions)
            .unwrap();
        let (significant, index) = SignificanceFilter::default().filter_indexed(&candidates.islands);
        let reattributed = ReattributeCommand::new(windows).run(&sample, &index, &genome);

        assert_eq!(significant.len(), 1);
        assert_eq!((significant[0].start(), significant[0].end()), (5_000, 5_400));
        assert_eq!(significant[0].chip, 40);
        assert_eq!(reattributed.retained(), 40);
        assert_eq!(reattributed.discarded, 1);
    }
}
