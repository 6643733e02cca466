//! Pipeline stages for island calling.

pub mod call;
pub mod dedup;
pub mod filter;
pub mod islands;
pub mod reattribute;
pub mod significance;
pub mod windows;

pub use crate::streaming::{verify_sorted_reads, SortValidator};
pub use call::{CallCommand, IslandCallResult, OutputNames};
pub use dedup::{DedupCommand, DedupStats};
pub use filter::SignificanceFilter;
pub use islands::{CandidateIslands, IslandCommand};
pub use reattribute::{ReattributeCommand, Reattribution};
pub use significance::{benjamini_hochberg, poisson_pvalue, SignificanceCommand, SignificanceStats};
pub use windows::{Aggregation, CoverageRecord, ReadPositions, Window, WindowCommand, WindowCounts};
