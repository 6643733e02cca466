//! Streaming utilities shared by the pipeline stages.
//!
//! - Zero-allocation BED line parsing
//! - Inline sort validation
//! - Buffered record output

pub mod output;
pub mod parsing;
pub mod validation;

pub use output::RecordWriter;
pub use parsing::{parse_read_bytes, parse_u64_fast, should_skip_line};
pub use validation::{verify_sorted_reads, SortValidator};
