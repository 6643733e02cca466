//! Error type for the island-calling pipeline.

use crate::bed::BedError;
use std::io;
use thiserror::Error;

/// Errors that abort an island-calling run.
///
/// Numeric edge cases (zero expected count, empty chromosomes) are not
/// errors; they are handled with sentinels and logged.
#[derive(Error, Debug)]
pub enum IslandError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Input not sorted: {message} (record {record})")]
    UnsortedInput { record: usize, message: String },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Statistics error: {0}")]
    Statistics(String),

    #[error(transparent)]
    Bed(#[from] BedError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsorted_message() {
        let err = IslandError::UnsortedInput {
            record: 7,
            message: "position 10 comes after 20 on chr1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Input not sorted: position 10 comes after 20 on chr1 (record 7)"
        );
    }

    #[test]
    fn test_bed_error_is_transparent() {
        let err: IslandError = BedError::InvalidFormat("bad".to_string()).into();
        assert_eq!(err.to_string(), "Invalid BED format: bad");
    }
}
