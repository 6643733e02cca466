//! Streaming BED reader for aligned reads.

use crate::interval::{Read as AlignedRead, Strand};
use crate::streaming::parsing::parse_read_bytes;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during BED parsing.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid BED format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, BedError>;

/// A streaming BED file reader.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
}

impl BedReader<File> {
    /// Open a BED file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new BED reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Create a BED reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next read record.
    pub fn read_record(&mut self) -> Result<Option<AlignedRead>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            // Skip empty lines and comments
            let line = self.buffer.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with("track")
                || line.starts_with("browser")
            {
                continue;
            }

            return self.parse_line(line).map(Some);
        }
    }

    /// Parse a single BED line.
    fn parse_line(&self, line: &str) -> Result<AlignedRead> {
        let fields: Vec<&str> = line.split('\t').collect();

        if fields.len() < 3 {
            return Err(BedError::Parse {
                line: self.line_number,
                message: format!("Expected at least 3 fields, got {}", fields.len()),
            });
        }

        let start = self.parse_position(fields[1], "start")?;
        let end = self.parse_position(fields[2], "end")?;

        if start > end {
            return Err(BedError::Parse {
                line: self.line_number,
                message: format!("Start ({}) > end ({})", start, end),
            });
        }

        let strand = fields
            .get(5)
            .and_then(|s| s.chars().next())
            .map(Strand::from_char)
            .unwrap_or(Strand::Unknown);

        let mut read = AlignedRead::new(fields[0], start, end, strand);
        if let Some(name) = fields.get(3) {
            read.name = Some(name.to_string());
        }
        if let Some(score) = fields.get(4) {
            read.score = score.parse().ok();
        }

        Ok(read)
    }

    fn parse_position(&self, s: &str, field_name: &str) -> Result<u64> {
        s.parse().map_err(|_| BedError::Parse {
            line: self.line_number,
            message: format!("Invalid {} position: '{}'", field_name, s),
        })
    }

    /// Get an iterator over all records.
    pub fn records(self) -> ReadIter<R> {
        ReadIter { reader: self }
    }
}

/// Iterator over BED reads.
pub struct ReadIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for ReadIter<R> {
    type Item = Result<AlignedRead>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read all reads from a BED file.
pub fn read_reads<P: AsRef<Path>>(path: P) -> Result<Vec<AlignedRead>> {
    let reader = BedReader::from_path(path)?;
    reader.records().collect()
}

/// Parse reads from a string.
#[cfg(test)]
pub(crate) fn parse_reads(content: &str) -> Result<Vec<AlignedRead>> {
    let reader = BedReader::new(content.as_bytes());
    reader.records().collect()
}

/// Fast line parser using memchr for performance.
///
/// Skips name and score; only chromosome, coordinates and strand are kept.
pub struct FastReadParser;

impl FastReadParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a line into a read.
    #[inline]
    pub fn parse_read(&self, line: &[u8]) -> Option<AlignedRead> {
        let (chrom, start, end, strand) = parse_read_bytes(line)?;
        let chrom = std::str::from_utf8(chrom).ok()?;
        Some(AlignedRead::new(chrom, start, end, strand))
    }
}

impl Default for FastReadParser {
    fn default() -> Self {
        Self::new()
    }
}
