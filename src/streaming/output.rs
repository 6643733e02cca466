//! Efficient output formatting for reads, window tracks and islands.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the hot path.

use crate::bed::BedError;
use crate::commands::windows::{CoverageRecord, Window};
use crate::interval::Read;
use crate::island::{FoldChange, Island};
use std::io::{BufWriter, Write};

/// Buffer size for RecordWriter (8MB default).
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// High-performance tab-separated record writer.
pub struct RecordWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> RecordWriter<W> {
    /// Create a new RecordWriter with default 8MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    /// Create a new RecordWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    #[inline]
    fn bytes(&mut self, bytes: &[u8]) -> Result<(), BedError> {
        self.writer.write_all(bytes).map_err(BedError::Io)
    }

    #[inline]
    fn tab(&mut self) -> Result<(), BedError> {
        self.bytes(b"\t")
    }

    #[inline]
    fn newline(&mut self) -> Result<(), BedError> {
        self.bytes(b"\n")
    }

    #[inline]
    fn int(&mut self, n: u64) -> Result<(), BedError> {
        self.writer
            .write_all(self.itoa_buf.format(n).as_bytes())
            .map_err(BedError::Io)
    }

    /// Float via ryu; integral values print without a fractional part.
    #[inline]
    fn float(&mut self, f: f64) -> Result<(), BedError> {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
            self.writer
                .write_all(self.itoa_buf.format(f as i64).as_bytes())
                .map_err(BedError::Io)
        } else {
            self.writer
                .write_all(self.ryu_buf.format(f).as_bytes())
                .map_err(BedError::Io)
        }
    }

    /// Write chrom, start and end without a trailing newline.
    #[inline]
    pub fn write_bed3(&mut self, chrom: &str, start: u64, end: u64) -> Result<(), BedError> {
        self.bytes(chrom.as_bytes())?;
        self.tab()?;
        self.int(start)?;
        self.tab()?;
        self.int(end)
    }

    /// Write a read as BED6.
    #[inline]
    pub fn write_read(&mut self, read: &Read) -> Result<(), BedError> {
        self.write_bed3(read.chrom(), read.start(), read.end())?;
        self.tab()?;
        self.bytes(read.name.as_deref().unwrap_or(".").as_bytes())?;
        self.tab()?;
        self.float(read.score.unwrap_or(0.0))?;
        self.tab()?;
        self.bytes(&[read.strand.as_byte()])?;
        self.newline()
    }

    /// Write a normalized bedgraph line.
    #[inline]
    pub fn write_coverage(&mut self, record: &CoverageRecord<'_>) -> Result<(), BedError> {
        self.write_bed3(record.chrom, record.start, record.end)?;
        self.tab()?;
        self.float(record.value)?;
        self.newline()
    }

    /// Write a raw window count line.
    #[inline]
    pub fn write_graph(
        &mut self,
        chrom: &str,
        window: &Window,
        window_size: u64,
    ) -> Result<(), BedError> {
        self.write_bed3(chrom, window.start(window_size), window.end(window_size))?;
        self.tab()?;
        self.int(window.count)?;
        self.newline()
    }

    /// Write a candidate island with its clustering score.
    pub fn write_scoreisland(&mut self, island: &Island) -> Result<(), BedError> {
        self.write_bed3(island.chrom(), island.start(), island.end())?;
        self.tab()?;
        self.float(island.score)?;
        self.newline()
    }

    /// Write an island summary line: chrom, start, end, chip, control,
    /// pvalue, fold change, alpha.
    pub fn write_summary(&mut self, island: &Island) -> Result<(), BedError> {
        self.write_bed3(island.chrom(), island.start(), island.end())?;
        self.tab()?;
        self.int(island.chip)?;
        self.tab()?;
        self.int(island.control)?;
        self.tab()?;
        self.float(island.pvalue)?;
        self.tab()?;
        match island.fold_change {
            FoldChange::Finite(v) => self.float(v)?,
            FoldChange::Unbounded => self.bytes(b"inf")?,
        }
        self.tab()?;
        self.float(island.alpha)?;
        self.newline()
    }

    /// Write a significant island as BED with its chip count.
    pub fn write_island_bed(&mut self, island: &Island) -> Result<(), BedError> {
        self.write_bed3(island.chrom(), island.start(), island.end())?;
        self.tab()?;
        self.int(island.chip)?;
        self.newline()
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), BedError> {
        self.writer.flush().map_err(BedError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Strand;

    fn written<F>(f: F) -> String
    where
        F: FnOnce(&mut RecordWriter<&mut Vec<u8>>) -> Result<(), BedError>,
    {
        let mut output = Vec::new();
        {
            let mut writer = RecordWriter::new(&mut output);
            f(&mut writer).unwrap();
            writer.flush().unwrap();
        }
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_write_read_bed6() {
        let mut read = Read::new("chr1", 100, 150, Strand::Minus);
        read.name = Some("r7".to_string());
        read.score = Some(255.0);

        let out = written(|w| w.write_read(&read));

        assert_eq!(out, "chr1\t100\t150\tr7\t255\t-\n");
    }

    #[test]
    fn test_write_read_defaults() {
        let read = Read::new("chr2", 0, 36, Strand::Unknown);
        assert_eq!(written(|w| w.write_read(&read)), "chr2\t0\t36\t.\t0\t.\n");
    }

    #[test]
    fn test_write_coverage_and_graph() {
        let record = CoverageRecord {
            chrom: "chr1",
            start: 200,
            end: 400,
            value: 2.5,
        };
        let window = Window { index: 3, count: 12 };

        let out = written(|w| {
            w.write_coverage(&record)?;
            w.write_graph("chr1", &window, 200)
        });

        assert_eq!(out, "chr1\t200\t400\t2.5\nchr1\t600\t800\t12\n");
    }

    #[test]
    fn test_write_summary_unbounded() {
        let mut island = Island::new("chr1", 200, 600);
        island.chip = 10;
        island.control = 0;
        island.pvalue = 1e-20;
        island.fold_change = FoldChange::Unbounded;
        island.alpha = 0.5;

        let out = written(|w| w.write_summary(&island));

        assert_eq!(out, "chr1\t200\t600\t10\t0\t1e-20\tinf\t0.5\n");
    }

    #[test]
    fn test_write_island_records() {
        let mut island = Island::new("chr3", 1000, 1400);
        island.score = 12.25;
        island.chip = 42;

        let out = written(|w| {
            w.write_scoreisland(&island)?;
            w.write_island_bed(&island)
        });

        assert_eq!(out, "chr3\t1000\t1400\t12.25\nchr3\t1000\t1400\t42\n");
    }
}
