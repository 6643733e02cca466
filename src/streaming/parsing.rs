//! Zero-allocation read parsing utilities.
//!
//! These functions parse the coordinate and strand columns of a BED line
//! without any heap allocation in the hot path.

use crate::interval::Strand;
use memchr::memchr;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.wrapping_mul(10).wrapping_add(d as u64);
    }
    Some(n)
}

/// Strip a trailing `\n` or `\r\n`.
#[inline(always)]
fn trim_eol(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

/// Parse chromosome, start, end and strand from a BED line using memchr.
///
/// Returns `(chrom_bytes, start, end, strand)`. Lines with fewer than six
/// columns are unstranded.
#[inline(always)]
pub fn parse_read_bytes(line: &[u8]) -> Option<(&[u8], u64, u64, Strand)> {
    let line = trim_eol(line);
    let tab1 = memchr(b'\t', line)?;
    let chrom = &line[..tab1];

    let rest1 = &line[tab1 + 1..];
    let tab2 = memchr(b'\t', rest1)?;
    let start = parse_u64_fast(&rest1[..tab2])?;

    let rest2 = &rest1[tab2 + 1..];
    let end_len = memchr(b'\t', rest2).unwrap_or(rest2.len());
    let end = parse_u64_fast(&rest2[..end_len])?;
    if start > end {
        return None;
    }

    // Columns 4 and 5 (name, score) are skipped; column 6 is the strand.
    let mut strand = Strand::Unknown;
    if end_len < rest2.len() {
        let mut fields = rest2[end_len + 1..].split(|&b| b == b'\t');
        if let Some(field) = fields.nth(2) {
            if let Some(&b) = field.first() {
                strand = Strand::from_byte(b);
            }
        }
    }

    Some((chrom, start, end, strand))
}

/// Check if a line should be skipped (empty, comment, or header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#' || line.starts_with(b"track") || line.starts_with(b"browser")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"abc"), None);
        assert_eq!(parse_u64_fast(b"123abc"), None);
        assert_eq!(parse_u64_fast(b"18446744073709551615"), Some(u64::MAX));
    }

    #[test]
    fn test_parse_read_bytes_bed3() {
        assert_eq!(
            parse_read_bytes(b"chr1\t100\t200"),
            Some((&b"chr1"[..], 100, 200, Strand::Unknown))
        );
        assert_eq!(
            parse_read_bytes(b"chr1\t100\t200\n"),
            Some((&b"chr1"[..], 100, 200, Strand::Unknown))
        );
        assert_eq!(parse_read_bytes(b"chr1\t100"), None);
        assert_eq!(parse_read_bytes(b""), None);
        assert_eq!(parse_read_bytes(b"chr1\t300\t200"), None);
    }

    #[test]
    fn test_parse_read_bytes_strand() {
        assert_eq!(
            parse_read_bytes(b"chr1\t100\t200\tname\t0\t-\n"),
            Some((&b"chr1"[..], 100, 200, Strand::Minus))
        );
        assert_eq!(
            parse_read_bytes(b"chr1\t100\t200\tname\t0\t+\r\n"),
            Some((&b"chr1"[..], 100, 200, Strand::Plus))
        );
        // Name without score or strand
        assert_eq!(
            parse_read_bytes(b"chr1\t100\t200\tname"),
            Some((&b"chr1"[..], 100, 200, Strand::Unknown))
        );
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#comment"));
        assert!(should_skip_line(b"track name=foo"));
        assert!(should_skip_line(b"browser position chr1:1-100"));
        assert!(!should_skip_line(b"chr1\t100\t200"));
    }
}
