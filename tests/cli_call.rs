//! Command-line tests for `islander call`, `dedup` and `windows`.
//!
//! Inputs are written to temp files and the compiled binary is run on them.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::{tempdir, NamedTempFile};

fn islander(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_islander"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run islander")
}

fn islander_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_islander"))
        .args(args)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run islander");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn write_genome() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "chr1\t100000").unwrap();
    writeln!(file, "chr2\t50000").unwrap();
    file.flush().unwrap();
    file
}

fn write_reads(path: &Path, reads: &[(&str, u64, char)]) {
    let mut file = fs::File::create(path).unwrap();
    for (i, (chrom, start, strand)) in reads.iter().enumerate() {
        writeln!(file, "{}\t{}\t{}\tr{}\t0\t{}", chrom, start, start + 36, i, strand).unwrap();
    }
}

/// Sparse background on both chromosomes, a dense block on chr1 and ten
/// duplicated reads.
fn sample_reads() -> Vec<(&'static str, u64, char)> {
    let mut chr1: Vec<u64> = (0..200).map(|i| i * 500 + 100).collect();
    chr1.extend((0..200).map(|i| 40_002 + i * 5));
    chr1.extend((0..10).map(|i| i * 500 + 100));
    chr1.sort_unstable();

    let mut reads: Vec<(&str, u64, char)> = chr1.into_iter().map(|s| ("chr1", s, '+')).collect();
    reads.extend((0..100).map(|i| ("chr2", i * 500 + 300, '-')));
    reads
}

fn control_reads() -> Vec<(&'static str, u64, char)> {
    let mut reads: Vec<(&str, u64, char)> = (0..200).map(|i| ("chr1", i * 500 + 250, '+')).collect();
    reads.extend((0..100).map(|i| ("chr2", i * 500 + 250, '+')));
    reads
}

// ============================================================================
// call
// ============================================================================

#[test]
fn test_call_writes_output_file_set() {
    let dir = tempdir().unwrap();
    let genome = write_genome();
    let sample = dir.path().join("chip.bed");
    let control = dir.path().join("input.bed");
    write_reads(&sample, &sample_reads());
    write_reads(&control, &control_reads());
    let out = dir.path().join("out");

    let output = islander(&[
        "call",
        "-t",
        sample.to_str().unwrap(),
        "-c",
        control.to_str().unwrap(),
        "-g",
        genome.path().to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "-e",
        "1",
    ]);

    assert!(
        output.status.success(),
        "call failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    for name in [
        "chip-1-removed.bed",
        "input-1-removed.bed",
        "chip-W200-normalized.bedgraph",
        "input-W200-normalized.bedgraph",
        "chip-W200.graph",
        "input-W200.graph",
        "chip-W200-G600.scoreisland",
        "chip-W200-G600-islands-summary",
        "chip-W200-G600-islands-summary-FDR0.01",
        "chip-W200-G600-FDR0.01-island.bed",
        "chip-W200-G600-FDR0.01-islandfiltered.bed",
        "chip-W200-G600-FDR0.01-islandfiltered-normalized.bedgraph",
    ] {
        assert!(out.join(name).exists(), "missing {}", name);
    }

    // Ten duplicated chr1 reads removed
    let removed = fs::read_to_string(out.join("chip-1-removed.bed")).unwrap();
    assert_eq!(removed.lines().count(), sample_reads().len() - 10);

    // The dense block is the significant island
    let islands = fs::read_to_string(out.join("chip-W200-G600-FDR0.01-island.bed")).unwrap();
    let lines: Vec<&str> = islands.lines().collect();
    assert_eq!(lines.len(), 1, "got: {:?}", lines);
    let fields: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(fields[0], "chr1");
    let start: u64 = fields[1].parse().unwrap();
    let end: u64 = fields[2].parse().unwrap();
    assert!(start <= 40_075 && end >= 41_070, "island {}-{}", start, end);

    // Summary: 8 columns, alpha never below the p-value
    let summary = fs::read_to_string(out.join("chip-W200-G600-islands-summary")).unwrap();
    for line in summary.lines() {
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols.len(), 8);
        let pvalue: f64 = cols[5].parse().unwrap();
        let alpha: f64 = cols[7].parse().unwrap();
        assert!(alpha >= pvalue);
    }
}

#[test]
fn test_call_rejects_unsorted_input() {
    let dir = tempdir().unwrap();
    let genome = write_genome();
    let sample = dir.path().join("chip.bed");
    let control = dir.path().join("input.bed");
    let mut reads = sample_reads();
    reads.reverse();
    write_reads(&sample, &reads);
    write_reads(&control, &control_reads());
    let out = dir.path().join("out");

    let args = [
        "call",
        "-t",
        sample.to_str().unwrap(),
        "-c",
        control.to_str().unwrap(),
        "-g",
        genome.path().to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "-e",
        "1",
    ];
    let output = islander(&args);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "stderr: {}", stderr);
    assert!(stderr.contains("not sorted"), "stderr: {}", stderr);
    assert!(!out.join("chip-W200-G600-islands-summary").exists());

    let mut sorted_args = args.to_vec();
    sorted_args.push("--allow-unsorted");
    let output = islander(&sorted_args);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(out.join("chip-W200-G600-islands-summary").exists());
}

#[test]
fn test_call_invalid_fdr() {
    let dir = tempdir().unwrap();
    let genome = write_genome();
    let sample = dir.path().join("chip.bed");
    write_reads(&sample, &sample_reads());

    let output = islander(&[
        "call",
        "-t",
        sample.to_str().unwrap(),
        "-c",
        sample.to_str().unwrap(),
        "-g",
        genome.path().to_str().unwrap(),
        "-o",
        dir.path().to_str().unwrap(),
        "-d",
        "0",
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid configuration"));
}

// ============================================================================
// dedup / windows
// ============================================================================

#[test]
fn test_dedup_to_stdout() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "chr1\t100\t136\ta\t0\t+").unwrap();
    writeln!(input, "chr1\t100\t136\tb\t0\t+").unwrap();
    writeln!(input, "chr1\t100\t136\tc\t0\t-").unwrap();
    writeln!(input, "chr1\t100\t136\td\t0\t+").unwrap();
    input.flush().unwrap();

    let output = islander(&["dedup", "-i", input.path().to_str().unwrap(), "-r", "2"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout
        .lines()
        .map(|l| l.split('\t').nth(3).unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_dedup_unsorted_stdin() {
    let input = "chr1\t300\t336\tb\t0\t+\nchr1\t100\t136\ta\t0\t+\nchr1\t100\t136\tc\t0\t+\n";

    let output = islander_stdin(&["dedup"], input);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not sorted"));

    for args in [
        vec!["dedup", "--allow-unsorted"],
        vec!["dedup", "--allow-unsorted", "-i", "-"],
    ] {
        let output = islander_stdin(&args, input);
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        let names: Vec<&str> = stdout
            .lines()
            .map(|l| l.split('\t').nth(3).unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}

#[test]
fn test_windows_raw_and_normalized() {
    let genome = write_genome();
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "chr1\t10\t46\tx\t0\t+").unwrap();
    writeln!(input, "chr1\t20\t56\ty\t0\t+").unwrap();
    writeln!(input, "chr2\t500\t536\tz\t0\t+").unwrap();
    input.flush().unwrap();

    let raw = islander(&[
        "windows",
        "-i",
        input.path().to_str().unwrap(),
        "-g",
        genome.path().to_str().unwrap(),
        "-f",
        "0",
        "--raw",
    ]);
    assert!(raw.status.success());
    assert_eq!(
        String::from_utf8_lossy(&raw.stdout),
        "chr1\t0\t200\t2\nchr2\t400\t600\t1\n"
    );

    let normalized = islander(&[
        "windows",
        "-i",
        input.path().to_str().unwrap(),
        "-g",
        genome.path().to_str().unwrap(),
        "-f",
        "0",
    ]);
    assert!(normalized.status.success());
    let stdout = String::from_utf8_lossy(&normalized.stdout);
    let values: Vec<f64> = stdout
        .lines()
        .map(|l| l.split('\t').nth(3).unwrap().parse().unwrap())
        .collect();
    assert!((values[0] - 2_000_000.0 / 3.0).abs() < 1e-6);
    assert!((values[1] - 1_000_000.0 / 3.0).abs() < 1e-6);
}
