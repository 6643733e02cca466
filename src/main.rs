// Clippy allows
#![allow(clippy::too_many_arguments)]

//! islander: ChIP-seq island caller
//!
//! Usage: islander <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::io;
use std::path::PathBuf;
use std::process;

use islander::bed::BedReader;
use islander::commands::{CallCommand, DedupCommand, WindowCommand};
use islander::config::{IslandConfig, NORMALIZATION_SCALE};
use islander::error::IslandError;
use islander::genome::Genome;
use islander::interval::Read;
use islander::parallel::{parallel_read_reads, parallel_sort_reads};
use islander::streaming::RecordWriter;

#[derive(Parser)]
#[command(name = "islander")]
#[command(version)]
#[command(about = "Identify broad ChIP-seq enrichment islands against a control library", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call significant islands from sample and control reads
    Call {
        /// Sample (treatment) BED file
        #[arg(short = 't', long)]
        treatment: PathBuf,

        /// Control (input) BED file
        #[arg(short = 'c', long)]
        control: PathBuf,

        /// Genome file (chrom<TAB>size)
        #[arg(short = 'g', long)]
        genome: PathBuf,

        /// Output directory
        #[arg(short = 'o', long, default_value = ".")]
        output: PathBuf,

        /// Window size in bp
        #[arg(short = 'w', long, default_value = "200")]
        window_size: u64,

        /// Maximum gap in bp between windows of one island
        #[arg(short = 's', long = "gap-size", default_value = "600")]
        gap_size: u64,

        /// Fragment size; reads are shifted by half of it
        #[arg(short = 'f', long, default_value = "150")]
        fragment_size: u64,

        /// Maximum reads kept per position and strand
        #[arg(short = 'r', long, default_value = "1")]
        redundancy: u32,

        /// Effective (mappable) fraction of the genome
        #[arg(short = 'p', long = "genome-fraction", default_value = "0.74")]
        genome_fraction: f64,

        /// False discovery rate cutoff
        #[arg(short = 'd', long, default_value = "0.01")]
        fdr: f64,

        /// Expected number of null windows passing the window threshold
        #[arg(short = 'e', long = "e-value", default_value = "1000")]
        e_value: f64,

        /// Load and sort inputs in memory instead of requiring sorted files
        #[arg(long)]
        allow_unsorted: bool,

        /// Print run statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Remove redundant reads from a sorted BED file
    Dedup {
        /// Input BED file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Maximum reads kept per position and strand
        #[arg(short = 'r', long, default_value = "1")]
        redundancy: u32,

        /// Load and sort input in memory instead of requiring a sorted file
        #[arg(long)]
        allow_unsorted: bool,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Count shifted reads in fixed-size windows
    Windows {
        /// Input BED file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Genome file (chrom<TAB>size)
        #[arg(short = 'g', long)]
        genome: PathBuf,

        /// Window size in bp
        #[arg(short = 'w', long, default_value = "200")]
        window_size: u64,

        /// Fragment size; reads are shifted by half of it
        #[arg(short = 'f', long, default_value = "150")]
        fragment_size: u64,

        /// Write raw counts instead of reads-per-million
        #[arg(long)]
        raw: bool,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },
}

fn init_logging() {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder.filter_level(LevelFilter::Info);
        }
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    }

    let result = match cli.command {
        Commands::Call {
            treatment,
            control,
            genome,
            output,
            window_size,
            gap_size,
            fragment_size,
            redundancy,
            genome_fraction,
            fdr,
            e_value,
            allow_unsorted,
            stats,
        } => {
            let config = IslandConfig::new()
                .with_window_size(window_size)
                .with_gap_size(gap_size)
                .with_fragment_size(fragment_size)
                .with_redundancy(redundancy)
                .with_genome_fraction(genome_fraction)
                .with_fdr(fdr)
                .with_e_value(e_value);
            run_call(config, treatment, control, genome, output, allow_unsorted, stats)
        }

        Commands::Dedup {
            input,
            redundancy,
            allow_unsorted,
            stats,
        } => run_dedup(input, redundancy, allow_unsorted, stats),

        Commands::Windows {
            input,
            genome,
            window_size,
            fragment_size,
            raw,
            stats,
        } => run_windows(input, genome, window_size, fragment_size, raw, stats),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_call(
    config: IslandConfig,
    treatment: PathBuf,
    control: PathBuf,
    genome: PathBuf,
    output: PathBuf,
    allow_unsorted: bool,
    stats: bool,
) -> Result<(), IslandError> {
    let cmd = CallCommand::new(config).with_allow_unsorted(allow_unsorted);
    let result = cmd.run(treatment, control, genome, output)?;

    info!(
        "{} of {} candidate islands significant",
        result.significant.len(),
        result.candidates.len()
    );
    if stats {
        eprintln!("{}", result);
    }
    Ok(())
}

fn run_dedup(
    input: Option<PathBuf>,
    redundancy: u32,
    allow_unsorted: bool,
    stats: bool,
) -> Result<(), IslandError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let cmd = DedupCommand::new().with_redundancy(redundancy);

    let result = if allow_unsorted {
        let reads = match input {
            Some(path) if path.to_string_lossy() != "-" => parallel_read_reads(&path)?,
            _ => BedReader::new(io::stdin().lock())
                .records()
                .collect::<Result<Vec<Read>, _>>()?,
        };
        let (kept, result) = cmd.dedup(parallel_sort_reads(reads))?;
        let mut writer = RecordWriter::new(&mut handle);
        for read in &kept {
            writer.write_read(read)?;
        }
        writer.flush()?;
        result
    } else {
        match input {
            Some(path) if path.to_string_lossy() != "-" => {
                cmd.run_reader(BedReader::from_path(&path)?, &mut handle)?
            }
            _ => cmd.run_stdin(&mut handle)?,
        }
    };

    if stats {
        eprintln!("Dedup stats: {}", result);
    }
    Ok(())
}

fn run_windows(
    input: Option<PathBuf>,
    genome: PathBuf,
    window_size: u64,
    fragment_size: u64,
    raw: bool,
    stats: bool,
) -> Result<(), IslandError> {
    let config = IslandConfig::new()
        .with_window_size(window_size)
        .with_fragment_size(fragment_size);
    config.validate()?;
    let genome = Genome::from_file(&genome)?;

    let reads: Vec<Read> = match input {
        Some(path) if path.to_string_lossy() != "-" => BedReader::from_path(&path)?
            .records()
            .collect::<Result<Vec<Read>, _>>()?,
        _ => {
            let stdin = io::stdin();
            BedReader::new(stdin.lock())
                .records()
                .collect::<Result<Vec<Read>, _>>()?
        }
    };

    let agg = WindowCommand::from_config(&config).aggregate(&reads, &genome);

    let stdout = io::stdout();
    let mut writer = RecordWriter::new(stdout.lock());
    if raw {
        for (chrom, windows) in agg.counts.iter() {
            for window in windows {
                writer.write_graph(chrom, window, agg.counts.window_size)?;
            }
        }
    } else {
        for record in agg.counts.normalized(&genome, NORMALIZATION_SCALE) {
            writer.write_coverage(&record)?;
        }
    }
    writer.flush()?;

    if stats {
        eprintln!("Window stats: {}", agg.counts);
    }
    Ok(())
}
