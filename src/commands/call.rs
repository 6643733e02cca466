//! End-to-end island calling.
//!
//! Runs every stage in order with typed intermediate values:
//! deduplication, windowing of sample and control, background calibration,
//! clustering, significance, FDR filtering and read re-attribution. Output
//! files are written only once every stage has succeeded.

use crate::background::{BackgroundModel, WindowThreshold};
use crate::bed::{read_reads, BedError};
use crate::commands::dedup::{DedupCommand, DedupStats};
use crate::commands::filter::SignificanceFilter;
use crate::commands::islands::{CandidateIslands, IslandCommand};
use crate::commands::reattribute::{ReattributeCommand, Reattribution};
use crate::commands::significance::{SignificanceCommand, SignificanceStats};
use crate::commands::windows::{Aggregation, WindowCommand, WindowCounts};
use crate::config::{IslandConfig, NORMALIZATION_SCALE};
use crate::error::IslandError;
use crate::genome::Genome;
use crate::interval::Read;
use crate::island::Island;
use crate::parallel::{parallel_read_reads, parallel_sort_reads};
use crate::streaming::output::RecordWriter;
use log::{debug, info, warn};
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Island calling pipeline.
#[derive(Debug, Clone)]
pub struct CallCommand {
    pub config: IslandConfig,
    /// Load and sort reads in memory instead of requiring sorted input
    pub allow_unsorted: bool,
}

impl Default for CallCommand {
    fn default() -> Self {
        Self::new(IslandConfig::default())
    }
}

/// Everything a run produces, in memory.
#[derive(Debug, Clone)]
pub struct IslandCallResult {
    pub sample_dedup: DedupStats,
    pub control_dedup: DedupStats,
    /// Deduplicated sample reads
    pub sample_reads: Vec<Read>,
    /// Deduplicated control reads
    pub control_reads: Vec<Read>,
    pub sample_windows: Aggregation,
    pub control_windows: Aggregation,
    pub background: BackgroundModel,
    pub threshold: WindowThreshold,
    /// All candidate islands with counts, p-values and alpha
    pub candidates: CandidateIslands,
    pub significance: SignificanceStats,
    /// Islands passing the FDR cutoff, in genome order
    pub significant: Vec<Island>,
    pub reattribution: Reattribution,
}

impl fmt::Display for IslandCallResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sample dedup:     {}", self.sample_dedup)?;
        writeln!(f, "control dedup:    {}", self.control_dedup)?;
        writeln!(f, "sample windows:   {}", self.sample_windows.counts)?;
        writeln!(f, "control windows:  {}", self.control_windows.counts)?;
        writeln!(f, "background:       {}", self.background)?;
        writeln!(f, "window threshold: {}", self.threshold)?;
        writeln!(f, "candidates:       {}", self.candidates)?;
        writeln!(f, "significance:     {}", self.significance)?;
        writeln!(f, "significant:      {}", self.significant.len())?;
        write!(f, "re-attribution:   {}", self.reattribution)
    }
}

/// Output file names derived from the input stems and parameters.
#[derive(Debug, Clone)]
pub struct OutputNames {
    sample: String,
    control: String,
    window_size: u64,
    gap_size: u64,
    redundancy: u32,
    fdr: f64,
}

impl OutputNames {
    pub fn new(sample: &Path, control: &Path, config: &IslandConfig) -> Self {
        Self {
            sample: file_stem(sample),
            control: file_stem(control),
            window_size: config.window_size,
            gap_size: config.gap_size,
            redundancy: config.redundancy,
            fdr: config.fdr,
        }
    }

    fn removed(&self, stem: &str) -> String {
        format!("{}-{}-removed.bed", stem, self.redundancy)
    }

    fn normalized(&self, stem: &str) -> String {
        format!("{}-W{}-normalized.bedgraph", stem, self.window_size)
    }

    fn graph(&self, stem: &str) -> String {
        format!("{}-W{}.graph", stem, self.window_size)
    }

    fn island_prefix(&self) -> String {
        format!("{}-W{}-G{}", self.sample, self.window_size, self.gap_size)
    }

    pub fn sample_removed(&self) -> String {
        self.removed(&self.sample)
    }

    pub fn control_removed(&self) -> String {
        self.removed(&self.control)
    }

    pub fn sample_normalized(&self) -> String {
        self.normalized(&self.sample)
    }

    pub fn control_normalized(&self) -> String {
        self.normalized(&self.control)
    }

    pub fn sample_graph(&self) -> String {
        self.graph(&self.sample)
    }

    pub fn control_graph(&self) -> String {
        self.graph(&self.control)
    }

    pub fn scoreisland(&self) -> String {
        format!("{}.scoreisland", self.island_prefix())
    }

    pub fn summary(&self) -> String {
        format!("{}-islands-summary", self.island_prefix())
    }

    pub fn significant_summary(&self) -> String {
        format!("{}-islands-summary-FDR{}", self.island_prefix(), self.fdr)
    }

    pub fn island_bed(&self) -> String {
        format!("{}-FDR{}-island.bed", self.island_prefix(), self.fdr)
    }

    pub fn filtered_reads(&self) -> String {
        format!("{}-FDR{}-islandfiltered.bed", self.island_prefix(), self.fdr)
    }

    pub fn filtered_normalized(&self) -> String {
        format!(
            "{}-FDR{}-islandfiltered-normalized.bedgraph",
            self.island_prefix(),
            self.fdr
        )
    }
}

/// File name without directory or final extension.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reads".to_string())
}

impl CallCommand {
    pub fn new(config: IslandConfig) -> Self {
        Self {
            config,
            allow_unsorted: false,
        }
    }

    pub fn with_allow_unsorted(mut self, allow: bool) -> Self {
        self.allow_unsorted = allow;
        self
    }

    /// Load one read file, sorting in memory when allowed.
    pub fn load_reads<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Read>, IslandError> {
        if self.allow_unsorted {
            Ok(parallel_sort_reads(parallel_read_reads(path)?))
        } else {
            Ok(read_reads(path)?)
        }
    }

    /// Run every stage on in-memory reads.
    pub fn call_reads(
        &self,
        sample: Vec<Read>,
        control: Vec<Read>,
        genome: &Genome,
    ) -> Result<IslandCallResult, IslandError> {
        let config = &self.config;
        config.validate()?;

        let dedup = DedupCommand::new().with_redundancy(config.redundancy);
        let (sample_reads, sample_dedup) = dedup.dedup(sample)?;
        let (control_reads, control_dedup) = dedup.dedup(control)?;
        info!("Sample deduplication: {}", sample_dedup);
        info!("Control deduplication: {}", control_dedup);

        let windows = WindowCommand::from_config(config);
        let sample_windows = windows.aggregate(&sample_reads, genome);
        let control_windows = windows.aggregate(&control_reads, genome);
        info!("Sample windows: {}", sample_windows.counts);
        info!("Control windows: {}", control_windows.counts);

        if sample_windows.counts.total_reads == 0 {
            return Err(IslandError::EmptyInput(
                "no sample reads left after deduplication and windowing".to_string(),
            ));
        }
        if control_windows.counts.total_reads == 0 {
            warn!("No control reads left after deduplication and windowing");
        }

        let effective = genome.effective_size(config.genome_fraction);
        let background =
            BackgroundModel::new(sample_windows.counts.total_reads, config.window_size, effective)?;
        let threshold = background.calibrate(config.e_value);
        info!("Background: {}", background);
        info!("Window threshold at E-value {}: {}", config.e_value, threshold);
        debug!(
            "Expected null windows at threshold: {:.4}",
            background.expected_island_count(threshold.score, background.num_windows())
        );

        let mut candidates = IslandCommand::from_config(config).find_islands(
            &sample_windows.counts,
            &background,
            &threshold,
        );

        let significance = SignificanceCommand::new(
            sample_windows.counts.total_reads,
            control_windows.counts.total_reads,
            effective,
        )
        .run(
            &mut candidates.islands,
            &sample_windows.positions,
            &control_windows.positions,
        )?;

        let filter = SignificanceFilter::new(config.fdr)?;
        let (significant, index) = filter.filter_indexed(&candidates.islands);

        let reattribution = ReattributeCommand::new(windows).run(&sample_reads, &index, genome);

        Ok(IslandCallResult {
            sample_dedup,
            control_dedup,
            sample_reads,
            control_reads,
            sample_windows,
            control_windows,
            background,
            threshold,
            candidates,
            significance,
            significant,
            reattribution,
        })
    }

    /// Load inputs, call islands and write the output file set into
    /// `output_dir`.
    pub fn run<P: AsRef<Path>>(
        &self,
        sample_path: P,
        control_path: P,
        genome_path: P,
        output_dir: P,
    ) -> Result<IslandCallResult, IslandError> {
        self.config.validate()?;
        let genome = Genome::from_file(genome_path.as_ref())?;
        info!("Loaded genome with {} chromosomes", genome.len());

        let sample = self.load_reads(sample_path.as_ref())?;
        let control = self.load_reads(control_path.as_ref())?;
        info!("Loaded {} sample and {} control reads", sample.len(), control.len());

        let result = self.call_reads(sample, control, &genome)?;

        let names = OutputNames::new(sample_path.as_ref(), control_path.as_ref(), &self.config);
        let written = write_outputs(&result, &genome, &names, output_dir.as_ref())?;
        info!(
            "Wrote {} files to {}",
            written.len(),
            output_dir.as_ref().display()
        );
        Ok(result)
    }
}

fn create(
    dir: &Path,
    name: String,
    written: &mut Vec<PathBuf>,
) -> Result<RecordWriter<File>, IslandError> {
    let path = dir.join(name);
    let file = File::create(&path)?;
    written.push(path);
    Ok(RecordWriter::new(file))
}

fn write_reads_file(
    dir: &Path,
    name: String,
    reads: &[Read],
    written: &mut Vec<PathBuf>,
) -> Result<(), IslandError> {
    let mut writer = create(dir, name, written)?;
    for read in reads {
        writer.write_read(read)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_normalized_file(
    dir: &Path,
    name: String,
    counts: &WindowCounts,
    genome: &Genome,
    written: &mut Vec<PathBuf>,
) -> Result<(), IslandError> {
    let mut writer = create(dir, name, written)?;
    for record in counts.normalized(genome, NORMALIZATION_SCALE) {
        writer.write_coverage(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_graph_file(
    dir: &Path,
    name: String,
    counts: &WindowCounts,
    written: &mut Vec<PathBuf>,
) -> Result<(), IslandError> {
    let mut writer = create(dir, name, written)?;
    for (chrom, windows) in counts.iter() {
        for window in windows {
            writer.write_graph(chrom, window, counts.window_size)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_islands_file<F>(
    dir: &Path,
    name: String,
    islands: &[Island],
    written: &mut Vec<PathBuf>,
    mut write: F,
) -> Result<(), IslandError>
where
    F: FnMut(&mut RecordWriter<File>, &Island) -> Result<(), BedError>,
{
    let mut writer = create(dir, name, written)?;
    for island in islands {
        write(&mut writer, island)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the complete output file set. Returns the paths written.
pub fn write_outputs(
    result: &IslandCallResult,
    genome: &Genome,
    names: &OutputNames,
    dir: &Path,
) -> Result<Vec<PathBuf>, IslandError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    write_reads_file(dir, names.sample_removed(), &result.sample_reads, &mut written)?;
    write_reads_file(dir, names.control_removed(), &result.control_reads, &mut written)?;

    let sample = &result.sample_windows.counts;
    let control = &result.control_windows.counts;
    write_normalized_file(dir, names.sample_normalized(), sample, genome, &mut written)?;
    write_normalized_file(dir, names.control_normalized(), control, genome, &mut written)?;
    write_graph_file(dir, names.sample_graph(), sample, &mut written)?;
    write_graph_file(dir, names.control_graph(), control, &mut written)?;

    let candidates = &result.candidates.islands;
    write_islands_file(dir, names.scoreisland(), candidates, &mut written, |w, i| {
        w.write_scoreisland(i)
    })?;
    write_islands_file(dir, names.summary(), candidates, &mut written, |w, i| {
        w.write_summary(i)
    })?;
    write_islands_file(
        dir,
        names.significant_summary(),
        &result.significant,
        &mut written,
        |w, i| w.write_summary(i),
    )?;
    write_islands_file(
        dir,
        names.island_bed(),
        &result.significant,
        &mut written,
        |w, i| w.write_island_bed(i),
    )?;

    write_reads_file(
        dir,
        names.filtered_reads(),
        &result.reattribution.reads,
        &mut written,
    )?;
    write_normalized_file(
        dir,
        names.filtered_normalized(),
        &result.reattribution.aggregation.counts,
        genome,
        &mut written,
    )?;

    for path in &written {
        debug!("wrote {}", path.display());
    }
    Ok(written)
}
