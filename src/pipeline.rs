// THEORY:
// The `pipeline` module is the top-level, sequential API of the compositor. It
// takes a resolved `RunConfig` and applies the composite transform to every file
// in the input directory, one file fully finished before the next begins.
//
// Ordering: directory listings come back in a platform-defined order. Entries are
// sorted by file name before processing so the progress trace and the report are
// reproducible across machines.
//
// Failure model:
// - Directory-level problems (missing input, uncreatable output) abort the run
//   before any file is touched.
// - Per-file problems follow the configured `ErrorPolicy`. Nothing is written for
//   a failed file, so earlier outputs are never corrupted and no partial output
//   appears.
// - A 1-pixel-wide sprite composites to a zero-width image. Image encoders cannot
//   store that, so it is reported as `FileOutcome::Empty` and nothing is written.

use crate::config::{ErrorPolicy, RunConfig};
use crate::core_modules::composite::composite;
use crate::core_modules::image_helper::image_helper;
use crate::error::{CompositeError, Result, error_chain};
use log::{debug, error, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Receives the path of each file just before it is composited.
pub trait ProgressSink {
    fn on_file(&mut self, path: &Path);
}

/// Writes one line per file, to standard output unless built with another writer.
#[derive(Debug)]
pub struct ConsoleProgress<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleProgress {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressSink for ConsoleProgress<W> {
    fn on_file(&mut self, path: &Path) {
        if let Err(e) = writeln!(self.out, "{}", path.display()).and_then(|_| self.out.flush()) {
            warn!("cannot write progress line for {}: {e}", path.display());
        }
    }
}

impl ProgressSink for Vec<PathBuf> {
    fn on_file(&mut self, path: &Path) {
        self.push(path.to_path_buf());
    }
}

/// The result of compositing one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The composite was written to this path.
    Written(PathBuf),
    /// The source was a single column wide; nothing was written.
    Empty(PathBuf),
}

/// A file that could not be composited.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: CompositeError,
}

/// Summary of a whole directory run, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub empty: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.written.len() + self.empty.len() + self.failures.len()
    }

    /// One-line description of how the run ended.
    pub fn summary(&self) -> String {
        if self.is_clean() {
            format!(
                "{} written, {} empty",
                self.written.len(),
                self.empty.len()
            )
        } else {
            format!(
                "{} of {} files could not be composited",
                self.failures.len(),
                self.total()
            )
        }
    }

    pub(crate) fn record(&mut self, source: PathBuf, outcome: Result<FileOutcome>) {
        match outcome {
            Ok(FileOutcome::Written(destination)) => self.written.push(destination),
            Ok(FileOutcome::Empty(source)) => self.empty.push(source),
            Err(error) => {
                warn!("skipping {}: {}", source.display(), error_chain(&error));
                self.failures.push(FileFailure {
                    path: source,
                    error,
                });
            }
        }
    }
}

/// Creates `path` and any missing parents. Existing content is left alone.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| CompositeError::OutputDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Lists every entry of `input_dir`, sorted by file name.
pub fn list_entries(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let not_found = |source: io::Error| CompositeError::InputDirectoryNotFound {
        path: input_dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(input_dir)
        .map_err(not_found)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(not_found)?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

/// Composites `source` into `output_dir`, keeping its file name and format.
pub fn process_file(source: &Path, output_dir: &Path) -> Result<FileOutcome> {
    let not_a_file = || CompositeError::NotAFile {
        path: source.to_path_buf(),
    };
    if !source.is_file() {
        return Err(not_a_file());
    }
    let file_name = source.file_name().ok_or_else(not_a_file)?;

    let image = image_helper::load(source)?;
    let result = composite::blend_image(&image)?;
    debug!(
        "{}: {}x{} -> {}x{}",
        source.display(),
        image.width(),
        image.height(),
        result.width(),
        result.height()
    );

    if result.width() == 0 {
        warn!(
            "{} is a single column wide, its composite is empty and was not written",
            source.display()
        );
        return Ok(FileOutcome::Empty(source.to_path_buf()));
    }

    let destination = output_dir.join(file_name);
    image_helper::save(&destination, &result)?;
    Ok(FileOutcome::Written(destination))
}

/// Sequential directory compositor.
pub struct Compositor {
    config: RunConfig,
}

impl Compositor {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Composites every file of the input directory into the output directory.
    pub fn process_directory<P: ProgressSink + ?Sized>(&self, progress: &mut P) -> Result<BatchReport> {
        let entries = list_entries(&self.config.input_dir)?;
        ensure_output_dir(&self.config.output_dir)?;
        info!(
            "compositing {} entries from {} into {}",
            entries.len(),
            self.config.input_dir.display(),
            self.config.output_dir.display()
        );

        let mut report = BatchReport::default();
        for source in entries {
            progress.on_file(&source);
            match process_file(&source, &self.config.output_dir) {
                Err(e) if self.config.error_policy == ErrorPolicy::Abort => {
                    error!("aborting at {}: {}", source.display(), error_chain(&e));
                    return Err(e);
                }
                outcome => report.record(source, outcome),
            }
        }

        log_summary(&report);
        Ok(report)
    }
}

pub(crate) fn log_summary(report: &BatchReport) {
    info!(
        "done: {} written, {} empty, {} failed",
        report.written.len(),
        report.empty.len(),
        report.failures.len()
    );
}
