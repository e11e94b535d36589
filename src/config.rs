// THEORY:
// All run-time knobs are resolved exactly once, at process start, into an
// immutable `RunConfig` that is handed to the compositor. Nothing below this
// module reads the environment or standard input.
//
// Templates live in sibling directories named after the game and the video
// connector they were captured from: `{game}@RGB` holds the clean captures and
// `{game}@Composite` receives the blended output. The same naming is used by the
// consumer that later loads the templates, so it must be preserved literally.

use crate::error::{CompositeError, Result};
use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_GAME_NAME: &str = "Sonic 1";
pub const DEFAULT_BASE_DIR: &str = ".";
pub const PROMPT: &str = "Enter game name: (for example, Sonic 1): ";

pub const BASE_DIR_KEY: &str = "COMPOSITE_BASE_DIR";
pub const ERROR_POLICY_KEY: &str = "COMPOSITE_ON_ERROR";
pub const WORKERS_KEY: &str = "COMPOSITE_WORKERS";

/// The video connector a template set was captured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateVariant {
    Rgb,
    Composite,
}

impl TemplateVariant {
    pub fn suffix(self) -> &'static str {
        match self {
            TemplateVariant::Rgb => "RGB",
            TemplateVariant::Composite => "Composite",
        }
    }

    pub fn directory_name(self, game_name: &str) -> String {
        format!("{game_name}@{}", self.suffix())
    }
}

/// What to do when a single file cannot be composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Record the failure and continue with the remaining files.
    #[default]
    Skip,
    /// Stop at the first failure. Outputs already written are kept.
    Abort,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(ErrorPolicy::Skip),
            "abort" => Ok(ErrorPolicy::Abort),
            _ => Err("expected `skip` or `abort`".to_string()),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorPolicy::Skip => "skip",
            ErrorPolicy::Abort => "abort",
        })
    }
}

/// Settings taken from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    pub base_dir: PathBuf,
    pub error_policy: ErrorPolicy,
    pub workers: usize,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            error_policy: ErrorPolicy::default(),
            workers: default_workers(),
        }
    }
}

impl EnvSettings {
    /// Reads settings through `lookup`, usually `|key| std::env::var(key).ok()`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = EnvSettings::default();

        if let Some(base_dir) = lookup(BASE_DIR_KEY).filter(|v| !v.is_empty()) {
            settings.base_dir = PathBuf::from(base_dir);
        }

        if let Some(value) = lookup(ERROR_POLICY_KEY) {
            settings.error_policy =
                value
                    .parse()
                    .map_err(|reason| CompositeError::InvalidConfig {
                        key: ERROR_POLICY_KEY,
                        value: value.clone(),
                        reason,
                    })?;
        }

        if let Some(value) = lookup(WORKERS_KEY) {
            settings.workers = parse_workers(&value)?;
        }

        Ok(settings)
    }
}

fn default_workers() -> usize {
    num_cpus::get().max(1)
}

fn parse_workers(value: &str) -> Result<usize> {
    let invalid = |reason: String| CompositeError::InvalidConfig {
        key: WORKERS_KEY,
        value: value.to_string(),
        reason,
    };
    match value.trim().parse::<usize>() {
        Ok(0) => Err(invalid("at least one worker is required".to_string())),
        Ok(workers) => Ok(workers),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Immutable description of one compositing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub game_name: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub error_policy: ErrorPolicy,
    pub workers: usize,
}

impl RunConfig {
    /// Explicit directories, default policy and worker count.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_name: String::new(),
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            error_policy: ErrorPolicy::default(),
            workers: default_workers(),
        }
    }

    /// `base_dir/{game}@RGB` composited into `base_dir/{game}@Composite`.
    pub fn for_game(base_dir: impl AsRef<Path>, game_name: &str) -> Self {
        let base_dir = base_dir.as_ref();
        Self {
            game_name: game_name.to_string(),
            ..Self::new(
                base_dir.join(TemplateVariant::Rgb.directory_name(game_name)),
                base_dir.join(TemplateVariant::Composite.directory_name(game_name)),
            )
        }
    }

    /// The original hard-coded run: `./Sonic 1@RGB` into `./Sonic 1@Composite`.
    pub fn legacy() -> Self {
        Self::for_game(DEFAULT_BASE_DIR, DEFAULT_GAME_NAME)
    }

    /// Builds the run for `game_name` using the base directory, policy and
    /// worker count from `settings`.
    pub fn resolve(settings: &EnvSettings, game_name: &str) -> Self {
        Self::for_game(&settings.base_dir, game_name)
            .with_error_policy(settings.error_policy)
            .with_workers(settings.workers)
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Asks the operator for the game name.
///
/// Only the line terminator is stripped; the rest of the line is returned as
/// typed. End of input before any text yields an empty name.
pub fn prompt_game_name<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<String> {
    output
        .write_all(PROMPT.as_bytes())
        .and_then(|_| output.flush())
        .map_err(CompositeError::Prompt)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(CompositeError::Prompt)?;

    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}

/// Replaces characters that would escape or break the template directory name.
/// Names without path separators or control characters are returned unchanged.
pub fn sanitize_game_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}
