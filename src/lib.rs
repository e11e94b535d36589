// THEORY:
// This file is the main entry point for the `sprite_composite` library crate.
// It exports the compositor the way `rgb_to_composite` drives it: resolve a
// `RunConfig` once, then hand it to either the sequential `Compositor` or the
// `ParallelCompositor`. The per-pixel rule and the image codecs live in
// `core_modules` and are reachable for callers that only need the transform.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use crate::config::{ErrorPolicy, RunConfig, TemplateVariant};
pub use crate::core_modules::composite::composite::{blend_image, blend_rgba};
pub use crate::core_modules::pixel::pixel::Pixel;
pub use crate::error::{CompositeError, Result};
pub use crate::parallel_pipeline::ParallelCompositor;
pub use crate::pipeline::{BatchReport, Compositor, FileOutcome, ProgressSink};
