//! # Mixgen Library
//!
//! This library expands targets, interferers, spatial placements, HRTF
//! selections, and target-to-interferer ratios into ordered sets of mixtures
//! for evaluating blind source separation.
//! It includes modules for parameter validation, combination and index
//! resolution, mixture generation, and a reference renderer.

pub mod combine;
pub mod error;
pub mod generate;
pub mod index;
pub mod level;
pub mod mixture;
pub mod options;
pub mod params;
pub mod render;
pub mod source;
pub mod variable;

pub use combine::{Combination, Combine};
pub use error::{MixgenError, Result};
pub use generate::{cache_path, generate_mixtures, plan, IterationContext, PlanEntry};
pub use index::{unravel_index, IterationIndices};
pub use mixture::{Mixture, Render};
pub use options::Options;
pub use params::{Matrix, ParameterSet, ParameterSetBuilder};
pub use render::{ReferenceRenderer, RenderedMixture};
pub use source::{Source, SourceLabel, Spatial};
pub use variable::{RowCounts, Variable};
