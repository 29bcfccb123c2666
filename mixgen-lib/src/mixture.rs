//! Contracts for the collaborator that renders and persists mixtures.

use std::path::Path;

use crate::error::Result;
use crate::source::Spatial;

/// A rendered mixture that can be persisted.
pub trait Mixture {
    /// File extension used for cache paths, without the dot.
    fn extension(&self) -> &str {
        "wav"
    }

    /// Persist the mixture (and, by convention, its constituent signals).
    fn write(&self, path: &Path) -> Result<()>;
}

/// Builds one mixture per iteration from placed sources.
///
/// Failures are returned unchanged to the caller of
/// [`crate::generate::generate_mixtures`].
pub trait Render {
    type Source: Spatial;
    type Output: Mixture;

    /// Build a mixture from an owned target, its owned interferers, the
    /// target-to-interferer ratio in dB, an optional HRTF reference, and the
    /// sampling rate.
    fn render(
        &mut self,
        target: Self::Source,
        interferers: Vec<Self::Source>,
        tir: f64,
        hrtf: Option<&str>,
        fs: u32,
    ) -> Result<Self::Output>;
}
