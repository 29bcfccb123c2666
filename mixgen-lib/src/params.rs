//! Validated parameter sets and their builder.

use std::path::{Path, PathBuf};

use crate::combine::{Combination, Combine};
use crate::error::{MixgenError, Result};
use crate::options::Options;
use crate::source::Spatial;
use crate::variable::RowCounts;

/// Default sampling rate in Hz.
pub const DEFAULT_FS: u32 = 16_000;
/// Default cache folder.
pub const DEFAULT_FOLDER: &str = "mixture_temp";

/// Rectangular numeric matrix stored row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: Vec<Vec<f64>>,
}

impl Matrix {
    /// Build a matrix from rows of equal length.
    ///
    /// # Errors
    /// Returns [`MixgenError::Shape`] if the rows are ragged.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(first) = rows.first() {
            let width = first.len();
            if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width)
            {
                return Err(MixgenError::Shape(format!(
                    "matrix row {} has {} column(s), expected {}",
                    index + 1,
                    row.len(),
                    width
                )));
            }
        }
        Ok(Self { rows })
    }

    /// Single row of values.
    pub fn row(values: Vec<f64>) -> Self {
        Self { rows: vec![values] }
    }

    /// Single all-zero row of the given width.
    pub fn zeros(width: usize) -> Self {
        Self::row(vec![0.0; width])
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column count, 0 for a matrix without rows.
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Row `index`, or an empty slice past the end.
    pub fn get_row(&self, index: usize) -> &[f64] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Immutable, validated inputs for one generation run.
#[derive(Debug, Clone)]
pub struct ParameterSet<S> {
    pub(crate) targets: Vec<S>,
    pub(crate) interferers: Vec<Vec<S>>,
    pub(crate) azimuths: Matrix,
    pub(crate) elevations: Matrix,
    pub(crate) hrtfs: Vec<String>,
    pub(crate) tirs: Vec<f64>,
    fs: u32,
    cache: bool,
    folder: PathBuf,
    combination: Combination,
}

impl<S: Spatial> ParameterSet<S> {
    /// Start building a parameter set from targets and interferer rows.
    ///
    /// Each interferer row holds one source per interferer slot.
    pub fn builder(targets: Vec<S>, interferers: Vec<Vec<S>>) -> ParameterSetBuilder<S> {
        ParameterSetBuilder::new(targets, interferers)
    }

    /// Number of interferer slots per mixture.
    pub fn interferer_count(&self) -> usize {
        self.interferers.first().map(Vec::len).unwrap_or(0)
    }

    pub fn row_counts(&self) -> RowCounts {
        row_counts(
            &self.targets,
            &self.interferers,
            &self.hrtfs,
            &self.tirs,
            &self.azimuths,
            &self.elevations,
        )
    }

    pub fn combination(&self) -> Combination {
        self.combination
    }

    pub fn iteration_count(&self) -> usize {
        self.combination.iteration_count()
    }

    pub fn fs(&self) -> u32 {
        self.fs
    }

    pub fn cache(&self) -> bool {
        self.cache
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

fn row_counts<S>(
    targets: &[S],
    interferers: &[Vec<S>],
    hrtfs: &[String],
    tirs: &[f64],
    azimuths: &Matrix,
    elevations: &Matrix,
) -> RowCounts {
    RowCounts::new([
        targets.len(),
        interferers.len(),
        hrtfs.len(),
        tirs.len(),
        azimuths.row_count(),
        elevations.row_count(),
    ])
}

/// Builder that applies defaults and validates a [`ParameterSet`].
#[derive(Debug, Clone)]
pub struct ParameterSetBuilder<S> {
    targets: Vec<S>,
    interferers: Vec<Vec<S>>,
    options: Options,
}

impl<S: Spatial> ParameterSetBuilder<S> {
    pub fn new(targets: Vec<S>, interferers: Vec<Vec<S>>) -> Self {
        Self {
            targets,
            interferers,
            options: Options::default(),
        }
    }

    /// Apply every field set in `options`, overriding earlier settings.
    pub fn options(mut self, options: Options) -> Self {
        self.options = self.options.merge(options);
        self
    }

    pub fn azimuths(mut self, azimuths: Matrix) -> Self {
        self.options.azimuths = Some(azimuths);
        self
    }

    pub fn elevations(mut self, elevations: Matrix) -> Self {
        self.options.elevations = Some(elevations);
        self
    }

    pub fn hrtfs(mut self, hrtfs: Vec<String>) -> Self {
        self.options.hrtfs = Some(hrtfs);
        self
    }

    pub fn tirs(mut self, tirs: Vec<f64>) -> Self {
        self.options.tirs = Some(tirs);
        self
    }

    pub fn fs(mut self, fs: u32) -> Self {
        self.options.fs = Some(fs);
        self
    }

    pub fn cache(mut self, cache: bool) -> Self {
        self.options.cache = Some(cache);
        self
    }

    pub fn folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.options.folder = Some(folder.into());
        self
    }

    pub fn combine(mut self, combine: Combine) -> Self {
        self.options.combine = Some(combine);
        self
    }

    /// Validate inputs, apply defaults, and decide the combination.
    ///
    /// # Errors
    /// - [`MixgenError::Type`] when there are no targets.
    /// - [`MixgenError::Shape`] for ragged interferer rows or azimuth/elevation
    ///   matrices whose width is not `interferer_count + 1`.
    /// - [`MixgenError::Configuration`] for a zero sampling rate.
    /// - [`MixgenError::UnequalRows`] when `rows` is requested for unequal rows.
    pub fn build(self) -> Result<ParameterSet<S>> {
        let Self {
            targets,
            mut interferers,
            options,
        } = self;

        if targets.is_empty() {
            return Err(MixgenError::Type(
                "targets must contain at least one source".to_string(),
            ));
        }

        let interferer_count = interferers.first().map(Vec::len).unwrap_or(0);
        if let Some((index, row)) = interferers
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != interferer_count)
        {
            return Err(MixgenError::Shape(format!(
                "interferer row {} has {} source(s), expected {}",
                index + 1,
                row.len(),
                interferer_count
            )));
        }
        if interferer_count == 0 {
            interferers.clear();
        }

        let width = interferer_count + 1;
        let azimuths = options.azimuths.unwrap_or_else(|| Matrix::zeros(width));
        let elevations = options.elevations.unwrap_or_else(|| Matrix::zeros(width));
        check_width("azimuths", &azimuths, width)?;
        check_width("elevations", &elevations, width)?;

        let mut hrtfs = options.hrtfs.unwrap_or_default();
        if hrtfs.iter().all(String::is_empty) {
            hrtfs.clear();
        }
        let tirs = options.tirs.unwrap_or_else(|| vec![0.0]);

        let fs = options.fs.unwrap_or(DEFAULT_FS);
        if fs == 0 {
            return Err(MixgenError::Configuration(
                "fs must be a positive sampling rate".to_string(),
            ));
        }

        let counts = row_counts(
            &targets,
            &interferers,
            &hrtfs,
            &tirs,
            &azimuths,
            &elevations,
        );
        let combination = Combination::decide(&counts, options.combine)?;

        Ok(ParameterSet {
            targets,
            interferers,
            azimuths,
            elevations,
            hrtfs,
            tirs,
            fs,
            cache: options.cache.unwrap_or(false),
            folder: options
                .folder
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FOLDER)),
            combination,
        })
    }
}

fn check_width(name: &str, matrix: &Matrix, width: usize) -> Result<()> {
    if matrix.width() != width || matrix.row_count() == 0 {
        return Err(MixgenError::Shape(format!(
            "{} must have {} column(s) (interferers + 1), got {}",
            name,
            width,
            matrix.width()
        )));
    }
    Ok(())
}
