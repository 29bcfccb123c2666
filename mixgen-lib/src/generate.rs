//! Per-iteration value resolution and mixture generation.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::error::Result;
use crate::index::IterationIndices;
use crate::mixture::{Mixture, Render};
use crate::params::ParameterSet;
use crate::source::Spatial;

/// Values of every variable for one iteration, borrowed from a parameter set.
#[derive(Debug, Clone)]
pub struct IterationContext<'a, S> {
    /// 1-based iteration number.
    pub iteration: usize,
    pub indices: IterationIndices,
    pub target: &'a S,
    /// One source per interferer slot; empty for target-only sets.
    pub interferers: &'a [S],
    pub hrtf: Option<&'a str>,
    pub tir: f64,
    /// Target azimuth first, then one per interferer.
    pub azimuths: &'a [f64],
    pub elevations: &'a [f64],
}

impl<'a, S: Spatial> IterationContext<'a, S> {
    /// Duplicate the target and interferers and assign their placements.
    pub fn place(&self) -> (S, Vec<S>) {
        let mut target = self.target.duplicate();
        target.set_azimuth(self.azimuths[0]);
        target.set_elevation(self.elevations[0]);

        let interferers = self
            .interferers
            .iter()
            .enumerate()
            .map(|(slot, interferer)| {
                let mut interferer = interferer.duplicate();
                interferer.set_azimuth(self.azimuths[slot + 1]);
                interferer.set_elevation(self.elevations[slot + 1]);
                interferer
            })
            .collect();

        (target, interferers)
    }
}

impl<S: Spatial> ParameterSet<S> {
    /// Resolve every variable for 1-based iteration `iteration`.
    pub fn context(&self, iteration: usize) -> IterationContext<'_, S> {
        let indices = self.combination().indices(iteration);
        IterationContext {
            iteration,
            indices,
            target: &self.targets[indices.targets],
            interferers: self
                .interferers
                .get(indices.interferers)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            hrtf: self
                .hrtfs
                .get(indices.hrtfs)
                .map(String::as_str)
                .filter(|hrtf| !hrtf.is_empty()),
            tir: self.tirs.get(indices.tirs).copied().unwrap_or(0.0),
            azimuths: self.azimuths.get_row(indices.azimuths),
            elevations: self.elevations.get_row(indices.elevations),
        }
    }
}

/// Cache path for a 1-based iteration: `{folder}/mixture-{iteration:05}.{extension}`.
pub fn cache_path(folder: &Path, iteration: usize, extension: &str) -> PathBuf {
    folder.join(format!("mixture-{:05}.{}", iteration, extension))
}

/// Render one mixture per iteration, in iteration order.
///
/// When the parameter set has caching enabled every mixture is written to
/// [`cache_path`] right after it is built.
///
/// # Errors
/// Returns the first render or persistence error; no mixtures are returned
/// in that case.
pub fn generate_mixtures<R: Render>(
    params: &ParameterSet<R::Source>,
    renderer: &mut R,
) -> Result<Vec<R::Output>> {
    let total = params.iteration_count();
    let mut mixtures = Vec::with_capacity(total);

    if params.cache() {
        info!(
            "Generating {} mixture(s) into {}",
            total,
            params.folder().display()
        );
    }

    for iteration in 1..=total {
        let context = params.context(iteration);
        debug!("iteration {}: {:?}", iteration, context.indices);

        let (target, interferers) = context.place();
        let mixture = renderer.render(
            target,
            interferers,
            context.tir,
            context.hrtf,
            params.fs(),
        )?;

        if params.cache() {
            mixture.write(&cache_path(params.folder(), iteration, mixture.extension()))?;
        }

        mixtures.push(mixture);
    }

    if params.cache() {
        info!("Done generating {} mixture(s)", total);
    }

    Ok(mixtures)
}

/// Description of one iteration, without rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub iteration: usize,
    pub indices: IterationIndices,
    pub target: String,
    pub interferers: Vec<String>,
    pub hrtf: Option<String>,
    pub tir: f64,
    pub azimuths: Vec<f64>,
    pub elevations: Vec<f64>,
}

/// Describe every iteration of a parameter set in order.
pub fn plan<S: Spatial>(params: &ParameterSet<S>) -> Vec<PlanEntry> {
    (1..=params.iteration_count())
        .map(|iteration| {
            let context = params.context(iteration);
            PlanEntry {
                iteration,
                indices: context.indices,
                target: context.target.label(),
                interferers: context.interferers.iter().map(Spatial::label).collect(),
                hrtf: context.hrtf.map(str::to_string),
                tir: context.tir,
                azimuths: context.azimuths.to_vec(),
                elevations: context.elevations.to_vec(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::combine::Combine;
    use crate::error::MixgenError;
    use crate::params::Matrix;
    use crate::render::ReferenceRenderer;
    use crate::source::{Source, SourceLabel};

    #[derive(Debug)]
    struct RecordedMixture {
        target: SourceLabel,
        interferers: Vec<SourceLabel>,
        tir: f64,
        hrtf: Option<String>,
        fs: u32,
        writes: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl Mixture for RecordedMixture {
        fn extension(&self) -> &str {
            "test"
        }

        fn write(&self, path: &Path) -> Result<()> {
            self.writes.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        writes: Rc<RefCell<Vec<PathBuf>>>,
        fail_at: Option<usize>,
        calls: usize,
    }

    impl Render for RecordingRenderer {
        type Source = SourceLabel;
        type Output = RecordedMixture;

        fn render(
            &mut self,
            target: SourceLabel,
            interferers: Vec<SourceLabel>,
            tir: f64,
            hrtf: Option<&str>,
            fs: u32,
        ) -> Result<RecordedMixture> {
            self.calls += 1;
            if self.fail_at == Some(self.calls) {
                return Err(MixgenError::Render("renderer unavailable".to_string()));
            }
            Ok(RecordedMixture {
                target,
                interferers,
                tir,
                hrtf: hrtf.map(str::to_string),
                fs,
                writes: self.writes.clone(),
            })
        }
    }

    fn labels(names: &[&str]) -> Vec<SourceLabel> {
        names.iter().map(|name| SourceLabel::new(*name)).collect()
    }

    #[test]
    fn placement_assigns_target_then_interferer_columns() {
        let params = ParameterSet::builder(labels(&["t"]), vec![labels(&["a", "b"])])
            .azimuths(Matrix::row(vec![10.0, 20.0, 30.0]))
            .elevations(Matrix::row(vec![1.0, 2.0, 3.0]))
            .build()
            .unwrap();

        let (target, interferers) = params.context(1).place();
        assert_eq!(target.azimuth(), 10.0);
        assert_eq!(target.elevation(), 1.0);
        assert_eq!(interferers[0].azimuth(), 20.0);
        assert_eq!(interferers[1].azimuth(), 30.0);
        assert_eq!(interferers[1].elevation(), 3.0);
    }

    #[test]
    fn duplicated_targets_stay_isolated_across_iterations() {
        let params = ParameterSet::builder(labels(&["t"]), vec![labels(&["a"])])
            .azimuths(Matrix::new(vec![vec![10.0, 0.0], vec![-40.0, 0.0]]).unwrap())
            .build()
            .unwrap();

        let (mut first, _) = params.context(1).place();
        let (second, _) = params.context(2).place();
        first.set_azimuth(99.0);

        assert_eq!(second.azimuth(), -40.0);
        assert_eq!(params.context(1).place().0.azimuth(), 10.0);
        assert_eq!(params.targets[0].azimuth(), 0.0);
    }

    #[test]
    fn scalar_tir_broadcasts_to_every_iteration() {
        let params = ParameterSet::builder(
            labels(&["t1", "t2", "t3"]),
            vec![labels(&["a"]), labels(&["b"])],
        )
        .build()
        .unwrap();
        assert_eq!(params.combination().mode(), Combine::All);
        for iteration in 1..=params.iteration_count() {
            assert_eq!(params.context(iteration).tir, 0.0);
            assert_eq!(params.context(iteration).hrtf, None);
        }
    }

    #[test]
    fn cross_product_resolves_targets_fastest() {
        let params = ParameterSet::builder(
            labels(&["t1", "t2"]),
            vec![labels(&["a1"]), labels(&["a2"]), labels(&["a3"])],
        )
        .build()
        .unwrap();
        assert_eq!(params.iteration_count(), 6);

        let context = params.context(4);
        assert_eq!(context.target.label(), "t2");
        assert_eq!(context.interferers[0].label(), "a2");
    }

    #[test]
    fn row_combination_pairs_variables_positionally() {
        let params = ParameterSet::builder(
            labels(&["t1", "t2"]),
            vec![labels(&["a1"]), labels(&["a2"])],
        )
        .tirs(vec![0.0, 6.0])
        .hrtfs(vec!["kemar".to_string()])
        .build()
        .unwrap();
        assert_eq!(params.combination().mode(), Combine::Rows);

        let second = params.context(2);
        assert_eq!(second.target.label(), "t2");
        assert_eq!(second.interferers[0].label(), "a2");
        assert_eq!(second.tir, 6.0);
        assert_eq!(second.hrtf, Some("kemar"));
    }

    #[test]
    fn empty_hrtf_entries_render_without_spatial_filtering() {
        let target = Source::new("t", vec![0.5; 64], 16_000);
        let params = ParameterSet::builder(vec![target], Vec::new())
            .hrtfs(vec![String::new(), "kemar".to_string()])
            .azimuths(Matrix::row(vec![90.0]))
            .build()
            .unwrap();
        assert_eq!(params.context(1).hrtf, None);
        assert_eq!(params.context(2).hrtf, Some("kemar"));

        let mut renderer = ReferenceRenderer::new();
        let mixtures = generate_mixtures(&params, &mut renderer).unwrap();
        assert_eq!(mixtures[0].hrtf(), None);
        assert_eq!(mixtures[0].channel_count(), 1);
        assert_eq!(mixtures[1].hrtf(), Some("kemar"));
        assert_eq!(mixtures[1].channel_count(), 2);
    }

    #[test]
    fn generation_renders_every_iteration_in_order() {
        let params = ParameterSet::builder(labels(&["t1", "t2", "t3"]), vec![labels(&["a"])])
            .tirs(vec![-5.0, 0.0, 5.0])
            .fs(8_000)
            .build()
            .unwrap();
        let mut renderer = RecordingRenderer::default();

        let mixtures = generate_mixtures(&params, &mut renderer).unwrap();
        assert_eq!(mixtures.len(), 3);
        for (index, mixture) in mixtures.iter().enumerate() {
            assert_eq!(mixture.target.label(), format!("t{}", index + 1));
            assert_eq!(mixture.interferers.len(), 1);
            assert_eq!(mixture.tir, -5.0 + 5.0 * index as f64);
            assert_eq!(mixture.hrtf, None);
            assert_eq!(mixture.fs, 8_000);
        }
        assert!(renderer.writes.borrow().is_empty());
    }

    #[test]
    fn caching_writes_one_file_per_iteration() {
        let params = ParameterSet::builder(labels(&["t1", "t2", "t3"]), Vec::new())
            .cache(true)
            .folder("corpus")
            .build()
            .unwrap();
        let mut renderer = RecordingRenderer::default();

        generate_mixtures(&params, &mut renderer).unwrap();
        assert_eq!(
            *renderer.writes.borrow(),
            vec![
                PathBuf::from("corpus/mixture-00001.test"),
                PathBuf::from("corpus/mixture-00002.test"),
                PathBuf::from("corpus/mixture-00003.test"),
            ]
        );
    }

    thread_local! {
        static CAPTURED: RefCell<Vec<(log::Level, String)>> = RefCell::new(Vec::new());
    }

    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            CAPTURED.with(|captured| {
                captured
                    .borrow_mut()
                    .push((record.level(), record.args().to_string()))
            });
        }

        fn flush(&self) {}
    }

    static CAPTURE_LOGGER: CaptureLogger = CaptureLogger;

    /// Info-level messages logged on this thread while running `f`.
    fn info_messages(f: impl FnOnce()) -> Vec<String> {
        static INSTALL: std::sync::Once = std::sync::Once::new();
        INSTALL.call_once(|| {
            if log::set_logger(&CAPTURE_LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Trace);
            }
        });

        CAPTURED.with(|captured| captured.borrow_mut().clear());
        f();
        CAPTURED.with(|captured| {
            captured
                .borrow()
                .iter()
                .filter(|(level, _)| *level == log::Level::Info)
                .map(|(_, message)| message.clone())
                .collect()
        })
    }

    #[test]
    fn caching_announces_start_and_end_once() {
        let params = ParameterSet::builder(labels(&["t1", "t2", "t3"]), Vec::new())
            .cache(true)
            .folder("corpus")
            .build()
            .unwrap();

        let messages = info_messages(|| {
            generate_mixtures(&params, &mut RecordingRenderer::default()).unwrap();
        });
        assert_eq!(
            messages,
            vec![
                "Generating 3 mixture(s) into corpus".to_string(),
                "Done generating 3 mixture(s)".to_string(),
            ]
        );
    }

    #[test]
    fn uncached_generation_is_silent() {
        let params = ParameterSet::builder(labels(&["t1", "t2"]), Vec::new())
            .build()
            .unwrap();

        let messages = info_messages(|| {
            generate_mixtures(&params, &mut RecordingRenderer::default()).unwrap();
        });
        assert!(messages.is_empty());
    }

    #[test]
    fn renderer_failures_propagate() {
        let params = ParameterSet::builder(labels(&["t1", "t2"]), Vec::new())
            .cache(true)
            .build()
            .unwrap();
        let mut renderer = RecordingRenderer {
            fail_at: Some(2),
            ..RecordingRenderer::default()
        };

        let err = generate_mixtures(&params, &mut renderer).unwrap_err();
        assert!(matches!(err, MixgenError::Render(_)));
        assert_eq!(renderer.writes.borrow().len(), 1);
    }

    #[test]
    fn target_only_sets_render_without_interferers() {
        let params = ParameterSet::builder(labels(&["t1"]), Vec::new())
            .azimuths(Matrix::row(vec![45.0]))
            .build()
            .unwrap();
        let mut renderer = RecordingRenderer::default();

        let mixtures = generate_mixtures(&params, &mut renderer).unwrap();
        assert_eq!(mixtures.len(), 1);
        assert!(mixtures[0].interferers.is_empty());
        assert_eq!(mixtures[0].target.azimuth(), 45.0);
    }

    #[test]
    fn plan_lists_resolved_values() {
        let params = ParameterSet::builder(labels(&["t1", "t2"]), vec![labels(&["a", "b"])])
            .tirs(vec![0.0, 10.0])
            .azimuths(Matrix::row(vec![0.0, -30.0, 30.0]))
            .build()
            .unwrap();

        let entries = plan(&params);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].iteration, 2);
        assert_eq!(entries[1].target, "t2");
        assert_eq!(entries[1].interferers, vec!["a", "b"]);
        assert_eq!(entries[1].tir, 10.0);
        assert_eq!(entries[1].azimuths, vec![0.0, -30.0, 30.0]);
    }

    #[test]
    fn cache_paths_are_zero_padded() {
        assert_eq!(
            cache_path(Path::new("out"), 42, "wav"),
            PathBuf::from("out/mixture-00042.wav")
        );
    }
}
