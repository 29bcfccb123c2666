//! Reference mixture renderer.
//!
//! Sums a target with level-scaled interferers. When an HRTF reference is
//! given, every source is placed with a simplified binaural model (Woodworth
//! ITD plus a head-shadow ILD) instead of measured filters; the reference is
//! only recorded. Plug a measured HRTF renderer in through [`Render`].

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use log::debug;

use crate::error::{MixgenError, Result};
use crate::level::{db_to_linear, rms};
use crate::mixture::{Mixture, Render};
use crate::source::{Source, Spatial};

/// Average head radius in meters.
const HEAD_RADIUS: f64 = 0.0875;
/// Speed of sound in m/s.
const SPEED_OF_SOUND: f64 = 343.0;
/// Strength of the far-ear attenuation.
const SHADOW_FACTOR: f64 = 0.4;

/// Renders [`Source`]s into [`RenderedMixture`]s.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRenderer;

impl ReferenceRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// A rendered mixture with its scaled constituent signals.
///
/// Signals are stored per channel: one channel without an HRTF, two
/// (left, right) with one.
#[derive(Debug, Clone)]
pub struct RenderedMixture {
    sample_rate: u32,
    tir: f64,
    hrtf: Option<String>,
    mixture: Vec<Vec<f32>>,
    target: Vec<Vec<f32>>,
    interferers: Vec<Vec<Vec<f32>>>,
}

impl RenderedMixture {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn tir(&self) -> f64 {
        self.tir
    }

    pub fn hrtf(&self) -> Option<&str> {
        self.hrtf.as_deref()
    }

    pub fn channel_count(&self) -> usize {
        self.mixture.len()
    }

    pub fn mixture(&self) -> &[Vec<f32>] {
        &self.mixture
    }

    pub fn target(&self) -> &[Vec<f32>] {
        &self.target
    }

    pub fn interferers(&self) -> &[Vec<Vec<f32>>] {
        &self.interferers
    }
}

impl Render for ReferenceRenderer {
    type Source = Source;
    type Output = RenderedMixture;

    fn render(
        &mut self,
        target: Source,
        interferers: Vec<Source>,
        tir: f64,
        hrtf: Option<&str>,
        fs: u32,
    ) -> Result<RenderedMixture> {
        for source in std::iter::once(&target).chain(interferers.iter()) {
            if source.sample_rate() != fs {
                return Err(MixgenError::Render(format!(
                    "{} is sampled at {} Hz, expected {} Hz",
                    source.name(),
                    source.sample_rate(),
                    fs
                )));
            }
        }

        let length = std::iter::once(&target)
            .chain(interferers.iter())
            .map(|source| source.samples().len())
            .max()
            .unwrap_or(0);

        let target_mono = padded(target.samples(), length);
        let mut interferer_monos: Vec<Vec<f32>> = interferers
            .iter()
            .map(|source| padded(source.samples(), length))
            .collect();

        let gain = interferer_gain(&target_mono, &interferer_monos, tir);
        debug!(
            "rendering {} with {} interferer(s), tir {} dB, interferer gain {:.4}",
            target.name(),
            interferers.len(),
            tir,
            gain
        );
        for mono in &mut interferer_monos {
            for sample in mono.iter_mut() {
                *sample = (*sample as f64 * gain) as f32;
            }
        }

        let place = |mono: &[f32], source: &Source| -> Vec<Vec<f32>> {
            match hrtf {
                Some(_) => spatialise(mono, source.azimuth(), source.elevation(), fs),
                None => vec![mono.to_vec()],
            }
        };

        let target_channels = place(target_mono.as_slice(), &target);
        let interferer_channels: Vec<Vec<Vec<f32>>> = interferer_monos
            .iter()
            .zip(interferers.iter())
            .map(|(mono, source)| place(mono.as_slice(), source))
            .collect();

        let mut mixture = target_channels.clone();
        for channels in &interferer_channels {
            for (mixed, channel) in mixture.iter_mut().zip(channels.iter()) {
                for (out, sample) in mixed.iter_mut().zip(channel.iter()) {
                    *out += *sample;
                }
            }
        }

        Ok(RenderedMixture {
            sample_rate: fs,
            tir,
            hrtf: hrtf.map(str::to_string),
            mixture,
            target: target_channels,
            interferers: interferer_channels,
        })
    }
}

impl Mixture for RenderedMixture {
    /// Write the mixture to `path` and the constituent signals next to it as
    /// `{stem}-target.wav` and `{stem}-interferer{n}.wav`.
    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        write_wav(path, &self.mixture, self.sample_rate)?;
        write_wav(&sibling(path, "target"), &self.target, self.sample_rate)?;
        for (index, channels) in self.interferers.iter().enumerate() {
            write_wav(
                &sibling(path, &format!("interferer{}", index + 1)),
                channels,
                self.sample_rate,
            )?;
        }

        Ok(())
    }
}

fn padded(samples: &[f32], length: usize) -> Vec<f32> {
    let mut out = samples.to_vec();
    out.resize(length, 0.0);
    out
}

/// Gain applied to every interferer so the target-to-interferer ratio is `tir` dB.
fn interferer_gain(target: &[f32], interferers: &[Vec<f32>], tir: f64) -> f64 {
    if interferers.is_empty() {
        return 1.0;
    }

    let mut sum = vec![0.0_f32; target.len()];
    for interferer in interferers {
        for (acc, sample) in sum.iter_mut().zip(interferer.iter()) {
            *acc += *sample;
        }
    }

    let target_rms = rms(target);
    let interferer_rms = rms(&sum);
    if target_rms <= 0.0 || interferer_rms <= 0.0 {
        return 1.0;
    }

    target_rms / (interferer_rms * db_to_linear(tir))
}

/// Place a mono signal at `azimuth`/`elevation` degrees; positive azimuth is
/// to the right. Returns `[left, right]`.
fn spatialise(samples: &[f32], azimuth: f64, elevation: f64, fs: u32) -> Vec<Vec<f32>> {
    let lateral = azimuth.to_radians().sin() * elevation.to_radians().cos();
    let itd = (HEAD_RADIUS / SPEED_OF_SOUND) * lateral * fs as f64;
    let (delay_left, delay_right) = if itd >= 0.0 { (itd, 0.0) } else { (0.0, -itd) };

    let norm = 1.0 + SHADOW_FACTOR * lateral.abs();
    let gain_left = (1.0 - SHADOW_FACTOR * lateral) / norm;
    let gain_right = (1.0 + SHADOW_FACTOR * lateral) / norm;

    let elevation_factor =
        (1.0 - 0.1 * elevation.to_radians().abs() / std::f64::consts::FRAC_PI_2).clamp(0.8, 1.0);

    vec![
        delayed(samples, delay_left, gain_left * elevation_factor),
        delayed(samples, delay_right, gain_right * elevation_factor),
    ]
}

/// Fractional delay by linear interpolation, keeping the input length.
fn delayed(samples: &[f32], delay: f64, gain: f64) -> Vec<f32> {
    let whole = delay.floor() as usize;
    let frac = delay - delay.floor();
    (0..samples.len())
        .map(|index| {
            if index < whole {
                return 0.0;
            }
            let current = samples[index - whole] as f64;
            let previous = if index > whole {
                samples[index - whole - 1] as f64
            } else {
                0.0
            };
            ((current * (1.0 - frac) + previous * frac) * gain) as f32
        })
        .collect()
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}-{}.wav", stem, suffix))
}

fn write_wav(path: &Path, channels: &[Vec<f32>], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: channels.len().max(1) as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    let frames = channels.first().map(Vec::len).unwrap_or(0);
    for frame in 0..frames {
        for channel in channels {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()?;
    Ok(())
}
