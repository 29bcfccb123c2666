//! Target and interferer sources with mutable spatial placement.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{MixgenError, Result};

/// Capability every target and interferer must provide.
///
/// The same source is reused across many iterations, so the builder always
/// calls [`Spatial::duplicate`] before assigning a placement. A duplicate must
/// share no mutable state with the original.
pub trait Spatial: Clone {
    fn azimuth(&self) -> f64;
    fn elevation(&self) -> f64;
    fn set_azimuth(&mut self, azimuth: f64);
    fn set_elevation(&mut self, elevation: f64);

    /// Human-readable name used in plans and logs.
    fn label(&self) -> String;

    /// Independently owned copy of this source.
    fn duplicate(&self) -> Self {
        self.clone()
    }
}

/// Mono audio source. Samples are shared between duplicates, placement is not.
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    samples: Arc<[f32]>,
    sample_rate: u32,
    azimuth: f64,
    elevation: f64,
}

impl Source {
    /// Create a source from in-memory mono samples, placed at (0, 0).
    pub fn new(name: impl Into<String>, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            samples: samples.into(),
            sample_rate,
            azimuth: 0.0,
            elevation: 0.0,
        }
    }

    /// Decode an audio file and downmix it to mono.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, probed, or decoded.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let (track_id, codec_params) = match format.default_track() {
            Some(track) => (track.id, track.codec_params.clone()),
            None => return Err(MixgenError::Decode(Error::Unsupported("no audio track"))),
        };
        let sample_rate = codec_params
            .sample_rate
            .ok_or(MixgenError::Decode(Error::Unsupported("unknown sample rate")))?;

        let mut decoder =
            symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(err)) if err.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(Error::ResetRequired) => break,
                Err(err) => return Err(err.into()),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::DecodeError(err)) => {
                    warn!("decode error in {}: {}", path.display(), err);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count().max(1);
            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            for frame in buffer.samples().chunks(channels) {
                samples.push(frame.iter().sum::<f32>() / channels as f32);
            }
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!(
            "loaded {} ({} samples at {} Hz)",
            name,
            samples.len(),
            sample_rate
        );

        Ok(Self::new(name, samples, sample_rate))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Spatial for Source {
    fn azimuth(&self) -> f64 {
        self.azimuth
    }

    fn elevation(&self) -> f64 {
        self.elevation
    }

    fn set_azimuth(&mut self, azimuth: f64) {
        self.azimuth = azimuth;
    }

    fn set_elevation(&mut self, elevation: f64) {
        self.elevation = elevation;
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// A source known only by name, for planning without decoding audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLabel {
    name: String,
    azimuth: f64,
    elevation: f64,
}

impl SourceLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            azimuth: 0.0,
            elevation: 0.0,
        }
    }
}

impl Spatial for SourceLabel {
    fn azimuth(&self) -> f64 {
        self.azimuth
    }

    fn elevation(&self) -> f64 {
        self.elevation
    }

    fn set_azimuth(&mut self, azimuth: f64) {
        self.azimuth = azimuth;
    }

    fn set_elevation(&mut self, elevation: f64) {
        self.elevation = elevation;
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}
