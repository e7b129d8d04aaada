//! # arabic-tts
//!
//! A small Rust library behind an Arabic text-to-speech demo: type Arabic
//! text, pick a male or female voice, optionally ask for GPU acceleration and
//! a different speaking speed, and get back a mono 16-bit WAV stream.
//!
//! ## Features
//!
//! - **Voice acquisition with fallback**: voices load on the accelerated
//!   backend when the user asks for it, and fall back to the CPU backend with
//!   a warning when that fails
//! - **Load once**: loaded voices are cached for the life of the process
//! - **Piper voices**: ONNX Piper models via the `piper` feature
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! arabic-tts = { version = "2026.10", features = ["piper"] }
//! ```
//!
//! ```ignore
//! use arabic_tts::engines::piper::PiperLoader;
//! use arabic_tts::{DemoConfig, SynthesisRequest, Synthesizer, VoiceIdentity};
//!
//! let config = DemoConfig::from_env();
//! let synthesizer = Synthesizer::new(config.catalog(), PiperLoader::new());
//!
//! let request = SynthesisRequest::builder()
//!     .text("مرحبا")
//!     .voice(VoiceIdentity::Female)
//!     .build()?;
//! let outcome = synthesizer.synthesize(&request)?;
//! std::fs::write("output.wav", &outcome.wav)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod acquisition;
pub mod backend;
pub mod config;
pub mod engine;
pub mod engines;
pub mod rate;
pub mod request;
pub mod voice;

#[cfg(test)]
mod testing;

use std::io::Cursor;
use std::path::Path;

pub use acquisition::{Acquisition, AcquisitionError, VoiceAcquisitionService, VoiceHandle};
pub use backend::{AccelerationPreference, Backend};
pub use config::DemoConfig;
pub use engine::{SynthesisVoice, VoiceLoader};
pub use rate::{RateError, RateScale};
pub use request::{Response, SynthesisOutcome, SynthesisRequest, Synthesizer, TtsError};
pub use voice::{VoiceCatalog, VoiceIdentity};

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw mono f32 audio samples in `[-1.0, 1.0]` and the sample rate
/// of the voice that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio, fixed by the voice's configuration
    pub sample_rate: u32,
}

impl SynthesisResult {
    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    /// Samples converted to 16-bit PCM, clipping anything outside `[-1.0, 1.0]`.
    pub fn to_pcm16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
            .collect()
    }

    /// Encode the audio as an in-memory mono 16-bit WAV stream.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, hound::Error> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, self.wav_spec())?;
            for sample in self.to_pcm16() {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }

    /// Write the audio to a mono 16-bit WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let mut writer = hound::WavWriter::create(path, self.wav_spec())?;
        for sample in self.to_pcm16() {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
