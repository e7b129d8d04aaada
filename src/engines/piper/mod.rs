//! Piper text-to-speech engine implementation.
//!
//! Piper voices are single ONNX files with a JSON config next to them. The
//! engine phonemizes text with espeak-ng, maps phonemes to ids using the
//! voice's own table and runs one inference per sentence.
//!
//! # System Requirements
//!
//! **espeak-ng** (with Arabic support) must be installed on your system:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Model Layout
//!
//! ```text
//! models/
//! ├── ar_JO-kareem-medium.onnx
//! ├── ar_JO-kareem-medium.onnx.json
//! ├── arabic-emirati-female-model.onnx
//! └── arabic-emirati-female-model.onnx.json
//! ```
//!
//! # Backends
//!
//! | Backend | Execution provider | On failure |
//! |---|---|---|
//! | `Default` | CPU | load error |
//! | `Accelerated` | CUDA (`error_on_failure`) | load error, caller falls back |
//!
//! The accelerated backend needs the `cuda` feature, which links the
//! CUDA-enabled ONNX Runtime build. Without it, loading on
//! `Backend::Accelerated` fails straight away with
//! [`PiperError::AccelerationUnavailable`] and callers fall back to CPU.
//!
//! # Examples
//!
//! ```rust,no_run
//! use arabic_tts::engines::piper::{PiperInferenceParams, PiperLoader, PiperModelParams};
//! use arabic_tts::{Backend, RateScale, SynthesisVoice, VoiceLoader};
//! use std::path::Path;
//!
//! let loader = PiperLoader::with_params(PiperModelParams {
//!     num_threads: Some(2),
//!     inference: PiperInferenceParams {
//!         sentence_silence: 0.3,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! });
//! let voice = loader.load(Path::new("models/arabic-emirati-female-model.onnx"), Backend::Default)?;
//! let result = voice.synthesize("كيف حالك اليوم؟", RateScale::from_speed(1.25)?)?;
//! result.write_wav(Path::new("out.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engine;
pub mod model;
pub mod phonemizer;

pub use engine::{PiperInferenceParams, PiperLoader, PiperModelParams, PiperVoice};
pub use model::PiperError;
pub use phonemizer::EspeakConfig;
