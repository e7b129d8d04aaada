//! Speech synthesis engines.
//!
//! This module contains implementations of the [`VoiceLoader`](crate::VoiceLoader)
//! and [`SynthesisVoice`](crate::SynthesisVoice) traits.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `piper` - Piper voices (ONNX format, espeak-ng required)

#[cfg(feature = "piper")]
pub mod piper;
