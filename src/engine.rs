use std::path::Path;

use crate::backend::Backend;
use crate::rate::RateScale;
use crate::SynthesisResult;

/// Loads voice models onto a backend.
///
/// Loading is expensive (seconds), synthesis is cheap; callers are expected
/// to cache what `load` returns rather than call it per request.
pub trait VoiceLoader {
    /// The loaded voice.
    type Voice: SynthesisVoice;
    /// Error produced when a model cannot be loaded on the given backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the model at `model_path` onto `backend`.
    fn load(&self, model_path: &Path, backend: Backend) -> Result<Self::Voice, Self::Error>;
}

/// A loaded voice, ready to synthesize.
///
/// Takes `&self` so one loaded voice can be shared between requests.
pub trait SynthesisVoice {
    /// Error produced during waveform generation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Native output sample rate, fixed when the voice was loaded.
    fn sample_rate(&self) -> u32;

    /// Synthesize `text` with the given duration multiplier.
    fn synthesize(&self, text: &str, rate: RateScale) -> Result<SynthesisResult, Self::Error>;
}
