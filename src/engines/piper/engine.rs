use std::path::Path;

use crate::backend::Backend;
use crate::engine::{SynthesisVoice, VoiceLoader};
use crate::rate::RateScale;
use crate::SynthesisResult;

use super::config::InferenceConfig;
use super::model::{PiperError, PiperModel, Scales};
use super::phonemizer::EspeakConfig;

/// Parameters for configuring Piper model loading.
#[derive(Debug, Clone, Default)]
pub struct PiperModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
    /// espeak-ng binary and data locations.
    pub espeak: EspeakConfig,
    /// Synthesis knobs applied to every request on voices from this loader.
    pub inference: PiperInferenceParams,
}

/// Per-voice synthesis knobs. `None` keeps the value from the voice config.
#[derive(Debug, Clone)]
pub struct PiperInferenceParams {
    pub noise_scale: Option<f32>,
    pub noise_w: Option<f32>,
    /// Speaker for multi-speaker voices; ignored by single-speaker ones.
    pub speaker_id: Option<i64>,
    /// Silence inserted between sentences, in seconds. Piper adds none.
    pub sentence_silence: f32,
}

impl Default for PiperInferenceParams {
    fn default() -> Self {
        Self {
            noise_scale: None,
            noise_w: None,
            speaker_id: None,
            sentence_silence: 0.0,
        }
    }
}

/// Loads Piper voices onto CPU or CUDA.
///
/// # Quick Start
///
/// ```rust,no_run
/// use arabic_tts::engines::piper::PiperLoader;
/// use arabic_tts::{Backend, RateScale, SynthesisVoice, VoiceLoader};
/// use std::path::Path;
///
/// let loader = PiperLoader::new();
/// let voice = loader.load(Path::new("ar_JO-kareem-medium.onnx"), Backend::Default)?;
/// let result = voice.synthesize("مرحبا", RateScale::NORMAL)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PiperLoader {
    params: PiperModelParams,
}

impl PiperLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: PiperModelParams) -> Self {
        Self { params }
    }
}

impl VoiceLoader for PiperLoader {
    type Voice = PiperVoice;
    type Error = PiperError;

    fn load(&self, model_path: &Path, backend: Backend) -> Result<PiperVoice, PiperError> {
        let model = PiperModel::load(model_path, backend, self.params.num_threads)?;
        Ok(PiperVoice {
            model,
            espeak: self.params.espeak.clone(),
            inference: self.params.inference.clone(),
        })
    }
}

/// A Piper voice loaded on one backend.
pub struct PiperVoice {
    model: PiperModel,
    espeak: EspeakConfig,
    inference: PiperInferenceParams,
}

impl PiperVoice {
    pub fn backend(&self) -> Backend {
        self.model.backend()
    }
}

impl Scales {
    /// Scales for one request: config defaults, then overrides, with the
    /// voice's length scale stretched by the request rate.
    pub fn for_request(
        defaults: &InferenceConfig,
        overrides: &PiperInferenceParams,
        rate: RateScale,
    ) -> Self {
        Self {
            noise_scale: overrides.noise_scale.unwrap_or(defaults.noise_scale),
            length_scale: defaults.length_scale * rate.value(),
            noise_w: overrides.noise_w.unwrap_or(defaults.noise_w),
        }
    }
}

impl std::fmt::Debug for PiperVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiperVoice")
            .field("backend", &self.model.backend())
            .field("sample_rate", &self.model.sample_rate())
            .field("espeak_voice", &self.model.config().espeak.voice)
            .finish()
    }
}

impl SynthesisVoice for PiperVoice {
    type Error = PiperError;

    fn sample_rate(&self) -> u32 {
        self.model.sample_rate()
    }

    fn synthesize(&self, text: &str, rate: RateScale) -> Result<SynthesisResult, PiperError> {
        let samples = self.model.synthesize_text(
            text,
            Scales::for_request(&self.model.config().inference, &self.inference, rate),
            self.inference.speaker_id,
            self.inference.sentence_silence,
            &self.espeak,
        )?;

        Ok(SynthesisResult {
            samples,
            sample_rate: self.model.sample_rate(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_without_voice_config_fails_before_onnx() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("ar_JO-kareem-medium.onnx");
        std::fs::write(&model, b"not a real model").unwrap();

        let err = PiperLoader::new()
            .load(&model, Backend::Default)
            .unwrap_err();

        assert!(matches!(err, PiperError::MissingConfig(_)));
        assert!(err.to_string().contains("ar_JO-kareem-medium.onnx.json"));
    }

    #[test]
    fn default_params_keep_voice_config_values() {
        let params = PiperModelParams::default();
        assert!(params.num_threads.is_none());
        assert!(params.inference.noise_scale.is_none());
        assert_eq!(params.inference.sentence_silence, 0.0);
    }

    fn voice_defaults() -> InferenceConfig {
        InferenceConfig {
            noise_scale: 0.667,
            length_scale: 1.1,
            noise_w: 0.8,
        }
    }

    #[test]
    fn request_rate_stretches_voice_length_scale() {
        let rate = RateScale::from_speed(2.0).unwrap();
        let scales =
            Scales::for_request(&voice_defaults(), &PiperInferenceParams::default(), rate);
        assert!((scales.length_scale - 0.55).abs() < 1e-6);
    }

    #[test]
    fn unset_overrides_keep_voice_defaults() {
        let scales = Scales::for_request(
            &voice_defaults(),
            &PiperInferenceParams::default(),
            RateScale::NORMAL,
        );
        assert_eq!(
            scales,
            Scales {
                noise_scale: 0.667,
                length_scale: 1.1,
                noise_w: 0.8,
            }
        );
    }

    #[test]
    fn overrides_replace_voice_defaults() {
        let overrides = PiperInferenceParams {
            noise_scale: Some(0.3),
            noise_w: Some(0.5),
            ..Default::default()
        };
        let scales = Scales::for_request(&voice_defaults(), &overrides, RateScale::NORMAL);
        assert_eq!(scales.noise_scale, 0.3);
        assert_eq!(scales.noise_w, 0.5);
        assert_eq!(scales.length_scale, 1.1);
    }
}
