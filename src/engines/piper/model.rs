use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ndarray::Array2;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use crate::backend::Backend;

use super::config::{PhonemeIdMap, PiperConfig};
use super::phonemizer::{phonemize, EspeakConfig};

/// Minimum peak used when normalizing output, so near-silence is not blown up.
const MIN_PEAK: f32 = 0.01;

#[derive(thiserror::Error, Debug)]
pub enum PiperError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Phonemization failed: {0}")]
    PhonemizerFailed(String),
    #[error("Voice config not found at {}", .0.display())]
    MissingConfig(PathBuf),
    #[error("Invalid voice config: {0}")]
    Config(String),
    #[error("Model produced no output")]
    NoOutput,
    #[error("Accelerated backend unavailable: built without the `cuda` feature")]
    AccelerationUnavailable,
}

/// Noise and pacing knobs passed to the model with every sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    pub noise_scale: f32,
    pub length_scale: f32,
    pub noise_w: f32,
}

/// Internal Piper ONNX model state.
pub struct PiperModel {
    session: Mutex<Session>,
    config: PiperConfig,
    phoneme_ids: PhonemeIdMap,
    backend: Backend,
}

impl PiperModel {
    /// Load a Piper voice (`<name>.onnx` plus `<name>.onnx.json`) onto `backend`.
    pub fn load(
        model_path: &Path,
        backend: Backend,
        num_threads: Option<usize>,
    ) -> Result<Self, PiperError> {
        let config = PiperConfig::load_for_model(model_path)?;
        log::info!(
            "Loading Piper voice from {} ({} Hz, espeak voice '{}')",
            model_path.display(),
            config.audio.sample_rate,
            config.espeak.voice
        );

        let session = init_session(model_path, backend, num_threads)?;
        let phoneme_ids = config.phoneme_ids();

        Ok(Self {
            session: Mutex::new(session),
            config,
            phoneme_ids,
            backend,
        })
    }

    pub fn config(&self) -> &PiperConfig {
        &self.config
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.audio.sample_rate
    }

    /// Synthesize audio from text, one inference per sentence.
    ///
    /// Sentences are joined with `sentence_silence` seconds of silence and the
    /// result is peak-normalized.
    pub fn synthesize_text(
        &self,
        text: &str,
        scales: Scales,
        speaker_id: Option<i64>,
        sentence_silence: f32,
        espeak: &EspeakConfig,
    ) -> Result<Vec<f32>, PiperError> {
        let sentences = phonemize(text, &self.config.espeak.voice, espeak)?;
        if sentences.is_empty() {
            log::warn!("No phonemes produced for text: {text:?}");
            return Ok(vec![]);
        }

        let silence_len = (sentence_silence.max(0.0) * self.sample_rate() as f32) as usize;
        let mut combined = Vec::new();

        for sentence in &sentences {
            let ids = self.phoneme_ids.encode(sentence);
            // Only sentence markers and padding left: nothing to say.
            if ids.len() <= 3 {
                continue;
            }

            let audio = self.infer(&ids, scales, speaker_id)?;
            if audio.is_empty() {
                continue;
            }
            if !combined.is_empty() {
                combined.resize(combined.len() + silence_len, 0.0);
            }
            combined.extend_from_slice(&audio);
        }

        normalize_peak(&mut combined);
        Ok(combined)
    }

    /// Run ONNX inference on one sentence of phoneme ids.
    fn infer(
        &self,
        ids: &[i64],
        scales: Scales,
        speaker_id: Option<i64>,
    ) -> Result<Vec<f32>, PiperError> {
        let input = Array2::from_shape_vec((1, ids.len()), ids.to_vec())?;
        let input_lengths = ndarray::arr1(&[ids.len() as i64]);
        let scales_arr = ndarray::arr1(&[scales.noise_scale, scales.length_scale, scales.noise_w]);

        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let output = match speaker_input(self.config.num_speakers, speaker_id) {
            Some(sid) => {
                let sid_arr = ndarray::arr1(&[sid]);
                let inputs = inputs![
                    "input" => TensorRef::from_array_view(input.view())?,
                    "input_lengths" => TensorRef::from_array_view(input_lengths.view())?,
                    "scales" => TensorRef::from_array_view(scales_arr.view())?,
                    "sid" => TensorRef::from_array_view(sid_arr.view())?,
                ];
                session.run(inputs)?
            }
            None => {
                let inputs = inputs![
                    "input" => TensorRef::from_array_view(input.view())?,
                    "input_lengths" => TensorRef::from_array_view(input_lengths.view())?,
                    "scales" => TensorRef::from_array_view(scales_arr.view())?,
                ];
                session.run(inputs)?
            }
        };

        // Waveform shape is [1, 1, 1, samples]; only the flat samples matter.
        let first_output = output.iter().next().ok_or(PiperError::NoOutput)?;
        let waveform = first_output.1.try_extract_array::<f32>()?;

        Ok(waveform.iter().copied().collect())
    }
}

/// Speaker id to feed as `sid`: multi-speaker voices always need one
/// (speaker 0 unless configured), single-speaker voices take none.
fn speaker_input(num_speakers: u32, speaker_id: Option<i64>) -> Option<i64> {
    (num_speakers > 1).then(|| speaker_id.unwrap_or(0))
}

/// Reject backends this build cannot run before touching ONNX Runtime.
fn ensure_backend_supported(backend: Backend) -> Result<(), PiperError> {
    if backend == Backend::Accelerated && !cfg!(feature = "cuda") {
        return Err(PiperError::AccelerationUnavailable);
    }
    Ok(())
}

/// Initialize an ONNX session on the requested backend.
///
/// The accelerated backend registers CUDA with `error_on_failure`, so a
/// machine without a usable GPU fails here instead of silently running on CPU.
fn init_session(
    onnx_path: &Path,
    backend: Backend,
    num_threads: Option<usize>,
) -> Result<Session, PiperError> {
    ensure_backend_supported(backend)?;

    let providers = match backend {
        Backend::Accelerated => vec![CUDAExecutionProvider::default().build().error_on_failure()],
        Backend::Default => vec![CPUExecutionProvider::default().build()],
    };

    let mut builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_execution_providers(providers)?;

    if let Some(threads) = num_threads {
        builder = builder
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?;
    }

    Ok(builder.commit_from_file(onnx_path)?)
}

/// Scale samples so the loudest one sits at full scale.
fn normalize_peak(samples: &mut [f32]) {
    let peak = samples
        .iter()
        .fold(0.0f32, |peak, s| peak.max(s.abs()))
        .max(MIN_PEAK);
    for sample in samples.iter_mut() {
        *sample /= peak;
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_backend_supported, normalize_peak, speaker_input, PiperError};
    use crate::backend::Backend;

    #[test]
    fn multi_speaker_voices_default_to_speaker_zero() {
        assert_eq!(speaker_input(4, None), Some(0));
        assert_eq!(speaker_input(4, Some(2)), Some(2));
    }

    #[test]
    fn single_speaker_voices_take_no_speaker_input() {
        assert_eq!(speaker_input(1, None), None);
        assert_eq!(speaker_input(1, Some(3)), None);
    }

    #[test]
    fn default_backend_is_always_supported() {
        assert!(ensure_backend_supported(Backend::Default).is_ok());
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn accelerated_backend_needs_cuda_build() {
        assert!(matches!(
            ensure_backend_supported(Backend::Accelerated),
            Err(PiperError::AccelerationUnavailable)
        ));
    }

    #[cfg(feature = "cuda")]
    #[test]
    fn cuda_build_accepts_accelerated_backend() {
        assert!(ensure_backend_supported(Backend::Accelerated).is_ok());
    }

    #[test]
    fn normalizes_to_full_scale() {
        let mut samples = vec![0.1, -0.4, 0.2];
        normalize_peak(&mut samples);
        for (got, want) in samples.iter().zip([0.25, -1.0, 0.5]) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn does_not_amplify_near_silence_past_floor() {
        let mut samples = vec![0.001, -0.002];
        normalize_peak(&mut samples);
        assert!((samples[0] - 0.1).abs() < 1e-6);
        assert!((samples[1] + 0.2).abs() < 1e-6);
    }

    #[test]
    fn empty_input_is_fine() {
        let mut samples: Vec<f32> = Vec::new();
        normalize_peak(&mut samples);
        assert!(samples.is_empty());
    }
}
