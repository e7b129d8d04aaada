//! The request boundary: one user action in, WAV bytes or a message out.

use derive_builder::Builder;

use crate::acquisition::{AcquisitionError, BoxError, VoiceAcquisitionService};
use crate::backend::{AccelerationPreference, Backend};
use crate::engine::{SynthesisVoice, VoiceLoader};
use crate::rate::{RateError, RateScale, NORMAL_SPEED};
use crate::voice::{VoiceCatalog, VoiceIdentity};

#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("Please enter some text.")]
    EmptyInput,
    #[error("Invalid speed: {0}")]
    InvalidSpeed(#[from] RateError),
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error("Error during synthesis: {source}")]
    SynthesisFailed {
        identity: VoiceIdentity,
        #[source]
        source: BoxError,
    },
    #[error("Failed to encode WAV audio: {0}")]
    Wav(#[from] hound::Error),
}

impl TtsError {
    /// Validation problems the user can fix by editing the form.
    pub fn is_warning(&self) -> bool {
        matches!(self, TtsError::EmptyInput | TtsError::InvalidSpeed(_))
    }

    /// Message for the user-facing surface.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[derive(thiserror::Error, Debug)]
#[error("engine produced no audio for the given text")]
struct NoAudio;

/// One synthesis request, created per user action.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct SynthesisRequest {
    #[builder(setter(into))]
    pub text: String,
    #[builder(default = "VoiceIdentity::Male")]
    pub voice: VoiceIdentity,
    /// User-facing speed, 1.0 is normal.
    #[builder(default = "NORMAL_SPEED")]
    pub speed: f32,
    #[builder(default)]
    pub acceleration: AccelerationPreference,
}

impl SynthesisRequest {
    pub fn builder() -> SynthesisRequestBuilder {
        SynthesisRequestBuilder::default()
    }

    pub fn new(text: impl Into<String>, voice: VoiceIdentity) -> Self {
        Self {
            text: text.into(),
            voice,
            speed: NORMAL_SPEED,
            acceleration: AccelerationPreference::default(),
        }
    }
}

/// Audio ready for the playback sink.
#[derive(Debug)]
pub struct SynthesisOutcome {
    /// Mono 16-bit WAV stream.
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub voice: VoiceIdentity,
    pub backend: Backend,
    pub duration_secs: f64,
    pub warnings: Vec<AcquisitionError>,
}

/// What the UI shows after a request.
#[derive(Debug)]
pub enum Response {
    Audio(SynthesisOutcome),
    Warning(String),
    Error(String),
}

/// Handles synthesis requests end to end on top of a voice cache.
pub struct Synthesizer<L: VoiceLoader> {
    voices: VoiceAcquisitionService<L>,
}

impl<L: VoiceLoader> Synthesizer<L> {
    pub fn new(catalog: VoiceCatalog, loader: L) -> Self {
        Self::with_service(VoiceAcquisitionService::new(catalog, loader))
    }

    pub fn with_service(voices: VoiceAcquisitionService<L>) -> Self {
        Self { voices }
    }

    pub fn voices(&self) -> &VoiceAcquisitionService<L> {
        &self.voices
    }

    /// Run one request to completion.
    ///
    /// Blank text is rejected before any model work. A synthesis failure
    /// leaves the acquired voice cached for the next request.
    pub fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome, TtsError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(TtsError::EmptyInput);
        }
        let rate = RateScale::from_speed(request.speed)?;

        let acquired = self.voices.acquire(request.voice, request.acceleration)?;
        let handle = acquired.handle;

        log::debug!(
            "Synthesizing {} chars with the {} voice (rate scale {:.2})",
            text.chars().count(),
            request.voice,
            rate.value()
        );
        let result = handle
            .voice()
            .synthesize(text, rate)
            .map_err(|e| TtsError::SynthesisFailed {
                identity: request.voice,
                source: e.into(),
            })?;
        if result.samples.is_empty() {
            return Err(TtsError::SynthesisFailed {
                identity: request.voice,
                source: Box::new(NoAudio),
            });
        }

        let wav = result.to_wav_bytes()?;
        log::info!(
            "Synthesized {:.2}s of audio at {} Hz on the {} backend",
            result.duration_secs(),
            result.sample_rate,
            handle.backend()
        );

        Ok(SynthesisOutcome {
            wav,
            sample_rate: result.sample_rate,
            voice: request.voice,
            backend: handle.backend(),
            duration_secs: result.duration_secs(),
            warnings: acquired.warnings,
        })
    }

    /// Run one request and turn every outcome into something displayable.
    pub fn respond(&self, request: &SynthesisRequest) -> Response {
        match self.synthesize(request) {
            Ok(outcome) => Response::Audio(outcome),
            Err(e) if e.is_warning() => {
                log::warn!("{e}");
                Response::Warning(e.user_message())
            }
            Err(e) => {
                log::error!("{e}");
                Response::Error(e.user_message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::testing::{model_dir, FakeLoader};

    fn synthesizer(
        loader: FakeLoader,
    ) -> (tempfile::TempDir, Synthesizer<FakeLoader>) {
        let (dir, catalog) = model_dir(&VoiceIdentity::ALL);
        (dir, Synthesizer::new(catalog, loader))
    }

    #[test]
    fn builder_defaults_match_the_form() {
        let request = SynthesisRequest::builder().text("مرحبا").build().unwrap();
        assert_eq!(request.voice, VoiceIdentity::Male);
        assert_eq!(request.speed, 1.0);
        assert_eq!(request.acceleration, AccelerationPreference::NotRequested);
        assert!(SynthesisRequest::builder().build().is_err());
    }

    #[test]
    fn female_voice_end_to_end() {
        let (_dir, synth) = synthesizer(FakeLoader::new());
        let request = SynthesisRequest::builder()
            .text("مرحبا")
            .voice(VoiceIdentity::Female)
            .speed(1.0)
            .build()
            .unwrap();

        let outcome = synth.synthesize(&request).unwrap();

        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.sample_rate, 16000);
        assert_eq!(outcome.backend, Backend::Default);

        let reader = hound::WavReader::new(Cursor::new(outcome.wav)).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.spec().sample_rate, 16000);
        assert!(reader.len() > 0);
    }

    #[test]
    fn blank_text_never_touches_the_engine() {
        let (_dir, synth) = synthesizer(FakeLoader::new());

        for text in ["", "   ", "\n\t "] {
            let err = synth
                .synthesize(&SynthesisRequest::new(text, VoiceIdentity::Female))
                .unwrap_err();
            assert!(matches!(err, TtsError::EmptyInput));
            assert!(err.is_warning());
        }
        assert_eq!(synth.voices().loader().total_loads(), 0);
        assert_eq!(synth.voices().loader().synth_calls(), 0);
    }

    #[test]
    fn invalid_speed_is_rejected_before_loading() {
        let (_dir, synth) = synthesizer(FakeLoader::new());
        let mut request = SynthesisRequest::new("مرحبا", VoiceIdentity::Male);
        request.speed = 3.0;

        let err = synth.synthesize(&request).unwrap_err();

        assert!(matches!(err, TtsError::InvalidSpeed(_)));
        assert_eq!(synth.voices().loader().total_loads(), 0);
    }

    #[test]
    fn faster_speed_gives_shorter_audio() {
        let (_dir, synth) = synthesizer(FakeLoader::new());
        let mut request = SynthesisRequest::new("السلام عليكم", VoiceIdentity::Male);

        let normal = synth.synthesize(&request).unwrap();
        request.speed = 2.0;
        let fast = synth.synthesize(&request).unwrap();

        assert!(fast.duration_secs < normal.duration_secs);
        assert!((fast.duration_secs * 2.0 - normal.duration_secs).abs() < 0.01);
        // Speed is per request; the voice was loaded once.
        assert_eq!(synth.voices().loader().total_loads(), 1);
    }

    #[test]
    fn fallback_warning_reaches_the_caller() {
        let (_dir, synth) = synthesizer(FakeLoader::new().failing_on(Backend::Accelerated));
        let request = SynthesisRequest::builder()
            .text("مرحبا")
            .acceleration(AccelerationPreference::Requested)
            .build()
            .unwrap();

        let outcome = synth.synthesize(&request).unwrap();

        assert_eq!(outcome.backend, Backend::Default);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(
            outcome.warnings[0],
            AcquisitionError::AcceleratedLoadFailed { .. }
        ));
    }

    #[test]
    fn failed_fallback_reports_both_backend_causes() {
        let (_dir, synth) = synthesizer(
            FakeLoader::new()
                .failing_on(Backend::Accelerated)
                .failing_on(Backend::Default),
        );
        let request = SynthesisRequest::builder()
            .text("مرحبا")
            .acceleration(AccelerationPreference::Requested)
            .build()
            .unwrap();

        let err = synth.synthesize(&request).unwrap_err();

        assert!(!err.is_warning());
        let message = err.user_message();
        assert!(message.contains("accelerated backend unavailable"));
        assert!(message.contains("default backend unavailable"));
    }

    #[test]
    fn synthesis_failure_keeps_the_voice_cached() {
        let (_dir, synth) = synthesizer(FakeLoader::new().failing_synthesis());
        let request = SynthesisRequest::new("مرحبا", VoiceIdentity::Female);

        let err = synth.synthesize(&request).unwrap_err();
        assert!(matches!(err, TtsError::SynthesisFailed { .. }));
        assert!(err.user_message().contains("synthesis exploded"));
        assert!(synth
            .voices()
            .is_cached(VoiceIdentity::Female, AccelerationPreference::NotRequested));

        let _ = synth.synthesize(&request);
        assert_eq!(synth.voices().loader().total_loads(), 1);
        assert_eq!(synth.voices().loader().synth_calls(), 2);
    }

    #[test]
    fn respond_maps_outcomes_to_messages() {
        let (dir, catalog) = model_dir(&[VoiceIdentity::Male]);
        let synth = Synthesizer::new(catalog, FakeLoader::new());

        match synth.respond(&SynthesisRequest::new(" ", VoiceIdentity::Male)) {
            Response::Warning(msg) => assert_eq!(msg, "Please enter some text."),
            other => panic!("expected warning, got {other:?}"),
        }

        match synth.respond(&SynthesisRequest::new("مرحبا", VoiceIdentity::Female)) {
            Response::Error(msg) => {
                let missing = dir.path().join("arabic-emirati-female-model.onnx");
                assert_eq!(msg, format!("Model file not found: {}", missing.display()));
            }
            other => panic!("expected error, got {other:?}"),
        }

        assert!(matches!(
            synth.respond(&SynthesisRequest::new("مرحبا", VoiceIdentity::Male)),
            Response::Audio(_)
        ));
    }
}
