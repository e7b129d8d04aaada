//! Test doubles for the engine traits.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::Backend;
use crate::engine::{SynthesisVoice, VoiceLoader};
use crate::rate::RateScale;
use crate::voice::{VoiceCatalog, VoiceIdentity, MALE_MODEL_FILE};
use crate::SynthesisResult;

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct FakeError(String);

/// Temp directory holding placeholder model files for `present` identities.
pub fn model_dir(present: &[VoiceIdentity]) -> (tempfile::TempDir, VoiceCatalog) {
    let dir = tempfile::tempdir().unwrap();
    let catalog = VoiceCatalog::in_dir(dir.path());
    for &identity in present {
        std::fs::write(catalog.model_path(identity), b"onnx").unwrap();
    }
    (dir, catalog)
}

#[derive(Debug, Default)]
pub struct FakeLoader {
    failing: HashSet<Backend>,
    fail_synthesis: bool,
    accelerated_loads: AtomicUsize,
    default_loads: AtomicUsize,
    synth_calls: Arc<AtomicUsize>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, backend: Backend) -> Self {
        self.failing.insert(backend);
        self
    }

    pub fn failing_synthesis(mut self) -> Self {
        self.fail_synthesis = true;
        self
    }

    pub fn loads(&self, backend: Backend) -> usize {
        match backend {
            Backend::Accelerated => self.accelerated_loads.load(Ordering::SeqCst),
            Backend::Default => self.default_loads.load(Ordering::SeqCst),
        }
    }

    pub fn total_loads(&self) -> usize {
        self.loads(Backend::Accelerated) + self.loads(Backend::Default)
    }

    pub fn synth_calls(&self) -> usize {
        self.synth_calls.load(Ordering::SeqCst)
    }
}

impl VoiceLoader for FakeLoader {
    type Voice = FakeVoice;
    type Error = FakeError;

    fn load(&self, model_path: &Path, backend: Backend) -> Result<FakeVoice, FakeError> {
        let counter = match backend {
            Backend::Accelerated => &self.accelerated_loads,
            Backend::Default => &self.default_loads,
        };
        counter.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&backend) {
            return Err(FakeError(format!("{backend} backend unavailable")));
        }

        let sample_rate = if model_path.ends_with(MALE_MODEL_FILE) {
            22050
        } else {
            16000
        };
        Ok(FakeVoice {
            sample_rate,
            fail_synthesis: self.fail_synthesis,
            synth_calls: Arc::clone(&self.synth_calls),
        })
    }
}

#[derive(Debug)]
pub struct FakeVoice {
    sample_rate: u32,
    fail_synthesis: bool,
    synth_calls: Arc<AtomicUsize>,
}

impl SynthesisVoice for FakeVoice {
    type Error = FakeError;

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// 100 samples per character, stretched by the rate scale.
    fn synthesize(&self, text: &str, rate: RateScale) -> Result<SynthesisResult, FakeError> {
        self.synth_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_synthesis {
            return Err(FakeError("synthesis exploded".to_string()));
        }

        let len = (text.chars().count() as f32 * 100.0 * rate.value()) as usize;
        let samples = (0..len).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        Ok(SynthesisResult {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}
