use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::model::PiperError;

/// Padding phoneme, inserted after every phoneme.
pub const PAD: char = '_';
/// Beginning-of-sentence phoneme.
pub const BOS: char = '^';
/// End-of-sentence phoneme.
pub const EOS: char = '$';

/// Voice configuration shipped next to every Piper model as `<model>.onnx.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct PiperConfig {
    pub audio: AudioConfig,
    #[serde(default)]
    pub espeak: EspeakVoice,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default = "default_num_speakers")]
    pub num_speakers: u32,
    pub phoneme_id_map: HashMap<String, Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspeakVoice {
    pub voice: String,
}

impl Default for EspeakVoice {
    fn default() -> Self {
        Self {
            voice: "ar".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub noise_scale: f32,
    pub length_scale: f32,
    pub noise_w: f32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            noise_scale: 0.667,
            length_scale: 1.0,
            noise_w: 0.8,
        }
    }
}

fn default_num_speakers() -> u32 {
    1
}

/// Path of the JSON config belonging to `model_path` (`voice.onnx` -> `voice.onnx.json`).
pub fn config_path(model_path: &Path) -> PathBuf {
    let mut path = OsString::from(model_path.as_os_str());
    path.push(".json");
    PathBuf::from(path)
}

impl PiperConfig {
    /// Load the config that sits next to `model_path`.
    pub fn load_for_model(model_path: &Path) -> Result<Self, PiperError> {
        let path = config_path(model_path);
        if !path.exists() {
            return Err(PiperError::MissingConfig(path));
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, PiperError> {
        let config: PiperConfig = serde_json::from_str(content)
            .map_err(|e| PiperError::Config(format!("Failed to parse JSON: {e}")))?;
        if config.audio.sample_rate == 0 {
            return Err(PiperError::Config("sample_rate must be positive".to_string()));
        }
        for required in [PAD, BOS, EOS] {
            if !config.phoneme_id_map.contains_key(required.to_string().as_str()) {
                return Err(PiperError::Config(format!(
                    "phoneme_id_map is missing {required:?}"
                )));
            }
        }
        Ok(config)
    }

    /// Phoneme map keyed by character. Multi-character keys are skipped.
    pub fn phoneme_ids(&self) -> PhonemeIdMap {
        let mut map = HashMap::with_capacity(self.phoneme_id_map.len());
        for (key, ids) in &self.phoneme_id_map {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => {
                    map.insert(ch, ids.clone());
                }
                _ => log::warn!("Skipping multi-character phoneme key {key:?}"),
            }
        }
        PhonemeIdMap { map }
    }
}

/// Mapping from a single phoneme character to its model ids.
#[derive(Debug, Clone)]
pub struct PhonemeIdMap {
    map: HashMap<char, Vec<i64>>,
}

impl PhonemeIdMap {
    fn push(&self, ch: char, ids: &mut Vec<i64>) -> bool {
        match self.map.get(&ch) {
            Some(found) => {
                ids.extend_from_slice(found);
                true
            }
            None => false,
        }
    }

    /// Encode one sentence of phonemes as `^ _ (p _)* $`.
    ///
    /// Phonemes without an id are dropped.
    pub fn encode(&self, phonemes: &str) -> Vec<i64> {
        let mut ids = Vec::with_capacity(phonemes.len() * 2 + 3);
        self.push(BOS, &mut ids);
        self.push(PAD, &mut ids);
        for ch in phonemes.chars() {
            if self.push(ch, &mut ids) {
                self.push(PAD, &mut ids);
            } else {
                log::debug!("No id for phoneme {ch:?}, dropping it");
            }
        }
        self.push(EOS, &mut ids);
        ids
    }
}
