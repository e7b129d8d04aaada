use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default file name of the male voice model (Jordanian Arabic, "kareem").
pub const MALE_MODEL_FILE: &str = "ar_JO-kareem-medium.onnx";

/// Default file name of the female voice model (Emirati Arabic).
pub const FEMALE_MODEL_FILE: &str = "arabic-emirati-female-model.onnx";

/// The two voices offered by the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceIdentity {
    Male,
    Female,
}

impl VoiceIdentity {
    pub const ALL: [VoiceIdentity; 2] = [VoiceIdentity::Male, VoiceIdentity::Female];

    /// Parse a user-facing selector value (`"male"`, `"Female"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(VoiceIdentity::Male),
            "female" | "f" => Some(VoiceIdentity::Female),
            _ => None,
        }
    }
}

impl fmt::Display for VoiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceIdentity::Male => f.write_str("Male"),
            VoiceIdentity::Female => f.write_str("Female"),
        }
    }
}

/// Fixed mapping from voice identity to model file.
///
/// Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCatalog {
    male: PathBuf,
    female: PathBuf,
}

impl VoiceCatalog {
    pub fn new(male: impl Into<PathBuf>, female: impl Into<PathBuf>) -> Self {
        Self {
            male: male.into(),
            female: female.into(),
        }
    }

    /// Catalog with the default model file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MALE_MODEL_FILE), dir.join(FEMALE_MODEL_FILE))
    }

    pub fn model_path(&self, identity: VoiceIdentity) -> &Path {
        match identity {
            VoiceIdentity::Male => &self.male,
            VoiceIdentity::Female => &self.female,
        }
    }
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::new(MALE_MODEL_FILE, FEMALE_MODEL_FILE)
    }
}
