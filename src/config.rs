//! Deployment configuration for the demo.
//!
//! Defaults match a checkout with both model files next to the binary.
//! Environment overrides:
//! - `ARABIC_TTS_MODEL_DIR`: directory holding the model files
//! - `ARABIC_TTS_MALE_MODEL`, `ARABIC_TTS_FEMALE_MODEL`: model file names (or paths)
//! - `ARABIC_TTS_USE_GPU`: `1|true|yes|on` requests acceleration by default

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::backend::AccelerationPreference;
use crate::voice::{VoiceCatalog, FEMALE_MODEL_FILE, MALE_MODEL_FILE};

pub const ENV_MODEL_DIR: &str = "ARABIC_TTS_MODEL_DIR";
pub const ENV_MALE_MODEL: &str = "ARABIC_TTS_MALE_MODEL";
pub const ENV_FEMALE_MODEL: &str = "ARABIC_TTS_FEMALE_MODEL";
pub const ENV_USE_GPU: &str = "ARABIC_TTS_USE_GPU";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub model_dir: PathBuf,
    pub male_model: PathBuf,
    pub female_model: PathBuf,
    pub acceleration: AccelerationPreference,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("."),
            male_model: PathBuf::from(MALE_MODEL_FILE),
            female_model: PathBuf::from(FEMALE_MODEL_FILE),
            acceleration: AccelerationPreference::NotRequested,
        }
    }
}

impl DemoConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Load from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = var(ENV_MODEL_DIR) {
            self.model_dir = PathBuf::from(dir);
        }
        if let Some(male) = var(ENV_MALE_MODEL) {
            self.male_model = PathBuf::from(male);
        }
        if let Some(female) = var(ENV_FEMALE_MODEL) {
            self.female_model = PathBuf::from(female);
        }
        if let Some(flag) = var(ENV_USE_GPU) {
            let on = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
            self.acceleration = AccelerationPreference::from(on);
        }
        self
    }

    /// Voice catalog for this deployment. Absolute model paths are kept as is.
    pub fn catalog(&self) -> VoiceCatalog {
        VoiceCatalog::new(
            self.model_dir.join(&self.male_model),
            self.model_dir.join(&self.female_model),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::voice::VoiceIdentity;

    #[test]
    fn default_catalog_uses_bundled_file_names() {
        let catalog = DemoConfig::default().catalog();
        assert_eq!(
            catalog.model_path(VoiceIdentity::Male),
            Path::new("./ar_JO-kareem-medium.onnx")
        );
    }

    #[test]
    fn overrides_replace_fields() {
        let env: HashMap<&str, &str> = [
            (ENV_MODEL_DIR, "/srv/voices"),
            (ENV_FEMALE_MODEL, "ar_female.onnx"),
            (ENV_USE_GPU, "Yes"),
        ]
        .into_iter()
        .collect();

        let config = DemoConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.acceleration, AccelerationPreference::Requested);
        let catalog = config.catalog();
        assert_eq!(
            catalog.model_path(VoiceIdentity::Female),
            Path::new("/srv/voices/ar_female.onnx")
        );
        assert_eq!(
            catalog.model_path(VoiceIdentity::Male),
            Path::new("/srv/voices/ar_JO-kareem-medium.onnx")
        );
    }

    #[test]
    fn gpu_flag_off_values() {
        let config = DemoConfig::default().with_overrides(|k| {
            (k == ENV_USE_GPU).then(|| "0".to_string())
        });
        assert_eq!(config.acceleration, AccelerationPreference::NotRequested);
    }

    #[test]
    fn loads_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        std::fs::write(&path, r#"{ "model_dir": "models", "acceleration": "requested" }"#).unwrap();

        let config = DemoConfig::from_json_file(&path).unwrap();

        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.male_model, PathBuf::from(MALE_MODEL_FILE));
        assert_eq!(config.acceleration, AccelerationPreference::Requested);
    }

    #[test]
    fn rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            DemoConfig::from_json_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
