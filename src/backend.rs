use std::fmt;

use serde::Deserialize;

/// Execution substrate a voice model is loaded onto.
///
/// A loaded voice is bound to exactly one backend for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Hardware-accelerated path (CUDA for the Piper engine).
    Accelerated,
    /// General-purpose CPU path; always the last resort.
    Default,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Accelerated => f.write_str("accelerated"),
            Backend::Default => f.write_str("default"),
        }
    }
}

/// Whether the user asked for the accelerated backend.
///
/// Acceleration is strictly opt-in: `NotRequested` never touches the
/// accelerated backend, `Requested` tries it first and falls back to
/// [`Backend::Default`] on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelerationPreference {
    Requested,
    #[default]
    NotRequested,
}

impl AccelerationPreference {
    /// Backend to attempt first for this preference.
    pub fn first_backend(self) -> Backend {
        match self {
            AccelerationPreference::Requested => Backend::Accelerated,
            AccelerationPreference::NotRequested => Backend::Default,
        }
    }
}

impl From<bool> for AccelerationPreference {
    fn from(use_gpu: bool) -> Self {
        if use_gpu {
            AccelerationPreference::Requested
        } else {
            AccelerationPreference::NotRequested
        }
    }
}
