//! Voice acquisition: identity + acceleration preference in, loaded voice out.
//!
//! Acceleration is opt-in. With [`AccelerationPreference::Requested`] the
//! model is first loaded on [`Backend::Accelerated`]; if that fails a
//! recoverable [`AcquisitionError::AcceleratedLoadFailed`] warning is recorded
//! and the load is retried once on [`Backend::Default`]. With
//! [`AccelerationPreference::NotRequested`] only the default backend is tried.
//!
//! Every successfully loaded voice is kept for the lifetime of the service.
//! Model files are static, so nothing is ever evicted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{AccelerationPreference, Backend};
use crate::engine::{SynthesisVoice, VoiceLoader};
use crate::voice::{VoiceCatalog, VoiceIdentity};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum AcquisitionError {
    #[error("Model file not found: {}", .path.display())]
    ModelNotFound {
        identity: VoiceIdentity,
        path: PathBuf,
    },
    #[error("Failed to load {} with acceleration enabled, retrying on CPU: {source}", .path.display())]
    AcceleratedLoadFailed {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error(
        "Failed to load {identity} voice from {} on the {backend} backend: {source}{}",
        .path.display(),
        accelerated_note(.accelerated)
    )]
    LoadFailed {
        identity: VoiceIdentity,
        path: PathBuf,
        backend: Backend,
        #[source]
        source: BoxError,
        /// Why the accelerated attempt failed first, when one was made.
        accelerated: Option<BoxError>,
    },
}

fn accelerated_note(accelerated: &Option<BoxError>) -> String {
    match accelerated {
        Some(cause) => format!(" (accelerated backend failed first: {cause})"),
        None => String::new(),
    }
}

impl AcquisitionError {
    /// True for errors that were recovered from by falling back.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AcquisitionError::AcceleratedLoadFailed { .. })
    }
}

/// A loaded voice bound to one model file and one backend.
///
/// Cheap to clone; clones share the underlying voice.
#[derive(Debug)]
pub struct VoiceHandle<V> {
    identity: VoiceIdentity,
    backend: Backend,
    model_path: PathBuf,
    voice: Arc<V>,
}

impl<V> Clone for VoiceHandle<V> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity,
            backend: self.backend,
            model_path: self.model_path.clone(),
            voice: Arc::clone(&self.voice),
        }
    }
}

impl<V> VoiceHandle<V> {
    pub fn identity(&self) -> VoiceIdentity {
        self.identity
    }

    /// Backend the voice actually loaded on.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }

    /// True when both handles share the same loaded voice.
    pub fn same_voice(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.voice, &other.voice)
    }
}

impl<V: SynthesisVoice> VoiceHandle<V> {
    pub fn sample_rate(&self) -> u32 {
        self.voice.sample_rate()
    }
}

/// Outcome of a successful [`VoiceAcquisitionService::acquire`].
#[derive(Debug)]
pub struct Acquisition<V> {
    pub handle: VoiceHandle<V>,
    /// Recoverable problems hit on the way (at most one fallback warning).
    pub warnings: Vec<AcquisitionError>,
}

struct VoiceCache<V> {
    voices: HashMap<(VoiceIdentity, Backend), VoiceHandle<V>>,
    resolved: HashMap<(VoiceIdentity, AccelerationPreference), Backend>,
}

impl<V> VoiceCache<V> {
    fn new() -> Self {
        Self {
            voices: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    fn lookup(
        &self,
        identity: VoiceIdentity,
        accel: AccelerationPreference,
    ) -> Option<VoiceHandle<V>> {
        let backend = self.resolved.get(&(identity, accel))?;
        self.voices.get(&(identity, *backend)).cloned()
    }
}

/// Resolves voice identities to loaded voices and keeps them loaded.
pub struct VoiceAcquisitionService<L: VoiceLoader> {
    catalog: VoiceCatalog,
    loader: L,
    cache: Mutex<VoiceCache<L::Voice>>,
}

impl<L: VoiceLoader> VoiceAcquisitionService<L> {
    pub fn new(catalog: VoiceCatalog, loader: L) -> Self {
        Self {
            catalog,
            loader,
            cache: Mutex::new(VoiceCache::new()),
        }
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Number of distinct loaded voices held by the cache.
    pub fn cached_voices(&self) -> usize {
        self.lock_cache().voices.len()
    }

    /// Whether `(identity, accel)` has already been resolved to a loaded voice.
    pub fn is_cached(&self, identity: VoiceIdentity, accel: AccelerationPreference) -> bool {
        self.lock_cache().lookup(identity, accel).is_some()
    }

    /// Get a loaded voice for `identity`, loading it on first use.
    ///
    /// Fails with [`AcquisitionError::ModelNotFound`] before any load is
    /// attempted when the model file is missing, and with
    /// [`AcquisitionError::LoadFailed`] when no backend could load it.
    /// Failed loads are not cached.
    pub fn acquire(
        &self,
        identity: VoiceIdentity,
        accel: AccelerationPreference,
    ) -> Result<Acquisition<L::Voice>, AcquisitionError> {
        // Held across the load so one model is never loaded twice.
        let mut cache = self.lock_cache();

        if let Some(handle) = cache.lookup(identity, accel) {
            log::debug!(
                "Reusing cached {} voice on the {} backend",
                identity,
                handle.backend
            );
            return Ok(Acquisition {
                handle,
                warnings: Vec::new(),
            });
        }

        let path = self.catalog.model_path(identity);
        if !path.is_file() {
            log::error!("Model file not found: {}", path.display());
            return Err(AcquisitionError::ModelNotFound {
                identity,
                path: path.to_path_buf(),
            });
        }

        let mut warnings = Vec::new();
        let handle = match accel.first_backend() {
            Backend::Accelerated => match self.load(identity, path, Backend::Accelerated) {
                Ok(handle) => {
                    cache
                        .voices
                        .insert((identity, Backend::Accelerated), handle.clone());
                    handle
                }
                Err(accelerated) => {
                    log::warn!(
                        "Failed to load {} with acceleration enabled, retrying on CPU: {}",
                        path.display(),
                        accelerated
                    );
                    match self.default_voice(&mut cache, identity, path) {
                        Ok(handle) => {
                            warnings.push(AcquisitionError::AcceleratedLoadFailed {
                                path: path.to_path_buf(),
                                source: accelerated,
                            });
                            handle
                        }
                        Err(mut err) => {
                            if let AcquisitionError::LoadFailed {
                                accelerated: cause, ..
                            } = &mut err
                            {
                                *cause = Some(accelerated);
                            }
                            log::error!("{err}");
                            return Err(err);
                        }
                    }
                }
            },
            Backend::Default => self
                .default_voice(&mut cache, identity, path)
                .inspect_err(|err| log::error!("{err}"))?,
        };

        cache.resolved.insert((identity, accel), handle.backend);
        Ok(Acquisition { handle, warnings })
    }

    /// Default-backend voice for `identity`, loading it only if no earlier
    /// request already did.
    fn default_voice(
        &self,
        cache: &mut VoiceCache<L::Voice>,
        identity: VoiceIdentity,
        path: &Path,
    ) -> Result<VoiceHandle<L::Voice>, AcquisitionError> {
        if let Some(handle) = cache.voices.get(&(identity, Backend::Default)) {
            return Ok(handle.clone());
        }

        let handle = self
            .load(identity, path, Backend::Default)
            .map_err(|source| AcquisitionError::LoadFailed {
                identity,
                path: path.to_path_buf(),
                backend: Backend::Default,
                source,
                accelerated: None,
            })?;
        cache
            .voices
            .insert((identity, Backend::Default), handle.clone());
        Ok(handle)
    }

    fn load(
        &self,
        identity: VoiceIdentity,
        path: &Path,
        backend: Backend,
    ) -> Result<VoiceHandle<L::Voice>, BoxError> {
        log::info!(
            "Loading {} voice from {} on the {} backend",
            identity,
            path.display(),
            backend
        );
        let voice = self.loader.load(path, backend).map_err(BoxError::from)?;
        log::info!(
            "Loaded {} voice on the {} backend ({} Hz)",
            identity,
            backend,
            voice.sample_rate()
        );
        Ok(VoiceHandle {
            identity,
            backend,
            model_path: path.to_path_buf(),
            voice: Arc::new(voice),
        })
    }

    fn lock_cache(&self) -> MutexGuard<'_, VoiceCache<L::Voice>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
