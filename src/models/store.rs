//! Artifact stores.
//!
//! `DirectoryStore` reads `<root>/<artifact name>` as an ARIMAX JSON description.
//! `MemoryStore` keeps artifacts in memory (demo runs and tests).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AppError;
use crate::models::arima::ArimaxArtifact;
use crate::models::forecast::{ArtifactStore, Forecaster};

/// Environment variable naming the artifact directory.
pub const MODELS_DIR_ENV: &str = "YW_MODELS_DIR";

/// Default artifact directory when neither a flag nor the environment sets one.
pub const DEFAULT_MODELS_DIR: &str = "models";

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the root from an explicit path, then `YW_MODELS_DIR`, then `models`.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(p) = explicit {
            return Self::new(p);
        }
        match std::env::var(MODELS_DIR_ENV) {
            Ok(v) if !v.trim().is_empty() => Self::new(v.trim()),
            _ => Self::new(DEFAULT_MODELS_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn read_artifact(&self, name: &str) -> Result<ArimaxArtifact, AppError> {
        let path = self.root.join(name);
        let file = File::open(&path).map_err(|e| {
            AppError::dispatch(format!("No forecaster artifact at '{}': {e}", path.display()))
        })?;
        let artifact: ArimaxArtifact = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AppError::dispatch(format!("Invalid forecaster artifact '{}': {e}", path.display())))?;
        artifact.validate(name)?;
        debug!(path = %path.display(), exog = artifact.exog_columns.len(), "artifact loaded");
        Ok(artifact)
    }
}

impl ArtifactStore for DirectoryStore {
    fn load(&self, name: &str) -> Result<Box<dyn Forecaster>, AppError> {
        Ok(Box::new(self.read_artifact(name)?))
    }
}

/// In-memory artifact store keyed by artifact name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: BTreeMap<String, ArimaxArtifact>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, artifact: ArimaxArtifact) {
        self.artifacts.insert(name.into(), artifact);
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArimaxArtifact)> {
        self.artifacts.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl ArtifactStore for MemoryStore {
    fn load(&self, name: &str) -> Result<Box<dyn Forecaster>, AppError> {
        let artifact = self
            .artifacts
            .get(name)
            .ok_or_else(|| AppError::dispatch(format!("No forecaster artifact named `{name}`.")))?;
        artifact.validate(name)?;
        Ok(Box::new(artifact.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ArimaxArtifact {
        ArimaxArtifact {
            intercept: 4.0,
            ar: Vec::new(),
            d: 0,
            exog_columns: vec!["diff_FFR".to_string()],
            exog_coefs: vec![0.5],
            sigma: 0.1,
            history: Vec::new(),
            alpha: 0.2,
        }
    }

    #[test]
    fn directory_store_round_trips_json() {
        let dir = tempfile::tempdir().unwrap();
        let name = "arima_model_2-year_monthly_tariff_ffr_cpi.pkl";
        let file = File::create(dir.path().join(name)).unwrap();
        serde_json::to_writer(file, &artifact()).unwrap();

        let store = DirectoryStore::new(dir.path());
        let loaded = store.load(name).unwrap();
        assert_eq!(loaded.exog_columns(), &["diff_FFR".to_string()]);

        let err = store.load("missing.pkl").err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::Dispatch);
    }

    #[test]
    fn corrupt_artifacts_are_dispatch_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.pkl"), b"\x80\x04binary pickle").unwrap();
        let err = DirectoryStore::new(dir.path()).load("bad.pkl").err().unwrap();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn explicit_root_wins() {
        let store = DirectoryStore::resolve(Some(Path::new("/tmp/artifacts")));
        assert_eq!(store.root(), Path::new("/tmp/artifacts"));
    }

    #[test]
    fn memory_store_validates_on_load() {
        let mut store = MemoryStore::new();
        let mut bad = artifact();
        bad.sigma = -1.0;
        store.insert("bad", bad);
        store.insert("good", artifact());
        assert!(store.load("bad").is_err());
        assert!(store.load("good").is_ok());
        assert!(store.load("other").is_err());
    }
}
