//! Persisted manifest correlating source ids with remote artifacts.
//!
//! The manifest is the only long-lived state the pipeline owns. It maps
//! each `sourceId` to the remote file that currently represents it, plus
//! the digest of the content that file was built from. Losing it is not
//! fatal: the reconciler rebuilds a skeleton from the remote file listing,
//! marking every digest [`UNKNOWN_DIGEST`] until confirmed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Config;

/// Sentinel digest for entries recovered from the remote listing whose
/// real digest has not been confirmed yet. Never trusted for diffing.
pub const UNKNOWN_DIGEST: &str = "UNKNOWN";

/// Default manifest location relative to the working directory.
const DEFAULT_MANIFEST_PATH: &str = ".cache/vector-store-manifest.json";

/// Environment variable naming a directory that survives across builds
/// (a CI build cache); the manifest is kept inside it when set.
pub const CACHE_DIR_ENV: &str = "SITESYNC_CACHE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    #[serde(rename = "vectorStoreId")]
    pub vector_store_id: String,
    /// Keyed by canonical source id. BTreeMap keeps the serialized form
    /// stable across runs.
    pub files: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    #[serde(rename = "openaiFileId")]
    pub file_id: String,
    pub sha256: String,
    pub url: String,
    pub kind: String,
}

impl Manifest {
    pub fn new(vector_store_id: String) -> Self {
        Self {
            vector_store_id,
            files: BTreeMap::new(),
        }
    }

    /// Whether any entry still carries the [`UNKNOWN_DIGEST`] sentinel.
    pub fn has_unresolved_digests(&self) -> bool {
        self.files.values().any(|e| e.sha256 == UNKNOWN_DIGEST)
    }
}

/// Load/save access to the persisted manifest file.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Resolve the manifest path: config override, then the build-cache
    /// directory from the environment, then the repo-local default.
    pub fn resolve(config: &Config) -> Self {
        let path = match &config.store.manifest_path {
            Some(path) => path.clone(),
            None => match std::env::var(CACHE_DIR_ENV) {
                Ok(dir) if !dir.trim().is_empty() => {
                    Path::new(&dir).join("vector-store-manifest.json")
                }
                _ => PathBuf::from(DEFAULT_MANIFEST_PATH),
            },
        };
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted manifest. A missing or unparsable file is
    /// "no manifest" (the caller falls back to rebuild-from-remote),
    /// never an error.
    pub fn load(&self) -> Option<Manifest> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no manifest on disk");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "manifest unreadable; treating as absent"
                );
                None
            }
        }
    }

    /// Durably persist the manifest: write a sibling temp file, then
    /// rename over the target so a crash never leaves a torn manifest.
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create manifest directory: {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(manifest)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write manifest: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace manifest: {}", self.path.display()))?;
        Ok(())
    }
}
