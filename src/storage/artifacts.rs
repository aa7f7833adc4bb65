// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Processed Image Storage
//!
//! Every processed image is written under its own request id, so concurrent
//! requests never share a path. An in-memory index maps ids to files and
//! remembers the most recent one for the "latest" download. Only the newest
//! `max_artifacts` images are kept; older files are deleted as new ones arrive.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::vision::image_utils::OutputFormat;

/// Download name used when the upload carried no usable file name
const DEFAULT_FILE_STEM: &str = "image";

/// Number of rendered images kept on disk by default
pub const DEFAULT_MAX_ARTIFACTS: usize = 100;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Metadata of one stored image
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub id: Uuid,
    /// Location on disk
    pub path: PathBuf,
    /// Name offered to clients when downloading
    pub file_name: String,
    pub format: OutputFormat,
    pub size_bytes: usize,
}

impl StoredArtifact {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

#[derive(Debug, Default)]
struct ArtifactIndex {
    entries: HashMap<Uuid, StoredArtifact>,
    /// Ids from oldest to newest
    order: VecDeque<Uuid>,
    latest: Option<Uuid>,
}

impl ArtifactIndex {
    /// Record `artifact` as the newest entry and return the artifacts that no
    /// longer fit under `limit`, plus a replaced file at a different path
    fn insert(&mut self, artifact: StoredArtifact, limit: usize) -> Vec<StoredArtifact> {
        let id = artifact.id;
        let mut stale = Vec::new();

        if let Some(previous) = self.entries.insert(id, artifact) {
            self.order.retain(|existing| *existing != id);
            if self.entries.get(&id).map(|a| &a.path) != Some(&previous.path) {
                stale.push(previous);
            }
        }
        self.order.push_back(id);
        self.latest = Some(id);

        while self.order.len() > limit {
            if let Some(oldest) = self.order.pop_front() {
                if let Some(evicted) = self.entries.remove(&oldest) {
                    stale.push(evicted);
                }
            }
        }

        stale
    }
}

/// Disk-backed store for rendered images, keyed by request id
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    max_artifacts: usize,
    index: Arc<RwLock<ArtifactIndex>>,
}

impl ArtifactStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::io(&root, e))?;

        info!("Artifact store ready at {}", root.display());

        Ok(Self {
            root,
            max_artifacts: DEFAULT_MAX_ARTIFACTS,
            index: Arc::new(RwLock::new(ArtifactIndex::default())),
        })
    }

    /// Keep at most `max_artifacts` images; the newest one is always kept
    pub fn with_max_artifacts(mut self, max_artifacts: usize) -> Self {
        self.max_artifacts = max_artifacts.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_artifacts(&self) -> usize {
        self.max_artifacts
    }

    /// Write a rendered image under a fresh id
    ///
    /// `original_name` is the uploaded file name; its stem becomes the
    /// download name, with the extension matching `format`.
    pub async fn store(
        &self,
        bytes: &[u8],
        format: OutputFormat,
        original_name: Option<&str>,
    ) -> Result<StoredArtifact, StorageError> {
        self.store_with_id(Uuid::new_v4(), bytes, format, original_name)
            .await
    }

    /// Write a rendered image under a caller-chosen id, such as a request id
    ///
    /// Storing under an existing id replaces that artifact. When the store is
    /// full the oldest artifacts are dropped from the index and deleted.
    pub async fn store_with_id(
        &self,
        id: Uuid,
        bytes: &[u8],
        format: OutputFormat,
        original_name: Option<&str>,
    ) -> Result<StoredArtifact, StorageError> {
        let path = self.root.join(format!("{}.{}", id, format.extension()));

        debug!("📥 Storing artifact {} ({} bytes)", id, bytes.len());

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::io(&path, e))?;

        let artifact = StoredArtifact {
            id,
            path,
            file_name: download_name(original_name, format),
            format,
            size_bytes: bytes.len(),
        };

        let stale = {
            let mut index = self.index.write().await;
            index.insert(artifact.clone(), self.max_artifacts)
        };

        for old in stale {
            debug!("🗑️ Evicting artifact {}", old.id);
            if let Err(e) = tokio::fs::remove_file(&old.path).await {
                warn!("Failed to remove artifact file {}: {}", old.path.display(), e);
            }
        }

        info!("✅ Artifact {} stored as {}", id, artifact.file_name);
        Ok(artifact)
    }

    /// Look up an artifact by id
    pub async fn get(&self, id: Uuid) -> Result<StoredArtifact, StorageError> {
        let index = self.index.read().await;
        index
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// The most recently stored artifact
    pub async fn latest(&self) -> Result<StoredArtifact, StorageError> {
        let index = self.index.read().await;
        index
            .latest
            .and_then(|id| index.entries.get(&id).cloned())
            .ok_or_else(|| StorageError::NotFound("no image has been processed yet".to_string()))
    }

    /// Read an artifact's bytes from disk
    ///
    /// A file that is gone, for example evicted after the lookup, reads as
    /// `NotFound`.
    pub async fn read(&self, artifact: &StoredArtifact) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(&artifact.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                return StorageError::NotFound(artifact.id.to_string());
            }
            warn!("Failed to read artifact {}: {}", artifact.id, e);
            StorageError::io(&artifact.path, e)
        })
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.entries.is_empty()
    }
}

/// Build a header-safe download name from the uploaded file name
fn download_name(original_name: Option<&str>, format: OutputFormat) -> String {
    let stem: String = original_name
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .map(|stem| {
            stem.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
                .collect()
        })
        .unwrap_or_default();

    let stem = if stem.is_empty() {
        DEFAULT_FILE_STEM
    } else {
        stem.as_str()
    };
    format!("{}.{}", stem, format.extension())
}
