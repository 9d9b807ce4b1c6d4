//! File-based asset cache: one blob plus one JSON sidecar per asset.
//!
//! Layout under the cache directory:
//!
//! ```text
//! <sha256(uri)>.<uuid>.bin   raw asset bytes, one file per stored version
//! <sha256(uri)>.json          {"uri": ..., "blob": ..., "last_modified": ..., "size": ...}
//! ```
//!
//! A store writes a fresh blob, then renames a new sidecar into place. The
//! sidecar rename is the commit point: until it succeeds the old sidecar
//! still names the old blob. The superseded blob is deleted afterwards.
//! Opening the cache rebuilds the index from the sidecars and deletes blobs
//! no sidecar names.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loadstone_core::asset::ResourceStream;
use loadstone_core::cache::{AssetCache, CachePolicy};
use loadstone_core::error::CacheError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

const BLOB_EXT: &str = "bin";
const SIDECAR_EXT: &str = "json";
const TMP_EXT: &str = "tmp";

/// Metadata persisted next to every blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sidecar {
    uri: String,
    blob: String,
    last_modified: Option<DateTime<Utc>>,
    size: u64,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    key: String,
    blob: String,
    last_modified: Option<DateTime<Utc>>,
}

/// A persistent asset cache rooted at a directory.
pub struct FileAssetCache {
    dir: PathBuf,
    index: Arc<RwLock<HashMap<String, IndexEntry>>>,
    policy: CachePolicy,
}

impl FileAssetCache {
    /// Open (or create) a cache at `dir`.
    ///
    /// Sidecars that fail to parse, or whose blob is missing, are skipped.
    pub fn open(dir: impl Into<PathBuf>, policy: CachePolicy) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            CacheError::Storage(format!("Failed to create cache directory {}: {e}", dir.display()))
        })?;

        let index = Self::load_index(&dir)?;
        debug!(dir = %dir.display(), count = index.len(), "File asset cache opened");

        Ok(Self {
            dir,
            index: Arc::new(RwLock::new(index)),
            policy,
        })
    }

    /// Default directory: `~/.loadstone/cache`
    pub fn default_dir() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".loadstone").join("cache")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of cached assets.
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    fn key_for(uri: &str) -> String {
        hex::encode(Sha256::digest(uri.as_bytes()))
    }

    fn new_blob_name(key: &str) -> String {
        format!("{key}.{}.{BLOB_EXT}", Uuid::new_v4().simple())
    }

    fn blob_path(&self, blob: &str) -> PathBuf {
        self.dir.join(blob)
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SIDECAR_EXT}"))
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.{TMP_EXT}", Uuid::new_v4()))
    }

    fn load_index(dir: &Path) -> Result<HashMap<String, IndexEntry>, CacheError> {
        let read_dir = std::fs::read_dir(dir).map_err(|e| {
            CacheError::Storage(format!("Failed to read cache directory {}: {e}", dir.display()))
        })?;

        let mut index = HashMap::new();
        let mut blobs = Vec::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some(SIDECAR_EXT) => {}
                Some(BLOB_EXT) => {
                    blobs.push(path);
                    continue;
                }
                Some(TMP_EXT) => {
                    // Left behind by an interrupted store.
                    let _ = std::fs::remove_file(&path);
                    continue;
                }
                _ => continue,
            }

            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let sidecar = match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<Sidecar>(&s).map_err(|e| e.to_string()))
            {
                Ok(sidecar) => sidecar,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping corrupted cache sidecar");
                    continue;
                }
            };

            if !dir.join(&sidecar.blob).is_file() {
                warn!(uri = %sidecar.uri, "Skipping cache entry with missing blob");
                continue;
            }

            index.insert(
                sidecar.uri,
                IndexEntry {
                    key,
                    blob: sidecar.blob,
                    last_modified: sidecar.last_modified,
                },
            );
        }

        // Blobs from stores that never committed, or whose sidecar is gone.
        for path in blobs {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if !index.values().any(|e| e.blob == name) {
                debug!(path = %path.display(), "Removing unreferenced cache blob");
                let _ = std::fs::remove_file(&path);
            }
        }
        Ok(index)
    }

    /// Write `bytes` to a temporary file, then rename it to `target`.
    async fn write_atomic(&self, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let tmp = self.tmp_path();
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&tmp, target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    async fn remove_files(&self, entry: &IndexEntry) {
        for path in [self.blob_path(&entry.blob), self.sidecar_path(&entry.key)] {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove cache file");
                }
            }
        }
    }
}

#[async_trait]
impl AssetCache for FileAssetCache {
    fn name(&self) -> &str {
        "file"
    }

    fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    async fn exists(&self, uri: &str) -> bool {
        self.index.read().await.contains_key(uri)
    }

    async fn retrieve(&self, uri: &str) -> Result<ResourceStream, CacheError> {
        loop {
            let blob = self
                .index
                .read()
                .await
                .get(uri)
                .map(|e| e.blob.clone())
                .ok_or_else(|| CacheError::NotFound(uri.to_string()))?;

            match tokio::fs::read(self.blob_path(&blob)).await {
                Ok(bytes) => return Ok(ResourceStream::from_bytes(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    let mut index = self.index.write().await;
                    // A concurrent store replaced the blob; read the new one.
                    if index.get(uri).is_some_and(|e| e.blob != blob) {
                        continue;
                    }
                    warn!(uri = %uri, "Cache blob vanished, dropping index entry");
                    index.remove(uri);
                    return Err(CacheError::NotFound(uri.to_string()));
                }
                Err(e) => {
                    return Err(CacheError::Storage(format!("Failed to read cached {uri}: {e}")));
                }
            }
        }
    }

    async fn store(&self, uri: &str, content: ResourceStream) -> Result<(), CacheError> {
        let write_err = |reason: String| CacheError::Write {
            uri: uri.to_string(),
            reason,
        };

        let bytes = content.read_to_end().await.map_err(|e| write_err(e.to_string()))?;

        let key = Self::key_for(uri);
        let blob = Self::new_blob_name(&key);
        let sidecar = Sidecar {
            uri: uri.to_string(),
            blob: blob.clone(),
            last_modified: Some(Utc::now()),
            size: bytes.len() as u64,
        };
        let sidecar_json =
            serde_json::to_vec_pretty(&sidecar).map_err(|e| write_err(e.to_string()))?;

        let blob_path = self.blob_path(&blob);
        if let Err(e) = tokio::fs::write(&blob_path, &bytes).await {
            let _ = tokio::fs::remove_file(&blob_path).await;
            return Err(write_err(format!("blob: {e}")));
        }

        // The sidecar rename and the index swap happen under one write lock.
        let mut index = self.index.write().await;
        if let Err(e) = self.write_atomic(&self.sidecar_path(&key), &sidecar_json).await {
            let _ = tokio::fs::remove_file(&blob_path).await;
            return Err(write_err(format!("sidecar: {e}")));
        }

        debug!(uri = %uri, blob = %blob, bytes = bytes.len(), "Stored asset on disk");
        let previous = index.insert(
            uri.to_string(),
            IndexEntry {
                key,
                blob,
                last_modified: sidecar.last_modified,
            },
        );
        drop(index);

        if let Some(previous) = previous {
            if let Err(e) = tokio::fs::remove_file(self.blob_path(&previous.blob)).await {
                warn!(uri = %uri, error = %e, "Failed to remove superseded cache blob");
            }
        }
        Ok(())
    }

    async fn last_modified(&self, uri: &str) -> Option<DateTime<Utc>> {
        self.index
            .read()
            .await
            .get(uri)
            .and_then(|e| e.last_modified)
    }

    async fn remove(&self, uri: &str) -> Result<bool, CacheError> {
        let mut index = self.index.write().await;
        match index.remove(uri) {
            Some(entry) => {
                self.remove_files(&entry).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn uris(&self) -> Vec<String> {
        self.index.read().await.keys().cloned().collect()
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut index = self.index.write().await;
        for (_, entry) in index.drain() {
            self.remove_files(&entry).await;
        }
        Ok(())
    }
}
