use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::profile_sync::{PictureStore, ProfileSyncError, StoredFile};

/// Disk-backed file store rooted at the site's public files directory.
///
/// A JSON manifest plays the role of a managed-file table: it allocates
/// numeric file ids and records which files are permanent (exempt from
/// temporary-file cleanup). Existing files are never overwritten; a
/// colliding destination gets a `_0`, `_1`, ... suffix instead.
pub struct DiskFileStore {
    root: PathBuf,
    manifest_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    next_id: u64,
    files: Vec<ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            next_id: 1,
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestEntry {
    id: u64,
    path: String,
    permanent: bool,
}

impl DiskFileStore {
    pub fn new(root: impl AsRef<Path>, manifest_path: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            manifest_path: manifest_path.as_ref().to_path_buf(),
        }
    }

    async fn load_manifest(&self) -> Result<Manifest, ProfileSyncError> {
        if !self.manifest_path.exists() {
            return Ok(Manifest::default());
        }

        let text = fs::read_to_string(&self.manifest_path)
            .await
            .map_err(|e| ProfileSyncError::FileStore(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| ProfileSyncError::FileStore(e.to_string()))
    }

    async fn save_manifest(&self, manifest: &Manifest) -> Result<(), ProfileSyncError> {
        if let Some(parent) = self.manifest_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ProfileSyncError::FileStore(e.to_string()))?;
        }

        let text = serde_json::to_string_pretty(manifest)
            .map_err(|e| ProfileSyncError::FileStore(e.to_string()))?;
        fs::write(&self.manifest_path, text)
            .await
            .map_err(|e| ProfileSyncError::FileStore(e.to_string()))
    }

    /// First free variant of `destination`: the name itself, then
    /// `name_0.ext`, `name_1.ext`, ...
    async fn available_destination(&self, destination: &str) -> Result<String, ProfileSyncError> {
        let mut candidate = destination.to_string();
        let mut counter = 0u32;

        while fs::try_exists(self.root.join(&candidate))
            .await
            .map_err(|e| ProfileSyncError::FileStore(e.to_string()))?
        {
            candidate = match destination.rsplit_once('.') {
                Some((stem, extension)) => format!("{}_{}.{}", stem, counter, extension),
                None => format!("{}_{}", destination, counter),
            };
            counter += 1;
        }

        Ok(candidate)
    }
}

#[async_trait]
impl PictureStore for DiskFileStore {
    async fn write_permanent(
        &self,
        data: &[u8],
        destination: &str,
    ) -> Result<StoredFile, ProfileSyncError> {
        let relative = self.available_destination(destination).await?;
        let full_path = self.root.join(&relative);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ProfileSyncError::FileStore(e.to_string()))?;
        }

        fs::write(&full_path, data)
            .await
            .map_err(|e| ProfileSyncError::FileStore(e.to_string()))?;

        let mut manifest = self.load_manifest().await?;
        let id = manifest.next_id;
        manifest.next_id += 1;
        manifest.files.push(ManifestEntry {
            id,
            path: relative.clone(),
            permanent: true,
        });
        self.save_manifest(&manifest).await?;

        Ok(StoredFile { id, path: relative })
    }
}
