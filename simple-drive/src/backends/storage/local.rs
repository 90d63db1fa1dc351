use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use tokio::fs;

use simple_drive_core::{
    backends::{blob_storage, BlobStorageBackend},
    error,
    models::BackendKind,
    Error,
};

/// Stores each payload as one file inside a fixed root directory.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub async fn open(root: impl Into<PathBuf>) -> Result<blob_storage::BlobStorage> {
        let root = root.into();

        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("failed to create storage root {}", root.display()))?;

        Ok(Arc::new(LocalStorage { root }))
    }

    fn blob_path(&self, blob_id: &str) -> PathBuf {
        self.root.join(sanitize_id(blob_id))
    }
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`, then every
/// `..` occurrence. Must run before any filesystem call; the result can
/// never name anything outside the storage root.
fn sanitize_id(blob_id: &str) -> String {
    let sanitized: String = blob_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    sanitized.replace("..", "_")
}

#[async_trait::async_trait]
impl BlobStorageBackend for LocalStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn store(&self, blob_id: &str, data: &[u8]) -> error::Result<()> {
        fs::write(self.blob_path(blob_id), data)
            .await
            .context("failed to store blob")?;

        Ok(())
    }

    async fn retrieve(&self, blob_id: &str) -> error::Result<Vec<u8>> {
        if !self.exists(blob_id).await? {
            return Err(Error::NotFound(blob_id.to_string()));
        }

        let data = fs::read(self.blob_path(blob_id))
            .await
            .context("failed to retrieve blob")?;

        Ok(data)
    }

    async fn exists(&self, blob_id: &str) -> error::Result<bool> {
        match fs::metadata(self.blob_path(blob_id)).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(Error::Backend(
                anyhow::Error::new(err).context("failed to check blob existence"),
            )),
        }
    }

    async fn delete(&self, blob_id: &str) -> error::Result<()> {
        match fs::remove_file(self.blob_path(blob_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Backend(
                anyhow::Error::new(err).context("failed to delete blob"),
            )),
        }
    }
}
