use std::{fmt, io::Cursor, sync::Arc};

use anyhow::anyhow;
use async_ftp::FtpStream;
use tokio::sync::{Mutex, MutexGuard};

use simple_drive_core::{
    backends::{blob_storage, BlobStorageBackend},
    error,
    models::BackendKind,
    Error,
};

/// Stores payloads on an FTP server under a configured base directory.
///
/// The control connection is established lazily on first use and owned by
/// the instance; the mutex serializes operations on it and guards re-entrant
/// connect attempts.
pub struct FtpStorage {
    host: String,
    port: u16,
    username: String,
    password: String,
    base_dir: String,
    client: Mutex<Option<FtpStream>>,
}

impl fmt::Debug for FtpStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpStorage")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl FtpStorage {
    pub fn open(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        base_dir: &str,
    ) -> blob_storage::BlobStorage {
        Arc::new(FtpStorage::new(host, port, username, password, base_dir))
    }

    fn new(host: &str, port: u16, username: &str, password: &str, base_dir: &str) -> FtpStorage {
        let base_dir = base_dir.trim_end_matches('/');
        let base_dir = if base_dir.is_empty() { "/" } else { base_dir };

        FtpStorage {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            base_dir: base_dir.to_string(),
            client: Mutex::new(None),
        }
    }

    /// Connects on first use: login, then change into the base directory,
    /// creating it when the change fails.
    async fn client(&self) -> error::Result<MutexGuard<'_, Option<FtpStream>>> {
        let mut guard = self.client.lock().await;

        if guard.is_none() {
            let mut ftp = FtpStream::connect((self.host.as_str(), self.port))
                .await
                .map_err(|err| {
                    Error::Backend(anyhow!("failed to connect to ftp server: {err}"))
                })?;

            ftp.login(&self.username, &self.password)
                .await
                .map_err(|err| {
                    Error::Backend(anyhow!("failed to log in to ftp server: {err}"))
                })?;

            if self.base_dir != "/" {
                if ftp.cwd(&self.base_dir).await.is_err() {
                    ftp.mkdir(&self.base_dir).await.map_err(|err| {
                        Error::Backend(anyhow!("failed to create ftp base directory: {err}"))
                    })?;
                    ftp.cwd(&self.base_dir).await.map_err(|err| {
                        Error::Backend(anyhow!("failed to enter ftp base directory: {err}"))
                    })?;
                }
            }

            *guard = Some(ftp);
        }

        Ok(guard)
    }

    fn blob_path(&self, blob_id: &str) -> String {
        if self.base_dir == "/" {
            blob_id.to_string()
        } else {
            format!("{}/{}", self.base_dir, blob_id).replace("//", "/")
        }
    }
}

#[async_trait::async_trait]
impl BlobStorageBackend for FtpStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Ftp
    }

    async fn store(&self, blob_id: &str, data: &[u8]) -> error::Result<()> {
        let path = self.blob_path(blob_id);
        let mut guard = self.client().await?;
        let ftp = guard
            .as_mut()
            .ok_or_else(|| Error::Backend(anyhow!("ftp client not connected")))?;

        let mut reader = Cursor::new(data.to_vec());
        ftp.put(&path, &mut reader)
            .await
            .map_err(|err| Error::Backend(anyhow!("failed to store blob over ftp: {err}")))?;

        Ok(())
    }

    async fn retrieve(&self, blob_id: &str) -> error::Result<Vec<u8>> {
        // Distinguish the missing case up front; a failed stream transfer
        // would otherwise read as a backend error.
        if !self.exists(blob_id).await? {
            return Err(Error::NotFound(blob_id.to_string()));
        }

        let path = self.blob_path(blob_id);
        let mut guard = self.client().await?;
        let ftp = guard
            .as_mut()
            .ok_or_else(|| Error::Backend(anyhow!("ftp client not connected")))?;

        let cursor = ftp
            .simple_retr(&path)
            .await
            .map_err(|err| Error::Backend(anyhow!("failed to retrieve blob over ftp: {err}")))?;

        Ok(cursor.into_inner())
    }

    /// Lists the base directory and matches entry names; no stat command is
    /// assumed available. Listing failures read as absent.
    async fn exists(&self, blob_id: &str) -> error::Result<bool> {
        let path = self.blob_path(blob_id);
        let name = basename(&path);

        let mut guard = self.client().await?;
        let ftp = match guard.as_mut() {
            Some(ftp) => ftp,
            None => return Ok(false),
        };

        match ftp.nlst(None).await {
            Ok(entries) => Ok(entries.iter().any(|entry| basename(entry) == name)),
            Err(_) => Ok(false),
        }
    }

    async fn delete(&self, blob_id: &str) -> error::Result<()> {
        let path = self.blob_path(blob_id);
        let mut guard = self.client().await?;
        let ftp = guard
            .as_mut()
            .ok_or_else(|| Error::Backend(anyhow!("ftp client not connected")))?;

        ftp.rm(&path)
            .await
            .map_err(|err| Error::Backend(anyhow!("failed to delete blob over ftp: {err}")))?;

        Ok(())
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
