use std::{fmt::Debug, sync::Arc};

use crate::{error::Result, models::BackendKind, Error};

pub type BlobStorage = Arc<dyn BlobStorageBackend>;

/// Capability contract every storage variant satisfies.
///
/// `store` overwrites silently; id uniqueness is the blob service's job.
/// `exists` never fails for a merely missing blob, but the variants disagree
/// on transport failures: local and database surface them as `Backend`
/// errors while s3 and ftp report `false`, matching the service this
/// replaces.
#[async_trait::async_trait]
pub trait BlobStorageBackend: Debug + Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn store(&self, blob_id: &str, data: &[u8]) -> Result<()>;

    async fn retrieve(&self, blob_id: &str) -> Result<Vec<u8>>;

    async fn exists(&self, blob_id: &str) -> Result<bool>;

    async fn delete(&self, _blob_id: &str) -> Result<()> {
        Err(Error::Unsupported("delete"))
    }
}
