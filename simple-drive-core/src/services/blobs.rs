use chrono::Utc;

use crate::{
    backends::{BlobStorage, MetadataStore},
    error::Result,
    models, Error,
};

/// Sequences metadata bookkeeping with backend payload I/O.
///
/// Callers must always go through this service to get the id uniqueness
/// guarantee; the payload stores themselves overwrite silently.
#[derive(Clone)]
pub struct BlobService {
    storage: BlobStorage,
    metadata: MetadataStore,
}

impl BlobService {
    pub fn new(storage: BlobStorage, metadata: MetadataStore) -> BlobService {
        BlobService { storage, metadata }
    }

    /// Not atomic across the payload store and the metadata store: a crash
    /// after `store` but before the insert leaves an orphaned payload behind.
    /// The metadata primary key still keeps ids unique.
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    pub async fn create_blob(&self, blob_id: &str, data: &[u8]) -> Result<models::BlobMetadata> {
        if self.metadata.get_blob(blob_id).await?.is_some() {
            return Err(Error::AlreadyExists(blob_id.to_string()));
        }

        self.storage.store(blob_id, data).await?;

        let metadata = models::BlobMetadata {
            id: blob_id.to_string(),
            size: data.len() as i64,
            created_at: Utc::now(),
            storage_backend: self.storage.kind().to_string(),
            storage_path: Some(blob_id.to_string()),
        };

        self.metadata.insert_blob(&metadata).await?;

        tracing::info!(blob_id, size = metadata.size, "created blob");

        Ok(metadata)
    }

    /// A metadata row whose backend copy has gone missing surfaces the
    /// backend's own not-found or error; the service does not reconcile the
    /// inconsistency.
    #[tracing::instrument(skip(self))]
    pub async fn get_blob(&self, blob_id: &str) -> Result<(Vec<u8>, models::BlobMetadata)> {
        let metadata = self
            .metadata
            .get_blob(blob_id)
            .await?
            .ok_or_else(|| Error::NotFound(blob_id.to_string()))?;

        let data = self.storage.retrieve(blob_id).await?;

        Ok((data, metadata))
    }

    pub async fn blob_exists(&self, blob_id: &str) -> Result<bool> {
        if self.metadata.get_blob(blob_id).await?.is_some() {
            return Ok(true);
        }

        self.storage.exists(blob_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::{
        backends::{BlobStorageBackend, MetadataStoreBackend},
        models::BackendKind,
    };

    #[derive(Debug, Default)]
    struct MemoryStorage {
        blobs: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl BlobStorageBackend for MemoryStorage {
        fn kind(&self) -> BackendKind {
            BackendKind::Local
        }

        async fn store(&self, blob_id: &str, data: &[u8]) -> Result<()> {
            self.blobs
                .lock()
                .unwrap()
                .insert(blob_id.to_string(), data.to_vec());
            Ok(())
        }

        async fn retrieve(&self, blob_id: &str) -> Result<Vec<u8>> {
            self.blobs
                .lock()
                .unwrap()
                .get(blob_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(blob_id.to_string()))
        }

        async fn exists(&self, blob_id: &str) -> Result<bool> {
            Ok(self.blobs.lock().unwrap().contains_key(blob_id))
        }
    }

    #[derive(Debug, Default)]
    struct MemoryMetadata {
        rows: Mutex<HashMap<String, models::BlobMetadata>>,
    }

    #[async_trait::async_trait]
    impl MetadataStoreBackend for MemoryMetadata {
        async fn get_blob(&self, blob_id: &str) -> Result<Option<models::BlobMetadata>> {
            Ok(self.rows.lock().unwrap().get(blob_id).cloned())
        }

        async fn insert_blob(&self, metadata: &models::BlobMetadata) -> Result<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(metadata.id.clone(), metadata.clone());
            Ok(())
        }
    }

    fn service() -> BlobService {
        BlobService::new(
            Arc::new(MemoryStorage::default()),
            Arc::new(MemoryMetadata::default()),
        )
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let service = service();

        let metadata = service.create_blob("a1", b"Hello World").await.unwrap();
        assert_eq!(metadata.id, "a1");
        assert_eq!(metadata.size, 11);
        assert_eq!(metadata.storage_backend, "local");
        assert_eq!(metadata.storage_path.as_deref(), Some("a1"));

        let (data, metadata) = service.get_blob("a1").await.unwrap();
        assert_eq!(data, b"Hello World");
        assert_eq!(metadata.size, 11);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let service = service();
        service.create_blob("x", b"abc").await.unwrap();

        let err = service.create_blob("x", b"something else").await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        // The original bytes are untouched.
        let (data, _) = service.get_blob("x").await.unwrap();
        assert_eq!(data, b"abc");
    }

    #[tokio::test]
    async fn test_get_missing_blob() {
        let service = service();

        let err = service.get_blob("missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_exists_checks_metadata_then_backend() {
        let service = service();
        assert!(!service.blob_exists("missing").await.unwrap());

        service.create_blob("a", b"1").await.unwrap();
        assert!(service.blob_exists("a").await.unwrap());

        // A payload written around the service is still visible through the
        // backend delegation.
        service.storage.store("orphan", b"2").await.unwrap();
        assert!(service.blob_exists("orphan").await.unwrap());
    }
}
