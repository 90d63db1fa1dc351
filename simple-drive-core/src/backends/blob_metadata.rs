use std::{fmt::Debug, sync::Arc};

use crate::{error::Result, models};

pub type MetadataStore = Arc<dyn MetadataStoreBackend>;

/// The relational store holding one `BlobMetadata` row per blob, independent
/// of which backend holds the payload bytes.
#[async_trait::async_trait]
pub trait MetadataStoreBackend: Debug + Send + Sync {
    async fn get_blob(&self, blob_id: &str) -> Result<Option<models::BlobMetadata>>;

    async fn insert_blob(&self, metadata: &models::BlobMetadata) -> Result<()>;
}
