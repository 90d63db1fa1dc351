pub use blob_metadata::{MetadataStore, MetadataStoreBackend};
pub use blob_storage::{BlobStorage, BlobStorageBackend};

pub mod blob_metadata;
pub mod blob_storage;
