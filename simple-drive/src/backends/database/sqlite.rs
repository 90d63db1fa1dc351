use std::{str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use simple_drive_core::{
    backends::{BlobStorage, MetadataStore, MetadataStoreBackend},
    error, models,
};

use crate::backends::storage::DatabaseBlobStorage;

/// Pool wrapper owning the metadata table and, when the relational backend
/// is active, the payload table next to it.
#[derive(Clone, Debug)]
pub struct SqliteDatabase {
    pub(crate) pool: sqlx::SqlitePool,
}

impl SqliteDatabase {
    #[tracing::instrument]
    pub async fn connect(url: &str) -> Result<SqliteDatabase> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url: {url}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Ok(SqliteDatabase { pool })
    }

    pub fn metadata_store(&self) -> MetadataStore {
        Arc::new(self.clone())
    }

    pub fn blob_storage(&self) -> BlobStorage {
        Arc::new(DatabaseBlobStorage::new(self.pool.clone()))
    }

    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("checking migrations");

        sqlx::migrate!("./migrations/sqlite")
            .run(&self.pool)
            .await
            .context("failed to apply migrations")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl MetadataStoreBackend for SqliteDatabase {
    #[tracing::instrument]
    async fn get_blob(&self, blob_id: &str) -> error::Result<Option<models::BlobMetadata>> {
        let metadata = sqlx::query_as(
            r"
            SELECT id, size, created_at, storage_backend, storage_path
            FROM blob_metadata
            WHERE id = ?1;
            ",
        )
        .bind(blob_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to look up blob metadata")?;

        Ok(metadata)
    }

    #[tracing::instrument]
    async fn insert_blob(&self, metadata: &models::BlobMetadata) -> error::Result<()> {
        sqlx::query(
            r"
            INSERT INTO blob_metadata (id, size, created_at, storage_backend, storage_path)
            VALUES (?1, ?2, ?3, ?4, ?5);
            ",
        )
        .bind(&metadata.id)
        .bind(metadata.size)
        .bind(metadata.created_at)
        .bind(&metadata.storage_backend)
        .bind(&metadata.storage_path)
        .execute(&self.pool)
        .await
        .context("failed to insert blob metadata")?;

        Ok(())
    }
}

/// A single-connection in-memory database; a pooled `:memory:` connection
/// per test would otherwise see its own empty schema.
#[cfg(test)]
pub(crate) async fn memory_database() -> SqliteDatabase {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    let database = SqliteDatabase { pool };
    database.migrate().await.unwrap();
    database
}
