use anyhow::Context;
use chrono::Utc;

use simple_drive_core::{
    backends::BlobStorageBackend,
    error,
    models::BackendKind,
    Error,
};

/// Persists payload bytes in the `blob_data` table, sharing the metadata
/// store's pool. Insert-or-fail inside a transaction; this layer does not
/// provide idempotent overwrite, callers rely on the blob service.
#[derive(Clone, Debug)]
pub struct DatabaseBlobStorage {
    pool: sqlx::SqlitePool,
}

impl DatabaseBlobStorage {
    pub fn new(pool: sqlx::SqlitePool) -> DatabaseBlobStorage {
        DatabaseBlobStorage { pool }
    }
}

#[async_trait::async_trait]
impl BlobStorageBackend for DatabaseBlobStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }

    async fn store(&self, blob_id: &str, data: &[u8]) -> error::Result<()> {
        let mut tx = self.pool.begin().await.context("failed to store blob")?;

        sqlx::query(
            r"
            INSERT INTO blob_data (id, data, created_at)
            VALUES (?1, ?2, ?3);
            ",
        )
        .bind(blob_id)
        .bind(data)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .context("failed to store blob")?;

        tx.commit().await.context("failed to store blob")?;

        Ok(())
    }

    async fn retrieve(&self, blob_id: &str) -> error::Result<Vec<u8>> {
        let data: Option<Vec<u8>> = sqlx::query_scalar(
            r"
            SELECT data
            FROM blob_data
            WHERE id = ?1;
            ",
        )
        .bind(blob_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to retrieve blob")?;

        data.ok_or_else(|| Error::NotFound(blob_id.to_string()))
    }

    async fn exists(&self, blob_id: &str) -> error::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM blob_data
            WHERE id = ?1;
            ",
        )
        .bind(blob_id)
        .fetch_one(&self.pool)
        .await
        .context("failed to check blob existence")?;

        Ok(count > 0)
    }

    async fn delete(&self, blob_id: &str) -> error::Result<()> {
        sqlx::query(
            r"
            DELETE FROM blob_data
            WHERE id = ?1;
            ",
        )
        .bind(blob_id)
        .execute(&self.pool)
        .await
        .context("failed to delete blob")?;

        Ok(())
    }
}
