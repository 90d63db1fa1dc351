use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Error;

/// One row per blob, regardless of which backend holds the payload bytes.
///
/// Created once by the blob service after a successful payload write; never
/// mutated or deleted afterwards.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct BlobMetadata {
    pub id: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub storage_backend: String,
    pub storage_path: Option<String>,
}

/// Tag identifying a storage backend variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Database,
    S3,
    Ftp,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Database => "database",
            BackendKind::S3 => "s3",
            BackendKind::Ftp => "ftp",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<BackendKind, Error> {
        match s {
            "local" => Ok(BackendKind::Local),
            "database" => Ok(BackendKind::Database),
            "s3" => Ok(BackendKind::S3),
            "ftp" => Ok(BackendKind::Ftp),
            other => Err(Error::Config(format!("unknown storage backend: {other}"))),
        }
    }
}
