pub use database::DatabaseBlobStorage;
pub use ftp::FtpStorage;
pub use local::LocalStorage;
pub use s3::S3CompatibleStorage;

mod database;
mod ftp;
mod local;
mod s3;
mod sigv4;

use simple_drive_core::{backends::BlobStorage, Error};

use super::SqliteDatabase;
use crate::settings::Settings;

/// Resolves the configured backend name into a constructed instance. Pure
/// factory: nothing is cached across calls.
pub async fn open_blob_storage(
    settings: &Settings,
    database: &SqliteDatabase,
) -> Result<BlobStorage, Error> {
    match settings.storage_backend.as_str() {
        "local" => {
            let storage = LocalStorage::open(&settings.local_storage_path).await?;
            Ok(storage)
        }
        "database" => Ok(database.blob_storage()),
        "s3" => {
            if settings.s3_endpoint_url.is_empty()
                || settings.s3_access_key_id.is_empty()
                || settings.s3_secret_access_key.is_empty()
                || settings.s3_bucket_name.is_empty()
            {
                return Err(Error::Config(
                    "s3 configuration incomplete: endpoint url, access key id, \
                     secret access key and bucket name are required"
                        .to_string(),
                ));
            }

            Ok(S3CompatibleStorage::open(
                &settings.s3_endpoint_url,
                &settings.s3_bucket_name,
                &settings.s3_access_key_id,
                &settings.s3_secret_access_key,
                &settings.s3_region,
            ))
        }
        "ftp" => {
            if settings.ftp_host.is_empty() {
                return Err(Error::Config(
                    "ftp configuration incomplete: host is required".to_string(),
                ));
            }

            Ok(FtpStorage::open(
                &settings.ftp_host,
                settings.ftp_port,
                &settings.ftp_username,
                &settings.ftp_password,
                &settings.ftp_base_dir,
            ))
        }
        other => Err(Error::Config(format!("unknown storage backend: {other}"))),
    }
}
