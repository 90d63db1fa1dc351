pub use database::SqliteDatabase;
pub use storage::{
    open_blob_storage, DatabaseBlobStorage, FtpStorage, LocalStorage, S3CompatibleStorage,
};

mod database;
mod storage;

#[cfg(test)]
pub(crate) use database::memory_database;
