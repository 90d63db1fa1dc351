mod blobs;

pub use blobs::BlobService;
