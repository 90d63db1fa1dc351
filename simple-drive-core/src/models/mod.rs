//! Domain models

pub use blobs::*;

mod blobs;
