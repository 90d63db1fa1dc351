pub use error::{Error, Result};

pub mod backends;
pub mod error;
pub mod models;
pub mod services;
