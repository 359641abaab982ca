//! Shared types for Folio

pub mod error;

pub use error::{FolioError, Result};
