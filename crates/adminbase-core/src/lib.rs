//! Core utilities shared across all Adminbase crates

pub mod error;
pub mod utils;
mod encryption;

// Re-export commonly used types
pub use encryption::EncryptionService;
pub use error::*;
pub use utils::*;

// Re-export external dependencies
pub use anyhow;
pub use async_trait;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tokio;
