//! Error types for storage and configuration loading.

use thiserror::Error;

/// Failures raised by a [`KeyValueStore`](crate::storage::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures raised while loading configuration or zone descriptors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("zone '{zone}' lists scene '{scene}' more than once")]
    DuplicateScene { zone: String, scene: String },

    #[error("zone '{zone}' has two scenes with order {order}")]
    DuplicateOrder { zone: String, order: u32 },

    #[error("zone '{0}' has no scenes")]
    EmptyZone(String),

    #[error("zone '{zone}' must start at order 1, found {first}")]
    OrderStart { zone: String, first: u32 },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
