//! WAPI error types.

use thiserror::Error;

/// Errors raised while talking to WAPI or preparing a call.
///
/// The `Display` text is what ends up in `{"error": ..}` payloads.
#[derive(Debug, Error)]
pub enum WapiError {
    #[error("InfoBlox not configured: missing {0}")]
    NotConfigured(String),

    #[error("invalid WAPI configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not connect to Grid Master {grid_master}. Check INFOBLOX_GRID_MASTER_IP")]
    Connect { grid_master: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("unexpected WAPI response: {0}")]
    Decode(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("No searchable field given to locate the object")]
    NoLookupCriteria,

    #[error("Object reference not found")]
    ReferenceNotFound,
}

/// Convenience alias for WAPI results.
pub type WapiResult<T> = Result<T, WapiError>;
