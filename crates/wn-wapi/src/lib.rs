//! InfoBlox WAPI access for wapi-nlp.
//!
//! [`WapiClient`] speaks HTTP (basic auth, optional certificate checks) and
//! fetches the self-describing schema. [`ApiExecutor`] turns an operation
//! descriptor plus an entity set into the actual WAPI call, resolving object
//! references for mutations first.

pub mod client;
pub mod config;
pub mod error;
pub mod executor;

pub use client::{ConnectionStatus, WapiClient};
pub use config::WapiConfig;
pub use error::{WapiError, WapiResult};
pub use executor::ApiExecutor;
