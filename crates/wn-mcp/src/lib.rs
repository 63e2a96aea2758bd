//! Schema discovery and tool generation for wapi-nlp.
//!
//! WAPI publishes its own schema. This crate walks it ([`SchemaDiscoverer`]),
//! keeps a file cache of processed object profiles ([`SchemaCache`]), turns
//! profiles into operation descriptors ([`ToolGenerator`]), and holds the
//! live descriptor set ([`ToolRegistry`]). [`DiscoveryWorker`] keeps the
//! registry in step with the grid in the background.

pub mod cache;
pub mod discovery;
pub mod error;
pub mod generator;
pub mod registry;
pub mod worker;

pub use cache::SchemaCache;
pub use discovery::SchemaDiscoverer;
pub use error::{McpError, McpResult};
pub use generator::ToolGenerator;
pub use registry::{SharedRegistry, ToolRegistry};
pub use worker::{DiscoveryWorker, Statistics, WorkerOptions, WorkerStatus};
