//! wapi-nlp HTTP server: library crate.
//!
//! Exposes the router, state and settings so the binary and the
//! end-to-end test crate build the same application.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
