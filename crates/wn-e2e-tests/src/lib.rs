//! End-to-end tests for wapi-nlp live under `tests/`.
//!
//! Each test drives the real router against a mocked WAPI grid master.
