//! Integration tests for the tally reconciliation engine.
//!
//! Test modules:
//!
//! - `scheduler_tests`: Concurrency ceiling and failure-absorption behavior
//!   of the bounded scheduler
//! - `retry_tests`: Retry and backoff behavior against mock HTTP sources
//! - `pipeline_tests`: End-to-end reconciliation runs against mock compute
//!   units and gateways
//!
//! All tests run against in-process `mockito` servers; no network access
//! is required:
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod scheduler_tests;

#[cfg(test)]
mod retry_tests;

#[cfg(test)]
mod pipeline_tests;
