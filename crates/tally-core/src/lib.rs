//! # Tally Core
//!
//! Core library for Tally, a concurrent balance reconciliation tool for
//! ao processes. It fetches the balance map of a process from a compute
//! unit (CU), re-fetches every address from the state-compute gateway
//! under a bounded concurrency ceiling, and produces an exact-arithmetic
//! discrepancy report.
//!
//! This crate provides:
//!
//! - **[`balance`]**: Canonical balance normalization and exact signed
//!   difference over arbitrary-precision integers. Malformed or missing
//!   balance data normalizes to `"0"` by policy.
//!
//! - **[`recon`]**: The reconciliation engine: bounded fetch scheduler,
//!   retry/backoff executor, comparator/report builder, and the
//!   two-source address-union comparator used for CU-vs-CU runs.
//!
//! - **[`source`]**: HTTP clients for the two balance sources (CU query
//!   interface and gateway) plus baseline acquisition from a dry-run,
//!   an evaluated message, or a captured file.
//!
//! - **[`config`]**: Layered configuration (defaults → TOML file →
//!   `TALLY__*` environment overrides) with validation.
//!
//! ## Pipeline
//!
//! ```text
//! baseline source                    counterpart source
//! (dry-run | message | file)         (gateway, per address)
//!         │                                  │
//!         ▼                                  │
//!    BalanceMap ──► extract_addresses        │
//!         │               │                  │
//!         │               ▼                  ▼
//!         │         Scheduler ──► RetryPolicy ──► fetch
//!         │               │   (≤ C in flight)
//!         └───────────────┼──► compare_balances
//!                         ▼
//!                   Vec<Comparison> ──► generate_report ──► Report
//! ```
//!
//! The pipeline is strictly one-way per invocation; nothing is retained
//! across runs. The core performs no terminal or file I/O of its own;
//! rendering and progress display are collaborators supplied by the
//! caller.

pub mod balance;
pub mod config;
pub mod recon;
pub mod source;
pub mod types;
