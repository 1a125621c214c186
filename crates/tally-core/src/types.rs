//! Core type definitions for balance maps, comparisons, and reports.
//!
//! All report types derive `Serialize` so the rendering layer can emit
//! them as JSON without intermediate conversion. Instances are built once
//! per run and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping from address to raw balance text, as returned by a source.
///
/// Keys are opaque address strings; values are whatever textual balance
/// the source reported (normalized lazily at comparison time). Produced
/// once per source query and treated as immutable afterwards.
pub type BalanceMap = HashMap<String, String>;

/// Outcome of a single per-address comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Both canonical balances are identical.
    Match,
    /// Both balances were obtained but differ.
    Mismatch,
    /// No value comparison was possible: the counterpart value is
    /// missing (degraded fetch under
    /// [`FallbackPolicy::MarkUnknown`](crate::recon::scheduler::FallbackPolicy),
    /// or a coverage gap in two-source mode).
    Unknown,
}

/// Result of reconciling one address between the baseline and the
/// counterpart source.
///
/// Balances are stored canonical (see [`crate::balance::normalize`]).
/// `difference` is present exactly when the outcome is [`Outcome::Mismatch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub address: String,
    pub baseline_balance: String,
    /// Canonical counterpart balance; absent only for [`Outcome::Unknown`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterpart_balance: Option<String>,
    pub outcome: Outcome,
    /// Exact signed `baseline - counterpart`, present only on mismatch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<String>,
}

impl Comparison {
    /// Returns `true` when the two balances matched exactly.
    #[must_use]
    pub fn matched(&self) -> bool {
        self.outcome == Outcome::Match
    }
}

/// Aggregate reconciliation report for a single run.
///
/// Invariants (asserted by the test suite):
/// `matching_count + mismatch_count + unknown_count == total_addresses`,
/// `0.0 <= accuracy_percentage <= 100.0`, and the accuracy of an empty
/// run is `0.0`. Under the default fallback policy `unknown_count` is
/// always zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub process_id: String,
    pub total_addresses: usize,
    pub matching_count: usize,
    pub mismatch_count: usize,
    pub unknown_count: usize,
    /// Percentage of matching addresses over comparable ones, rounded to
    /// two decimals.
    pub accuracy_percentage: f64,
    /// Sum of absolute differences over all mismatches, exact decimal.
    pub total_discrepancy: String,
    pub mismatches: Vec<Comparison>,
    pub matches: Vec<Comparison>,
    pub unknowns: Vec<Comparison>,
    pub timestamp: DateTime<Utc>,
}

/// Per-address result of a two-source (CU vs CU) comparison.
///
/// Raw balances are preserved as reported by each source. When an address
/// exists in only one source, the outcome is [`Outcome::Unknown`]: no
/// value comparison is performed and `difference` is absent (not zero).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnionComparison {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_b: Option<String>,
    pub outcome: Outcome,
    pub only_in_a: bool,
    pub only_in_b: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<String>,
}

/// Aggregate report for a two-source comparison over the address union.
///
/// `accuracy_percentage` is computed over **common** addresses only;
/// addresses present in a single source are coverage gaps, reported in
/// `unique_to_a` / `unique_to_b` and excluded from the denominator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnionReport {
    pub process_id: String,
    pub message_id: String,
    pub source_a_url: String,
    pub source_b_url: String,
    pub total_addresses_a: usize,
    pub total_addresses_b: usize,
    pub common_addresses: usize,
    pub only_in_a: usize,
    pub only_in_b: usize,
    pub matching_count: usize,
    pub mismatch_count: usize,
    pub accuracy_percentage: f64,
    pub total_discrepancy: String,
    pub mismatches: Vec<UnionComparison>,
    pub matches: Vec<UnionComparison>,
    pub unique_to_a: Vec<UnionComparison>,
    pub unique_to_b: Vec<UnionComparison>,
    pub timestamp: DateTime<Utc>,
}
