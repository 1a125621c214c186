//! Per-address comparison and report assembly.

use crate::balance;
use crate::types::{BalanceMap, Comparison, Outcome, Report};
use chrono::Utc;
use num_bigint::{BigInt, BigUint};
use std::str::FromStr;

/// Compares the baseline and counterpart balances for one address.
///
/// Both inputs are normalized before comparison, so absent and malformed
/// values degrade to zero rather than failing. Passing `None` as the
/// counterpart marks the comparison [`Outcome::Unknown`]: the fetch
/// failed and no value claim is made.
#[must_use]
pub fn compare_balances(
    address: &str,
    baseline: Option<&str>,
    counterpart: Option<&str>,
) -> Comparison {
    let baseline_balance = balance::normalize(baseline);

    let Some(raw) = counterpart else {
        return Comparison {
            address: address.to_string(),
            baseline_balance,
            counterpart_balance: None,
            outcome: Outcome::Unknown,
            difference: None,
        };
    };

    let counterpart_balance = balance::normalize(Some(raw));
    if baseline_balance == counterpart_balance {
        Comparison {
            address: address.to_string(),
            baseline_balance,
            counterpart_balance: Some(counterpart_balance),
            outcome: Outcome::Match,
            difference: None,
        }
    } else {
        let difference = balance::difference(&baseline_balance, &counterpart_balance);
        Comparison {
            address: address.to_string(),
            baseline_balance,
            counterpart_balance: Some(counterpart_balance),
            outcome: Outcome::Mismatch,
            difference: Some(difference),
        }
    }
}

/// Extracts the addresses of a balance map, sorted for deterministic
/// iteration and truncation.
#[must_use]
pub fn extract_addresses(balances: &BalanceMap) -> Vec<String> {
    let mut addresses: Vec<String> = balances.keys().cloned().collect();
    addresses.sort();
    addresses
}

/// Rounds to two decimal places, half away from zero.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregates per-address comparisons into a [`Report`].
///
/// Accuracy is the percentage of matches over comparable addresses
/// (matches plus mismatches); unknowns are excluded from the denominator.
/// An empty run reports `0.0`. The total discrepancy is the exact sum of
/// absolute mismatch differences.
#[must_use]
pub fn generate_report(comparisons: Vec<Comparison>, process_id: &str) -> Report {
    let total_addresses = comparisons.len();

    let mut matches = Vec::new();
    let mut mismatches = Vec::new();
    let mut unknowns = Vec::new();
    let mut total_discrepancy = BigUint::default();

    for comparison in comparisons {
        match comparison.outcome {
            Outcome::Match => matches.push(comparison),
            Outcome::Mismatch => {
                if let Some(diff) = &comparison.difference {
                    if let Ok(value) = BigInt::from_str(diff) {
                        total_discrepancy += value.magnitude();
                    }
                }
                mismatches.push(comparison);
            }
            Outcome::Unknown => unknowns.push(comparison),
        }
    }

    let comparable = matches.len() + mismatches.len();
    let accuracy_percentage = if comparable == 0 {
        0.0
    } else {
        round2(matches.len() as f64 / comparable as f64 * 100.0)
    };

    Report {
        process_id: process_id.to_string(),
        total_addresses,
        matching_count: matches.len(),
        mismatch_count: mismatches.len(),
        unknown_count: unknowns.len(),
        accuracy_percentage,
        total_discrepancy: total_discrepancy.to_string(),
        mismatches,
        matches,
        unknowns,
        timestamp: Utc::now(),
    }
}
