//! Two-source comparison over the union of address sets.

use crate::balance;
use crate::types::{BalanceMap, Outcome, UnionComparison, UnionReport};
use chrono::Utc;
use num_bigint::{BigInt, BigUint};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Compares two balance maps over the union of their addresses.
///
/// Common addresses get a normal value comparison. Addresses present in
/// only one map are flagged `only_in_a` / `only_in_b` with outcome
/// [`Outcome::Unknown`]; their recorded balance is the raw value from
/// the side that has it and no difference is computed.
#[must_use]
pub fn compare_maps(map_a: &BalanceMap, map_b: &BalanceMap) -> Vec<UnionComparison> {
    let union: BTreeSet<&String> = map_a.keys().chain(map_b.keys()).collect();

    union
        .into_iter()
        .map(|address| {
            let raw_a = map_a.get(address);
            let raw_b = map_b.get(address);
            match (raw_a, raw_b) {
                (Some(a), Some(b)) => {
                    let norm_a = balance::normalize(Some(a));
                    let norm_b = balance::normalize(Some(b));
                    let (outcome, difference) = if norm_a == norm_b {
                        (Outcome::Match, None)
                    } else {
                        (Outcome::Mismatch, Some(balance::difference(&norm_a, &norm_b)))
                    };
                    UnionComparison {
                        address: address.clone(),
                        balance_a: Some(a.clone()),
                        balance_b: Some(b.clone()),
                        outcome,
                        only_in_a: false,
                        only_in_b: false,
                        difference,
                    }
                }
                (Some(a), None) => UnionComparison {
                    address: address.clone(),
                    balance_a: Some(a.clone()),
                    balance_b: None,
                    outcome: Outcome::Unknown,
                    only_in_a: true,
                    only_in_b: false,
                    difference: None,
                },
                (None, Some(b)) => UnionComparison {
                    address: address.clone(),
                    balance_a: None,
                    balance_b: Some(b.clone()),
                    outcome: Outcome::Unknown,
                    only_in_a: false,
                    only_in_b: true,
                    difference: None,
                },
                (None, None) => unreachable!("address came from the key union"),
            }
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregates union comparisons into a [`UnionReport`].
///
/// Accuracy is computed over common addresses only; coverage gaps are
/// counted and listed separately.
#[must_use]
pub fn generate_report(
    comparisons: Vec<UnionComparison>,
    process_id: &str,
    message_id: &str,
    source_a_url: &str,
    source_b_url: &str,
) -> UnionReport {
    let mut matches = Vec::new();
    let mut mismatches = Vec::new();
    let mut unique_to_a = Vec::new();
    let mut unique_to_b = Vec::new();
    let mut total_discrepancy = BigUint::default();

    for comparison in comparisons {
        if comparison.only_in_a {
            unique_to_a.push(comparison);
        } else if comparison.only_in_b {
            unique_to_b.push(comparison);
        } else {
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
                Outcome::Unknown => {
                    // Common addresses always carry both values.
                    unreachable!("common address marked unknown")
                }
            }
        }
    }

    let common = matches.len() + mismatches.len();
    let accuracy_percentage = if common == 0 {
        0.0
    } else {
        round2(matches.len() as f64 / common as f64 * 100.0)
    };

    UnionReport {
        process_id: process_id.to_string(),
        message_id: message_id.to_string(),
        source_a_url: source_a_url.to_string(),
        source_b_url: source_b_url.to_string(),
        total_addresses_a: common + unique_to_a.len(),
        total_addresses_b: common + unique_to_b.len(),
        common_addresses: common,
        only_in_a: unique_to_a.len(),
        only_in_b: unique_to_b.len(),
        matching_count: matches.len(),
        mismatch_count: mismatches.len(),
        accuracy_percentage,
        total_discrepancy: total_discrepancy.to_string(),
        mismatches,
        matches,
        unique_to_a,
        unique_to_b,
        timestamp: Utc::now(),
    }
}
