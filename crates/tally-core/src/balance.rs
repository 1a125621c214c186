//! Canonical balance arithmetic.
//!
//! Balances arrive as free-form text from two independent sources and may
//! exceed any fixed-width integer type. Everything here runs on
//! [`BigInt`]; no floating point anywhere on the comparison path.
//!
//! Normalization is fail-soft: missing, empty, or malformed
//! input becomes the canonical value `"0"`. Downstream comparison cannot
//! distinguish "no data" from "zero balance"; see
//! [`crate::recon::scheduler::FallbackPolicy`] for the opt-in alternative.

use num_bigint::BigInt;
use std::str::FromStr;

/// Converts arbitrary balance text into a canonical decimal string.
///
/// `None`, the empty string, the literal strings `"null"` / `"undefined"`,
/// and anything that does not parse as an optionally signed base-10
/// integer all normalize to `"0"`. Valid input is re-rendered through
/// [`BigInt`], which strips leading zeros and collapses `-0` to `0`.
///
/// Never panics; idempotent over its own output.
#[must_use]
pub fn normalize(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "0".to_string();
    };

    let cleaned = raw.trim();
    if cleaned.is_empty() || cleaned == "null" || cleaned == "undefined" {
        return "0".to_string();
    }

    match BigInt::from_str(cleaned) {
        Ok(value) => value.to_string(),
        Err(_) => "0".to_string(),
    }
}

/// Computes the exact signed difference `a - b` as a decimal string.
///
/// Both inputs are normalized first, so malformed input contributes `0`
/// rather than an error.
#[must_use]
pub fn difference(a: &str, b: &str) -> String {
    let lhs = parse_canonical(a);
    let rhs = parse_canonical(b);
    (lhs - rhs).to_string()
}

/// Returns `true` when both balances normalize to the same canonical
/// string. Exact match only, no numeric tolerance.
#[must_use]
pub fn balances_match(a: &str, b: &str) -> bool {
    normalize(Some(a)) == normalize(Some(b))
}

fn parse_canonical(value: &str) -> BigInt {
    BigInt::from_str(&normalize(Some(value))).unwrap_or_default()
}
