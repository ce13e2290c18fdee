//! Content-addressing for pricing packs.
//!
//! The pack hash is a pure function of its prices and FX rates: sort each
//! collection by its natural key, serialize to a canonical JSON form (sorted
//! object keys, decimal amounts as strings so formatting never perturbs the
//! hash), and digest the concatenation with SHA-256.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::price::{FxRate, Price};

#[derive(Serialize)]
struct CanonicalPriceRow<'a> {
    security_id: &'a str,
    close: String,
    currency: &'a str,
}

#[derive(Serialize)]
struct CanonicalFxRow<'a> {
    base_ccy: &'a str,
    quote_ccy: &'a str,
    rate: String,
}

/// Serialize prices, sorted by security identifier, to the canonical form
/// hashed into the pack's content address.
#[must_use]
pub fn canonical_price_json(prices: &[Price]) -> String {
    let mut sorted: Vec<&Price> = prices.iter().collect();
    sorted.sort_by(|a, b| a.security_id.as_str().cmp(b.security_id.as_str()));
    let rows: Vec<CanonicalPriceRow<'_>> = sorted
        .iter()
        .map(|p| CanonicalPriceRow {
            security_id: p.security_id.as_str(),
            close: p.close.normalize().to_string(),
            currency: &p.currency,
        })
        .collect();
    serde_json::to_string(&rows).expect("canonical price rows always serialize")
}

/// Serialize FX rates, sorted by `(base, quote)`, to the canonical form
/// hashed into the pack's content address.
#[must_use]
pub fn canonical_fx_json(rates: &[FxRate]) -> String {
    let mut sorted: Vec<&FxRate> = rates.iter().collect();
    sorted.sort_by(|a, b| {
        (a.base_ccy.as_str(), a.quote_ccy.as_str()).cmp(&(b.base_ccy.as_str(), b.quote_ccy.as_str()))
    });
    let rows: Vec<CanonicalFxRow<'_>> = sorted
        .iter()
        .map(|r| CanonicalFxRow {
            base_ccy: &r.base_ccy,
            quote_ccy: &r.quote_ccy,
            rate: r.rate.normalize().to_string(),
        })
        .collect();
    serde_json::to_string(&rows).expect("canonical fx rows always serialize")
}

/// Compute the pack's content hash from its prices and FX rates.
///
/// Recomputing this from a persisted pack's rows must always yield the
/// stored hash; this is the reproducibility invariant the pack exists to
/// guarantee.
#[must_use]
pub fn compute_pack_hash(prices: &[Price], rates: &[FxRate]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_price_json(prices).as_bytes());
    hasher.update(b"|");
    hasher.update(canonical_fx_json(rates).as_bytes());
    format!("{:x}", hasher.finalize())
}
