//! Pricing pack aggregate: an immutable, content-addressed snapshot of
//! closing prices and FX rates for one `(asof_date, policy)` key.

mod hash;
mod pack;
mod price;

pub use hash::{canonical_fx_json, canonical_price_json, compute_pack_hash};
pub use pack::{Pack, PackStatus, SourcesManifest};
pub use price::{FxRate, Price};
