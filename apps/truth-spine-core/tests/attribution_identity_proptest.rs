//! Property test for the currency-attribution identity
//! (S3: `r_base = r_local + r_fx + r_interaction` within 0.1bp) across a
//! wide range of local returns and FX rate pairs, not just the spec's one
//! worked example.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use truth_spine_core::domain::shared::{PackId, PortfolioId};
use truth_spine_core::metrics::currency_attribution;
use truth_spine_core::metrics::math::{from_f64, to_f64};

proptest! {
    #[test]
    fn identity_holds_across_local_returns_and_fx_moves(
        r_local in -0.30f64..0.30,
        fx_start in 0.01f64..500.0,
        fx_move in -0.20f64..0.20,
    ) {
        let fx_end = fx_start * (1.0 + fx_move);
        let row = currency_attribution(
            PortfolioId::new("port-1"),
            NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            PackId::new("pack-1"),
            None,
            from_f64(r_local),
            from_f64(fx_start),
            from_f64(fx_end),
            None,
        );

        let row = row.expect("currency_attribution should never violate its own identity");
        let computed = row.r_local + row.r_fx + row.r_interaction;
        let residual_bp = to_f64((computed - row.r_base).abs()) * 10_000.0;
        prop_assert!(residual_bp < 0.1, "residual {residual_bp}bp exceeds tolerance");
    }

    #[test]
    fn aggregating_identical_weighted_positions_preserves_the_identity(
        r_local in -0.10f64..0.10,
        fx_start in 1.0f64..2.0,
        fx_move in -0.05f64..0.05,
        n_positions in 1usize..6,
    ) {
        let fx_end = fx_start * (1.0 + fx_move);
        let weight = Decimal::ONE / Decimal::from(n_positions as u64);
        let positions: Vec<_> = (0..n_positions)
            .map(|_| {
                currency_attribution(
                    PortfolioId::new("port-1"),
                    NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
                    PackId::new("pack-1"),
                    None,
                    from_f64(r_local),
                    from_f64(fx_start),
                    from_f64(fx_end),
                    Some(weight),
                )
                .unwrap()
            })
            .collect();

        let aggregate = truth_spine_core::metrics::aggregate_portfolio_attribution(
            PortfolioId::new("port-1"),
            NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            PackId::new("pack-1"),
            &positions,
        );

        let computed = aggregate.r_local + aggregate.r_fx + aggregate.r_interaction;
        let residual_bp = to_f64((computed - aggregate.r_base).abs()) * 10_000.0;
        prop_assert!(residual_bp < 0.1);
    }
}
