//! Property-based tests for the risk engine
//!
//! These tests check invariants that must hold for any portfolio, using
//! `proptest` for random input generation.

use lp_risk::forecast::forecast_with_pacing;
use lp_risk::{
    aggregate, run_scenarios, CashFlowHistory, CustomScenarios, Dimension, ExposureBasis,
    ForecastAdjustments, ForecastHorizon, Holding, PacingRates, PacingSource, PortfolioMetrics,
    PresetFamily, Quarter, Scenario, ScenarioConfig, VarConfig, VarEngine,
};
use proptest::prelude::*;

// =============================================================================
// Generators
// =============================================================================

fn arb_holding(index: usize) -> impl Strategy<Value = Holding> {
    (
        0.0f64..50_000_000.0,
        0.0f64..1.2,
        0.0f64..40_000_000.0,
        prop_oneof![Just(None), Just(Some("Acme")), Just(Some("Beta")), Just(Some("Gamma"))],
        prop_oneof![Just(None), Just(Some("Buyout")), Just(Some("Credit")), Just(Some("Venture"))],
    )
        .prop_map(move |(commitment, called, nav, manager, asset_class)| {
            let mut holding = Holding::new(
                format!("fund-{}", index),
                format!("Fund {}", index),
                commitment,
                commitment * called,
                nav,
            );
            if let Some(m) = manager {
                holding = holding.with_manager(m);
            }
            if let Some(a) = asset_class {
                holding = holding.with_asset_class(a);
            }
            holding
        })
}

fn arb_holdings() -> impl Strategy<Value = Vec<Holding>> {
    (1usize..12).prop_flat_map(|n| (0..n).map(arb_holding).collect::<Vec<_>>())
}

fn arb_scenario() -> impl Strategy<Value = Scenario> {
    (-0.9f64..0.5, 0.0f64..3.0, 0.0f64..3.0)
        .prop_map(|(shock, calls, dists)| Scenario::custom("Custom stress", shock, calls, dists).unwrap())
}

fn arb_pacing() -> impl Strategy<Value = PacingRates> {
    (0.03f64..0.5, 0.02f64..0.5).prop_map(|(deployment_rate, distribution_rate)| PacingRates {
        deployment_rate,
        distribution_rate,
        source: PacingSource::History,
    })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Percentages sum to 100 for a positive total and are all zero otherwise
    #[test]
    fn prop_percentage_closure(holdings in arb_holdings()) {
        for dimension in Dimension::ALL {
            for basis in [ExposureBasis::Nav, ExposureBasis::Unfunded, ExposureBasis::Commitment] {
                let entries = aggregate(&holdings, dimension, basis);
                let total: f64 = holdings.iter().map(|h| basis.amount(h)).sum();
                let sum: f64 = entries.iter().map(|e| e.percentage).sum();

                if total > 0.0 {
                    prop_assert!((sum - 100.0).abs() < 1e-6, "{:?} {:?} sums to {}", dimension, basis, sum);
                } else {
                    prop_assert!(entries.iter().all(|e| e.percentage == 0.0));
                }
            }
        }
    }

    /// Call share of remaining unfunded never rises, and calls never exceed unfunded
    #[test]
    fn prop_capital_call_taper(
        holdings in arb_holdings(),
        pacing in arb_pacing(),
        scenario in arb_scenario(),
        quarters in 1u32..24,
    ) {
        let metrics = PortfolioMetrics::from_holdings(&holdings);
        let forecast = forecast_with_pacing(
            &metrics,
            pacing,
            &scenario,
            ForecastHorizon::Quarters(quarters),
            &ForecastAdjustments::default(),
            Quarter::new(2025, 1).unwrap(),
        );

        prop_assert_eq!(forecast.projections.len(), quarters as usize);
        prop_assert!(forecast.total_calls() <= metrics.unfunded_commitments * (1.0 + 1e-12));

        let mut remaining = metrics.unfunded_commitments;
        let mut previous_share = f64::INFINITY;
        for p in &forecast.projections {
            if remaining > 0.0 {
                let share = p.capital_calls / remaining;
                prop_assert!(share <= previous_share + 1e-9);
                previous_share = share;
            }
            prop_assert!(p.required_reserve >= 0.0);
            remaining = p.remaining_unfunded;
        }
    }

    /// Daily <= monthly <= annual for the closed-form estimators
    #[test]
    fn prop_var_horizon_ordering(
        value in 0.0f64..1e10,
        variance in 0.0f64..1.0,
        history in proptest::collection::vec(0.0f64..100.0, 0..16),
    ) {
        let engine = VarEngine::new(VarConfig::default());
        for metrics in [engine.parametric(value, variance), engine.historical(value, &history)] {
            prop_assert!(metrics.daily_var >= 0.0);
            prop_assert!(metrics.daily_var <= metrics.monthly_var);
            prop_assert!(metrics.monthly_var <= metrics.annual_var);
            prop_assert!(metrics.expected_shortfall >= metrics.daily_var);
        }
    }

    /// Closed-form estimators are bit-identical across calls
    #[test]
    fn prop_closed_form_idempotent(
        value in 0.0f64..1e10,
        variance in 0.0f64..1.0,
        history in proptest::collection::vec(1.0f64..100.0, 0..16),
    ) {
        let engine = VarEngine::new(VarConfig::default());
        prop_assert_eq!(engine.parametric(value, variance), engine.parametric(value, variance));
        prop_assert_eq!(engine.historical(value, &history), engine.historical(value, &history));
    }

    /// Custom scenarios never change the built-in results
    #[test]
    fn prop_scenario_non_interference(
        holdings in arb_holdings(),
        scenarios in proptest::collection::vec(arb_scenario(), 1..4),
        liquidity in 0.0f64..20_000_000.0,
    ) {
        let mut custom = CustomScenarios::new();
        for (i, mut s) in scenarios.into_iter().enumerate() {
            s.name = format!("Custom {}", i);
            custom.add(s).unwrap();
        }

        let history = CashFlowHistory::new();
        let config = ScenarioConfig::default();
        for family in [PresetFamily::BaseBestWorst, PresetFamily::BaseDownsideSevere] {
            let alone = run_scenarios(&holdings, &history, family, &CustomScenarios::new(), liquidity, &config);
            let mixed = run_scenarios(&holdings, &history, family, &custom, liquidity, &config);
            prop_assert_eq!(&alone.built_in, &mixed.built_in);
            prop_assert_eq!(mixed.custom.len(), custom.len());
        }
    }
}
