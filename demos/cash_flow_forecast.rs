//! Cash-flow forecast example
//!
//! Derives pacing from eight quarters of history, projects calls and
//! distributions for three years under each preset, and prints the stitched
//! historical + projected timeline for the base case.
//!
//! Run with: cargo run --example cash_flow_forecast

use lp_risk::{
    forecast, stitch_timeline, CashFlowHistory, ForecastAdjustments, ForecastHorizon, Holding,
    PortfolioMetrics, PresetFamily, TimelineSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    println!("=== Cash-Flow Forecast Example ===\n");

    let holdings = vec![
        Holding::new("f1", "Fund I", 25_000_000.0, 14_000_000.0, 16_500_000.0),
        Holding::new("f2", "Fund II", 15_000_000.0, 4_500_000.0, 4_800_000.0),
        Holding::new("f3", "Fund III", 10_000_000.0, 9_800_000.0, 12_000_000.0).with_distributed(7_000_000.0),
    ];
    let metrics = PortfolioMetrics::from_holdings(&holdings);

    let quarters = ["Q1 2023", "Q2 2023", "Q3 2023", "Q4 2023", "Q1 2024", "Q2 2024", "Q3 2024", "Q4 2024"];
    let calls: Vec<(String, f64)> = quarters
        .iter()
        .enumerate()
        .map(|(i, q)| (q.to_string(), 1_800_000.0 - i as f64 * 120_000.0))
        .collect();
    let distributions: Vec<(String, f64)> = quarters
        .iter()
        .enumerate()
        .map(|(i, q)| (q.to_string(), 400_000.0 + i as f64 * 90_000.0))
        .collect();
    let history = CashFlowHistory::from_series(&calls, &distributions)?;

    println!("Unfunded commitments: ${:.0}", metrics.unfunded_commitments);
    println!("NAV: ${:.0}", metrics.total_nav);
    println!();

    let adjustments = ForecastAdjustments::default();
    for family in [PresetFamily::BaseBestWorst, PresetFamily::BaseDownsideSevere] {
        for scenario in family.scenarios() {
            let f = forecast(&metrics, &history, &scenario, ForecastHorizon::ThreeYears, &adjustments);
            println!(
                "{:<9} calls ${:>11.0}  dists ${:>11.0}  net ${:>12.0}  peak reserve ${:>11.0}",
                scenario.name,
                f.total_calls(),
                f.total_distributions(),
                f.net_cash_flow(),
                f.peak_reserve_requirement
            );
        }
    }
    println!();

    let base = forecast(
        &metrics,
        &history,
        &PresetFamily::default().scenarios()[0],
        ForecastHorizon::ThreeYears,
        &adjustments,
    );
    println!(
        "Pacing: deployment {:.1}%/qtr, distribution {:.1}%/qtr ({:?})",
        base.pacing.deployment_rate * 100.0,
        base.pacing.distribution_rate * 100.0,
        base.pacing.source
    );
    println!();

    println!("Timeline");
    for point in stitch_timeline(&history, &base)? {
        let marker = match point.source {
            TimelineSource::Historical => " ",
            TimelineSource::Projected => "*",
        };
        println!(
            "{} {}  calls ${:>10.0}  dists ${:>10.0}  cumulative ${:>12.0}",
            marker, point.period, point.capital_calls, point.distributions, point.cumulative_net
        );
    }
    println!("\n* projected");

    Ok(())
}
