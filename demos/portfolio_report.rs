//! Portfolio risk report example
//!
//! Builds a full report for a small fund portfolio: exposures, drift,
//! scenarios, policy breaches, risk score and VaR under all three methods.
//!
//! Run with: RUST_LOG=lp_risk=debug cargo run --example portfolio_report

use lp_risk::{
    CustomScenarios, Dimension, Holding, PolicyConfig, ReportEngine, ReportRequest, Scenario,
    TargetAllocation, VarConfig, VarMethod,
};

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    println!("=== LP Portfolio Risk Report ===\n");

    let holdings = vec![
        Holding::new("f1", "Acme Buyout IV", 20_000_000.0, 15_000_000.0, 19_500_000.0)
            .with_manager("Acme")
            .with_asset_class("Buyout")
            .with_domicile("US")
            .with_sector("Industrials")
            .with_vintage(2018)
            .with_currency("USD")
            .with_distributed(6_000_000.0)
            .with_net_irr(0.14),
        Holding::new("f2", "Beta Credit II", 10_000_000.0, 8_000_000.0, 7_600_000.0)
            .with_manager("Beta")
            .with_asset_class("Credit")
            .with_domicile("EU")
            .with_sector("Financials")
            .with_vintage(2020)
            .with_currency("EUR")
            .with_distributed(2_500_000.0)
            .with_net_irr(0.09),
        Holding::new("f3", "Gamma Ventures I", 8_000_000.0, 3_000_000.0, 4_200_000.0)
            .with_manager("Gamma")
            .with_asset_class("Venture")
            .with_domicile("US")
            .with_sector("Technology")
            .with_vintage(2022)
            .with_currency("USD")
            .with_leverage(1.0),
        Holding::new("f4", "Acme Growth I", 12_000_000.0, 6_000_000.0, 6_900_000.0)
            .with_manager("Acme")
            .with_asset_class("Growth")
            .with_domicile("Asia")
            .with_sector("Technology")
            .with_vintage(2021)
            .with_currency("USD")
            .with_leverage(1.4),
    ];

    let targets = TargetAllocation::new()
        .with_target(Dimension::AssetClass, "Buyout", 35.0)
        .with_target(Dimension::AssetClass, "Credit", 20.0)
        .with_target(Dimension::AssetClass, "Venture", 15.0)
        .with_target(Dimension::AssetClass, "Growth", 20.0)
        .with_target(Dimension::AssetClass, "Real Assets", 10.0);

    let mut custom = CustomScenarios::new();
    custom.add(Scenario::custom("Rate shock", -0.20, 1.3, 0.4)?)?;

    let policy = PolicyConfig::from_yaml(
        r#"
max_single_fund_pct: 45.0
max_manager_pct: 70.0
min_fund_count: 4
"#,
    )?;

    let engine = ReportEngine::new(policy).with_var_config(VarConfig {
        random_seed: Some(42),
        ..Default::default()
    });

    let request = ReportRequest::new(holdings)
        .with_targets(targets)
        .with_custom_scenarios(custom)
        .with_available_liquidity(4_500_000.0)
        .with_risk_score_history(vec![41.0, 44.5, 43.0, 47.5, 46.0]);

    let report = engine.build_report(&request)?;

    println!("Portfolio");
    println!("  Funds: {}", report.metrics.fund_count);
    println!("  NAV: ${:.0}", report.metrics.total_nav);
    println!("  Unfunded: ${:.0}", report.metrics.unfunded_commitments);
    println!("  TVPI: {:.2}x  DPI: {:.2}x", report.metrics.tvpi, report.metrics.dpi);
    println!();

    for dimension in [Dimension::Manager, Dimension::AssetClass, Dimension::Geography] {
        println!("Exposure by {}", dimension);
        for entry in report.exposures.entries(dimension) {
            println!("  {:<14} {:>6.1}%", entry.name, entry.percentage);
        }
        println!();
    }

    println!("Rebalancing");
    for rec in &report.recommendations {
        println!(
            "  {:?} {} by {:.1}pp (${:.0}) - {}",
            rec.action, rec.category, rec.drift.abs(), rec.adjustment_amount, rec.timeline
        );
        for fund in &rec.fund_plan {
            println!("    {} ${:.0} [{}]", fund.holding_name, fund.cash_impact, fund.constraint.label());
        }
    }
    println!();

    println!("Scenarios (next quarter)");
    for result in report.scenarios.all() {
        println!(
            "  {:<12} calls ${:>10.0}  dists ${:>10.0}  gap ${:>10.0}  {:?}",
            result.name(),
            result.projected_calls,
            result.projected_distributions,
            result.liquidity_gap,
            result.status
        );
    }
    println!();

    println!("Policy");
    if report.breaches.is_empty() {
        println!("  No limits breached");
    }
    for breach in &report.breaches {
        println!("  {}", breach);
    }
    println!();

    println!(
        "Risk score: {:.1}/10 (concentration {:.0}, liquidity {:.0})",
        report.scores.display_score(),
        report.scores.concentration,
        report.scores.liquidity
    );
    println!(
        "Diversification: {:.0} ({:.1} effective funds)",
        report.diversification.score, report.diversification.effective_positions
    );
    println!();

    println!("Value at Risk (95%)");
    for method in [VarMethod::Historical, VarMethod::Parametric, VarMethod::MonteCarlo] {
        let var = engine.build_report(&request.clone().with_var_method(method))?.var;
        println!(
            "  {:<11?} daily ${:>10.0}  monthly ${:>10.0}  annual ${:>11.0}  ES ${:>10.0}",
            method, var.daily_var, var.monthly_var, var.annual_var, var.expected_shortfall
        );
    }

    Ok(())
}
