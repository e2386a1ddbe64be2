//! Policy limit evaluation
//!
//! Checks a portfolio snapshot against every threshold in a `PolicyConfig`
//! and lists the limits it violates. Hard limits are reported as
//! `Severity::Breach`; soft targets (liquidity buffer, diversification, fund
//! count and performance minimums) as `Severity::Warning`.

use crate::exposure::{Diversification, Dimension, ExposureBreakdown};
use crate::holding::{ratio, Holding, PortfolioMetrics};
use crate::policy::PolicyConfig;
use crate::scenario::LiquiditySummary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which policy threshold was crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitKind {
    Exposure(Dimension),
    UnfundedCommitments,
    LiquidityReserve,
    LiquidityBuffer,
    CoverageRatio,
    FundLeverage,
    PortfolioLeverage,
    FundCount,
    Diversification,
    Tvpi,
    Dpi,
    Irr,
}

impl LimitKind {
    pub fn name(&self) -> String {
        match self {
            LimitKind::Exposure(d) => format!("{}Exposure", d),
            LimitKind::UnfundedCommitments => "UnfundedCommitments".to_string(),
            LimitKind::LiquidityReserve => "LiquidityReserve".to_string(),
            LimitKind::LiquidityBuffer => "LiquidityBuffer".to_string(),
            LimitKind::CoverageRatio => "CoverageRatio".to_string(),
            LimitKind::FundLeverage => "FundLeverage".to_string(),
            LimitKind::PortfolioLeverage => "PortfolioLeverage".to_string(),
            LimitKind::FundCount => "FundCount".to_string(),
            LimitKind::Diversification => "Diversification".to_string(),
            LimitKind::Tvpi => "Tvpi".to_string(),
            LimitKind::Dpi => "Dpi".to_string(),
            LimitKind::Irr => "Irr".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Breach,
}

/// One violated threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyBreach {
    pub kind: LimitKind,
    /// Category, fund or "Portfolio"
    pub subject: String,
    pub actual: f64,
    pub limit: f64,
    pub severity: Severity,
}

impl PolicyBreach {
    fn new(kind: LimitKind, subject: impl Into<String>, actual: f64, limit: f64, severity: Severity) -> Self {
        Self {
            kind,
            subject: subject.into(),
            actual,
            limit,
            severity,
        }
    }

    pub fn is_breach(&self) -> bool {
        self.severity == Severity::Breach
    }
}

impl fmt::Display for PolicyBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} ({}): {:.2} vs limit {:.2}",
            self.severity,
            self.kind.name(),
            self.subject,
            self.actual,
            self.limit
        )
    }
}

const PORTFOLIO: &str = "Portfolio";

/// Evaluate all policy limits for one snapshot
///
/// NAV-relative checks are skipped when NAV is zero, and performance
/// multiples when nothing has been paid in.
pub fn evaluate_limits(
    holdings: &[Holding],
    breakdown: &ExposureBreakdown,
    metrics: &PortfolioMetrics,
    liquidity: &LiquiditySummary,
    policy: &PolicyConfig,
) -> Vec<PolicyBreach> {
    let mut breaches = Vec::new();

    for dimension in Dimension::ALL {
        let limit = policy.exposure_limit(dimension);
        for entry in breakdown.entries(dimension) {
            if entry.percentage > limit {
                breaches.push(PolicyBreach::new(
                    LimitKind::Exposure(dimension),
                    entry.name.clone(),
                    entry.percentage,
                    limit,
                    Severity::Breach,
                ));
            }
        }
    }

    let nav = metrics.total_nav;
    if nav > 0.0 {
        let unfunded_pct = 100.0 * ratio(metrics.unfunded_commitments, nav);
        if unfunded_pct > policy.max_unfunded_pct {
            breaches.push(PolicyBreach::new(
                LimitKind::UnfundedCommitments,
                PORTFOLIO,
                unfunded_pct,
                policy.max_unfunded_pct,
                Severity::Breach,
            ));
        }

        let reserve_pct = liquidity.reserve_pct(nav);
        if reserve_pct < policy.min_liquidity_reserve_pct {
            breaches.push(PolicyBreach::new(
                LimitKind::LiquidityReserve,
                PORTFOLIO,
                reserve_pct,
                policy.min_liquidity_reserve_pct,
                Severity::Breach,
            ));
        } else if reserve_pct < policy.target_liquidity_buffer_pct {
            breaches.push(PolicyBreach::new(
                LimitKind::LiquidityBuffer,
                PORTFOLIO,
                reserve_pct,
                policy.target_liquidity_buffer_pct,
                Severity::Warning,
            ));
        }
    }

    let coverage = liquidity.coverage_ratio();
    if coverage < policy.min_coverage_ratio {
        breaches.push(PolicyBreach::new(
            LimitKind::CoverageRatio,
            PORTFOLIO,
            coverage,
            policy.min_coverage_ratio,
            Severity::Breach,
        ));
    }

    let fund_label = Dimension::Fund.categorizer(holdings);
    for holding in holdings {
        if holding.leverage() > policy.max_leverage {
            breaches.push(PolicyBreach::new(
                LimitKind::FundLeverage,
                fund_label(holding),
                holding.leverage(),
                policy.max_leverage,
                Severity::Breach,
            ));
        }
    }
    if metrics.look_through_leverage > policy.max_leverage {
        breaches.push(PolicyBreach::new(
            LimitKind::PortfolioLeverage,
            PORTFOLIO,
            metrics.look_through_leverage,
            policy.max_leverage,
            Severity::Breach,
        ));
    }

    if metrics.fund_count < policy.min_fund_count {
        breaches.push(PolicyBreach::new(
            LimitKind::FundCount,
            PORTFOLIO,
            metrics.fund_count as f64,
            policy.min_fund_count as f64,
            Severity::Warning,
        ));
    }

    let diversification = Diversification::from_entries(breakdown.entries(Dimension::Fund));
    if diversification.score < policy.target_diversification_score {
        breaches.push(PolicyBreach::new(
            LimitKind::Diversification,
            PORTFOLIO,
            diversification.score,
            policy.target_diversification_score,
            Severity::Warning,
        ));
    }

    if metrics.total_paid_in > 0.0 {
        if metrics.tvpi < policy.min_tvpi {
            breaches.push(PolicyBreach::new(
                LimitKind::Tvpi,
                PORTFOLIO,
                metrics.tvpi,
                policy.min_tvpi,
                Severity::Warning,
            ));
        }
        if metrics.dpi < policy.min_dpi {
            breaches.push(PolicyBreach::new(
                LimitKind::Dpi,
                PORTFOLIO,
                metrics.dpi,
                policy.min_dpi,
                Severity::Warning,
            ));
        }
    }

    if let Some(irr) = metrics.weighted_irr {
        if irr < policy.min_irr {
            breaches.push(PolicyBreach::new(
                LimitKind::Irr,
                PORTFOLIO,
                irr,
                policy.min_irr,
                Severity::Warning,
            ));
        }
    }

    for breach in breaches.iter().filter(|b| b.is_breach()) {
        tracing::warn!(
            limit = %breach.kind.name(),
            subject = %breach.subject,
            actual = breach.actual,
            threshold = breach.limit,
            "Policy limit breached"
        );
    }

    breaches
}
