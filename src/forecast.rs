//! Quarterly cash-flow forecasting
//!
//! Projects capital calls and distributions over a 1/3/5-year horizon from
//! baseline pacing, scenario multipliers and user adjustments, and sizes the
//! liquidity reserve needed to ride out the cumulative net outflow.
//!
//! Call pacing decays over the horizon (front-loaded J-curve):
//! `time_factor = max(0.3, 1 - (i/n) * 0.7)`, and each call is bounded by the
//! remaining unfunded commitment. Distributions accelerate with
//! `maturity_factor = 1 + (i/n) * 0.5`.

use crate::cashflow::{CashFlowHistory, PacingRates, DEFAULT_HISTORY_WINDOW};
use crate::error::{EngineError, Result};
use crate::holding::{sanitize, PortfolioMetrics};
use crate::quarter::Quarter;
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};

/// Safety buffer applied to the worst cumulative drawdown
pub const RESERVE_BUFFER: f64 = 1.15;

/// Floor of the call-pacing time decay
pub const MIN_TIME_FACTOR: f64 = 0.3;

/// Total decay of call pacing across the horizon
pub const TIME_DECAY: f64 = 0.7;

/// Total acceleration of distributions across the horizon
pub const MATURITY_ACCELERATION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForecastHorizon {
    #[default]
    OneYear,
    ThreeYears,
    FiveYears,
    Quarters(u32),
}

impl ForecastHorizon {
    pub fn quarters(&self) -> u32 {
        match self {
            ForecastHorizon::OneYear => 4,
            ForecastHorizon::ThreeYears => 12,
            ForecastHorizon::FiveYears => 20,
            ForecastHorizon::Quarters(n) => *n,
        }
    }
}

/// User overrides layered on top of the scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastAdjustments {
    pub call_pace_multiplier: f64,
    pub distribution_multiplier: f64,
    pub growth_adjustment: f64,
}

impl Default for ForecastAdjustments {
    fn default() -> Self {
        Self {
            call_pace_multiplier: 1.0,
            distribution_multiplier: 1.0,
            growth_adjustment: 1.0,
        }
    }
}

/// One projected quarter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastProjection {
    pub period: Quarter,
    pub capital_calls: f64,
    pub distributions: f64,
    /// distributions - capital calls
    pub net_cash_flow: f64,
    pub cumulative_calls: f64,
    pub cumulative_distributions: f64,
    pub cumulative_net: f64,
    /// Unfunded commitment left after this quarter's call
    pub remaining_unfunded: f64,
    /// Reserve covering the worst cumulative drawdown so far, with buffer
    pub required_reserve: f64,
}

impl ForecastProjection {
    pub fn label(&self) -> String {
        self.period.to_string()
    }
}

/// A full forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub start: Quarter,
    pub pacing: PacingRates,
    pub projections: Vec<ForecastProjection>,
    /// Largest required reserve across the horizon
    pub peak_reserve_requirement: f64,
}

impl Forecast {
    pub fn total_calls(&self) -> f64 {
        self.projections.iter().map(|p| p.capital_calls).sum()
    }

    pub fn total_distributions(&self) -> f64 {
        self.projections.iter().map(|p| p.distributions).sum()
    }

    pub fn net_cash_flow(&self) -> f64 {
        self.total_distributions() - self.total_calls()
    }
}

/// First projected quarter: one past the latest history, else `fallback`
pub fn start_quarter(history: &CashFlowHistory, fallback: Quarter) -> Quarter {
    history.latest_quarter().map(|q| q.next()).unwrap_or(fallback)
}

/// Call/distribution amounts per quarter
///
/// Shared by the forecast and the scenario engine.
pub(crate) fn project_amounts(
    unfunded: f64,
    nav: f64,
    pacing: &PacingRates,
    scenario: &Scenario,
    quarters: u32,
    adjustments: &ForecastAdjustments,
) -> Vec<(f64, f64)> {
    let n = quarters as f64;
    let pace = sanitize(pacing.deployment_rate)
        * sanitize(scenario.capital_call_multiplier)
        * sanitize(adjustments.call_pace_multiplier);
    let rate = sanitize(pacing.distribution_rate)
        * sanitize(scenario.distribution_multiplier)
        * sanitize(adjustments.distribution_multiplier);
    let adjusted_nav = sanitize(nav * (1.0 + scenario.nav_shock_pct));
    let growth = sanitize(adjustments.growth_adjustment);

    let mut remaining = sanitize(unfunded);
    (0..quarters)
        .map(|i| {
            let progress = i as f64 / n;
            let time_factor = (1.0 - progress * TIME_DECAY).max(MIN_TIME_FACTOR);
            let call = (remaining * pace * time_factor).min(remaining);
            remaining -= call;

            let maturity_factor = 1.0 + progress * MATURITY_ACCELERATION;
            let distribution = adjusted_nav * rate * maturity_factor * growth;
            (call, distribution)
        })
        .collect()
}

/// Forecast with explicit pacing and start quarter
pub fn forecast_with_pacing(
    metrics: &PortfolioMetrics,
    pacing: PacingRates,
    scenario: &Scenario,
    horizon: ForecastHorizon,
    adjustments: &ForecastAdjustments,
    start: Quarter,
) -> Forecast {
    let amounts = project_amounts(
        metrics.unfunded_commitments,
        metrics.total_nav,
        &pacing,
        scenario,
        horizon.quarters(),
        adjustments,
    );

    let mut remaining = sanitize(metrics.unfunded_commitments);
    let mut cumulative_calls = 0.0;
    let mut cumulative_distributions = 0.0;
    let mut running_min: f64 = 0.0;
    let mut peak_reserve: f64 = 0.0;

    let projections: Vec<ForecastProjection> = amounts
        .into_iter()
        .enumerate()
        .map(|(i, (calls, distributions))| {
            remaining = (remaining - calls).max(0.0);
            cumulative_calls += calls;
            cumulative_distributions += distributions;
            let cumulative_net = cumulative_distributions - cumulative_calls;
            running_min = running_min.min(cumulative_net);
            let required_reserve = running_min.min(0.0).abs() * RESERVE_BUFFER;
            peak_reserve = peak_reserve.max(required_reserve);

            ForecastProjection {
                period: start.succ_n(i as u32),
                capital_calls: calls,
                distributions,
                net_cash_flow: distributions - calls,
                cumulative_calls,
                cumulative_distributions,
                cumulative_net,
                remaining_unfunded: remaining,
                required_reserve,
            }
        })
        .collect();

    tracing::debug!(
        scenario = %scenario.name,
        quarters = projections.len(),
        start = %start,
        peak_reserve,
        "Cash-flow forecast computed"
    );

    Forecast {
        start,
        pacing,
        projections,
        peak_reserve_requirement: peak_reserve,
    }
}

/// Forecast from portfolio metrics and the historical series
///
/// Starts one quarter after the latest historical quarter, or in the current
/// calendar quarter when no history exists.
pub fn forecast(
    metrics: &PortfolioMetrics,
    history: &CashFlowHistory,
    scenario: &Scenario,
    horizon: ForecastHorizon,
    adjustments: &ForecastAdjustments,
) -> Forecast {
    let pacing = PacingRates::from_history(
        history,
        metrics.unfunded_commitments,
        metrics.total_nav,
        DEFAULT_HISTORY_WINDOW,
    );
    let start = start_quarter(history, Quarter::current());
    forecast_with_pacing(metrics, pacing, scenario, horizon, adjustments, start)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineSource {
    Historical,
    Projected,
}

/// One quarter of the combined historical + projected timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub period: Quarter,
    pub source: TimelineSource,
    pub capital_calls: f64,
    pub distributions: f64,
    pub net_cash_flow: f64,
    pub cumulative_net: f64,
}

/// Join history and forecast into one continuous quarterly timeline
///
/// Gaps inside the history are filled with zero quarters. The forecast must
/// begin exactly one quarter after the history ends.
pub fn stitch_timeline(history: &CashFlowHistory, forecast: &Forecast) -> Result<Vec<TimelinePoint>> {
    let historical = history.contiguous()?;

    if let (Some(last), Some(first)) = (historical.last(), forecast.projections.first()) {
        let expected = last.quarter.next();
        if first.period != expected {
            return Err(EngineError::TimelineMismatch(format!(
                "history ends {} but forecast starts {} (expected {})",
                last.quarter, first.period, expected
            )));
        }
    }

    let mut cumulative = 0.0;
    let mut timeline = Vec::with_capacity(historical.len() + forecast.projections.len());

    for flow in &historical {
        let calls = sanitize(flow.capital_calls);
        let distributions = sanitize(flow.distributions);
        cumulative += distributions - calls;
        timeline.push(TimelinePoint {
            period: flow.quarter,
            source: TimelineSource::Historical,
            capital_calls: calls,
            distributions,
            net_cash_flow: distributions - calls,
            cumulative_net: cumulative,
        });
    }

    for p in &forecast.projections {
        cumulative += p.net_cash_flow;
        timeline.push(TimelinePoint {
            period: p.period,
            source: TimelineSource::Projected,
            capital_calls: p.capital_calls,
            distributions: p.distributions,
            net_cash_flow: p.net_cash_flow,
            cumulative_net: cumulative,
        });
    }

    Ok(timeline)
}
