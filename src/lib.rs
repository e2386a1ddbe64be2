//! # lp-risk: Portfolio Risk and Cash-Flow Forecasting for LP Portfolios
//!
//! This library analyses a limited partner's portfolio of private-market fund
//! commitments: where the exposure sits, how far it has drifted from target,
//! how much liquidity upcoming capital calls will need, and how much value is
//! at risk.
//!
//! ## Core Components
//!
//! - **Exposure**: Aggregation by fund, manager, geography, vintage, asset class,
//!   sector and currency, with concentration statistics
//! - **Drift**: Target-vs-current comparison and rebalancing recommendations
//! - **Cash flows**: Pacing rates from history, quarterly forecasts and
//!   reserve requirements
//! - **Scenarios**: Preset and custom stress scenarios with liquidity coverage
//! - **Risk**: Concentration / liquidity scores and VaR (Historical,
//!   Parametric, Monte Carlo)
//! - **Policy System**: YAML/JSON policy thresholds and limit evaluation
//!
//! ## Example Usage
//!
//! ```rust
//! use lp_risk::{Holding, ReportEngine, ReportRequest};
//!
//! let yaml = r#"
//! max_single_fund_pct: 75.0
//! min_fund_count: 2
//! "#;
//! let engine = ReportEngine::from_yaml(yaml).unwrap();
//!
//! let holdings = vec![
//!     Holding::new("a", "Fund A", 10_000_000.0, 6_000_000.0, 9_000_000.0)
//!         .with_asset_class("Buyout"),
//!     Holding::new("b", "Fund B", 5_000_000.0, 5_000_000.0, 4_000_000.0)
//!         .with_asset_class("Credit"),
//! ];
//! let request = ReportRequest::new(holdings).with_available_liquidity(2_000_000.0);
//!
//! let report = engine.build_report(&request).unwrap();
//! assert_eq!(report.metrics.fund_count, 2);
//! assert_eq!(report.scenarios.built_in.len(), 3);
//! assert!(report.var.daily_var > 0.0);
//! ```

pub mod cashflow;
pub mod drift;
pub mod error;
pub mod exposure;
pub mod forecast;
pub mod holding;
pub mod limits;
mod policy;
pub mod quarter;
pub mod report;
pub mod risk;
pub mod scenario;

pub use cashflow::{CashFlowHistory, PacingRates, PacingSource, QuarterlyCashFlow};
pub use drift::{
    compute_drift, recommend_rebalancing, DriftItem, DriftTolerances, RebalanceAction, Recommendation,
    TargetAllocation,
};
pub use error::{EngineError, Result};
pub use exposure::{
    aggregate, Dimension, Diversification, ExposureBasis, ExposureBreakdown, ExposureEntry,
    FundLabels,
};
pub use forecast::{
    forecast, stitch_timeline, Forecast, ForecastAdjustments, ForecastHorizon, ForecastProjection,
    TimelinePoint, TimelineSource,
};
pub use holding::{validate_holdings, Holding, PortfolioMetrics};
pub use limits::{evaluate_limits, LimitKind, PolicyBreach, Severity};
pub use policy::{default_policy, PolicyConfig};
pub use quarter::Quarter;
pub use report::{ReportEngine, ReportRequest, RiskReport};
pub use risk::{
    assess, CorrelationMode, CovarianceModel, RiskAssessment, RiskInputs, RiskScores, VarConfig, VarEngine,
    VarMethod, VarMetrics,
};
pub use scenario::{
    run_scenario, run_scenarios, CoverageStatus, CustomScenarios, LiquiditySummary, PresetFamily, Scenario,
    ScenarioAnalysis, ScenarioConfig, ScenarioResult,
};
