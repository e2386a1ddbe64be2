//! Portfolio report engine
//!
//! `ReportEngine` owns the policy and engine settings and assembles one
//! `RiskReport` per request: exposures, drift and rebalancing, scenarios,
//! liquidity, policy breaches, risk scores, VaR and the cash-flow forecast.
//! The engine holds no mutable state, so one instance can serve concurrent
//! requests.

use crate::cashflow::CashFlowHistory;
use crate::drift::{
    compute_drift, recommend_rebalancing, DriftItem, DriftTolerances, Recommendation, TargetAllocation,
};
use crate::error::Result;
use crate::exposure::{Diversification, Dimension, ExposureBasis, ExposureBreakdown};
use crate::forecast::{forecast_with_pacing, start_quarter, Forecast, ForecastAdjustments, ForecastHorizon};
use crate::holding::{validate_holdings, Holding, PortfolioMetrics};
use crate::limits::{evaluate_limits, PolicyBreach};
use crate::policy::PolicyConfig;
use crate::quarter::Quarter;
use crate::risk::{assess, CorrelationMode, RiskInputs, RiskScores, VarConfig, VarEngine, VarMethod, VarMetrics};
use crate::scenario::{
    run_scenarios, CustomScenarios, LiquiditySummary, PresetFamily, Scenario, ScenarioAnalysis, ScenarioConfig,
};
use serde::{Deserialize, Serialize};

/// Everything a report is computed from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRequest {
    pub holdings: Vec<Holding>,
    pub targets: TargetAllocation,
    pub history: CashFlowHistory,
    pub custom_scenarios: CustomScenarios,
    pub available_liquidity: f64,
    /// Overall risk scores of prior snapshots, oldest first
    pub risk_score_history: Vec<f64>,
    pub var_method: VarMethod,
    pub preset_family: PresetFamily,
    pub correlation: CorrelationMode,
    pub forecast_horizon: ForecastHorizon,
}

impl ReportRequest {
    pub fn new(holdings: Vec<Holding>) -> Self {
        Self {
            holdings,
            ..Default::default()
        }
    }

    pub fn with_targets(mut self, targets: TargetAllocation) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_history(mut self, history: CashFlowHistory) -> Self {
        self.history = history;
        self
    }

    pub fn with_custom_scenarios(mut self, scenarios: CustomScenarios) -> Self {
        self.custom_scenarios = scenarios;
        self
    }

    pub fn with_available_liquidity(mut self, liquidity: f64) -> Self {
        self.available_liquidity = liquidity;
        self
    }

    pub fn with_risk_score_history(mut self, history: Vec<f64>) -> Self {
        self.risk_score_history = history;
        self
    }

    pub fn with_var_method(mut self, method: VarMethod) -> Self {
        self.var_method = method;
        self
    }

    pub fn with_preset_family(mut self, family: PresetFamily) -> Self {
        self.preset_family = family;
        self
    }

    pub fn with_forecast_horizon(mut self, horizon: ForecastHorizon) -> Self {
        self.forecast_horizon = horizon;
        self
    }
}

/// Full risk report for one portfolio snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub metrics: PortfolioMetrics,
    pub exposures: ExposureBreakdown,
    pub drift: Vec<DriftItem>,
    pub recommendations: Vec<Recommendation>,
    pub breaches: Vec<PolicyBreach>,
    pub scenarios: ScenarioAnalysis,
    /// Liquidity under the base scenario
    pub liquidity: LiquiditySummary,
    pub scores: RiskScores,
    pub var: VarMetrics,
    pub portfolio_variance: f64,
    pub diversification: Diversification,
    /// Base-case forecast over the requested horizon
    pub forecast: Forecast,
}

impl RiskReport {
    /// True if any hard limit is breached (warnings excluded)
    pub fn has_breaches(&self) -> bool {
        self.breaches.iter().any(PolicyBreach::is_breach)
    }
}

/// Report assembly engine
#[derive(Debug, Clone, Default)]
pub struct ReportEngine {
    policy: PolicyConfig,
    var_config: VarConfig,
    scenario_config: ScenarioConfig,
    tolerances: DriftTolerances,
}

impl ReportEngine {
    pub fn new(policy: PolicyConfig) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Create an engine from a YAML policy document
    ///
    /// # Example
    ///
    /// ```
    /// use lp_risk::ReportEngine;
    ///
    /// let engine = ReportEngine::from_yaml("min_fund_count: 4").unwrap();
    /// assert_eq!(engine.policy().min_fund_count, 4);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(Self::new(PolicyConfig::from_yaml(yaml)?))
    }

    /// Create an engine from a JSON policy document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(PolicyConfig::from_json(json)?))
    }

    pub fn with_var_config(mut self, config: VarConfig) -> Self {
        self.var_config = config;
        self
    }

    pub fn with_scenario_config(mut self, config: ScenarioConfig) -> Self {
        self.scenario_config = config;
        self
    }

    pub fn with_tolerances(mut self, tolerances: DriftTolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn var_config(&self) -> &VarConfig {
        &self.var_config
    }

    /// Assemble the report
    ///
    /// Fails only on structurally malformed input: empty or duplicate holding
    /// ids, or custom scenarios with invalid multipliers, duplicate names or
    /// built-in names.
    pub fn build_report(&self, request: &ReportRequest) -> Result<RiskReport> {
        validate_holdings(&request.holdings)?;
        request.custom_scenarios.validate()?;

        let holdings = &request.holdings;
        let metrics = PortfolioMetrics::from_holdings(holdings);
        let exposures = ExposureBreakdown::from_holdings(holdings, ExposureBasis::Nav);

        let drift = compute_drift(&exposures, &request.targets, &self.tolerances);
        let recommendations = recommend_rebalancing(&drift, holdings);

        let scenarios = run_scenarios(
            holdings,
            &request.history,
            request.preset_family,
            &request.custom_scenarios,
            request.available_liquidity,
            &self.scenario_config,
        );
        let liquidity = scenarios
            .find(Scenario::base().name.as_str())
            .map(LiquiditySummary::from_result)
            .unwrap_or(LiquiditySummary {
                available_liquidity: request.available_liquidity,
                projected_calls: 0.0,
                projected_distributions: 0.0,
            });

        let breaches = evaluate_limits(holdings, &exposures, &metrics, &liquidity, &self.policy);

        let inputs = RiskInputs {
            exposures_by_asset_class: exposures.entries(Dimension::AssetClass).to_vec(),
            liquidity,
            scenarios: scenarios.scenarios(),
            portfolio_value: metrics.total_nav,
            risk_score_history: request.risk_score_history.clone(),
            correlation: request.correlation,
        };
        let engine = VarEngine::new(self.var_config.clone());
        let assessment = assess(&inputs, &self.policy, request.var_method, &engine);

        let diversification = Diversification::from_entries(exposures.entries(Dimension::Fund));

        let forecast = forecast_with_pacing(
            &metrics,
            scenarios.pacing,
            &Scenario::base(),
            request.forecast_horizon,
            &ForecastAdjustments::default(),
            start_quarter(&request.history, Quarter::current()),
        );

        tracing::info!(
            funds = metrics.fund_count,
            nav = metrics.total_nav,
            risk_score = assessment.scores.overall,
            daily_var = assessment.var.daily_var,
            breaches = breaches.len(),
            recommendations = recommendations.len(),
            "Risk report assembled"
        );

        Ok(RiskReport {
            metrics,
            exposures,
            drift,
            recommendations,
            breaches,
            scenarios,
            liquidity,
            scores: assessment.scores,
            var: assessment.var,
            portfolio_variance: assessment.portfolio_variance,
            diversification,
            forecast,
        })
    }

    /// Assemble the report on tokio's blocking pool
    #[cfg(feature = "async")]
    pub async fn build_report_async(self: std::sync::Arc<Self>, request: ReportRequest) -> Result<RiskReport> {
        tokio::task::spawn_blocking(move || self.build_report(&request))
            .await
            .map_err(|e| crate::error::EngineError::TaskFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::QuarterlyCashFlow;
    use crate::drift::RebalanceAction;
    use crate::error::EngineError;
    use approx::assert_abs_diff_eq;

    fn holdings() -> Vec<Holding> {
        vec![
            Holding::new("a", "Fund A", 10_000_000.0, 6_000_000.0, 9_000_000.0)
                .with_manager("Alpha Partners")
                .with_asset_class("Buyout")
                .with_domicile("US")
                .with_vintage(2018),
            Holding::new("b", "Fund B", 5_000_000.0, 5_000_000.0, 4_000_000.0)
                .with_manager("Beta Capital")
                .with_asset_class("Credit")
                .with_domicile("EU")
                .with_vintage(2020),
        ]
    }

    fn history() -> CashFlowHistory {
        CashFlowHistory::from_flows((1..=4).map(|q| {
            QuarterlyCashFlow::new(Quarter::new(2024, q).unwrap(), 400_000.0, 250_000.0)
        }))
    }

    fn engine() -> ReportEngine {
        ReportEngine::new(PolicyConfig::default()).with_var_config(VarConfig {
            random_seed: Some(11),
            ..Default::default()
        })
    }

    #[test]
    fn test_build_report() {
        let targets = TargetAllocation::new()
            .with_target(Dimension::AssetClass, "Buyout", 40.0)
            .with_target(Dimension::AssetClass, "Credit", 40.0)
            .with_target(Dimension::AssetClass, "Growth", 20.0);
        let request = ReportRequest::new(holdings())
            .with_targets(targets)
            .with_history(history())
            .with_available_liquidity(1_000_000.0);

        let report = engine().build_report(&request).unwrap();

        let asset = report.exposures.entries(Dimension::AssetClass);
        assert_abs_diff_eq!(asset[0].percentage, 69.2, epsilon = 0.05);
        assert_abs_diff_eq!(asset[1].percentage, 30.8, epsilon = 0.05);

        assert_eq!(report.recommendations[0].category, "Buyout");
        assert_eq!(report.recommendations[0].action, RebalanceAction::Reduce);

        assert_eq!(report.scenarios.built_in.len(), 3);
        assert!(report.scenarios.custom.is_empty());
        assert_eq!(report.forecast.start, Quarter::new(2025, 1).unwrap());
        assert_eq!(report.forecast.projections.len(), 4);
        assert!(report.scores.overall >= 0.0 && report.scores.overall <= 100.0);
        assert_eq!(report.var.method, VarMethod::Parametric);
        assert!(report.var.daily_var > 0.0);
        assert!(report.has_breaches());
    }

    #[test]
    fn test_custom_scenarios_do_not_change_built_ins() {
        let base = ReportRequest::new(holdings()).with_history(history());
        let mut custom = CustomScenarios::new();
        custom
            .add(Scenario::custom("Rate shock", -0.3, 1.6, 0.2).unwrap())
            .unwrap();
        let with_custom = base.clone().with_custom_scenarios(custom);

        let a = engine().build_report(&base).unwrap();
        let b = engine().build_report(&with_custom).unwrap();

        assert_eq!(a.scenarios.built_in, b.scenarios.built_in);
        assert_eq!(b.scenarios.custom.len(), 1);
        assert_eq!(a.scores, b.scores);
    }

    #[test]
    fn test_invalid_requests() {
        let mut dup = holdings();
        dup[1].id = "a".to_string();
        let err = engine().build_report(&ReportRequest::new(dup)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        let mut bad = CustomScenarios::new();
        bad.add(Scenario::custom("Ok", 0.0, 1.0, 1.0).unwrap()).unwrap();
        let mut json = serde_json::to_value(&bad).unwrap();
        json["scenarios"][0]["capital_call_multiplier"] = serde_json::json!(-1.0);
        let bad: CustomScenarios = serde_json::from_value(json).unwrap();
        let request = ReportRequest::new(holdings()).with_custom_scenarios(bad);
        let err = engine().build_report(&request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidScenario(_)));
    }

    #[test]
    fn test_deserialized_scenario_names_are_checked() {
        let mut store = CustomScenarios::new();
        store.add(Scenario::custom("Rate shock", -0.2, 1.2, 0.8).unwrap()).unwrap();
        store.add(Scenario::custom("Credit freeze", -0.1, 1.1, 0.5).unwrap()).unwrap();
        let json = serde_json::to_value(&store).unwrap();

        for name in ["Rate shock", "worst"] {
            let mut renamed = json.clone();
            renamed["scenarios"][1]["name"] = serde_json::json!(name);
            let store: CustomScenarios = serde_json::from_value(renamed).unwrap();
            let request = ReportRequest::new(holdings()).with_custom_scenarios(store);
            let err = engine().build_report(&request).unwrap_err();
            assert!(matches!(err, EngineError::InvalidScenario(_)), "{name} accepted");
        }

        let store: CustomScenarios = serde_json::from_value(json).unwrap();
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_monte_carlo_report_is_reproducible_with_seed() {
        let request = ReportRequest::new(holdings())
            .with_history(history())
            .with_var_method(VarMethod::MonteCarlo);
        let a = engine().build_report(&request).unwrap();
        let b = engine().build_report(&request).unwrap();
        assert_eq!(a.var, b.var);
    }

    #[test]
    fn test_from_yaml_policy() {
        let engine = ReportEngine::from_yaml("max_single_fund_pct: 80.0\nmin_fund_count: 2").unwrap();
        let report = engine
            .build_report(&ReportRequest::new(holdings()).with_available_liquidity(5_000_000.0))
            .unwrap();
        assert!(!report
            .breaches
            .iter()
            .any(|b| b.kind == crate::limits::LimitKind::Exposure(Dimension::Fund)));
        assert!(!report
            .breaches
            .iter()
            .any(|b| b.kind == crate::limits::LimitKind::FundCount));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_build_report_async() {
        let engine = std::sync::Arc::new(engine());
        let request = ReportRequest::new(holdings()).with_history(history());
        let report = engine.clone().build_report_async(request.clone()).await.unwrap();
        assert_eq!(report, engine.build_report(&request).unwrap());
    }
}
