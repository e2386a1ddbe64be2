//! Scenario analysis over capital calls, distributions and liquidity
//!
//! A scenario shocks NAV and scales the baseline call and distribution pacing.
//! Built-in presets always run; custom scenarios run alongside them and are
//! reported in their own list. Each scenario is evaluated independently, so
//! adding or deleting a custom scenario cannot change a built-in result.

use crate::cashflow::{CashFlowHistory, PacingRates, DEFAULT_HISTORY_WINDOW};
use crate::error::{EngineError, Result};
use crate::forecast::{project_amounts, ForecastAdjustments};
use crate::holding::{ratio, sanitize, Holding, PortfolioMetrics};
use serde::{Deserialize, Serialize};

/// Coverage ratio reported when no capital calls are projected
pub const COVERAGE_RATIO_CAP: f64 = 10.0;

/// Whether a scenario is an engine preset or user supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScenarioKind {
    BuiltIn,
    #[default]
    Custom,
}

/// Named shock parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    /// Signed NAV shock, e.g. -0.20 for a 20% decline
    pub nav_shock_pct: f64,

    pub capital_call_multiplier: f64,

    pub distribution_multiplier: f64,

    #[serde(default)]
    pub kind: ScenarioKind,
}

impl Scenario {
    /// Create a validated custom scenario
    pub fn custom(
        name: impl Into<String>,
        nav_shock_pct: f64,
        capital_call_multiplier: f64,
        distribution_multiplier: f64,
    ) -> Result<Self> {
        let scenario = Self {
            name: name.into(),
            nav_shock_pct,
            capital_call_multiplier,
            distribution_multiplier,
            kind: ScenarioKind::Custom,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    fn preset(name: &str, nav_shock_pct: f64, calls: f64, distributions: f64) -> Self {
        Self {
            name: name.to_string(),
            nav_shock_pct,
            capital_call_multiplier: calls,
            distribution_multiplier: distributions,
            kind: ScenarioKind::BuiltIn,
        }
    }

    /// No shock, baseline pacing
    pub fn base() -> Self {
        Self::preset("Base", 0.0, 1.0, 1.0)
    }

    pub fn best() -> Self {
        Self::preset("Best", 0.10, 0.8, 1.3)
    }

    pub fn worst() -> Self {
        Self::preset("Worst", -0.25, 1.4, 0.5)
    }

    pub fn downside() -> Self {
        Self::preset("Downside", -0.15, 1.2, 0.7)
    }

    pub fn severe() -> Self {
        Self::preset("Severe", -0.35, 1.5, 0.3)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidScenario("Scenario name is empty".to_string()));
        }
        if !self.nav_shock_pct.is_finite() {
            return Err(EngineError::InvalidScenario(format!(
                "{}: NAV shock must be finite",
                self.name
            )));
        }
        for (field, value) in [
            ("capital_call_multiplier", self.capital_call_multiplier),
            ("distribution_multiplier", self.distribution_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidScenario(format!(
                    "{}: {} must be a non-negative number, got {}",
                    self.name, field, value
                )));
            }
        }
        Ok(())
    }
}

/// Built-in preset sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PresetFamily {
    #[default]
    BaseBestWorst,
    BaseDownsideSevere,
}

impl PresetFamily {
    pub fn scenarios(&self) -> Vec<Scenario> {
        match self {
            PresetFamily::BaseBestWorst => vec![Scenario::base(), Scenario::best(), Scenario::worst()],
            PresetFamily::BaseDownsideSevere => {
                vec![Scenario::base(), Scenario::downside(), Scenario::severe()]
            }
        }
    }
}

fn is_reserved_name(name: &str) -> bool {
    ["Base", "Best", "Worst", "Downside", "Severe"]
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name.trim()))
}

/// User-defined scenarios supplied by an external store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomScenarios {
    scenarios: Vec<Scenario>,
}

impl CustomScenarios {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scenario; names must be unique and may not shadow a preset
    pub fn add(&mut self, mut scenario: Scenario) -> Result<()> {
        scenario.validate()?;
        if is_reserved_name(&scenario.name) {
            return Err(EngineError::InvalidScenario(format!(
                "{} is a built-in scenario name",
                scenario.name
            )));
        }
        if self.scenarios.iter().any(|s| s.name == scenario.name) {
            return Err(EngineError::InvalidScenario(format!(
                "Duplicate scenario name: {}",
                scenario.name
            )));
        }
        scenario.kind = ScenarioKind::Custom;
        self.scenarios.push(scenario);
        Ok(())
    }

    /// Re-check a store that was deserialized rather than built with `add`
    pub fn validate(&self) -> Result<()> {
        for (i, scenario) in self.scenarios.iter().enumerate() {
            scenario.validate()?;
            if is_reserved_name(&scenario.name) {
                return Err(EngineError::InvalidScenario(format!(
                    "{} is a built-in scenario name",
                    scenario.name
                )));
            }
            if self.scenarios[..i].iter().any(|s| s.name == scenario.name) {
                return Err(EngineError::InvalidScenario(format!(
                    "Duplicate scenario name: {}",
                    scenario.name
                )));
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Scenario> {
        let index = self.scenarios.iter().position(|s| s.name == name)?;
        Some(self.scenarios.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn as_slice(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Scenario engine settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Trailing quarters of history used for pacing
    pub history_window: usize,
    /// Quarters over which calls and distributions are projected
    pub horizon_quarters: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            horizon_quarters: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageStatus {
    Covered,
    Shortfall,
}

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    /// NAV after the shock, floored at zero
    pub stressed_nav: f64,
    pub projected_calls: f64,
    pub projected_distributions: f64,
    pub available_liquidity: f64,
    /// max(0, calls - liquidity - distributions)
    pub liquidity_gap: f64,
    pub status: CoverageStatus,
}

impl ScenarioResult {
    pub fn name(&self) -> &str {
        &self.scenario.name
    }

    pub fn is_covered(&self) -> bool {
        self.status == CoverageStatus::Covered
    }
}

/// Run one scenario with explicitly supplied pacing
pub fn run_scenario_with_pacing(
    metrics: &PortfolioMetrics,
    pacing: &PacingRates,
    scenario: &Scenario,
    available_liquidity: f64,
    horizon_quarters: u32,
) -> ScenarioResult {
    let available_liquidity = sanitize(available_liquidity);
    let amounts = project_amounts(
        metrics.unfunded_commitments,
        metrics.total_nav,
        pacing,
        scenario,
        horizon_quarters.max(1),
        &ForecastAdjustments::default(),
    );

    let projected_calls: f64 = amounts.iter().map(|(calls, _)| calls).sum();
    let projected_distributions: f64 = amounts.iter().map(|(_, dists)| dists).sum();
    let liquidity_gap = (projected_calls - available_liquidity - projected_distributions).max(0.0);
    let status = if liquidity_gap > 0.0 {
        CoverageStatus::Shortfall
    } else {
        CoverageStatus::Covered
    };

    ScenarioResult {
        scenario: scenario.clone(),
        stressed_nav: (metrics.total_nav * (1.0 + scenario.nav_shock_pct)).max(0.0),
        projected_calls,
        projected_distributions,
        available_liquidity,
        liquidity_gap,
        status,
    }
}

/// Run one scenario against a holdings snapshot and its history
pub fn run_scenario(
    holdings: &[Holding],
    history: &CashFlowHistory,
    scenario: &Scenario,
    available_liquidity: f64,
    config: &ScenarioConfig,
) -> ScenarioResult {
    let metrics = PortfolioMetrics::from_holdings(holdings);
    let pacing = PacingRates::from_history(
        history,
        metrics.unfunded_commitments,
        metrics.total_nav,
        config.history_window,
    );
    run_scenario_with_pacing(&metrics, &pacing, scenario, available_liquidity, config.horizon_quarters)
}

/// Built-in and custom scenario results for one report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub pacing: PacingRates,
    pub built_in: Vec<ScenarioResult>,
    pub custom: Vec<ScenarioResult>,
}

impl ScenarioAnalysis {
    /// Scenario with the largest liquidity gap (built-in wins ties)
    pub fn worst(&self) -> Option<&ScenarioResult> {
        self.all()
            .reduce(|worst, r| if r.liquidity_gap > worst.liquidity_gap { r } else { worst })
    }

    pub fn all(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.built_in.iter().chain(self.custom.iter())
    }

    pub fn find(&self, name: &str) -> Option<&ScenarioResult> {
        self.all().find(|r| r.name() == name)
    }

    /// Every scenario definition, built-in first
    pub fn scenarios(&self) -> Vec<Scenario> {
        self.all().map(|r| r.scenario.clone()).collect()
    }
}

/// Run the preset family plus any custom scenarios
pub fn run_scenarios(
    holdings: &[Holding],
    history: &CashFlowHistory,
    presets: PresetFamily,
    custom: &CustomScenarios,
    available_liquidity: f64,
    config: &ScenarioConfig,
) -> ScenarioAnalysis {
    let metrics = PortfolioMetrics::from_holdings(holdings);
    let pacing = PacingRates::from_history(
        history,
        metrics.unfunded_commitments,
        metrics.total_nav,
        config.history_window,
    );

    let run = |s: &Scenario| {
        let result =
            run_scenario_with_pacing(&metrics, &pacing, s, available_liquidity, config.horizon_quarters);
        tracing::debug!(
            scenario = %s.name,
            calls = result.projected_calls,
            distributions = result.projected_distributions,
            gap = result.liquidity_gap,
            "Scenario evaluated"
        );
        result
    };

    let built_in = presets.scenarios().iter().map(run).collect();
    let custom = custom.as_slice().iter().map(run).collect();

    ScenarioAnalysis {
        pacing,
        built_in,
        custom,
    }
}

/// Liquidity position against projected calls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySummary {
    pub available_liquidity: f64,
    pub projected_calls: f64,
    pub projected_distributions: f64,
}

impl LiquiditySummary {
    pub fn from_result(result: &ScenarioResult) -> Self {
        Self {
            available_liquidity: result.available_liquidity,
            projected_calls: result.projected_calls,
            projected_distributions: result.projected_distributions,
        }
    }

    /// (liquidity + distributions) / calls, capped at `COVERAGE_RATIO_CAP`
    pub fn coverage_ratio(&self) -> f64 {
        let calls = sanitize(self.projected_calls);
        if calls == 0.0 {
            return COVERAGE_RATIO_CAP;
        }
        let sources = sanitize(self.available_liquidity) + sanitize(self.projected_distributions);
        (sources / calls).min(COVERAGE_RATIO_CAP)
    }

    /// Available liquidity as a share of NAV (%)
    pub fn reserve_pct(&self, nav: f64) -> f64 {
        100.0 * ratio(sanitize(self.available_liquidity), sanitize(nav))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn holdings() -> Vec<Holding> {
        vec![
            Holding::new("a", "Fund A", 10_000_000.0, 6_000_000.0, 9_000_000.0),
            Holding::new("b", "Fund B", 5_000_000.0, 5_000_000.0, 4_000_000.0),
        ]
    }

    #[test]
    fn test_base_scenario_defaults() {
        let result = run_scenario(
            &holdings(),
            &CashFlowHistory::new(),
            &Scenario::base(),
            0.0,
            &ScenarioConfig::default(),
        );

        assert_relative_eq!(result.projected_calls, 600_000.0, max_relative = 1e-12);
        assert_relative_eq!(result.projected_distributions, 13_000_000.0 * 0.08, max_relative = 1e-12);
        assert_eq!(result.liquidity_gap, 0.0);
        assert!(result.is_covered());
    }

    #[test]
    fn test_worst_scenario_gap() {
        let h = vec![Holding::new("a", "Fund A", 10_000_000.0, 1_000_000.0, 1_000_000.0)];
        let result = run_scenario(
            &h,
            &CashFlowHistory::new(),
            &Scenario::worst(),
            100_000.0,
            &ScenarioConfig::default(),
        );

        let calls = 9_000_000.0 * 0.15 * 1.4;
        let dists = 1_000_000.0 * 0.75 * 0.08 * 0.5;
        assert_relative_eq!(result.projected_calls, calls, max_relative = 1e-12);
        assert_relative_eq!(result.projected_distributions, dists, max_relative = 1e-12);
        assert_relative_eq!(result.liquidity_gap, calls - 100_000.0 - dists, max_relative = 1e-12);
        assert_eq!(result.status, CoverageStatus::Shortfall);
        assert_relative_eq!(result.stressed_nav, 750_000.0);
    }

    #[test]
    fn test_custom_scenarios_do_not_touch_built_ins() {
        let h = holdings();
        let history = CashFlowHistory::new();
        let config = ScenarioConfig::default();

        let without = run_scenarios(&h, &history, PresetFamily::BaseBestWorst, &CustomScenarios::new(), 0.0, &config);

        let mut custom = CustomScenarios::new();
        custom.add(Scenario::custom("Rate Shock", -0.4, 2.0, 0.1).unwrap()).unwrap();
        let with = run_scenarios(&h, &history, PresetFamily::BaseBestWorst, &custom, 0.0, &config);

        assert_eq!(without.built_in, with.built_in);
        assert!(without.custom.is_empty());
        assert_eq!(with.custom.len(), 1);
        assert_eq!(with.custom[0].scenario.kind, ScenarioKind::Custom);

        custom.remove("Rate Shock");
        let after_delete = run_scenarios(&h, &history, PresetFamily::BaseBestWorst, &custom, 0.0, &config);
        assert_eq!(after_delete.built_in, without.built_in);
    }

    #[test]
    fn test_custom_store_validation() {
        let mut store = CustomScenarios::new();
        assert!(Scenario::custom("Neg", 0.0, -1.0, 1.0).is_err());
        assert!(Scenario::custom("NaN", f64::NAN, 1.0, 1.0).is_err());

        let shadow = Scenario {
            kind: ScenarioKind::Custom,
            ..Scenario::worst()
        };
        assert!(store.add(shadow).is_err());

        store.add(Scenario::custom("Mine", 0.0, 1.0, 1.0).unwrap()).unwrap();
        assert!(store.add(Scenario::custom("Mine", 0.1, 1.0, 1.0).unwrap()).is_err());
        assert_eq!(store.len(), 1);
        assert!(store.remove("Missing").is_none());
    }

    #[test]
    fn test_preset_families() {
        let names: Vec<String> = PresetFamily::BaseDownsideSevere
            .scenarios()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Base", "Downside", "Severe"]);
        assert!(PresetFamily::BaseBestWorst
            .scenarios()
            .iter()
            .all(|s| s.kind == ScenarioKind::BuiltIn && s.validate().is_ok()));
    }

    #[test]
    fn test_analysis_worst() {
        let h = vec![Holding::new("a", "Fund A", 10_000_000.0, 1_000_000.0, 1_000_000.0)];
        let analysis = run_scenarios(
            &h,
            &CashFlowHistory::new(),
            PresetFamily::BaseBestWorst,
            &CustomScenarios::new(),
            0.0,
            &ScenarioConfig::default(),
        );
        assert_eq!(analysis.worst().unwrap().name(), "Worst");
        assert_eq!(analysis.scenarios().len(), 3);
    }

    #[test]
    fn test_coverage_ratio() {
        let summary = LiquiditySummary {
            available_liquidity: 1_000.0,
            projected_calls: 500.0,
            projected_distributions: 250.0,
        };
        assert_relative_eq!(summary.coverage_ratio(), 2.5);
        assert_relative_eq!(summary.reserve_pct(10_000.0), 10.0);
        assert_eq!(summary.reserve_pct(0.0), 0.0);

        let no_calls = LiquiditySummary {
            projected_calls: 0.0,
            ..summary
        };
        assert_eq!(no_calls.coverage_ratio(), COVERAGE_RATIO_CAP);
    }
}
