//! Blended 0-100 risk score and the combined risk assessment
//!
//! Higher scores mean more risk. Each sub-score maps its ratio to the policy
//! threshold onto 0-100, reaching 50 exactly at the threshold:
//! - concentration: `50 * clamp(max_pct / max_asset_class_pct, 0, 2)`
//! - liquidity: `50 * clamp(2 - coverage / min_coverage_ratio, 0, 2)`
//! - overall: `CONCENTRATION_WEIGHT * concentration + LIQUIDITY_WEIGHT * liquidity`

use crate::exposure::ExposureEntry;
use crate::policy::PolicyConfig;
use crate::risk::covariance::{CorrelationMode, CovarianceModel};
use crate::risk::var::{VarEngine, VarMethod, VarMetrics};
use crate::scenario::{LiquiditySummary, Scenario};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const CONCENTRATION_WEIGHT: f64 = 0.5;
pub const LIQUIDITY_WEIGHT: f64 = 0.5;

/// Risk sub-scores and blend, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScores {
    pub concentration: f64,
    pub liquidity: f64,
    pub overall: f64,
}

impl RiskScores {
    pub fn compute(exposures: &[ExposureEntry], liquidity: &LiquiditySummary, policy: &PolicyConfig) -> Self {
        let max_pct = exposures
            .iter()
            .map(|e| e.percentage)
            .filter(|p| p.is_finite())
            .fold(0.0, f64::max);

        let concentration = if policy.max_asset_class_pct > 0.0 {
            50.0 * (max_pct / policy.max_asset_class_pct).clamp(0.0, 2.0)
        } else if max_pct > 0.0 {
            100.0
        } else {
            0.0
        };

        let liquidity = if policy.min_coverage_ratio > 0.0 {
            50.0 * (2.0 - liquidity.coverage_ratio() / policy.min_coverage_ratio).clamp(0.0, 2.0)
        } else {
            0.0
        };

        Self {
            concentration,
            liquidity,
            overall: CONCENTRATION_WEIGHT * concentration + LIQUIDITY_WEIGHT * liquidity,
        }
    }

    /// Overall score on the 0-10 display scale
    pub fn display_score(&self) -> f64 {
        self.overall / 10.0
    }
}

/// Everything the risk engine consumes for one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub exposures_by_asset_class: Vec<ExposureEntry>,
    pub liquidity: LiquiditySummary,
    /// Built-in and custom scenarios, sampled by Monte Carlo VaR
    pub scenarios: Vec<Scenario>,
    pub portfolio_value: f64,
    /// Overall risk scores of prior snapshots, oldest first
    #[serde(default)]
    pub risk_score_history: Vec<f64>,
    #[serde(default)]
    pub correlation: CorrelationMode,
}

/// Risk scores plus VaR for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub scores: RiskScores,
    pub var: VarMetrics,
    pub portfolio_variance: f64,
}

/// Score a portfolio and estimate VaR with the chosen method
pub fn assess(
    inputs: &RiskInputs,
    policy: &PolicyConfig,
    method: VarMethod,
    engine: &VarEngine,
) -> RiskAssessment {
    let mut rng = engine.rng();
    assess_with_rng(inputs, policy, method, engine, &mut rng)
}

/// As [`assess`], drawing Monte Carlo samples from `rng`
pub fn assess_with_rng<R: Rng + ?Sized>(
    inputs: &RiskInputs,
    policy: &PolicyConfig,
    method: VarMethod,
    engine: &VarEngine,
    rng: &mut R,
) -> RiskAssessment {
    let scores = RiskScores::compute(&inputs.exposures_by_asset_class, &inputs.liquidity, policy);
    let model = CovarianceModel::from_exposures(&inputs.exposures_by_asset_class, inputs.correlation);
    let portfolio_variance = model.portfolio_variance();

    let var = match method {
        VarMethod::Historical => engine.historical(inputs.portfolio_value, &inputs.risk_score_history),
        VarMethod::Parametric => engine.parametric(inputs.portfolio_value, portfolio_variance),
        VarMethod::MonteCarlo => engine.monte_carlo(
            inputs.portfolio_value,
            portfolio_variance,
            &inputs.scenarios,
            rng,
        ),
    };

    RiskAssessment {
        scores,
        var,
        portfolio_variance,
    }
}
