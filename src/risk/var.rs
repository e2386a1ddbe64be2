//! Value at Risk (VaR) and Expected Shortfall engines
//!
//! Implements three interchangeable daily estimators at 95% confidence:
//! - Historical: volatility of snapshot-over-snapshot risk score changes
//! - Parametric: volatility implied by the exposure covariance model
//! - Monte Carlo: scenario shocks plus Gaussian noise, empirical 5th percentile
//!
//! Horizons scale with the square root of time: 21 trading days per month,
//! 252 per year.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::holding::sanitize;
use crate::scenario::Scenario;

/// One-tailed 95% z-score
pub const Z_SCORE_95: f64 = 1.65;

/// ES / VaR multiple for the closed-form methods
pub const ES_MULTIPLIER: f64 = 1.35;

pub const TRADING_DAYS_PER_MONTH: f64 = 21.0;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Tail probability for the Monte Carlo percentile
pub const TAIL_PROBABILITY: f64 = 0.05;

/// Lower bound on the number of Monte Carlo draws
pub const MIN_SIMULATIONS: usize = 800;

/// Weights of the two independent noise terms
const NOISE_WEIGHTS: (f64, f64) = (0.7, 0.3);

/// VaR calculation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VarMethod {
    Historical,
    #[default]
    Parametric,
    MonteCarlo,
}

/// VaR engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarConfig {
    /// Number of Monte Carlo draws (raised to `MIN_SIMULATIONS` if lower)
    pub simulations: usize,

    /// Random seed for reproducible Monte Carlo (None = fresh entropy per run)
    pub random_seed: Option<u64>,

    /// Floor on historical daily volatility
    pub historical_volatility_floor: f64,

    /// Floor on parametric daily volatility
    pub parametric_volatility_floor: f64,
}

impl Default for VarConfig {
    fn default() -> Self {
        Self {
            simulations: 1_000,
            random_seed: None,
            historical_volatility_floor: 0.012,
            parametric_volatility_floor: 0.015,
        }
    }
}

/// VaR and ES over daily, monthly and annual horizons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarMetrics {
    pub method: VarMethod,

    /// Daily volatility (closed-form methods) or |VaR return| (Monte Carlo)
    pub daily_volatility: f64,

    pub daily_var: f64,
    pub monthly_var: f64,
    pub annual_var: f64,
    pub expected_shortfall: f64,

    /// Simulated 5th percentile return (Monte Carlo only)
    pub var_return: Option<f64>,

    /// Mean simulated return in the tail (Monte Carlo only)
    pub es_return: Option<f64>,

    /// Draws used (0 for closed-form methods)
    pub simulations: usize,
}

impl VarMetrics {
    fn from_daily(method: VarMethod, daily_volatility: f64, daily_var: f64, expected_shortfall: f64) -> Self {
        Self {
            method,
            daily_volatility,
            daily_var,
            monthly_var: daily_var * TRADING_DAYS_PER_MONTH.sqrt(),
            annual_var: daily_var * TRADING_DAYS_PER_YEAR.sqrt(),
            expected_shortfall,
            var_return: None,
            es_return: None,
            simulations: 0,
        }
    }
}

/// VaR calculation engine
#[derive(Debug, Clone, Default)]
pub struct VarEngine {
    config: VarConfig,
}

impl VarEngine {
    pub fn new(config: VarConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VarConfig {
        &self.config
    }

    /// RNG for one Monte Carlo run: seeded if configured, otherwise from entropy
    pub fn rng(&self) -> StdRng {
        match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Historical VaR from the overall risk score series
    ///
    /// Daily volatility is the standard deviation of fractional score changes,
    /// floored at `historical_volatility_floor`. Changes from a zero or
    /// non-finite score are skipped.
    pub fn historical(&self, portfolio_value: f64, score_history: &[f64]) -> VarMetrics {
        let deltas: Vec<f64> = score_history
            .windows(2)
            .filter(|w| w[0].is_finite() && w[1].is_finite() && w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect();

        let variance = if deltas.is_empty() {
            0.0
        } else {
            let mean = deltas.iter().mean();
            tracing::debug!(observations = deltas.len(), mean, "Historical score deltas");
            deltas.iter().population_variance()
        };

        let sigma = variance.max(0.0).sqrt().max(self.config.historical_volatility_floor);
        self.closed_form(VarMethod::Historical, portfolio_value, sigma)
    }

    /// Parametric VaR from the covariance model's portfolio variance
    pub fn parametric(&self, portfolio_value: f64, portfolio_variance: f64) -> VarMetrics {
        let sigma = sanitize(portfolio_variance)
            .sqrt()
            .max(self.config.parametric_volatility_floor);
        self.closed_form(VarMethod::Parametric, portfolio_value, sigma)
    }

    fn closed_form(&self, method: VarMethod, portfolio_value: f64, sigma: f64) -> VarMetrics {
        let daily_var = sanitize(portfolio_value) * sigma * Z_SCORE_95;
        VarMetrics::from_daily(method, sigma, daily_var, daily_var * ES_MULTIPLIER)
    }

    /// Monte Carlo VaR
    ///
    /// Each draw picks a scenario uniformly and adds its NAV shock, scaled to a
    /// daily move by `1/sqrt(252)`, to two independent standard normal terms
    /// weighted 0.7/0.3 and scaled by the portfolio volatility.
    pub fn monte_carlo<R: Rng + ?Sized>(
        &self,
        portfolio_value: f64,
        portfolio_variance: f64,
        scenarios: &[Scenario],
        rng: &mut R,
    ) -> VarMetrics {
        let simulations = self.config.simulations.max(MIN_SIMULATIONS);
        let scale = sanitize(portfolio_variance).sqrt();
        let daily_shock = TRADING_DAYS_PER_YEAR.sqrt();

        let mut returns: Vec<f64> = (0..simulations)
            .map(|_| {
                let shock = if scenarios.is_empty() {
                    0.0
                } else {
                    let s = &scenarios[rng.gen_range(0..scenarios.len())];
                    if s.nav_shock_pct.is_finite() {
                        s.nav_shock_pct / daily_shock
                    } else {
                        0.0
                    }
                };
                let z1: f64 = rng.sample(StandardNormal);
                let z2: f64 = rng.sample(StandardNormal);
                shock + scale * (NOISE_WEIGHTS.0 * z1 + NOISE_WEIGHTS.1 * z2)
            })
            .collect();

        returns.sort_by(|a, b| a.total_cmp(b));
        let index = (TAIL_PROBABILITY * (returns.len() - 1) as f64).ceil() as usize;
        let index = index.min(returns.len() - 1);
        let var_return = returns[index];
        let tail = &returns[..=index];
        let es_return = tail.iter().sum::<f64>() / tail.len() as f64;

        let value = sanitize(portfolio_value);
        let mut metrics = VarMetrics::from_daily(
            VarMethod::MonteCarlo,
            var_return.abs(),
            value * var_return.abs(),
            value * es_return.abs(),
        );
        metrics.var_return = Some(var_return);
        metrics.es_return = Some(es_return);
        metrics.simulations = simulations;
        metrics
    }
}
