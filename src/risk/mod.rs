//! # Risk Scoring and Value-at-Risk
//!
//! Quantitative models over asset-class exposures.
//!
//! ## Modules
//!
//! - `covariance`: Exposure-implied volatility, correlation and covariance
//! - `score`: Concentration / liquidity sub-scores and the blended risk score
//! - `var`: Value at Risk and Expected Shortfall (Historical, Parametric, Monte Carlo)

mod covariance;
mod score;
mod var;

pub use covariance::{CorrelationMode, CovarianceModel};
pub use score::{
    assess, assess_with_rng, RiskAssessment, RiskInputs, RiskScores, CONCENTRATION_WEIGHT,
    LIQUIDITY_WEIGHT,
};
pub use var::{VarConfig, VarEngine, VarMethod, VarMetrics, ES_MULTIPLIER, MIN_SIMULATIONS, Z_SCORE_95};
