//! Exposure-implied covariance structure
//!
//! There is no return history per asset class, so volatility and correlation
//! are structural assumptions driven by the exposures themselves:
//! - weight: `w_i = pct_i / Σ pct` (a single implicit weight of 1 when Σ = 0)
//! - volatility: `σ_i = 0.08 + w_i * 0.15`
//! - correlation: closer percentages and larger combined exposure imply higher
//!   correlation, clamped to [0.1, 0.95]; or zero cross-correlation
//! - covariance: `Σ_ij = ρ_ij σ_i σ_j`, portfolio variance `w^T Σ w`

use crate::error::{EngineError, Result};
use crate::exposure::ExposureEntry;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Baseline volatility of any category
pub const BASE_VOLATILITY: f64 = 0.08;

/// Extra volatility per unit of weight
pub const CONCENTRATION_VOLATILITY: f64 = 0.15;

pub const MIN_CORRELATION: f64 = 0.1;
pub const MAX_CORRELATION: f64 = 0.95;

/// How cross-category correlation is assumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrelationMode {
    /// Derived from exposure similarity
    #[default]
    ExposureSimilarity,
    /// Diagonal-only covariance
    Independent,
}

/// Weights, volatilities and matrices for one set of exposures
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceModel {
    categories: Vec<String>,
    weights: DVector<f64>,
    volatilities: DVector<f64>,
    correlation: DMatrix<f64>,
    covariance: DMatrix<f64>,
}

impl CovarianceModel {
    pub fn from_exposures(exposures: &[ExposureEntry], mode: CorrelationMode) -> Self {
        let pcts: Vec<f64> = exposures
            .iter()
            .map(|e| if e.percentage.is_finite() { e.percentage.max(0.0) } else { 0.0 })
            .collect();
        let sum: f64 = pcts.iter().sum();

        let (categories, pcts, weights): (Vec<String>, Vec<f64>, Vec<f64>) = if sum > 0.0 {
            let weights = pcts.iter().map(|p| p / sum).collect();
            (exposures.iter().map(|e| e.name.clone()).collect(), pcts, weights)
        } else {
            (vec!["Portfolio".to_string()], vec![100.0], vec![1.0])
        };

        let n = weights.len();
        let weights = DVector::from_vec(weights);
        let volatilities = weights.map(|w| BASE_VOLATILITY + w * CONCENTRATION_VOLATILITY);

        let correlation = DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                1.0
            } else {
                match mode {
                    CorrelationMode::Independent => 0.0,
                    CorrelationMode::ExposureSimilarity => similarity_correlation(pcts[i], pcts[j]),
                }
            }
        });

        let covariance = DMatrix::from_fn(n, n, |i, j| {
            correlation[(i, j)] * volatilities[i] * volatilities[j]
        });

        Self {
            categories,
            weights,
            volatilities,
            correlation,
            covariance,
        }
    }

    /// Build from an explicit correlation matrix
    pub fn with_correlation(exposures: &[ExposureEntry], correlation: DMatrix<f64>) -> Result<Self> {
        let mut model = Self::from_exposures(exposures, CorrelationMode::Independent);
        let n = model.weights.len();
        if correlation.nrows() != n || correlation.ncols() != n {
            return Err(EngineError::MatrixError(format!(
                "Correlation matrix is {}x{}, expected {}x{}",
                correlation.nrows(),
                correlation.ncols(),
                n,
                n
            )));
        }

        let vols = &model.volatilities;
        model.covariance = DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                vols[i] * vols[i]
            } else {
                correlation[(i, j)] * vols[i] * vols[j]
            }
        });
        model.correlation = correlation;
        Ok(model)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    pub fn volatilities(&self) -> &DVector<f64> {
        &self.volatilities
    }

    pub fn correlation(&self) -> &DMatrix<f64> {
        &self.correlation
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// σ_p² = w^T Σ w, floored at zero
    pub fn portfolio_variance(&self) -> f64 {
        let w = &self.weights;
        let variance = (w.transpose() * &self.covariance * w)[(0, 0)];
        variance.max(0.0)
    }

    pub fn portfolio_volatility(&self) -> f64 {
        self.portfolio_variance().sqrt()
    }
}

/// Correlation implied by two exposure percentages (0-100)
fn similarity_correlation(p_i: f64, p_j: f64) -> f64 {
    let similarity = 1.0 - (p_i - p_j).abs() / 100.0;
    let combined = (p_i + p_j) / 100.0;
    (0.6 * similarity + 0.4 * combined).clamp(MIN_CORRELATION, MAX_CORRELATION)
}
