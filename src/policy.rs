//! Risk policy configuration
//!
//! `PolicyConfig` holds one numeric threshold per (dimension, metric) pair.
//! Every field has a system default, so a policy document only needs to list
//! the thresholds it overrides. Absent fields are never read as zero.

use crate::error::{EngineError, Result};
use crate::exposure::Dimension;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Portfolio policy thresholds
///
/// Percentages are expressed on a 0-100 scale, ratios and multiples as plain
/// numbers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Maximum NAV share of any single fund (%)
    pub max_single_fund_pct: f64,
    pub max_manager_pct: f64,
    pub max_geography_pct: f64,
    pub max_sector_pct: f64,
    pub max_vintage_pct: f64,
    pub max_currency_pct: f64,
    pub max_asset_class_pct: f64,

    /// Maximum unfunded commitments as a share of NAV (%)
    pub max_unfunded_pct: f64,

    /// Minimum available liquidity as a share of NAV (%)
    pub min_liquidity_reserve_pct: f64,

    /// Minimum (liquidity + distributions) / calls multiple
    pub min_coverage_ratio: f64,

    /// Target liquidity buffer as a share of NAV (%)
    pub target_liquidity_buffer_pct: f64,

    /// Maximum NAV-weighted look-through leverage
    pub max_leverage: f64,

    pub min_fund_count: usize,

    /// Target diversification score (0-100)
    pub target_diversification_score: f64,

    pub min_tvpi: f64,
    pub min_dpi: f64,

    /// Minimum NAV-weighted net IRR, as a fraction
    pub min_irr: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_single_fund_pct: 20.0,
            max_manager_pct: 25.0,
            max_geography_pct: 60.0,
            max_sector_pct: 35.0,
            max_vintage_pct: 30.0,
            max_currency_pct: 70.0,
            max_asset_class_pct: 50.0,
            max_unfunded_pct: 40.0,
            min_liquidity_reserve_pct: 10.0,
            min_coverage_ratio: 1.5,
            target_liquidity_buffer_pct: 15.0,
            max_leverage: 2.0,
            min_fund_count: 8,
            target_diversification_score: 70.0,
            min_tvpi: 1.2,
            min_dpi: 0.5,
            min_irr: 0.08,
        }
    }
}

/// System default policy
pub fn default_policy() -> PolicyConfig {
    PolicyConfig::default()
}

impl PolicyConfig {
    /// Load a policy from YAML, missing fields take their defaults
    ///
    /// # Example
    ///
    /// ```
    /// use lp_risk::PolicyConfig;
    ///
    /// let policy = PolicyConfig::from_yaml("max_manager_pct: 15.0").unwrap();
    /// assert_eq!(policy.max_manager_pct, 15.0);
    /// assert_eq!(policy.max_single_fund_pct, 20.0);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PolicyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a policy from JSON, missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PolicyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a policy file; `.json` is parsed as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Maximum exposure percentage for a dimension
    pub fn exposure_limit(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Fund => self.max_single_fund_pct,
            Dimension::Manager => self.max_manager_pct,
            Dimension::Geography => self.max_geography_pct,
            Dimension::Vintage => self.max_vintage_pct,
            Dimension::AssetClass => self.max_asset_class_pct,
            Dimension::Sector => self.max_sector_pct,
            Dimension::Currency => self.max_currency_pct,
        }
    }

    /// Reject thresholds that cannot be meaningfully compared against
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("max_single_fund_pct", self.max_single_fund_pct),
            ("max_manager_pct", self.max_manager_pct),
            ("max_geography_pct", self.max_geography_pct),
            ("max_sector_pct", self.max_sector_pct),
            ("max_vintage_pct", self.max_vintage_pct),
            ("max_currency_pct", self.max_currency_pct),
            ("max_asset_class_pct", self.max_asset_class_pct),
            ("max_unfunded_pct", self.max_unfunded_pct),
            ("min_liquidity_reserve_pct", self.min_liquidity_reserve_pct),
            ("min_coverage_ratio", self.min_coverage_ratio),
            ("target_liquidity_buffer_pct", self.target_liquidity_buffer_pct),
            ("max_leverage", self.max_leverage),
            ("target_diversification_score", self.target_diversification_score),
            ("min_tvpi", self.min_tvpi),
            ("min_dpi", self.min_dpi),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "Policy field {} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if !self.min_irr.is_finite() {
            return Err(EngineError::InvalidInput(
                "Policy field min_irr must be finite".to_string(),
            ));
        }

        Ok(())
    }
}
