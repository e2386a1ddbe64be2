//! Fund and direct-investment holdings
//!
//! Holdings arrive as a snapshot from an external store and are immutable for
//! the duration of a computation. Economic fields are read through sanitizing
//! accessors: non-finite or negative values contribute zero so that a single
//! bad record cannot poison every downstream percentage.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fund or direct investment position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub manager: Option<String>,

    /// Domicile / geography
    #[serde(default)]
    pub domicile: Option<String>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub asset_class: Option<String>,

    #[serde(default)]
    pub sector: Option<String>,

    #[serde(default)]
    pub vintage: Option<i32>,

    pub commitment: f64,

    /// Cumulative capital called
    pub paid_in: f64,

    /// NAV or latest mark
    pub current_value: f64,

    /// Cumulative distributions received
    #[serde(default)]
    pub distributed: f64,

    /// Look-through leverage multiplier (1.0 when absent)
    #[serde(default)]
    pub leverage: Option<f64>,

    /// Net IRR reported for the position, as a fraction
    #[serde(default)]
    pub net_irr: Option<f64>,
}

impl Holding {
    /// Create a holding with the required economics and no classification
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        commitment: f64,
        paid_in: f64,
        current_value: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            manager: None,
            domicile: None,
            currency: None,
            asset_class: None,
            sector: None,
            vintage: None,
            commitment,
            paid_in,
            current_value,
            distributed: 0.0,
            leverage: None,
            net_irr: None,
        }
    }

    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = Some(manager.into());
        self
    }

    pub fn with_domicile(mut self, domicile: impl Into<String>) -> Self {
        self.domicile = Some(domicile.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_asset_class(mut self, asset_class: impl Into<String>) -> Self {
        self.asset_class = Some(asset_class.into());
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_vintage(mut self, vintage: i32) -> Self {
        self.vintage = Some(vintage);
        self
    }

    pub fn with_distributed(mut self, distributed: f64) -> Self {
        self.distributed = distributed;
        self
    }

    pub fn with_leverage(mut self, leverage: f64) -> Self {
        self.leverage = Some(leverage);
        self
    }

    pub fn with_net_irr(mut self, irr: f64) -> Self {
        self.net_irr = Some(irr);
        self
    }

    pub fn commitment(&self) -> f64 {
        sanitize(self.commitment)
    }

    pub fn paid_in(&self) -> f64 {
        sanitize(self.paid_in)
    }

    pub fn nav(&self) -> f64 {
        sanitize(self.current_value)
    }

    pub fn distributed(&self) -> f64 {
        sanitize(self.distributed)
    }

    /// Leverage multiplier, 1.0 when missing or unusable
    pub fn leverage(&self) -> f64 {
        match self.leverage {
            Some(l) if l.is_finite() && l > 0.0 => l,
            _ => 1.0,
        }
    }

    /// Capital the manager can still call. Over-called positions report zero.
    pub fn unfunded(&self) -> f64 {
        (self.commitment() - self.paid_in()).max(0.0)
    }

    /// Fraction of commitment called so far (0 when commitment is zero)
    pub fn called_ratio(&self) -> f64 {
        ratio(self.paid_in(), self.commitment())
    }

    /// Total value to paid-in: (NAV + distributions) / paid-in
    pub fn tvpi(&self) -> f64 {
        ratio(self.nav() + self.distributed(), self.paid_in())
    }

    /// Distributed to paid-in
    pub fn dpi(&self) -> f64 {
        ratio(self.distributed(), self.paid_in())
    }

    /// True if any economic field had to be sanitized
    pub fn has_invalid_economics(&self) -> bool {
        [self.commitment, self.paid_in, self.current_value, self.distributed]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
    }
}

/// Non-finite or negative amounts contribute nothing
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Division with a zero result for a zero or non-finite denominator
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Reject structurally malformed snapshots (empty or duplicate ids)
pub fn validate_holdings(holdings: &[Holding]) -> Result<()> {
    let mut seen = HashSet::with_capacity(holdings.len());
    for holding in holdings {
        if holding.id.trim().is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "Holding '{}' has an empty id",
                holding.name
            )));
        }
        if !seen.insert(holding.id.as_str()) {
            return Err(EngineError::InvalidInput(format!(
                "Duplicate holding id: {}",
                holding.id
            )));
        }
        if holding.has_invalid_economics() {
            tracing::warn!(
                holding_id = %holding.id,
                "Holding has non-finite or negative economics; treating them as zero"
            );
        }
    }
    Ok(())
}

/// Portfolio-level totals and performance multiples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_commitment: f64,
    pub total_paid_in: f64,
    pub total_nav: f64,
    pub total_distributed: f64,
    pub unfunded_commitments: f64,
    pub fund_count: usize,
    pub tvpi: f64,
    pub dpi: f64,

    /// NAV-weighted look-through leverage (1.0 for an empty portfolio)
    pub look_through_leverage: f64,

    /// NAV-weighted IRR over holdings that report one
    pub weighted_irr: Option<f64>,
}

impl PortfolioMetrics {
    pub fn from_holdings(holdings: &[Holding]) -> Self {
        let mut m = Self::default();
        let mut leverage_weighted = 0.0;
        let mut irr_weighted = 0.0;
        let mut irr_nav = 0.0;
        let mut irr_count = 0usize;

        for h in holdings {
            let nav = h.nav();
            m.total_commitment += h.commitment();
            m.total_paid_in += h.paid_in();
            m.total_nav += nav;
            m.total_distributed += h.distributed();
            m.unfunded_commitments += h.unfunded();
            leverage_weighted += nav * h.leverage();

            if let Some(irr) = h.net_irr.filter(|v| v.is_finite()) {
                irr_weighted += nav * irr;
                irr_nav += nav;
                irr_count += 1;
            }
        }

        m.fund_count = holdings.len();
        m.tvpi = ratio(m.total_nav + m.total_distributed, m.total_paid_in);
        m.dpi = ratio(m.total_distributed, m.total_paid_in);
        m.look_through_leverage = if m.total_nav > 0.0 {
            leverage_weighted / m.total_nav
        } else {
            1.0
        };
        m.weighted_irr = match irr_count {
            0 => None,
            _ if irr_nav > 0.0 => Some(irr_weighted / irr_nav),
            _ => Some(0.0),
        };
        m
    }
}
