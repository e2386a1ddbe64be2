//! Exposure aggregation by portfolio dimension
//!
//! Groups holdings by a closed set of dimensions and reports each category's
//! amount and percentage of the portfolio total. Categories appear in order of
//! first occurrence; ranked views are produced separately.
//!
//! Missing or blank classification values map to a per-dimension sentinel:
//!
//! | Dimension   | Sentinel      |
//! |-------------|---------------|
//! | Manager     | `Unassigned`  |
//! | AssetClass  | `Unassigned`  |
//! | Geography   | `Unspecified` |
//! | Sector      | `Unspecified` |
//! | Vintage     | `Unknown`     |
//! | Currency    | `Unknown`     |
//! | Fund        | name, then id |
//!
//! Funds are keyed by id. A fund is labelled with its name, with the id
//! appended when another fund with a different id shares that name.

use crate::holding::{ratio, Holding};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimension along which holdings are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    /// Single fund (one category per holding)
    Fund,
    Manager,
    /// Domicile / geography
    Geography,
    Vintage,
    /// Asset class / strategy
    AssetClass,
    Sector,
    Currency,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Fund,
        Dimension::Manager,
        Dimension::Geography,
        Dimension::Vintage,
        Dimension::AssetClass,
        Dimension::Sector,
        Dimension::Currency,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Fund => "Fund",
            Dimension::Manager => "Manager",
            Dimension::Geography => "Geography",
            Dimension::Vintage => "Vintage",
            Dimension::AssetClass => "AssetClass",
            Dimension::Sector => "Sector",
            Dimension::Currency => "Currency",
        }
    }

    /// Label used when a holding has no value for this dimension
    pub fn sentinel(&self) -> &'static str {
        match self {
            Dimension::Manager | Dimension::AssetClass => "Unassigned",
            Dimension::Geography | Dimension::Sector => "Unspecified",
            Dimension::Vintage | Dimension::Currency => "Unknown",
            Dimension::Fund => "Unknown",
        }
    }

    /// Category of a holding along this dimension
    ///
    /// For `Fund` this is the bare fund name; use [`Dimension::categorizer`]
    /// when funds may share a name.
    pub fn category_of(&self, holding: &Holding) -> String {
        let value = match self {
            Dimension::Fund => non_blank(Some(&holding.name)).or_else(|| non_blank(Some(&holding.id))),
            Dimension::Manager => non_blank(holding.manager.as_ref()),
            Dimension::Geography => non_blank(holding.domicile.as_ref()),
            Dimension::Vintage => holding.vintage.map(|y| y.to_string()),
            Dimension::AssetClass => non_blank(holding.asset_class.as_ref()),
            Dimension::Sector => non_blank(holding.sector.as_ref()),
            Dimension::Currency => non_blank(holding.currency.as_ref()),
        };
        value.unwrap_or_else(|| self.sentinel().to_string())
    }

    /// Category function for one snapshot of holdings
    ///
    /// Same as [`Dimension::category_of`] except that funds sharing a name
    /// get distinct categories.
    pub fn categorizer(self, holdings: &[Holding]) -> impl Fn(&Holding) -> String {
        let labels = (self == Dimension::Fund).then(|| FundLabels::new(holdings));
        move |holding| match &labels {
            Some(labels) => labels.label(holding),
            None => self.category_of(holding),
        }
    }
}

/// Fund labels for one snapshot, disambiguating shared names by id
#[derive(Debug, Clone, Default)]
pub struct FundLabels {
    keys_by_name: IndexMap<String, IndexSet<String>>,
}

impl FundLabels {
    pub fn new(holdings: &[Holding]) -> Self {
        let mut keys_by_name: IndexMap<String, IndexSet<String>> = IndexMap::new();
        for holding in holdings {
            keys_by_name
                .entry(Dimension::Fund.category_of(holding))
                .or_default()
                .insert(fund_key(holding));
        }
        Self { keys_by_name }
    }

    pub fn label(&self, holding: &Holding) -> String {
        let name = Dimension::Fund.category_of(holding);
        match self.keys_by_name.get(&name) {
            Some(keys) if keys.len() > 1 => format!("{} ({})", name, fund_key(holding)),
            _ => name,
        }
    }
}

/// Identity of a fund: id, then name
fn fund_key(holding: &Holding) -> String {
    non_blank(Some(&holding.id))
        .or_else(|| non_blank(Some(&holding.name)))
        .unwrap_or_else(|| Dimension::Fund.sentinel().to_string())
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Amount used when sizing a holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExposureBasis {
    /// Current NAV / mark
    #[default]
    Nav,
    /// Remaining callable commitment
    Unfunded,
    Commitment,
}

impl ExposureBasis {
    pub fn amount(&self, holding: &Holding) -> f64 {
        match self {
            ExposureBasis::Nav => holding.nav(),
            ExposureBasis::Unfunded => holding.unfunded(),
            ExposureBasis::Commitment => holding.commitment(),
        }
    }
}

/// Exposure to one category of a dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureEntry {
    pub name: String,
    pub amount: f64,
    /// Percentage of the portfolio total (0-100)
    pub percentage: f64,
}

/// Group holdings along `dimension` on the given amount basis
///
/// Percentages are all zero when the portfolio total is zero.
pub fn aggregate(holdings: &[Holding], dimension: Dimension, basis: ExposureBasis) -> Vec<ExposureEntry> {
    aggregate_by(holdings, dimension.categorizer(holdings), basis)
}

/// Group holdings by an arbitrary selector
pub fn aggregate_by<F>(holdings: &[Holding], selector: F, basis: ExposureBasis) -> Vec<ExposureEntry>
where
    F: Fn(&Holding) -> String,
{
    let mut groups: IndexMap<String, f64> = IndexMap::new();
    let mut total = 0.0;

    for holding in holdings {
        let amount = basis.amount(holding);
        *groups.entry(selector(holding)).or_insert(0.0) += amount;
        total += amount;
    }

    groups
        .into_iter()
        .map(|(name, amount)| ExposureEntry {
            name,
            amount,
            percentage: 100.0 * ratio(amount, total),
        })
        .collect()
}

/// Entries sorted by amount, largest first (ties keep first-occurrence order)
pub fn ranked(entries: &[ExposureEntry]) -> Vec<ExposureEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    sorted
}

/// Resolve a user-selected focus category
///
/// A selection that no longer exists (or none at all) falls back to the first
/// category. Returns `None` only for an empty list.
pub fn resolve_focus<'a>(entries: &'a [ExposureEntry], selection: Option<&str>) -> Option<&'a ExposureEntry> {
    selection
        .and_then(|s| entries.iter().find(|e| e.name == s))
        .or_else(|| entries.first())
}

/// Herfindahl-Hirschman index over category weights
///
/// HHI = Σ w_i^2, 1.0 when everything sits in one category
pub fn herfindahl(entries: &[ExposureEntry]) -> f64 {
    entries
        .iter()
        .map(|e| {
            let w = e.percentage / 100.0;
            w * w
        })
        .sum()
}

/// Concentration statistics derived from the HHI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Diversification {
    pub hhi: f64,
    /// 1 / HHI (0 for an empty portfolio)
    pub effective_positions: f64,
    /// 100 * (1 - HHI), 0 for an empty portfolio
    pub score: f64,
}

impl Diversification {
    pub fn from_entries(entries: &[ExposureEntry]) -> Self {
        let hhi = herfindahl(entries);
        if hhi <= 0.0 {
            return Self {
                hhi: 0.0,
                effective_positions: 0.0,
                score: 0.0,
            };
        }
        Self {
            hhi,
            effective_positions: 1.0 / hhi,
            score: 100.0 * (1.0 - hhi),
        }
    }
}

/// Exposures for every dimension of one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureBreakdown {
    pub basis: ExposureBasis,
    pub total: f64,
    pub by_dimension: IndexMap<Dimension, Vec<ExposureEntry>>,
}

impl ExposureBreakdown {
    pub fn from_holdings(holdings: &[Holding], basis: ExposureBasis) -> Self {
        let by_dimension = Dimension::ALL
            .iter()
            .map(|d| (*d, aggregate(holdings, *d, basis)))
            .collect();

        Self {
            basis,
            total: holdings.iter().map(|h| basis.amount(h)).sum(),
            by_dimension,
        }
    }

    pub fn entries(&self, dimension: Dimension) -> &[ExposureEntry] {
        self.by_dimension
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Largest category of a dimension
    pub fn top(&self, dimension: Dimension) -> Option<ExposureEntry> {
        ranked(self.entries(dimension)).into_iter().next()
    }
}
