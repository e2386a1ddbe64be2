//! Drift against target allocations and rebalancing recommendations
//!
//! Current exposures are compared with a target allocation per dimension.
//! Categories in breach of their dimension's tolerance become recommendations,
//! each with a fund-level execution plan.

use crate::exposure::{Dimension, ExposureBreakdown, ExposureEntry};
use crate::holding::Holding;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maximum number of funds in an execution plan
pub const MAX_PLAN_FUNDS: usize = 3;

/// Target allocation percentages (0-100) per dimension and category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetAllocation {
    pub targets: IndexMap<Dimension, IndexMap<String, f64>>,
}

impl TargetAllocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, dimension: Dimension, category: impl Into<String>, pct: f64) -> Self {
        self.set(dimension, category, pct);
        self
    }

    pub fn set(&mut self, dimension: Dimension, category: impl Into<String>, pct: f64) {
        self.targets
            .entry(dimension)
            .or_default()
            .insert(category.into(), pct);
    }

    pub fn for_dimension(&self, dimension: Dimension) -> Option<&IndexMap<String, f64>> {
        self.targets.get(&dimension)
    }

    /// Targets equal to the current exposures (no drift anywhere)
    pub fn from_breakdown(breakdown: &ExposureBreakdown) -> Self {
        let targets = breakdown
            .by_dimension
            .iter()
            .map(|(d, entries)| {
                let map = entries.iter().map(|e| (e.name.clone(), e.percentage)).collect();
                (*d, map)
            })
            .collect();
        Self { targets }
    }
}

/// Allowed drift in percentage points per dimension
///
/// These are engine constants rather than user policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftTolerances {
    pub fund: f64,
    pub manager: f64,
    pub geography: f64,
    pub vintage: f64,
    pub asset_class: f64,
    pub sector: f64,
    pub currency: f64,
}

impl Default for DriftTolerances {
    fn default() -> Self {
        Self {
            fund: 2.0,
            manager: 2.0,
            geography: 1.0,
            vintage: 1.5,
            asset_class: 2.0,
            sector: 2.0,
            currency: 1.0,
        }
    }
}

impl DriftTolerances {
    pub fn for_dimension(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Fund => self.fund,
            Dimension::Manager => self.manager,
            Dimension::Geography => self.geography,
            Dimension::Vintage => self.vintage,
            Dimension::AssetClass => self.asset_class,
            Dimension::Sector => self.sector,
            Dimension::Currency => self.currency,
        }
    }
}

/// Drift of one category from its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftItem {
    pub dimension: Dimension,
    pub category: String,
    pub current_pct: f64,
    pub target_pct: f64,
    /// current - target, in percentage points
    pub drift: f64,
    pub tolerance: f64,
}

impl DriftItem {
    pub fn in_breach(&self) -> bool {
        self.drift.abs() > self.tolerance
    }
}

/// Compare one dimension's exposures with its targets
///
/// Categories are the union of both sides: current categories first, then
/// target-only categories. A category missing on either side counts as 0%.
pub fn compute_dimension_drift(
    dimension: Dimension,
    current: &[ExposureEntry],
    targets: Option<&IndexMap<String, f64>>,
    tolerance: f64,
) -> Vec<DriftItem> {
    let mut union: IndexMap<&str, (f64, f64)> = IndexMap::new();

    for entry in current {
        union.entry(entry.name.as_str()).or_insert((0.0, 0.0)).0 += entry.percentage;
    }
    if let Some(targets) = targets {
        for (category, pct) in targets {
            let target = if pct.is_finite() { *pct } else { 0.0 };
            union.entry(category.as_str()).or_insert((0.0, 0.0)).1 = target;
        }
    }

    union
        .into_iter()
        .map(|(category, (current_pct, target_pct))| DriftItem {
            dimension,
            category: category.to_string(),
            current_pct,
            target_pct,
            drift: current_pct - target_pct,
            tolerance,
        })
        .collect()
}

/// Drift for every dimension that has a target allocation
pub fn compute_drift(
    breakdown: &ExposureBreakdown,
    targets: &TargetAllocation,
    tolerances: &DriftTolerances,
) -> Vec<DriftItem> {
    targets
        .targets
        .iter()
        .flat_map(|(dimension, map)| {
            compute_dimension_drift(
                *dimension,
                breakdown.entries(*dimension),
                Some(map),
                tolerances.for_dimension(*dimension),
            )
        })
        .collect()
}

/// Direction of a rebalancing trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceAction {
    /// Overweight: drift > 0
    Reduce,
    /// Underweight: drift < 0
    Increase,
}

impl RebalanceAction {
    pub fn timeline(&self) -> &'static str {
        match self {
            RebalanceAction::Reduce => "Execute in 30–60 days",
            RebalanceAction::Increase => "Deploy across 1–3 quarters",
        }
    }
}

/// Qualitative capacity of a fund's general partner to absorb a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpConstraint {
    /// paid-in / commitment >= 0.9
    NearFullyCalled,
    /// paid-in / commitment <= 0.3
    EarlyStageDeployment,
    StandardCapacity,
    /// No eligible holdings in the category
    ReviewAllocation,
}

impl GpConstraint {
    pub fn for_holding(holding: &Holding) -> Self {
        let called = holding.called_ratio();
        if called >= 0.9 {
            GpConstraint::NearFullyCalled
        } else if called <= 0.3 {
            GpConstraint::EarlyStageDeployment
        } else {
            GpConstraint::StandardCapacity
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GpConstraint::NearFullyCalled => "Near fully called",
            GpConstraint::EarlyStageDeployment => "Early-stage deployment",
            GpConstraint::StandardCapacity => "Standard capacity",
            GpConstraint::ReviewAllocation => "Review allocation",
        }
    }
}

/// One fund's share of a rebalancing trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundAction {
    pub holding_id: String,
    pub holding_name: String,
    /// Share of the category's NAV
    pub weight: f64,
    pub cash_impact: f64,
    pub constraint: GpConstraint,
}

/// Rebalancing recommendation for a category in breach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub dimension: Dimension,
    pub category: String,
    pub action: RebalanceAction,
    pub drift: f64,
    pub adjustment_amount: f64,
    pub fund_plan: Vec<FundAction>,
    /// Constraint of the largest fund action, or `ReviewAllocation` for an empty plan
    pub constraint: GpConstraint,
    pub timeline: String,
}

/// Turn breached drift items into recommendations, largest |drift| first
pub fn recommend_rebalancing(items: &[DriftItem], holdings: &[Holding]) -> Vec<Recommendation> {
    let total: f64 = holdings.iter().map(Holding::nav).sum();

    let mut recommendations: Vec<Recommendation> = items
        .iter()
        .filter(|item| item.in_breach())
        .map(|item| {
            let action = if item.drift > 0.0 {
                RebalanceAction::Reduce
            } else {
                RebalanceAction::Increase
            };
            let adjustment_amount = item.drift.abs() / 100.0 * total;
            let fund_plan = build_fund_plan(item, holdings, adjustment_amount);
            let constraint = fund_plan
                .first()
                .map(|f| f.constraint)
                .unwrap_or(GpConstraint::ReviewAllocation);

            Recommendation {
                dimension: item.dimension,
                category: item.category.clone(),
                action,
                drift: item.drift,
                adjustment_amount,
                fund_plan,
                constraint,
                timeline: action.timeline().to_string(),
            }
        })
        .collect();

    recommendations.sort_by(|a, b| b.drift.abs().total_cmp(&a.drift.abs()));
    recommendations
}

/// Allocate an adjustment across the category's holdings by NAV share
fn build_fund_plan(item: &DriftItem, holdings: &[Holding], adjustment_amount: f64) -> Vec<FundAction> {
    let category_of = item.dimension.categorizer(holdings);
    let members: Vec<&Holding> = holdings
        .iter()
        .filter(|h| category_of(*h) == item.category)
        .collect();

    if members.is_empty() {
        return Vec::new();
    }

    let category_nav: f64 = members.iter().map(|h| h.nav()).sum();
    let equal_weight = 1.0 / members.len() as f64;

    let mut plan: Vec<FundAction> = members
        .iter()
        .map(|h| {
            let weight = if category_nav > 0.0 {
                h.nav() / category_nav
            } else {
                equal_weight
            };
            FundAction {
                holding_id: h.id.clone(),
                holding_name: h.name.clone(),
                weight,
                cash_impact: adjustment_amount * weight,
                constraint: GpConstraint::for_holding(h),
            }
        })
        .collect();

    plan.sort_by(|a, b| b.cash_impact.abs().total_cmp(&a.cash_impact.abs()));
    plan.truncate(MAX_PLAN_FUNDS);
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::ExposureBasis;
    use approx::assert_relative_eq;

    fn holdings() -> Vec<Holding> {
        vec![
            Holding::new("a", "Fund A", 10_000_000.0, 6_000_000.0, 9_000_000.0)
                .with_manager("Acme")
                .with_asset_class("Buyout"),
            Holding::new("b", "Fund B", 5_000_000.0, 5_000_000.0, 4_000_000.0)
                .with_manager("Beta")
                .with_asset_class("Credit"),
        ]
    }

    #[test]
    fn test_no_drift_against_own_exposures() {
        let h = holdings();
        let breakdown = ExposureBreakdown::from_holdings(&h, ExposureBasis::Nav);
        let targets = TargetAllocation::from_breakdown(&breakdown);

        let items = compute_drift(&breakdown, &targets, &DriftTolerances::default());
        assert!(!items.is_empty());
        assert!(items.iter().all(|i| i.drift == 0.0));
        assert!(recommend_rebalancing(&items, &h).is_empty());
    }

    #[test]
    fn test_union_of_categories() {
        let h = holdings();
        let breakdown = ExposureBreakdown::from_holdings(&h, ExposureBasis::Nav);
        let targets = TargetAllocation::new()
            .with_target(Dimension::AssetClass, "Buyout", 50.0)
            .with_target(Dimension::AssetClass, "Venture", 20.0);

        let items = compute_drift(&breakdown, &targets, &DriftTolerances::default());
        let names: Vec<&str> = items.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(names, vec!["Buyout", "Credit", "Venture"]);

        let credit = &items[1];
        assert_eq!(credit.target_pct, 0.0);
        let venture = &items[2];
        assert_eq!(venture.current_pct, 0.0);
        assert_eq!(venture.drift, -20.0);
    }

    #[test]
    fn test_breach_uses_dimension_tolerance() {
        let item = |dimension, drift: f64| DriftItem {
            dimension,
            category: "X".to_string(),
            current_pct: 10.0 + drift,
            target_pct: 10.0,
            drift,
            tolerance: DriftTolerances::default().for_dimension(dimension),
        };

        assert!(!item(Dimension::Manager, 1.9).in_breach());
        assert!(item(Dimension::Manager, 2.1).in_breach());
        assert!(item(Dimension::Geography, -1.2).in_breach());
        assert!(!item(Dimension::Vintage, 1.5).in_breach());
    }

    #[test]
    fn test_recommendations_sorted_and_directed() {
        let h = holdings();
        let breakdown = ExposureBreakdown::from_holdings(&h, ExposureBasis::Nav);
        let targets = TargetAllocation::new()
            .with_target(Dimension::Manager, "Acme", 60.0)
            .with_target(Dimension::Manager, "Beta", 40.0)
            .with_target(Dimension::AssetClass, "Buyout", 900.0 / 13.0)
            .with_target(Dimension::AssetClass, "Credit", 400.0 / 13.0)
            .with_target(Dimension::AssetClass, "Venture", 30.0);

        let items = compute_drift(&breakdown, &targets, &DriftTolerances::default());
        let recs = recommend_rebalancing(&items, &h);

        // Venture (-30) ahead of Acme (+9.2) and Beta (-9.2)
        assert_eq!(recs[0].category, "Venture");
        assert_eq!(recs[0].action, RebalanceAction::Increase);
        assert!(recs[0].fund_plan.is_empty());
        assert_eq!(recs[0].constraint, GpConstraint::ReviewAllocation);
        assert_relative_eq!(recs[0].adjustment_amount, 0.30 * 13_000_000.0, max_relative = 1e-12);

        let acme = recs.iter().find(|r| r.category == "Acme").unwrap();
        assert_eq!(acme.action, RebalanceAction::Reduce);
        assert_eq!(acme.timeline, "Execute in 30–60 days");
        assert_eq!(acme.fund_plan.len(), 1);
        assert_relative_eq!(acme.fund_plan[0].cash_impact, acme.adjustment_amount);
        assert_eq!(acme.fund_plan[0].constraint, GpConstraint::StandardCapacity);

        let beta = recs.iter().find(|r| r.category == "Beta").unwrap();
        assert_eq!(beta.timeline, "Deploy across 1–3 quarters");
        assert_eq!(beta.constraint, GpConstraint::NearFullyCalled);
    }

    #[test]
    fn test_fund_plan_caps_at_three_and_weights_by_nav() {
        let h: Vec<Holding> = [40.0, 30.0, 20.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, nav)| {
                Holding::new(format!("f{i}"), format!("F{i}"), 100.0, 20.0, *nav).with_manager("Solo")
            })
            .collect();

        let item = DriftItem {
            dimension: Dimension::Manager,
            category: "Solo".to_string(),
            current_pct: 100.0,
            target_pct: 50.0,
            drift: 50.0,
            tolerance: 2.0,
        };

        let recs = recommend_rebalancing(&[item], &h);
        let plan = &recs[0].fund_plan;
        assert_eq!(plan.len(), MAX_PLAN_FUNDS);
        assert_eq!(plan[0].holding_id, "f0");
        assert_relative_eq!(plan[0].weight, 0.4);
        assert_relative_eq!(plan[0].cash_impact, 50.0 * 0.4);
        assert_eq!(plan[0].constraint, GpConstraint::EarlyStageDeployment);
    }

    #[test]
    fn test_zero_nav_category_uses_equal_weights() {
        let h = vec![
            Holding::new("x", "X", 10.0, 0.0, 0.0).with_manager("New"),
            Holding::new("y", "Y", 10.0, 0.0, 0.0).with_manager("New"),
            Holding::new("z", "Z", 10.0, 10.0, 100.0).with_manager("Old"),
        ];
        let item = DriftItem {
            dimension: Dimension::Manager,
            category: "New".to_string(),
            current_pct: 0.0,
            target_pct: 10.0,
            drift: -10.0,
            tolerance: 2.0,
        };

        let recs = recommend_rebalancing(&[item], &h);
        assert_eq!(recs[0].fund_plan.len(), 2);
        assert!(recs[0].fund_plan.iter().all(|f| (f.weight - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_fund_plan_separates_funds_sharing_a_name() {
        let h = vec![
            Holding::new("a", "Fund I", 100.0, 50.0, 15.0),
            Holding::new("b", "Fund I", 100.0, 50.0, 15.0),
            Holding::new("c", "Other", 100.0, 50.0, 70.0),
        ];
        let item = DriftItem {
            dimension: Dimension::Fund,
            category: "Fund I (a)".to_string(),
            current_pct: 15.0,
            target_pct: 10.0,
            drift: 5.0,
            tolerance: 2.0,
        };

        let recs = recommend_rebalancing(&[item], &h);
        let plan = &recs[0].fund_plan;
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].holding_id, "a");
        assert_relative_eq!(plan[0].weight, 1.0);
    }
}
