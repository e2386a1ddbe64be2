//! Historical capital-call / distribution series and pacing rates
//!
//! Pacing rates are the quarterly fractions of unfunded commitments called and
//! of NAV distributed. They are derived from the trailing window of history and
//! clamped so that sparse or noisy data cannot produce runaway projections.

use crate::error::{EngineError, Result};
use crate::holding::{ratio, sanitize};
use crate::quarter::Quarter;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Deployment rate used when no history exists
pub const DEFAULT_DEPLOYMENT_RATE: f64 = 0.15;

/// Distribution rate used when no history exists
pub const DEFAULT_DISTRIBUTION_RATE: f64 = 0.08;

/// Bounds on the quarterly share of unfunded commitments called
pub const DEPLOYMENT_RATE_BOUNDS: (f64, f64) = (0.03, 0.50);

/// Bounds on the quarterly share of NAV distributed
pub const DISTRIBUTION_RATE_BOUNDS: (f64, f64) = (0.02, 0.50);

/// Quarters of history used for pacing
pub const DEFAULT_HISTORY_WINDOW: usize = 8;

/// Longest history, in quarters, that is expanded into a contiguous series
pub const MAX_HISTORY_SPAN: i64 = 4 * 1000;

/// Cash flows observed in one quarter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyCashFlow {
    pub quarter: Quarter,
    pub capital_calls: f64,
    pub distributions: f64,
}

impl QuarterlyCashFlow {
    pub fn new(quarter: Quarter, capital_calls: f64, distributions: f64) -> Self {
        Self {
            quarter,
            capital_calls,
            distributions,
        }
    }

    pub fn net(&self) -> f64 {
        sanitize(self.distributions) - sanitize(self.capital_calls)
    }
}

/// Quarter-indexed history, sorted and unique by quarter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowHistory {
    quarters: Vec<QuarterlyCashFlow>,
}

impl CashFlowHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary rows; rows for the same quarter are summed
    pub fn from_flows(flows: impl IntoIterator<Item = QuarterlyCashFlow>) -> Self {
        let mut merged: IndexMap<Quarter, (f64, f64)> = IndexMap::new();
        for flow in flows {
            let slot = merged.entry(flow.quarter).or_insert((0.0, 0.0));
            slot.0 += sanitize(flow.capital_calls);
            slot.1 += sanitize(flow.distributions);
        }

        let mut quarters: Vec<QuarterlyCashFlow> = merged
            .into_iter()
            .map(|(q, (calls, dists))| QuarterlyCashFlow::new(q, calls, dists))
            .collect();
        quarters.sort_by_key(|f| f.quarter);
        Self { quarters }
    }

    /// Join separate call and distribution series on their quarter labels
    pub fn from_series(calls: &[(String, f64)], distributions: &[(String, f64)]) -> Result<Self> {
        let mut rows = Vec::with_capacity(calls.len() + distributions.len());
        for (label, amount) in calls {
            rows.push(QuarterlyCashFlow::new(label.parse()?, *amount, 0.0));
        }
        for (label, amount) in distributions {
            rows.push(QuarterlyCashFlow::new(label.parse()?, 0.0, *amount));
        }
        Ok(Self::from_flows(rows))
    }

    pub fn quarters(&self) -> &[QuarterlyCashFlow] {
        &self.quarters
    }

    pub fn is_empty(&self) -> bool {
        self.quarters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quarters.len()
    }

    pub fn latest_quarter(&self) -> Option<Quarter> {
        self.quarters.last().map(|f| f.quarter)
    }

    /// The trailing calendar window ending at the latest quarter
    ///
    /// Covers at most `window` quarters and never reaches back before the
    /// first recorded quarter. Quarters without a row are zero-filled.
    pub fn trailing(&self, window: usize) -> Vec<QuarterlyCashFlow> {
        let (first, last) = match (self.quarters.first(), self.quarters.last()) {
            (Some(f), Some(l)) => (f.quarter, l.quarter),
            _ => return Vec::new(),
        };

        let span = first.quarters_until(&last).max(0) as u64 + 1;
        let len = span.min(window as u64);
        if len == 0 {
            return Vec::new();
        }
        self.fill(first.succ_n((span - len) as u32), len as u32)
    }

    /// Contiguous history from first to last quarter, gaps filled with zeros
    pub fn contiguous(&self) -> Result<Vec<QuarterlyCashFlow>> {
        let (first, last) = match (self.quarters.first(), self.quarters.last()) {
            (Some(f), Some(l)) => (f.quarter, l.quarter),
            _ => return Ok(Vec::new()),
        };

        let span = first.quarters_until(&last);
        if span < 0 {
            return Err(EngineError::InvalidInput(
                "Cash-flow history is not sorted by quarter".to_string(),
            ));
        }
        if span >= MAX_HISTORY_SPAN {
            return Err(EngineError::InvalidInput(format!(
                "Cash-flow history spans {} quarters ({} to {})",
                span + 1,
                first,
                last
            )));
        }
        Ok(self.fill(first, span as u32 + 1))
    }

    /// `len` consecutive quarters from `start`, zero-filled where no row exists
    fn fill(&self, start: Quarter, len: u32) -> Vec<QuarterlyCashFlow> {
        let mut existing = self.quarters.iter().skip_while(|f| f.quarter < start).peekable();
        (0..len)
            .map(|step| {
                let quarter = start.succ_n(step);
                match existing.peek() {
                    Some(flow) if flow.quarter == quarter => {
                        let flow = **flow;
                        existing.next();
                        flow
                    }
                    _ => QuarterlyCashFlow::new(quarter, 0.0, 0.0),
                }
            })
            .collect()
    }
}

/// Where the pacing rates came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacingSource {
    History,
    Default,
}

/// Baseline quarterly pacing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingRates {
    /// Share of unfunded commitments called per quarter
    pub deployment_rate: f64,
    /// Share of NAV distributed per quarter
    pub distribution_rate: f64,
    pub source: PacingSource,
}

impl Default for PacingRates {
    fn default() -> Self {
        Self {
            deployment_rate: DEFAULT_DEPLOYMENT_RATE,
            distribution_rate: DEFAULT_DISTRIBUTION_RATE,
            source: PacingSource::Default,
        }
    }
}

impl PacingRates {
    /// Derive pacing from the trailing `window` calendar quarters of history
    ///
    /// Quarters inside the window with no recorded flows count as zero.
    /// Average quarterly calls are taken relative to current unfunded
    /// commitments and average distributions relative to current NAV. A zero
    /// denominator keeps the default rate for that leg. Both rates are clamped.
    pub fn from_history(history: &CashFlowHistory, unfunded: f64, nav: f64, window: usize) -> Self {
        let recent = history.trailing(window.max(1));
        if recent.is_empty() {
            tracing::debug!("No cash-flow history; using default pacing rates");
            return Self::default();
        }

        let n = recent.len() as f64;
        let avg_calls = recent.iter().map(|f| sanitize(f.capital_calls)).sum::<f64>() / n;
        let avg_dists = recent.iter().map(|f| sanitize(f.distributions)).sum::<f64>() / n;

        let deployment = if unfunded > 0.0 {
            ratio(avg_calls, unfunded)
        } else {
            DEFAULT_DEPLOYMENT_RATE
        };
        let distribution = if nav > 0.0 {
            ratio(avg_dists, nav)
        } else {
            DEFAULT_DISTRIBUTION_RATE
        };

        let rates = Self {
            deployment_rate: deployment.clamp(DEPLOYMENT_RATE_BOUNDS.0, DEPLOYMENT_RATE_BOUNDS.1),
            distribution_rate: distribution
                .clamp(DISTRIBUTION_RATE_BOUNDS.0, DISTRIBUTION_RATE_BOUNDS.1),
            source: PacingSource::History,
        };

        tracing::debug!(
            quarters = recent.len(),
            deployment_rate = rates.deployment_rate,
            distribution_rate = rates.distribution_rate,
            "Derived pacing rates from history"
        );
        rates
    }
}
