// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{FlowError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One fund on one date, as reported by the fund data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundAllocationRow {
    pub fund_code: String,
    pub classification_group: Option<String>,
    pub date: NaiveDate,
    /// `None` when the source cell was blank or not a number.
    pub net_flow_amount: Option<Decimal>,
    /// Percent of portfolio per asset class, 0..=100. Classes the fund does
    /// not hold are simply absent.
    pub allocation_pct: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetClassFlow {
    pub fund_code: String,
    pub classification_group: Option<String>,
    pub date: NaiveDate,
    pub asset_class: String,
    pub flow_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedSummaryRow {
    pub key: String,
    pub amount: Decimal,
    /// Share of the window total; `None` when the total is zero.
    pub share: Option<Decimal>,
}

/// Sums over the N most recent observed dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedSummary {
    pub window: usize,
    /// Dates covered by the window, ascending. May be shorter than `window`
    /// when the series has fewer distinct dates.
    pub dates: Vec<NaiveDate>,
    pub total: Decimal,
    pub rows: Vec<WindowedSummaryRow>,
}

impl WindowedSummary {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn amount_for(&self, key: &str) -> Option<Decimal> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub running_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub id: String,
    pub name: String,
    pub value: Decimal,
}

/// Category name -> absolute size at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionSnapshot {
    pub label: String,
    pub as_of: Option<NaiveDate>,
    /// Name of the aggregate row, if the source carries one.
    pub total_label: Option<String>,
    entries: Vec<(String, Decimal)>,
}

impl CompositionSnapshot {
    /// Repeated category names keep their first value.
    pub fn new<I, S>(label: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: Into<String>,
    {
        let mut kept: Vec<(String, Decimal)> = Vec::new();
        for (name, size) in entries {
            let name = name.into();
            if kept.iter().any(|(n, _)| *n == name) {
                continue;
            }
            kept.push((name, size));
        }
        Self {
            label: label.into(),
            as_of: None,
            total_label: None,
            entries: kept,
        }
    }

    pub fn with_total_label(mut self, total_label: impl Into<String>) -> Self {
        self.total_label = Some(total_label.into());
        self
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn get(&self, category: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|(n, _)| n == category)
            .map(|(_, v)| *v)
    }

    /// Value of the aggregate row, when present.
    pub fn total_row(&self) -> Option<Decimal> {
        self.total_label.as_deref().and_then(|t| self.get(t))
    }

    fn is_total(&self, name: &str) -> bool {
        self.total_label.as_deref() == Some(name)
    }

    /// Category rows in input order, aggregate row excluded.
    pub fn categories(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.entries
            .iter()
            .filter(|(n, _)| !self.is_total(n))
            .map(|(n, v)| (n.as_str(), *v))
    }

    pub fn category_sum(&self) -> Result<Decimal> {
        self.categories().try_fold(Decimal::ZERO, |acc, (_, v)| {
            acc.checked_add(v)
                .ok_or_else(|| FlowError::Overflow(format!("category sum of '{}'", self.label)))
        })
    }

    pub fn len(&self) -> usize {
        self.categories().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonDelta {
    pub label: String,
    pub comparison_share: Decimal,
    /// (reference share - comparison share) * 10_000, rounded to 0.1.
    pub delta_bps: Decimal,
}

/// One category of a ranked comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub category: String,
    pub current_share: Decimal,
    pub absolute_size: Decimal,
    pub deltas: Vec<HorizonDelta>,
}

impl ComparisonResult {
    pub fn delta(&self, label: &str) -> Option<Decimal> {
        self.deltas
            .iter()
            .find(|d| d.label == label)
            .map(|d| d.delta_bps)
    }
}
