// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Trailing-window and cumulative summaries over asset-class flow series.
//!
//! A window of N covers the N most recent dates that actually occur in the
//! series, so holidays and missing days never shrink it. Every operation
//! sorts by date itself; caller ordering is never trusted.

use crate::error::{FlowError, Result};
use crate::models::{
    AssetClassFlow, CumulativePoint, DailyTotal, WindowedSummary, WindowedSummaryRow,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::str::FromStr;

const UNCLASSIFIED: &str = "(unclassified)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKey {
    #[default]
    AssetClass,
    Fund,
    Classification,
}

impl GroupKey {
    pub fn key_of(self, flow: &AssetClassFlow) -> &str {
        match self {
            GroupKey::AssetClass => &flow.asset_class,
            GroupKey::Fund => &flow.fund_code,
            GroupKey::Classification => {
                flow.classification_group.as_deref().unwrap_or(UNCLASSIFIED)
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupKey::AssetClass => "Asset Class",
            GroupKey::Fund => "Fund",
            GroupKey::Classification => "Classification",
        }
    }
}

impl FromStr for GroupKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asset-class" | "asset_class" | "asset" => Ok(GroupKey::AssetClass),
            "fund" => Ok(GroupKey::Fund),
            "classification" | "group" | "pys" | "pyş" => Ok(GroupKey::Classification),
            other => Err(anyhow::anyhow!(
                "Unknown grouping '{}' (use asset-class|fund|classification)",
                other
            )),
        }
    }
}

/// Row filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowFilter {
    pub classification_group: Option<String>,
    pub fund_code: Option<String>,
    pub asset_class: Option<String>,
}

impl FlowFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn classification(group: impl Into<String>) -> Self {
        Self {
            classification_group: Some(group.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, flow: &AssetClassFlow) -> bool {
        let group_ok = match &self.classification_group {
            Some(g) => flow.classification_group.as_deref() == Some(g.as_str()),
            None => true,
        };
        let fund_ok = self.fund_code.as_ref().is_none_or(|c| *c == flow.fund_code);
        let class_ok = self.asset_class.as_ref().is_none_or(|c| *c == flow.asset_class);
        group_ok && fund_ok && class_ok
    }
}

/// Whether [`cumulative_with`] may reorder its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortPolicy {
    #[default]
    Defensive,
    /// Fail with `UnsortedInput` instead of sorting.
    RequireSorted,
}

/// The `window` most recent distinct dates of the whole series, ascending.
pub fn window_dates(series: &[AssetClassFlow], window: NonZeroUsize) -> Vec<NaiveDate> {
    let distinct: BTreeSet<NaiveDate> = series.iter().map(|f| f.date).collect();
    let mut dates: Vec<NaiveDate> = distinct.into_iter().rev().take(window.get()).collect();
    dates.reverse();
    dates
}

fn add_amount(acc: &mut Decimal, amount: Decimal, what: impl FnOnce() -> String) -> Result<()> {
    *acc = acc
        .checked_add(amount)
        .ok_or_else(|| FlowError::Overflow(what()))?;
    Ok(())
}

/// Sums flows per `group` over the trailing window. The window is picked
/// from the dates of the whole series before `filter` is applied. An empty
/// `rows` means nothing matched. A share that cannot be expressed (zero
/// total, or a quotient out of range) is `None`.
pub fn trailing_window_sum(
    series: &[AssetClassFlow],
    window: NonZeroUsize,
    filter: &FlowFilter,
    group: GroupKey,
) -> Result<WindowedSummary> {
    let dates = window_dates(series, window);
    let in_window: BTreeSet<NaiveDate> = dates.iter().copied().collect();

    let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
    for f in series
        .iter()
        .filter(|f| in_window.contains(&f.date) && filter.matches(f))
    {
        let key = group.key_of(f);
        add_amount(sums.entry(key).or_insert(Decimal::ZERO), f.flow_amount, || {
            format!("window sum of '{}'", key)
        })?;
    }

    let mut total = Decimal::ZERO;
    for amount in sums.values() {
        add_amount(&mut total, *amount, || "window total".to_string())?;
    }
    let mut rows: Vec<WindowedSummaryRow> = sums
        .into_iter()
        .map(|(key, amount)| WindowedSummaryRow {
            key: key.to_string(),
            amount,
            share: amount.checked_div(total),
        })
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.key.cmp(&b.key)));

    tracing::debug!(
        window = window.get(),
        start = ?dates.first(),
        end = ?dates.last(),
        groups = rows.len(),
        "trailing window summed"
    );
    Ok(WindowedSummary {
        window: window.get(),
        dates,
        total,
        rows,
    })
}

/// Total flow per date across all groups, ascending by date.
pub fn daily_group_sum(
    series: &[AssetClassFlow],
    filter: &FlowFilter,
) -> Result<Vec<DailyTotal>> {
    let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for f in series.iter().filter(|f| filter.matches(f)) {
        add_amount(by_date.entry(f.date).or_insert(Decimal::ZERO), f.flow_amount, || {
            format!("daily sum on {}", f.date)
        })?;
    }
    Ok(by_date
        .into_iter()
        .map(|(date, amount)| DailyTotal { date, amount })
        .collect())
}

/// Daily totals split by `group`.
pub fn daily_group_sum_by(
    series: &[AssetClassFlow],
    filter: &FlowFilter,
    group: GroupKey,
) -> Result<BTreeMap<String, Vec<DailyTotal>>> {
    let mut nested: BTreeMap<&str, BTreeMap<NaiveDate, Decimal>> = BTreeMap::new();
    for f in series.iter().filter(|f| filter.matches(f)) {
        let key = group.key_of(f);
        let slot = nested
            .entry(key)
            .or_default()
            .entry(f.date)
            .or_insert(Decimal::ZERO);
        add_amount(slot, f.flow_amount, || format!("daily sum of '{}' on {}", key, f.date))?;
    }
    Ok(nested
        .into_iter()
        .map(|(key, days)| {
            let totals = days
                .into_iter()
                .map(|(date, amount)| DailyTotal { date, amount })
                .collect();
            (key.to_string(), totals)
        })
        .collect())
}

/// Running total in ascending date order. Input is sorted (stably) first.
pub fn cumulative(points: &[DailyTotal]) -> Result<Vec<CumulativePoint>> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);
    running_total(&sorted)
}

pub fn cumulative_with(
    points: &[DailyTotal],
    policy: SortPolicy,
) -> Result<Vec<CumulativePoint>> {
    match policy {
        SortPolicy::Defensive => cumulative(points),
        SortPolicy::RequireSorted => {
            if let Some(w) = points.windows(2).find(|w| w[1].date < w[0].date) {
                return Err(FlowError::UnsortedInput {
                    previous: w[0].date,
                    next: w[1].date,
                });
            }
            running_total(points)
        }
    }
}

fn running_total(points: &[DailyTotal]) -> Result<Vec<CumulativePoint>> {
    let mut acc = Decimal::ZERO;
    points
        .iter()
        .map(|p| {
            add_amount(&mut acc, p.amount, || format!("running total on {}", p.date))?;
            Ok(CumulativePoint {
                date: p.date,
                amount: p.amount,
                running_total: acc,
            })
        })
        .collect()
}

pub fn cumulative_by_group(
    series: &[AssetClassFlow],
    filter: &FlowFilter,
    group: GroupKey,
) -> Result<BTreeMap<String, Vec<CumulativePoint>>> {
    daily_group_sum_by(series, filter, group)?
        .into_iter()
        .map(|(k, days)| Ok((k, cumulative(&days)?)))
        .collect()
}
