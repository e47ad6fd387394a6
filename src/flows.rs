// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Projects per-fund allocation percentages onto the fund's net flow.

use crate::config::FundColumns;
use crate::error::{FlowError, Result};
use crate::models::{AssetClassFlow, FundAllocationRow};
use crate::table::{DedupPolicy, SnapshotTable, Value};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Derivation {
    pub flows: Vec<AssetClassFlow>,
    /// Rows skipped because their net flow was missing or not a number.
    pub excluded_rows: usize,
    /// Rows dropped because their (fund, date) pair was already seen.
    pub duplicate_rows: usize,
}

/// Keep-first variant of [`derive_with_policy`].
pub fn derive(rows: &[FundAllocationRow], asset_classes: &[String]) -> Result<Derivation> {
    derive_with_policy(rows, asset_classes, DedupPolicy::KeepFirst)
}

/// One output row per (fund, date, asset class). A class the fund does not
/// report contributes a zero flow. A flow too large for a `Decimal` is an
/// `Overflow` error.
pub fn derive_with_policy(
    rows: &[FundAllocationRow],
    asset_classes: &[String],
    policy: DedupPolicy,
) -> Result<Derivation> {
    let (unique, duplicate_rows) = dedup_rows(rows, policy);

    let mut out = Derivation {
        flows: Vec::with_capacity(unique.len() * asset_classes.len()),
        excluded_rows: 0,
        duplicate_rows,
    };
    for row in unique {
        let Some(net) = row.net_flow_amount else {
            out.excluded_rows += 1;
            continue;
        };
        for class in asset_classes {
            let pct = row.allocation_pct.get(class).copied().unwrap_or(Decimal::ZERO);
            let flow_amount = net.checked_mul(pct / Decimal::ONE_HUNDRED).ok_or_else(|| {
                FlowError::Overflow(format!(
                    "{} flow of {} on {}",
                    class, row.fund_code, row.date
                ))
            })?;
            out.flows.push(AssetClassFlow {
                fund_code: row.fund_code.clone(),
                classification_group: row.classification_group.clone(),
                date: row.date,
                asset_class: class.clone(),
                flow_amount,
            });
        }
    }

    if out.excluded_rows > 0 {
        tracing::warn!(
            excluded = out.excluded_rows,
            "rows without a numeric net flow were left out"
        );
    }
    if out.duplicate_rows > 0 {
        tracing::warn!(duplicates = out.duplicate_rows, "duplicate fund/date rows collapsed");
    }
    Ok(out)
}

fn dedup_rows(
    rows: &[FundAllocationRow],
    policy: DedupPolicy,
) -> (Vec<&FundAllocationRow>, usize) {
    let mut seen: HashSet<(&str, NaiveDate)> = HashSet::with_capacity(rows.len());
    let mut kept: Vec<&FundAllocationRow> = match policy {
        DedupPolicy::KeepFirst => rows
            .iter()
            .filter(|r| seen.insert((r.fund_code.as_str(), r.date)))
            .collect(),
        DedupPolicy::KeepLast => rows
            .iter()
            .rev()
            .filter(|r| seen.insert((r.fund_code.as_str(), r.date)))
            .collect(),
    };
    if policy == DedupPolicy::KeepLast {
        kept.reverse();
    }
    let dropped = rows.len() - kept.len();
    (kept, dropped)
}

/// Reads fund rows out of a table laid out per `cols`. Missing or
/// non-numeric percentages are left out of the row's allocation map.
pub fn allocation_rows(
    table: &SnapshotTable,
    cols: &FundColumns,
) -> Result<Vec<FundAllocationRow>> {
    let required = [&cols.fund_code, &cols.classification, &cols.date, &cols.net_flow];
    for c in required {
        if !table.has_column(c) {
            return Err(FlowError::Schema(format!(
                "expected column '{}' absent from {}",
                c,
                table.name()
            )));
        }
    }
    let fund_idx = table.column_index(&cols.fund_code)?;
    let group_idx = table.column_index(&cols.classification)?;
    let date_idx = table.column_index(&cols.date)?;
    let flow_idx = table.column_index(&cols.net_flow)?;

    let classes = cols.asset_classes_in(table.columns());
    if classes.is_empty() {
        return Err(FlowError::Schema(format!(
            "no allocation columns ending in '{}' in {}",
            cols.allocation_suffix,
            table.name()
        )));
    }
    let mut class_idx = Vec::with_capacity(classes.len());
    for class in &classes {
        let col = cols.allocation_column(class);
        let idx = table.column_index(&col).map_err(|_| {
            FlowError::Schema(format!("expected column '{}' absent from {}", col, table.name()))
        })?;
        class_idx.push((class.clone(), idx));
    }

    let mut out = Vec::with_capacity(table.len());
    let mut unreadable_pct = 0usize;
    for (i, row) in table.rows().enumerate() {
        let date = row[date_idx].as_date().ok_or_else(|| {
            FlowError::Schema(format!(
                "row {} of {}: '{}' is not a date",
                i + 1,
                table.name(),
                row[date_idx]
            ))
        })?;
        unreadable_pct += class_idx
            .iter()
            .filter(|(_, idx)| matches!(row[*idx], Value::Text(_)))
            .count();
        let allocation_pct: BTreeMap<String, Decimal> = class_idx
            .iter()
            .filter_map(|(class, idx)| row[*idx].as_number().map(|p| (class.clone(), p)))
            .collect();
        out.push(FundAllocationRow {
            fund_code: row[fund_idx].to_string(),
            classification_group: match &row[group_idx] {
                Value::Missing => None,
                v => Some(v.to_string()),
            },
            date,
            net_flow_amount: row[flow_idx].as_number(),
            allocation_pct,
        });
    }
    if unreadable_pct > 0 {
        tracing::warn!(
            cells = unreadable_pct,
            table = table.name(),
            "non-numeric allocation percentages were read as zero"
        );
    }
    Ok(out)
}

/// Distinct classification groups, sorted.
pub fn classification_groups(series: &[AssetClassFlow]) -> Vec<String> {
    series
        .iter()
        .filter_map(|f| f.classification_group.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
