// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Composition shift between a reference snapshot and earlier snapshots.
//!
//! Each snapshot is normalized by its own total, so a category that kept
//! its share while total assets grew shows a zero delta. Deltas are in
//! basis points, rounded to one decimal.

use crate::config::{CompositionSettings, Normalization};
use crate::error::{FlowError, Result};
use crate::models::{ComparisonResult, CompositionSnapshot, HorizonDelta};
use crate::table::SnapshotTable;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

pub const REFERENCE_LABEL: &str = "t";

const BPS: Decimal = dec!(10000);

/// Builds a snapshot from a two-column category table. Rows outside the
/// allow-list and rows without a numeric size are skipped.
pub fn snapshot_from_table(
    table: &SnapshotTable,
    label: &str,
    category_column: &str,
    value_column: &str,
    settings: &CompositionSettings,
) -> Result<CompositionSnapshot> {
    let cat_idx = table.column_index(category_column)?;
    let val_idx = table.column_index(value_column)?;

    let mut entries = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.rows() {
        let name = row[cat_idx].to_string();
        let listed = settings.main_items.is_empty()
            || name == settings.total_label
            || settings.main_items.iter().any(|m| *m == name);
        if !listed {
            continue;
        }
        match row[val_idx].as_number() {
            Some(size) => entries.push((name, size)),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(label, skipped, "composition rows without a numeric size");
    }

    let snap =
        CompositionSnapshot::new(label, entries).with_total_label(settings.total_label.clone());
    if snap.is_empty() {
        return Err(FlowError::EmptyData(format!("snapshot '{}'", label)));
    }
    Ok(snap)
}

/// Orders `t-7` before `t-28`, and any other label lexically after those.
fn horizon_order(a: &str, b: &str) -> Ordering {
    fn rank(label: &str) -> (u8, u64, &str) {
        match label.strip_prefix("t-").and_then(|n| n.parse::<u64>().ok()) {
            Some(days) => (0, days, label),
            None => (1, 0, label),
        }
    }
    rank(a).cmp(&rank(b))
}

fn to_bps(share_delta: Decimal) -> Option<Decimal> {
    share_delta
        .checked_mul(BPS)
        .map(|bps| bps.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven))
}

/// Collects labelled snapshots until [`SnapshotDiffer::build`] normalizes them.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDiffer {
    normalization: Normalization,
    snapshots: Vec<CompositionSnapshot>,
}

impl SnapshotDiffer {
    pub fn new(normalization: Normalization) -> Self {
        Self {
            normalization,
            snapshots: Vec::new(),
        }
    }

    /// A second snapshot under the same label replaces the first.
    pub fn add(&mut self, snapshot: CompositionSnapshot) -> &mut Self {
        if let Some(pos) = self.snapshots.iter().position(|s| s.label == snapshot.label) {
            tracing::debug!(label = %snapshot.label, "replacing snapshot");
            self.snapshots[pos] = snapshot;
        } else {
            self.snapshots.push(snapshot);
        }
        self
    }

    /// Same as adding each snapshot under its map key, then building.
    pub fn build_from<I>(
        snapshots: I,
        normalization: Normalization,
    ) -> Result<NormalizedComparison>
    where
        I: IntoIterator<Item = (String, CompositionSnapshot)>,
    {
        let mut differ = SnapshotDiffer::new(normalization);
        for (label, mut snap) in snapshots {
            snap.label = label;
            differ.add(snap);
        }
        differ.build()
    }

    /// Needs the reference snapshot `t` and at least one comparison.
    pub fn build(&self) -> Result<NormalizedComparison> {
        let reference = self
            .snapshots
            .iter()
            .find(|s| s.label == REFERENCE_LABEL)
            .ok_or_else(|| FlowError::MissingReference(REFERENCE_LABEL.to_string()))?;
        let reference = NormalizedSnapshot::from_snapshot(reference, self.normalization)?;

        let mut comparisons = self
            .snapshots
            .iter()
            .filter(|s| s.label != REFERENCE_LABEL)
            .map(|s| NormalizedSnapshot::from_snapshot(s, self.normalization))
            .collect::<Result<Vec<_>>>()?;
        if comparisons.is_empty() {
            return Err(FlowError::EmptyData("comparison snapshots".to_string()));
        }
        comparisons.sort_by(|a, b| horizon_order(&a.label, &b.label));

        Ok(NormalizedComparison {
            reference,
            comparisons,
        })
    }
}

/// One snapshot with its categories expressed as shares of its own total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSnapshot {
    pub label: String,
    pub denominator: Decimal,
    categories: Vec<(String, Decimal, Decimal)>,
}

impl NormalizedSnapshot {
    fn from_snapshot(snap: &CompositionSnapshot, normalization: Normalization) -> Result<Self> {
        let denominator = match (normalization, snap.total_row()) {
            (Normalization::TotalRowOrSum, Some(total)) => total,
            _ => snap.category_sum()?,
        };
        if denominator.is_zero() {
            return Err(FlowError::ZeroTotal(snap.label.clone()));
        }
        let categories = snap
            .categories()
            .map(|(name, size)| {
                let share = size.checked_div(denominator).ok_or_else(|| {
                    FlowError::Overflow(format!("share of '{}' at '{}'", name, snap.label))
                })?;
                Ok((name.to_string(), size, share))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            label: snap.label.clone(),
            denominator,
            categories,
        })
    }

    pub fn share(&self, category: &str) -> Option<Decimal> {
        self.categories
            .iter()
            .find(|(n, _, _)| n == category)
            .map(|(_, _, s)| *s)
    }

    pub fn size(&self, category: &str) -> Option<Decimal> {
        self.categories
            .iter()
            .find(|(n, _, _)| n == category)
            .map(|(_, v, _)| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDiff {
    pub category: String,
    pub reference_share: Decimal,
    pub comparison_share: Decimal,
    pub delta_bps: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Reference-date absolute size, largest first.
    AbsoluteSize,
    CurrentShare,
    /// Category name, A to Z.
    Category,
    /// Delta against the named comparison, largest first.
    Delta(String),
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if let Some(label) = s.strip_prefix("delta:") {
            return Ok(SortKey::Delta(label.trim().to_string()));
        }
        match s.to_lowercase().as_str() {
            "size" | "absolute-size" => Ok(SortKey::AbsoluteSize),
            "share" | "current-share" => Ok(SortKey::CurrentShare),
            "category" | "name" => Ok(SortKey::Category),
            other => Err(anyhow::anyhow!(
                "Unknown sort '{}' (use size|share|category|delta:<label>)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedComparison {
    reference: NormalizedSnapshot,
    comparisons: Vec<NormalizedSnapshot>,
}

impl NormalizedComparison {
    pub fn reference(&self) -> &NormalizedSnapshot {
        &self.reference
    }

    /// Comparison labels, nearest horizon first.
    pub fn comparison_labels(&self) -> Vec<&str> {
        self.comparisons.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn snapshot(&self, label: &str) -> Result<&NormalizedSnapshot> {
        if label == self.reference.label {
            return Ok(&self.reference);
        }
        self.comparisons
            .iter()
            .find(|s| s.label == label)
            .ok_or_else(|| FlowError::UnknownSnapshot(label.to_string()))
    }

    /// Per category of `reference_label`: both shares and the bps delta.
    /// A category missing from the comparison snapshot is an error rather
    /// than an implicit zero.
    pub fn diff(
        &self,
        reference_label: &str,
        comparison_label: &str,
    ) -> Result<Vec<CategoryDiff>> {
        let reference = self.snapshot(reference_label)?;
        let comparison = self.snapshot(comparison_label)?;
        reference
            .categories
            .iter()
            .map(|(name, _, ref_share)| {
                let cmp_share = comparison
                    .share(name)
                    .ok_or_else(|| FlowError::CategoryMismatch {
                        category: name.clone(),
                        reference: reference.label.clone(),
                        comparison: comparison.label.clone(),
                    })?;
                let delta_bps = ref_share
                    .checked_sub(cmp_share)
                    .and_then(to_bps)
                    .ok_or_else(|| {
                        FlowError::Overflow(format!(
                            "delta of '{}' between '{}' and '{}'",
                            name, reference.label, comparison.label
                        ))
                    })?;
                Ok(CategoryDiff {
                    category: name.clone(),
                    reference_share: *ref_share,
                    comparison_share: cmp_share,
                    delta_bps,
                })
            })
            .collect()
    }

    /// Reference categories with deltas against every comparison, largest
    /// reference size first.
    pub fn compare(&self) -> Result<Vec<ComparisonResult>> {
        self.ranked(&SortKey::AbsoluteSize)
    }

    pub fn ranked(&self, sort: &SortKey) -> Result<Vec<ComparisonResult>> {
        let mut rows: Vec<ComparisonResult> = self
            .reference
            .categories
            .iter()
            .map(|(name, size, share)| ComparisonResult {
                category: name.clone(),
                current_share: *share,
                absolute_size: *size,
                deltas: Vec::with_capacity(self.comparisons.len()),
            })
            .collect();

        for cmp in &self.comparisons {
            let diffs = self.diff(&self.reference.label, &cmp.label)?;
            for (row, d) in rows.iter_mut().zip(diffs) {
                row.deltas.push(HorizonDelta {
                    label: cmp.label.clone(),
                    comparison_share: d.comparison_share,
                    delta_bps: d.delta_bps,
                });
            }
        }

        if let SortKey::Delta(label) = sort {
            self.snapshot(label)?;
        }
        rows.sort_by(|a, b| {
            let primary = match sort {
                SortKey::AbsoluteSize => b.absolute_size.cmp(&a.absolute_size),
                SortKey::CurrentShare => b.current_share.cmp(&a.current_share),
                SortKey::Category => Ordering::Equal,
                SortKey::Delta(label) => b.delta(label).cmp(&a.delta(label)),
            };
            primary.then_with(|| a.category.cmp(&b.category))
        });
        Ok(rows)
    }
}
