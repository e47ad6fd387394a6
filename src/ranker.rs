// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result;
use crate::models::{RankedRow, WindowedSummary};
use crate::table::SnapshotTable;
use regex::{Regex, RegexBuilder};

/// Predicate over an entity's display name, applied before ranking.
#[derive(Debug, Clone)]
pub enum NameFilter {
    /// Keep names containing the text, case-insensitively.
    Include(String),
    /// Drop names containing the text, case-insensitively.
    Exclude(String),
    IncludePattern(Regex),
    ExcludePattern(Regex),
}

impl NameFilter {
    pub fn include_pattern(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(NameFilter::IncludePattern(case_insensitive(pattern)?))
    }

    pub fn exclude_pattern(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(NameFilter::ExcludePattern(case_insensitive(pattern)?))
    }

    pub fn allows(&self, name: &str) -> bool {
        match self {
            NameFilter::Include(needle) => contains_ci(name, needle),
            NameFilter::Exclude(needle) => !contains_ci(name, needle),
            NameFilter::IncludePattern(re) => re.is_match(name),
            NameFilter::ExcludePattern(re) => !re.is_match(name),
        }
    }
}

fn case_insensitive(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn contains_ci(hay: &str, needle: &str) -> bool {
    hay.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    pub ascending: bool,
    pub name_filter: Option<NameFilter>,
}

/// At most `n` entries ordered by value (descending unless `ascending`),
/// ties broken by id ascending. The name filter runs before truncation.
pub fn top_n(entries: &[RankedRow], n: usize, opts: &RankOptions) -> Vec<RankedRow> {
    let mut candidates: Vec<RankedRow> = entries
        .iter()
        .filter(|e| opts.name_filter.as_ref().is_none_or(|f| f.allows(&e.name)))
        .cloned()
        .collect();
    candidates.sort_by(|a, b| {
        let by_value = if opts.ascending {
            a.value.cmp(&b.value)
        } else {
            b.value.cmp(&a.value)
        };
        by_value.then_with(|| a.id.cmp(&b.id))
    });
    candidates.truncate(n);
    candidates
}

/// Ranks table rows by `metric_column`. The id is the table key; the
/// display name comes from `name_column` when given. Rows whose metric is
/// missing or non-numeric cannot be ranked and are left out.
pub fn top_n_table(
    table: &SnapshotTable,
    metric_column: &str,
    name_column: Option<&str>,
    n: usize,
    opts: &RankOptions,
) -> Result<Vec<RankedRow>> {
    let metric_idx = table.column_index(metric_column)?;
    let name_idx = name_column.map(|c| table.column_index(c)).transpose()?;
    let key_idx: Vec<usize> = table
        .key_columns()
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<_>>()?;

    let entries: Vec<RankedRow> = table
        .rows()
        .filter_map(|row| {
            let value = row[metric_idx].as_number()?;
            let id = key_idx
                .iter()
                .map(|&k| row[k].to_string())
                .collect::<Vec<_>>()
                .join(" / ");
            let name = match name_idx {
                Some(i) if !row[i].is_missing() => row[i].to_string(),
                _ => id.clone(),
            };
            Some(RankedRow { id, name, value })
        })
        .collect();
    Ok(top_n(&entries, n, opts))
}

/// Leaderboard candidates from a windowed summary, keyed by group.
pub fn summary_entries(summary: &WindowedSummary) -> Vec<RankedRow> {
    summary
        .rows
        .iter()
        .map(|r| RankedRow {
            id: r.key.clone(),
            name: r.key.clone(),
            value: r.amount,
        })
        .collect()
}
