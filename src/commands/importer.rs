// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::diff::snapshot_from_table;
use crate::flows::{Derivation, allocation_rows, derive_with_policy};
use crate::models::CompositionSnapshot;
use crate::table::{DedupPolicy, SnapshotTable, Value};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Semicolon-separated exports are common for Turkish locale spreadsheets.
fn sniff_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).with_context(|| format!("Open CSV {}", path.display()))?;
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first)?;
    if first.contains(';') && !first.contains(',') {
        Ok(b';')
    } else {
        Ok(b',')
    }
}

fn clean_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_string()
}

/// How the cells of one column are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Number,
    Date,
}

/// Reads a CSV into a table, typing each column with `kind_of(header)`.
/// Semicolon files are read with a decimal comma.
pub fn read_table(
    path: &Path,
    key_columns: &[&str],
    kind_of: impl Fn(&str) -> CellKind,
) -> Result<SnapshotTable> {
    let delimiter = sniff_delimiter(path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;

    let headers: Vec<String> = rdr.headers()?.iter().map(clean_header).collect();
    let parsers: Vec<fn(&str) -> Value> = headers
        .iter()
        .map(|h| match kind_of(h.as_str()) {
            CellKind::Text => Value::parse_text,
            CellKind::Number if delimiter == b';' => Value::parse_decimal_comma,
            CellKind::Number => Value::parse_number,
            CellKind::Date => Value::parse_date,
        })
        .collect();

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result.with_context(|| format!("Read row {} of {}", i + 1, path.display()))?;
        rows.push(
            rec.iter()
                .zip(&parsers)
                .map(|(cell, parse)| parse(cell))
                .collect(),
        );
    }

    let name = path.display().to_string();
    let table = SnapshotTable::load(name, headers, rows, key_columns)
        .with_context(|| format!("Load {}", path.display()))?;
    Ok(table)
}

pub fn read_fund_table(path: &Path, settings: &Settings) -> Result<SnapshotTable> {
    let cols = &settings.fund_columns;
    read_table(path, &[cols.fund_code.as_str(), cols.date.as_str()], |h| {
        if h == cols.date {
            CellKind::Date
        } else if h == cols.net_flow || h.ends_with(cols.allocation_suffix.as_str()) {
            CellKind::Number
        } else {
            CellKind::Text
        }
    })
}

/// Fund CSV -> deduplicated allocation rows -> per-asset-class flows.
pub fn load_flows(path: &Path, settings: &Settings) -> Result<Derivation> {
    let cols = &settings.fund_columns;
    let raw = read_fund_table(path, settings)?;
    let duplicates = raw.duplicate_count();
    let table = raw.deduplicate(settings.dedup_policy);

    let classes = cols.asset_classes_in(table.columns());
    let rows = allocation_rows(&table, cols)
        .with_context(|| format!("Read fund rows from {}", path.display()))?;
    let mut derivation = derive_with_policy(&rows, &classes, settings.dedup_policy)
        .with_context(|| format!("Derive flows from {}", path.display()))?;
    derivation.duplicate_rows += duplicates;
    tracing::debug!(
        path = %path.display(),
        funds = rows.len(),
        flows = derivation.flows.len(),
        "derived asset-class flows"
    );
    Ok(derivation)
}

/// First column names the category, second holds its size.
pub fn load_composition(
    path: &Path,
    label: &str,
    settings: &Settings,
) -> Result<CompositionSnapshot> {
    let file = File::open(path).with_context(|| format!("Open CSV {}", path.display()))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(sniff_delimiter(path)?)
        .from_reader(file);
    let headers: Vec<String> = rdr.headers()?.iter().map(clean_header).collect();
    if headers.len() < 2 {
        return Err(anyhow!(
            "{} needs a category column and a size column",
            path.display()
        ));
    }
    let (category_col, value_col) = (headers[0].clone(), headers[1].clone());

    let table = read_table(path, &[category_col.as_str()], |h| {
        if h == value_col {
            CellKind::Number
        } else {
            CellKind::Text
        }
    })?
    .deduplicate(DedupPolicy::KeepFirst);

    let snap =
        snapshot_from_table(&table, label, &category_col, &value_col, &settings.composition)
            .with_context(|| format!("Snapshot '{}' from {}", label, path.display()))?;
    Ok(snap)
}

/// Splits `t-7=path.csv` into label and path. A bare path takes its label
/// from its position: `t` first, then the configured offsets.
pub fn parse_snapshot_arg<'a>(
    raw: &'a str,
    position: usize,
    settings: &Settings,
) -> Result<(String, &'a Path)> {
    let Some((label, path)) = raw.split_once('=') else {
        let label = match position {
            0 => crate::diff::REFERENCE_LABEL.to_string(),
            i => settings
                .comparison_labels()
                .get(i - 1)
                .cloned()
                .ok_or_else(|| {
                    anyhow!("No label for snapshot #{} '{}', use LABEL=PATH", i + 1, raw)
                })?,
        };
        return Ok((label, Path::new(raw.trim())));
    };
    let label = label.trim();
    if label.is_empty() {
        return Err(anyhow!("Snapshot '{}' has an empty label", raw));
    }
    Ok((label.to_string(), Path::new(path.trim())))
}
