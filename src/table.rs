// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Validated, immutable rectangular datasets.
//!
//! Every operation returns a new table; nothing here mutates in place.

use crate::error::{FlowError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Missing,
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
}

impl Value {
    /// Blank cells and NaN markers become `Missing`; anything that is not a
    /// decimal is kept as text so callers can tell "absent" from "garbage".
    pub fn parse_number(raw: &str) -> Value {
        let s = raw.trim();
        if is_missing_marker(s) {
            return Value::Missing;
        }
        match crate::utils::parse_decimal(s) {
            Ok(d) => Value::Number(d),
            Err(_) => Value::Text(s.to_string()),
        }
    }

    /// Like [`Value::parse_number`] for locales writing `1.234,5`: dots
    /// group thousands and the comma marks decimals. Cells without a comma
    /// parse as usual.
    pub fn parse_decimal_comma(raw: &str) -> Value {
        let s = raw.trim();
        if !s.contains(',') {
            return Value::parse_number(s);
        }
        match Value::parse_number(&s.replace('.', "").replace(',', ".")) {
            Value::Text(_) => Value::Text(s.to_string()),
            v => v,
        }
    }

    pub fn parse_text(raw: &str) -> Value {
        let s = raw.trim();
        if s.is_empty() {
            Value::Missing
        } else {
            Value::Text(s.to_string())
        }
    }

    pub fn parse_date(raw: &str) -> Value {
        let s = raw.trim();
        if is_missing_marker(s) {
            return Value::Missing;
        }
        match crate::utils::parse_date(s) {
            Ok(d) => Value::Date(d),
            Err(_) => Value::Text(s.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(d) => write!(f, "{}", d),
            Value::Date(d) => write!(f, "{}", d),
        }
    }
}

fn is_missing_marker(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null")
}

/// Which row survives when a key repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    #[default]
    KeepFirst,
    KeepLast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotTable {
    name: String,
    columns: Vec<String>,
    key: Vec<usize>,
    rows: Vec<Vec<Value>>,
}

impl SnapshotTable {
    /// Builds a table keyed by `key_columns`. Rows with a missing key cell are
    /// dropped; ragged rows are a schema error.
    pub fn load(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
        key_columns: &[&str],
    ) -> Result<Self> {
        let name = name.into();
        if key_columns.is_empty() {
            return Err(FlowError::Schema(format!("{} declares no key column", name)));
        }
        let mut seen = HashSet::new();
        for c in &columns {
            if !seen.insert(c.as_str()) {
                return Err(FlowError::Schema(format!(
                    "duplicate column '{}' in {}",
                    c, name
                )));
            }
        }
        let mut key = Vec::with_capacity(key_columns.len());
        for k in key_columns {
            let idx = columns.iter().position(|c| c == k).ok_or_else(|| {
                FlowError::Schema(format!("key column '{}' absent from {}", k, name))
            })?;
            key.push(idx);
        }

        let width = columns.len();
        let mut kept = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(FlowError::Schema(format!(
                    "row {} of {} has {} cells, expected {}",
                    i + 1,
                    name,
                    row.len(),
                    width
                )));
            }
            if key.iter().any(|&k| row[k].is_missing()) {
                continue;
            }
            kept.push(row);
        }
        if kept.is_empty() {
            return Err(FlowError::EmptyData(name));
        }

        Ok(Self {
            name,
            columns,
            key,
            rows: kept,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn key_columns(&self) -> Vec<&str> {
        self.key.iter().map(|&k| self.columns[k].as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| FlowError::ColumnNotFound(column.to_string()))
    }

    fn key_of(&self, row: &[Value]) -> String {
        self.key
            .iter()
            .map(|&k| row[k].to_string())
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }

    pub fn duplicate_count(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.rows.len());
        self.rows
            .iter()
            .filter(|r| !seen.insert(self.key_of(r)))
            .count()
    }

    /// Drops rows whose key was already seen. The survivors keep their input
    /// order; the result never has more rows than `self`.
    pub fn deduplicate(&self, policy: DedupPolicy) -> SnapshotTable {
        let mut seen = HashSet::with_capacity(self.rows.len());
        let rows: Vec<Vec<Value>> = match policy {
            DedupPolicy::KeepFirst => self
                .rows
                .iter()
                .filter(|r| seen.insert(self.key_of(r)))
                .cloned()
                .collect(),
            DedupPolicy::KeepLast => {
                let mut rev: Vec<Vec<Value>> = self
                    .rows
                    .iter()
                    .rev()
                    .filter(|r| seen.insert(self.key_of(r)))
                    .cloned()
                    .collect();
                rev.reverse();
                rev
            }
        };
        let dropped = self.rows.len() - rows.len();
        if dropped > 0 {
            tracing::debug!(table = %self.name, dropped, "deduplicated rows");
        }
        SnapshotTable {
            name: self.name.clone(),
            columns: self.columns.clone(),
            key: self.key.clone(),
            rows,
        }
    }

    /// Narrows the table to `columns`. Key columns are always retained and
    /// placed first when not requested explicitly.
    pub fn select(&self, columns: &[&str]) -> Result<SnapshotTable> {
        let mut picked: Vec<usize> = Vec::with_capacity(columns.len() + self.key.len());
        for c in columns {
            picked.push(self.column_index(c)?);
        }
        let missing_keys: Vec<usize> = self
            .key
            .iter()
            .copied()
            .filter(|k| !picked.contains(k))
            .collect();
        let order: Vec<usize> = missing_keys.into_iter().chain(picked).collect();
        let mut dedup = HashSet::new();
        let order: Vec<usize> = order.into_iter().filter(|i| dedup.insert(*i)).collect();

        let key = self
            .key
            .iter()
            .map(|k| order.iter().position(|i| i == k).unwrap_or_default())
            .collect();
        Ok(SnapshotTable {
            name: self.name.clone(),
            columns: order.iter().map(|&i| self.columns[i].clone()).collect(),
            key,
            rows: self
                .rows
                .iter()
                .map(|r| order.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// Numeric view of a column; non-numeric and missing cells are `None`.
    pub fn numeric(&self, column: &str) -> Result<Vec<Option<Decimal>>> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(|r| r[idx].as_number()).collect())
    }

    pub fn text(&self, column: &str) -> Result<Vec<Option<&str>>> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(|r| r[idx].as_text()).collect())
    }

    pub fn dates(&self, column: &str) -> Result<Vec<Option<NaiveDate>>> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(|r| r[idx].as_date()).collect())
    }

    /// True when every non-missing cell of `column` holds a number.
    pub fn is_numeric(&self, column: &str) -> Result<bool> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .all(|r| matches!(r[idx], Value::Number(_) | Value::Missing)))
    }
}
