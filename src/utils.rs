// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};
use rust_decimal::{Decimal, RoundingStrategy};
use std::path::Path;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    // Exports from spreadsheet tools often carry a midnight time component.
    let day = s.split_once([' ', 'T']).map(|(d, _)| d).unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(day, f).ok())
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD or DD.MM.YYYY", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    let s = s.trim();
    s.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(s))
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Display units for monetary amounts. The engine always works in the
/// original unit; scaling only happens at print time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Unit,
    Millions,
    Billions,
}

impl Scale {
    fn divisor(self) -> Decimal {
        match self {
            Scale::Unit => Decimal::ONE,
            Scale::Millions => Decimal::from(1_000_000),
            Scale::Billions => Decimal::from(1_000_000_000),
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Scale::Unit => "",
            Scale::Millions => "mn",
            Scale::Billions => "bn",
        }
    }

    pub fn apply(self, d: Decimal) -> Decimal {
        (d / self.divisor()).round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven)
    }
}

pub fn fmt_scaled(d: Decimal, scale: Scale) -> String {
    format!("{:.1}", scale.apply(d))
}

pub fn fmt_pct(share: Option<Decimal>) -> String {
    match share {
        Some(s) => format!("{:.2}%", (s * Decimal::ONE_HUNDRED).round_dp(2)),
        None => "-".to_string(),
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(|v| {
            let numeric = v.parse::<f64>().is_ok() || v.ends_with('%');
            let cell = Cell::new(v);
            if numeric {
                cell.set_alignment(CellAlignment::Right)
            } else {
                cell
            }
        }));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn write_csv(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Create CSV {}", path.display()))?;
    wtr.write_record(headers)?;
    for r in rows {
        wtr.write_record(r)?;
    }
    wtr.flush()?;
    Ok(())
}
