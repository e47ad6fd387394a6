// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::exporter::{Report, emit};
use crate::commands::importer::{load_composition, parse_snapshot_arg};
use crate::config::Settings;
use crate::diff::{REFERENCE_LABEL, SnapshotDiffer, SortKey};
use crate::utils::{Scale, fmt_pct, fmt_scaled, parse_date};
use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};

pub fn handle(settings: &Settings, m: &clap::ArgMatches) -> Result<()> {
    let reference_date = m
        .get_one::<String>("date")
        .map(|d| parse_date(d))
        .transpose()?;
    let sort: SortKey = m.get_one::<String>("sort").unwrap().parse()?;

    let mut differ = SnapshotDiffer::new(settings.composition.normalization);
    for (i, raw) in m.get_many::<String>("snapshot").into_iter().flatten().enumerate() {
        let (label, path) = parse_snapshot_arg(raw, i, settings)?;
        let mut snap = load_composition(path, &label, settings)?;
        if let Some(as_of) = reference_date.and_then(|d| as_of_for(d, &label)) {
            snap = snap.with_as_of(as_of);
        }
        differ.add(snap);
    }

    let comparison = differ.build().context("Build comparison")?;
    let results = comparison.ranked(&sort)?;
    let labels: Vec<String> = comparison
        .comparison_labels()
        .iter()
        .map(|l| l.to_string())
        .collect();

    let delta_headers: Vec<String> = labels.iter().map(|l| format!("Δ {} (bps)", l)).collect();
    let share_header = format!("Share ({})", REFERENCE_LABEL);
    let mut headers: Vec<&str> = vec!["Category", share_header.as_str()];
    headers.extend(delta_headers.iter().map(|h| h.as_str()));
    headers.push("Size (bn)");

    let rows = results
        .iter()
        .map(|r| {
            let mut row = vec![r.category.clone(), fmt_pct(Some(r.current_share))];
            for l in &labels {
                row.push(r.delta(l).map(|d| format!("{:.1}", d)).unwrap_or_default());
            }
            row.push(fmt_scaled(r.absolute_size, Scale::Billions));
            row
        })
        .collect();

    let footer = reference_date.map(|d| format!("Reference date {}", d.format("%d %B %Y")));
    emit(
        m,
        Report {
            headers,
            rows,
            records: &results,
            footer,
        },
    )
}

/// `t` is the reference date itself, `t-N` is N calendar days earlier.
fn as_of_for(reference: NaiveDate, label: &str) -> Option<NaiveDate> {
    if label == REFERENCE_LABEL {
        return Some(reference);
    }
    let days = label.strip_prefix("t-")?.parse::<u64>().ok()?;
    reference.checked_sub_days(Days::new(days))
}
