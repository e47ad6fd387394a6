// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::exporter::{Report, emit};
use crate::commands::importer::load_flows;
use crate::config::Settings;
use crate::flows::{Derivation, classification_groups};
use crate::models::RankedRow;
use crate::ranker::{NameFilter, RankOptions, summary_entries, top_n};
use crate::utils::{Scale, fmt_pct, fmt_scaled, pretty_table};
use crate::window::{
    FlowFilter, GroupKey, cumulative, cumulative_by_group, daily_group_sum, trailing_window_sum,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

pub fn handle(settings: &Settings, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("horizons", _)) => horizons(settings),
        Some(("groups", sub)) => groups(settings, sub),
        Some(("summary", sub)) => summary(settings, sub),
        Some(("cumulative", sub)) => cumulative_cmd(settings, sub),
        Some(("top", sub)) => top(settings, sub),
        _ => Ok(()),
    }
}

fn load(settings: &Settings, sub: &clap::ArgMatches) -> Result<Derivation> {
    let path = sub.get_one::<String>("data").unwrap().trim();
    let derivation = load_flows(Path::new(path), settings)?;
    if derivation.excluded_rows > 0 {
        eprintln!(
            "note: {} row(s) without a numeric net flow were excluded",
            derivation.excluded_rows
        );
    }
    Ok(derivation)
}

fn filter_for(sub: &clap::ArgMatches) -> FlowFilter {
    match sub.get_one::<String>("group") {
        Some(g) => FlowFilter::classification(g.trim()),
        None => FlowFilter::all(),
    }
}

fn group_key(sub: &clap::ArgMatches) -> Result<Option<GroupKey>> {
    sub.get_one::<String>("by")
        .map(|s| s.parse::<GroupKey>())
        .transpose()
}

fn range_name(settings: &Settings, raw: &str) -> String {
    settings
        .horizons
        .iter()
        .find(|h| h.key.eq_ignore_ascii_case(raw.trim()))
        .map(|h| h.name.clone())
        .unwrap_or_else(|| format!("{} days", raw.trim()))
}

fn horizons(settings: &Settings) -> Result<()> {
    let rows = settings
        .horizons
        .iter()
        .map(|h| vec![h.key.clone(), h.name.clone(), h.dates.to_string()])
        .collect();
    println!("{}", pretty_table(&["Key", "Name", "Trading dates"], rows));
    Ok(())
}

fn groups(settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let derivation = load(settings, sub)?;
    for g in classification_groups(&derivation.flows) {
        println!("{}", g);
    }
    Ok(())
}

fn summary(settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let raw_range = sub.get_one::<String>("range").unwrap();
    let window = settings.window(raw_range)?;
    let by = group_key(sub)?.unwrap_or_default();
    let filter = filter_for(sub);
    let derivation = load(settings, sub)?;

    let summary = trailing_window_sum(&derivation.flows, window, &filter, by)?;
    if summary.is_empty() {
        println!("No data for the selected criteria.");
        return Ok(());
    }

    let rows = summary
        .rows
        .iter()
        .map(|r| vec![r.key.clone(), fmt_scaled(r.amount, Scale::Millions), fmt_pct(r.share)])
        .collect();
    let scope = filter
        .classification_group
        .clone()
        .unwrap_or_else(|| "All funds".to_string());
    let period = match (summary.start(), summary.end()) {
        (Some(s), Some(e)) => format!("{} .. {}", s, e),
        _ => String::new(),
    };
    let footer = format!(
        "{} - {} net flow (total: {} mn) {}",
        scope,
        range_name(settings, raw_range),
        fmt_scaled(summary.total, Scale::Millions),
        period
    );
    emit(
        sub,
        Report {
            headers: vec![by.label(), "Net Flow (mn)", "Share"],
            rows,
            records: &summary,
            footer: Some(footer),
        },
    )
}

#[derive(Serialize)]
struct CumulativeRecord {
    key: Option<String>,
    date: chrono::NaiveDate,
    amount: rust_decimal::Decimal,
    running_total: rust_decimal::Decimal,
}

fn cumulative_cmd(settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let filter = filter_for(sub);
    let by = group_key(sub)?;
    let derivation = load(settings, sub)?;

    let records: Vec<CumulativeRecord> = match by {
        Some(group) => cumulative_by_group(&derivation.flows, &filter, group)?
            .into_iter()
            .flat_map(|(key, points)| {
                points.into_iter().map(move |p| CumulativeRecord {
                    key: Some(key.clone()),
                    date: p.date,
                    amount: p.amount,
                    running_total: p.running_total,
                })
            })
            .collect(),
        None => cumulative(&daily_group_sum(&derivation.flows, &filter)?)?
            .into_iter()
            .map(|p| CumulativeRecord {
                key: None,
                date: p.date,
                amount: p.amount,
                running_total: p.running_total,
            })
            .collect(),
    };
    if records.is_empty() {
        println!("No data for the selected criteria.");
        return Ok(());
    }

    let mut headers = vec!["Date", "Daily Flow (mn)", "Cumulative (mn)"];
    if let Some(group) = by {
        headers.insert(0, group.label());
    }
    let rows = records
        .iter()
        .map(|r| {
            let mut row = vec![
                r.date.to_string(),
                fmt_scaled(r.amount, Scale::Millions),
                fmt_scaled(r.running_total, Scale::Millions),
            ];
            if let Some(k) = &r.key {
                row.insert(0, k.clone());
            }
            row
        })
        .collect();
    emit(
        sub,
        Report {
            headers,
            rows,
            records: &records,
            footer: None,
        },
    )
}

fn name_filter(sub: &clap::ArgMatches) -> Result<Option<NameFilter>> {
    let regex = sub.get_flag("regex");
    if let Some(inc) = sub.get_one::<String>("include") {
        let f = if regex {
            NameFilter::include_pattern(inc)
                .with_context(|| format!("Invalid regex pattern '{}'", inc))?
        } else {
            NameFilter::Include(inc.clone())
        };
        return Ok(Some(f));
    }
    if let Some(exc) = sub.get_one::<String>("exclude") {
        let f = if regex {
            NameFilter::exclude_pattern(exc)
                .with_context(|| format!("Invalid regex pattern '{}'", exc))?
        } else {
            NameFilter::Exclude(exc.clone())
        };
        return Ok(Some(f));
    }
    Ok(None)
}

fn top(settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let raw_range = sub.get_one::<String>("range").unwrap();
    let window = settings.window(raw_range)?;
    let by = group_key(sub)?.unwrap_or(GroupKey::Fund);
    let n = *sub.get_one::<usize>("limit").unwrap_or(&10);
    let opts = RankOptions {
        ascending: sub.get_flag("ascending"),
        name_filter: name_filter(sub)?,
    };
    let filter = filter_for(sub);
    let derivation = load(settings, sub)?;

    let summary = trailing_window_sum(&derivation.flows, window, &filter, by)?;
    let ranked: Vec<RankedRow> = top_n(&summary_entries(&summary), n, &opts);
    if ranked.is_empty() {
        println!("No data for the selected criteria.");
        return Ok(());
    }

    let rows = ranked
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.name.clone(),
                fmt_scaled(r.value, Scale::Millions),
            ]
        })
        .collect();
    emit(
        sub,
        Report {
            headers: vec!["#", by.label(), "Net Flow (mn)"],
            rows,
            records: &ranked,
            footer: Some(format!("{} window", range_name(settings, raw_range))),
        },
    )
}
