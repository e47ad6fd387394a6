// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fundflow::error::FlowError;
use fundflow::models::{AssetClassFlow, RankedRow};
use fundflow::ranker::{NameFilter, RankOptions, summary_entries, top_n, top_n_table};
use fundflow::table::{SnapshotTable, Value};
use fundflow::window::{FlowFilter, GroupKey, trailing_window_sum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::num::NonZeroUsize;

fn entry(id: &str, name: &str, value: Decimal) -> RankedRow {
    RankedRow {
        id: id.into(),
        name: name.into(),
        value,
    }
}

fn ids(rows: &[RankedRow]) -> Vec<&str> {
    rows.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn weekly_leaderboard_breaks_ties_by_id() {
    let mut flows = Vec::new();
    // Six trading dates; only the last five count for a 1-week window.
    for (i, d) in [2u32, 3, 6, 7, 8, 9].iter().enumerate() {
        let date = NaiveDate::from_ymd_opt(2025, 6, *d).unwrap();
        let early = i == 0;
        for (fund, amount) in [("Z", dec!(20)), ("Y", dec!(60)), ("X", dec!(60))] {
            flows.push(AssetClassFlow {
                fund_code: fund.into(),
                classification_group: Some("Ak".into()),
                date,
                asset_class: "Equity".into(),
                flow_amount: if early { dec!(1000) } else { amount },
            });
        }
    }
    let summary = trailing_window_sum(
        &flows,
        NonZeroUsize::new(5).unwrap(),
        &FlowFilter::all(),
        GroupKey::Fund,
    )
    .unwrap();
    assert_eq!(summary.amount_for("X"), Some(dec!(300)));
    assert_eq!(summary.amount_for("Z"), Some(dec!(100)));

    let top = top_n(&summary_entries(&summary), 2, &RankOptions::default());
    assert_eq!(ids(&top), vec!["X", "Y"]);
}

#[test]
fn large_n_returns_everything_and_is_repeatable() {
    let rows = vec![
        entry("C", "Gamma", dec!(5)),
        entry("B", "Beta", dec!(5)),
        entry("A", "Alpha", dec!(-1)),
        entry("D", "Delta", dec!(9)),
    ];
    let first = top_n(&rows, 10, &RankOptions::default());
    assert_eq!(ids(&first), vec!["D", "B", "C", "A"]);
    let second = top_n(&rows, 10, &RankOptions::default());
    assert_eq!(first, second);

    let asc = top_n(
        &rows,
        2,
        &RankOptions {
            ascending: true,
            ..RankOptions::default()
        },
    );
    assert_eq!(ids(&asc), vec!["A", "B"]);
}

#[test]
fn name_filter_runs_before_truncation() {
    let rows = vec![
        entry("F1", "Alpha Serbest Fon", dec!(100)),
        entry("F2", "Beta Hisse", dec!(90)),
        entry("F3", "Gamma SERBEST", dec!(80)),
        entry("F4", "Delta Tahvil", dec!(70)),
    ];
    let opts = RankOptions {
        ascending: false,
        name_filter: Some(NameFilter::Exclude("serbest".into())),
    };
    let top = top_n(&rows, 2, &opts);
    assert_eq!(ids(&top), vec!["F2", "F4"]);

    let only = RankOptions {
        ascending: false,
        name_filter: Some(NameFilter::include_pattern(r"^(alpha|delta)\b").unwrap()),
    };
    assert_eq!(ids(&top_n(&rows, 5, &only)), vec!["F1", "F4"]);
}

#[test]
fn empty_candidates_give_empty_result() {
    let rows = vec![entry("F1", "Alpha", dec!(1))];
    let opts = RankOptions {
        ascending: false,
        name_filter: Some(NameFilter::Include("zzz".into())),
    };
    assert!(top_n(&rows, 3, &opts).is_empty());
    assert!(top_n(&[], 3, &RankOptions::default()).is_empty());
}

fn text(s: &str) -> Value {
    Value::parse_text(s)
}

fn fund_table() -> SnapshotTable {
    let columns = ["code", "title", "weekly"].iter().map(|s| s.to_string()).collect();
    SnapshotTable::load(
        "leaders",
        columns,
        vec![
            vec![text("AFT"), text("Ak Teknoloji"), Value::parse_number("12")],
            vec![text("TTE"), Value::Missing, Value::parse_number("40")],
            vec![text("IPJ"), text("İş Enerji"), Value::parse_number("")],
        ],
        &["code"],
    )
    .unwrap()
}

#[test]
fn table_ranking_uses_metric_and_name_columns() {
    let t = fund_table();
    let top = top_n_table(&t, "weekly", Some("title"), 5, &RankOptions::default()).unwrap();
    // IPJ has no metric and cannot be ranked.
    assert_eq!(ids(&top), vec!["TTE", "AFT"]);
    assert_eq!(top[0].name, "TTE");
    assert_eq!(top[1].name, "Ak Teknoloji");
}

#[test]
fn table_ranking_reports_missing_columns() {
    let t = fund_table();
    let err = top_n_table(&t, "monthly", None, 5, &RankOptions::default()).unwrap_err();
    assert_eq!(err, FlowError::ColumnNotFound("monthly".into()));
    let err = top_n_table(&t, "weekly", Some("unvan"), 5, &RankOptions::default()).unwrap_err();
    assert_eq!(err, FlowError::ColumnNotFound("unvan".into()));
}
