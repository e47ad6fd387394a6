// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fundflow::config::FundColumns;
use fundflow::error::FlowError;
use fundflow::flows::{allocation_rows, classification_groups, derive};
use fundflow::models::FundAllocationRow;
use fundflow::table::{SnapshotTable, Value};
use fundflow::utils::parse_decimal;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

fn classes() -> Vec<String> {
    vec!["Equity".into(), "Bond".into(), "Gold".into()]
}

fn fund(code: &str, d: u32, net: Option<Decimal>, pct: &[(&str, Decimal)]) -> FundAllocationRow {
    FundAllocationRow {
        fund_code: code.into(),
        classification_group: Some("Ak Portföy".into()),
        date: day(d),
        net_flow_amount: net,
        allocation_pct: pct.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn splits_net_flow_by_allocation() {
    let rows = vec![fund(
        "A",
        2,
        Some(dec!(1000000)),
        &[("Equity", dec!(40)), ("Bond", dec!(60))],
    )];
    let out = derive(&rows, &classes()).unwrap();
    assert_eq!(out.flows.len(), 3);
    let by_class: BTreeMap<&str, Decimal> = out
        .flows
        .iter()
        .map(|f| (f.asset_class.as_str(), f.flow_amount))
        .collect();
    assert_eq!(by_class["Equity"], dec!(400000));
    assert_eq!(by_class["Bond"], dec!(600000));
    // Not held -> zero flow, not an error.
    assert_eq!(by_class["Gold"], Decimal::ZERO);
    assert_eq!(out.excluded_rows, 0);
}

#[test]
fn derived_flows_sum_back_to_net_flow() {
    let rows = vec![
        fund(
            "A",
            2,
            Some(dec!(-1234567.89)),
            &[("Equity", dec!(33.3)), ("Bond", dec!(33.3)), ("Gold", dec!(33.4))],
        ),
        fund("B", 2, Some(dec!(500)), &[("Equity", dec!(50)), ("Bond", dec!(25))]),
    ];
    let out = derive(&rows, &classes()).unwrap();
    let total_for = |code: &str| -> Decimal {
        out.flows
            .iter()
            .filter(|f| f.fund_code == code)
            .map(|f| f.flow_amount)
            .sum()
    };
    assert_eq!(total_for("A"), dec!(-1234567.89));
    // Percentages summing to 75 give 75% of the net flow.
    assert_eq!(total_for("B"), dec!(375));
}

#[test]
fn rows_without_net_flow_are_counted_not_dropped_silently() {
    let rows = vec![
        fund("A", 2, None, &[("Equity", dec!(100))]),
        fund("B", 2, Some(dec!(10)), &[("Equity", dec!(100))]),
    ];
    let out = derive(&rows, &classes()).unwrap();
    assert_eq!(out.excluded_rows, 1);
    assert!(out.flows.iter().all(|f| f.fund_code == "B"));
}

#[test]
fn duplicate_fund_dates_keep_first_row() {
    let rows = vec![
        fund("A", 2, Some(dec!(100)), &[("Equity", dec!(100))]),
        fund("A", 2, Some(dec!(900)), &[("Equity", dec!(100))]),
        fund("A", 3, Some(dec!(5)), &[("Equity", dec!(100))]),
    ];
    let out = derive(&rows, &["Equity".to_string()]).unwrap();
    assert_eq!(out.duplicate_rows, 1);
    let amounts: Vec<Decimal> = out.flows.iter().map(|f| f.flow_amount).collect();
    assert_eq!(amounts, vec![dec!(100), dec!(5)]);
}

#[test]
fn oversized_net_flow_is_reported_not_panicking() {
    let huge = parse_decimal("1e27").unwrap();
    let rows = vec![fund("A", 2, Some(huge), &[("Equity", dec!(100))])];
    // 100% of the amount still fits.
    let out = derive(&rows, &["Equity".to_string()]).unwrap();
    assert_eq!(out.flows[0].flow_amount, huge);

    let rows = vec![fund("A", 2, Some(Decimal::MAX), &[("Equity", dec!(150))])];
    let err = derive(&rows, &["Equity".to_string()]).unwrap_err();
    assert!(matches!(err, FlowError::Overflow(_)));
    assert!(err.to_string().contains("Equity flow of A on 2025-01-02"));
}

fn fund_table(rows: Vec<Vec<Value>>) -> SnapshotTable {
    let columns = ["fund_code", "PYŞ", "Tarih", "net_flow", "Equity_pct", "Bond_pct"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    SnapshotTable::load("funds", columns, rows, &["fund_code", "Tarih"]).unwrap()
}

#[test]
fn allocation_rows_read_configured_columns() {
    let table = fund_table(vec![
        vec![
            Value::parse_text("AFT"),
            Value::parse_text("Ak Portföy"),
            Value::parse_date("2025-01-02"),
            Value::parse_number("1000"),
            Value::parse_number("70"),
            Value::parse_number("NaN"),
        ],
        vec![
            Value::parse_text("TTE"),
            Value::parse_text(""),
            Value::parse_date("2025-01-02"),
            Value::parse_number("n/a"),
            Value::parse_number("100"),
            Value::parse_number(""),
        ],
    ]);
    let rows = allocation_rows(&table, &FundColumns::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].allocation_pct.get("Equity"), Some(&dec!(70)));
    assert_eq!(rows[0].allocation_pct.get("Bond"), None);
    assert_eq!(rows[1].classification_group, None);
    assert_eq!(rows[1].net_flow_amount, None);

    let out = derive(&rows, &["Equity".to_string(), "Bond".to_string()]).unwrap();
    assert_eq!(out.excluded_rows, 1);
    assert_eq!(classification_groups(&out.flows), vec!["Ak Portföy".to_string()]);
}

#[test]
fn allocation_rows_require_known_columns() {
    let table = fund_table(vec![vec![
        Value::parse_text("AFT"),
        Value::parse_text("Ak Portföy"),
        Value::parse_date("2025-01-02"),
        Value::parse_number("1"),
        Value::parse_number("1"),
        Value::parse_number("1"),
    ]]);
    let cols = FundColumns {
        net_flow: "Net Akım".into(),
        ..FundColumns::default()
    };
    assert!(matches!(allocation_rows(&table, &cols), Err(FlowError::Schema(_))));

    let cols = FundColumns {
        asset_classes: vec!["Gold".into()],
        ..FundColumns::default()
    };
    let err = allocation_rows(&table, &cols).unwrap_err();
    assert!(err.to_string().contains("Gold_pct"));
}
