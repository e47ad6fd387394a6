// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fundflow::error::FlowError;
use fundflow::models::{AssetClassFlow, DailyTotal};
use fundflow::window::{
    FlowFilter, GroupKey, cumulative, cumulative_by_group, daily_group_sum, trailing_window_sum,
    window_dates,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::num::NonZeroUsize;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn w(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn flow(fund: &str, group: &str, d: u32, class: &str, amount: Decimal) -> AssetClassFlow {
    AssetClassFlow {
        fund_code: fund.into(),
        classification_group: Some(group.into()),
        date: day(d),
        asset_class: class.into(),
        flow_amount: amount,
    }
}

/// Trading dates 3, 4, 5, 10, 11 (a weekend-and-holiday gap in between).
fn series() -> Vec<AssetClassFlow> {
    vec![
        flow("AAA", "Ak", 11, "Equity", dec!(10)),
        flow("AAA", "Ak", 11, "Bond", dec!(5)),
        flow("BBB", "İş", 10, "Equity", dec!(-3)),
        flow("AAA", "Ak", 5, "Equity", dec!(7)),
        flow("BBB", "İş", 4, "Bond", dec!(2)),
        flow("AAA", "Ak", 3, "Equity", dec!(1)),
        flow("BBB", "İş", 3, "Bond", dec!(100)),
    ]
}

#[test]
fn window_spans_observed_dates_not_calendar_days() {
    assert_eq!(window_dates(&series(), w(3)), vec![day(5), day(10), day(11)]);
    // Asking for more dates than exist gives them all.
    assert_eq!(window_dates(&series(), w(50)).len(), 5);
}

#[test]
fn trailing_sum_groups_by_asset_class() {
    let s = trailing_window_sum(&series(), w(3), &FlowFilter::all(), GroupKey::AssetClass).unwrap();
    assert_eq!(s.window, 3);
    assert_eq!(s.start(), Some(day(5)));
    assert_eq!(s.end(), Some(day(11)));
    assert_eq!(s.amount_for("Equity"), Some(dec!(14)));
    assert_eq!(s.amount_for("Bond"), Some(dec!(5)));
    assert_eq!(s.total, dec!(19));
    assert_eq!(s.rows[0].key, "Equity");
    let equity_share = s.rows[0].share.unwrap();
    assert_eq!(equity_share, dec!(14) / dec!(19));
}

#[test]
fn filter_applies_after_the_window_is_chosen() {
    // "İş" has no rows on the last two dates of the whole series; the window
    // must not slide back to find some.
    let is_portfoy = FlowFilter::classification("İş");
    let s = trailing_window_sum(&series(), w(1), &is_portfoy, GroupKey::Fund).unwrap();
    assert!(s.is_empty());
    assert_eq!(s.dates, vec![day(11)]);
    assert_eq!(s.total, Decimal::ZERO);

    let s = trailing_window_sum(&series(), w(2), &is_portfoy, GroupKey::Fund).unwrap();
    assert_eq!(s.amount_for("BBB"), Some(dec!(-3)));
}

#[test]
fn zero_total_has_no_share() {
    let flows = vec![
        flow("AAA", "Ak", 3, "Equity", dec!(5)),
        flow("BBB", "Ak", 3, "Equity", dec!(-5)),
    ];
    let s = trailing_window_sum(&flows, w(5), &FlowFilter::all(), GroupKey::Fund).unwrap();
    assert_eq!(s.total, Decimal::ZERO);
    assert!(s.rows.iter().all(|r| r.share.is_none()));
}

#[test]
fn equal_amounts_order_by_key() {
    let flows = vec![
        flow("ZZZ", "Ak", 3, "Equity", dec!(300)),
        flow("XXX", "Ak", 3, "Equity", dec!(300)),
        flow("YYY", "Ak", 3, "Equity", dec!(100)),
    ];
    let s = trailing_window_sum(&flows, w(5), &FlowFilter::all(), GroupKey::Fund).unwrap();
    let keys: Vec<&str> = s.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["XXX", "ZZZ", "YYY"]);
}

#[test]
fn full_window_matches_daily_totals() {
    let flows = series();
    let full = trailing_window_sum(&flows, w(5), &FlowFilter::all(), GroupKey::AssetClass).unwrap();
    let daily = daily_group_sum(&flows, &FlowFilter::all()).unwrap();
    let daily_total: Decimal = daily.iter().map(|d| d.amount).sum();
    assert_eq!(full.total, daily_total);
    assert_eq!(daily_total, dec!(122));
}

#[test]
fn daily_sums_are_ascending_by_date() {
    let daily = daily_group_sum(&series(), &FlowFilter::all()).unwrap();
    let dates: Vec<NaiveDate> = daily.iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![day(3), day(4), day(5), day(10), day(11)]);
    assert_eq!(daily[0].amount, dec!(101));
    assert_eq!(daily[4].amount, dec!(15));
}

#[test]
fn cumulative_adds_one_term_per_date() {
    let daily = daily_group_sum(&series(), &FlowFilter::all()).unwrap();
    let cum = cumulative(&daily).unwrap();
    assert_eq!(cum.len(), daily.len());
    assert_eq!(cum[0].running_total, daily[0].amount);
    for i in 1..cum.len() {
        assert_eq!(cum[i].running_total, cum[i - 1].running_total + cum[i].amount);
    }
    assert_eq!(cum.last().unwrap().running_total, dec!(122));
}

#[test]
fn cumulative_sorts_shuffled_input() {
    let sorted = vec![
        DailyTotal { date: day(3), amount: dec!(1) },
        DailyTotal { date: day(4), amount: dec!(2) },
        DailyTotal { date: day(7), amount: dec!(-4) },
    ];
    let shuffled = vec![sorted[2], sorted[0], sorted[1]];
    let cum = cumulative(&shuffled).unwrap();
    assert_eq!(cum, cumulative(&sorted).unwrap());
    assert_eq!(cum.last().unwrap().running_total, dec!(-1));
}

#[test]
fn cumulative_per_group_tracks_each_key() {
    let by_fund = cumulative_by_group(&series(), &FlowFilter::all(), GroupKey::Fund).unwrap();
    assert_eq!(by_fund.len(), 2);
    let aaa = &by_fund["AAA"];
    assert_eq!(aaa.iter().map(|p| p.date).collect::<Vec<_>>(), vec![day(3), day(5), day(11)]);
    assert_eq!(aaa.last().unwrap().running_total, dec!(23));
    assert_eq!(by_fund["BBB"].last().unwrap().running_total, dec!(99));
}

#[test]
fn overflowing_window_sum_is_an_error() {
    let flows = vec![
        flow("AAA", "Ak", 3, "Equity", Decimal::MAX),
        flow("BBB", "Ak", 3, "Equity", Decimal::MAX),
    ];
    let err = trailing_window_sum(&flows, w(1), &FlowFilter::all(), GroupKey::AssetClass)
        .unwrap_err();
    assert_eq!(err, FlowError::Overflow("window sum of 'Equity'".into()));
    assert!(matches!(
        daily_group_sum(&flows, &FlowFilter::all()),
        Err(FlowError::Overflow(_))
    ));

    // Per-fund sums fit; only the window total overflows.
    let err = trailing_window_sum(&flows, w(1), &FlowFilter::all(), GroupKey::Fund).unwrap_err();
    assert_eq!(err, FlowError::Overflow("window total".into()));
}
