// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use chrono::NaiveDate;
use common::{book, form};
use miaoledger::models::{DEFAULT_LEDGER_ID, LedgerScope, Transaction, TransactionKind};
use miaoledger::summary::{
    CustomRange, Granularity, PresetRange, SummaryFilter, budget_status, filter, granularity,
    group_by_day, summarize,
};
use rust_decimal::Decimal;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn tx(id: &str, amount: i64, kind: TransactionKind, category: &str, date: &str, ledger: &str) -> Transaction {
    Transaction {
        id: id.into(),
        amount: Decimal::from(amount),
        r#type: kind,
        category: category.into(),
        sub_category: None,
        date: date.into(),
        note: String::new(),
        ledger_id: ledger.into(),
        created_at: 0,
    }
}

fn sample() -> Vec<Transaction> {
    use TransactionKind::{Expense, Income};
    vec![
        tx("1", 30, Expense, "餐饮", "2024-05-20T12:00:00", "L1"),
        tx("2", 10, Expense, "交通", "2024-05-03", "L1"),
        tx("3", 60, Expense, "餐饮", "2024-05-01", "L2"),
        tx("4", 1000, Income, "工资", "2024-05-10", "L1"),
        tx("5", 50, Expense, "购物", "2024-04-28", "L1"),
        tx("6", 20, Expense, "餐饮", "2023-12-31", "L2"),
    ]
}

#[test]
fn current_month_totals_and_breakdown() {
    let txs = sample();
    let s = summarize(
        &txs,
        &SummaryFilter::Preset(PresetRange::CurrentMonth),
        TransactionKind::Expense,
        d("2024-05-25"),
    );
    assert_eq!(s.totals.income, Decimal::from(1000));
    assert_eq!(s.totals.expense, Decimal::from(100));
    assert_eq!(s.totals.balance, Decimal::from(900));

    let cats: Vec<&str> = s.breakdown.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(cats, vec!["餐饮", "交通"]);
    assert_eq!(s.breakdown[0].percent, Decimal::from(90));
    let sum: Decimal = s.breakdown.iter().map(|c| c.percent).sum();
    assert_eq!(sum, Decimal::ONE_HUNDRED);
    assert_eq!(s.granularity, Granularity::Daily);
}

#[test]
fn empty_breakdown_has_no_percentages() {
    let txs = sample();
    let s = summarize(
        &txs,
        &SummaryFilter::Preset(PresetRange::PrevMonth),
        TransactionKind::Income,
        d("2024-05-25"),
    );
    assert!(s.breakdown.is_empty());
    assert_eq!(s.totals.expense, Decimal::from(50));
}

#[test]
fn previous_month_wraps_into_last_year() {
    let txs = sample();
    let picked = filter(
        &txs,
        &SummaryFilter::Preset(PresetRange::PrevMonth),
        d("2024-01-15"),
    );
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].id, "6");
}

#[test]
fn custom_range_is_inclusive_and_scoped() {
    let txs = sample();
    let mut range = CustomRange::new(d("2024-05-01"), d("2024-05-20"));
    range.ledger = LedgerScope::Ledger("L1".into());
    range.categories = ["餐饮".to_string(), "交通".to_string()].into_iter().collect();
    let picked = filter(&txs, &SummaryFilter::Custom(range), d("2030-01-01"));
    let ids: Vec<&str> = picked.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[test]
fn long_custom_ranges_bucket_by_month() {
    let sixty_one = CustomRange::new(d("2024-01-01"), d("2024-03-02"));
    assert_eq!(sixty_one.span_days(), 61);
    assert_eq!(
        granularity(&SummaryFilter::Custom(sixty_one)),
        Granularity::Monthly
    );
    assert_eq!(
        granularity(&SummaryFilter::Preset(PresetRange::CurrentYear)),
        Granularity::Monthly
    );
    assert_eq!(
        granularity(&SummaryFilter::Preset(PresetRange::PrevMonth)),
        Granularity::Daily
    );
}

#[test]
fn monthly_trend_is_ascending() {
    let txs = sample();
    let s = summarize(
        &txs,
        &SummaryFilter::Preset(PresetRange::All),
        TransactionKind::Expense,
        d("2024-05-25"),
    );
    let labels: Vec<&str> = s.trend.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["2023-12", "2024-04", "2024-05"]);
    assert_eq!(s.trend[2].income, Decimal::from(1000));
    assert_eq!(s.trend[2].expense, Decimal::from(100));
}

#[test]
fn budget_status_counts_scoped_month_expense() {
    let txs = sample();
    let all = budget_status(&txs, Decimal::from(200), &LedgerScope::All, d("2024-05-25"));
    assert_eq!(all.spent, Decimal::from(100));
    assert_eq!(all.remaining, Decimal::from(100));
    assert_eq!(all.used_ratio, Some(Decimal::new(5, 1)));

    let l2 = budget_status(
        &txs,
        Decimal::ZERO,
        &LedgerScope::Ledger("L2".into()),
        d("2024-05-25"),
    );
    assert_eq!(l2.spent, Decimal::from(60));
    assert_eq!(l2.used_ratio, None);
}

#[test]
fn days_are_grouped_newest_first() {
    let txs = sample();
    let refs: Vec<&Transaction> = txs.iter().collect();
    let groups = group_by_day(&refs);
    let days: Vec<&str> = groups.iter().map(|g| g.day.as_str()).collect();
    assert_eq!(
        days,
        vec!["2024-05-20", "2024-05-10", "2024-05-03", "2024-05-01", "2024-04-28", "2023-12-31"]
    );
    assert_eq!(groups[1].income, Decimal::from(1000));
    assert_eq!(groups[0].expense, Decimal::from(30));
}

#[test]
fn zero_amount_rows_break_down_to_zero_percent() {
    let mut b = book();
    let report = b
        .import_transactions(
            r#"[
                {"id":"z1","amount":0,"type":"expense","category":"餐饮","date":"2024-05-02",
                 "note":"","ledgerId":"default_1","createdAt":1},
                {"id":"z2","amount":0,"type":"expense","category":"交通","date":"2024-05-03",
                 "note":"","ledgerId":"default_1","createdAt":2}
            ]"#,
        )
        .unwrap();
    assert_eq!(report.imported, 2);

    let s = summarize(
        b.transactions(),
        &SummaryFilter::Preset(PresetRange::All),
        TransactionKind::Expense,
        d("2024-05-25"),
    );
    assert_eq!(s.breakdown.len(), 2);
    assert!(s.breakdown.iter().all(|c| c.percent == Decimal::ZERO));
    assert_eq!(s.totals.expense, Decimal::ZERO);
}

#[test]
fn huge_amounts_saturate_instead_of_overflowing() {
    let mut b = book();
    for date in ["2024-05-01", "2024-05-02"] {
        b.create_transaction(&form("50000000000000000000000000000", "餐饮", date, DEFAULT_LEDGER_ID))
            .unwrap();
    }

    let s = summarize(
        b.transactions(),
        &SummaryFilter::Preset(PresetRange::All),
        TransactionKind::Expense,
        d("2024-05-25"),
    );
    assert_eq!(s.totals.expense, Decimal::MAX);
    assert_eq!(s.totals.balance, -Decimal::MAX);
    assert_eq!(s.breakdown.len(), 1);
    assert_eq!(s.breakdown[0].percent, Decimal::ONE_HUNDRED);
    assert_eq!(s.trend.len(), 1);
    assert_eq!(s.trend[0].expense, Decimal::MAX);

    let refs: Vec<&Transaction> = b.transactions().iter().collect();
    assert_eq!(group_by_day(&refs).len(), 2);

    let status = budget_status(b.transactions(), Decimal::new(1, 2), &LedgerScope::All, d("2024-05-25"));
    assert_eq!(status.spent, Decimal::MAX);
    assert_eq!(status.used_ratio, None);
}
