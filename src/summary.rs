// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only aggregates over the transaction list.

use crate::models::{LedgerScope, Transaction, TransactionKind};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

/// Custom ranges wider than this many days are bucketed by month.
pub const DAILY_BUCKET_MAX_DAYS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetRange {
    CurrentMonth,
    PrevMonth,
    CurrentYear,
    All,
}

impl FromStr for PresetRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "current_month" | "month" => Ok(PresetRange::CurrentMonth),
            "prev_month" => Ok(PresetRange::PrevMonth),
            "current_year" | "year" => Ok(PresetRange::CurrentYear),
            "all" => Ok(PresetRange::All),
            other => Err(format!(
                "Unknown range '{}' (use current_month|prev_month|current_year|all)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub ledger: LedgerScope,
    /// Empty means every category.
    pub categories: BTreeSet<String>,
}

impl CustomRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            ledger: LedgerScope::All,
            categories: BTreeSet::new(),
        }
    }

    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days().abs()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryFilter {
    Preset(PresetRange),
    Custom(CustomRange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Decimal,
    /// Share of the type's total, 0..=100. Zero when the total is zero.
    pub percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendBucket {
    pub label: String,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub totals: Totals,
    pub breakdown_type: TransactionKind,
    pub breakdown: Vec<CategoryShare>,
    pub granularity: Granularity,
    pub trend: Vec<TrendBucket>,
}

fn parse_day(t: &Transaction) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(t.day(), "%Y-%m-%d").ok()
}

fn prev_month(today: NaiveDate) -> (i32, u32) {
    if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    }
}

fn in_preset(t: &Transaction, range: PresetRange, today: NaiveDate) -> bool {
    if range == PresetRange::All {
        return true;
    }
    let Some(d) = parse_day(t) else {
        return false;
    };
    match range {
        PresetRange::CurrentMonth => d.year() == today.year() && d.month() == today.month(),
        PresetRange::PrevMonth => (d.year(), d.month()) == prev_month(today),
        PresetRange::CurrentYear => d.year() == today.year(),
        PresetRange::All => true,
    }
}

fn in_custom(t: &Transaction, range: &CustomRange) -> bool {
    let start = range.start.format("%Y-%m-%d").to_string();
    let end = range.end.format("%Y-%m-%d").to_string();
    let day = t.day();
    day >= start.as_str()
        && day <= end.as_str()
        && range.ledger.matches(&t.ledger_id)
        && (range.categories.is_empty() || range.categories.contains(&t.category))
}

/// Transactions selected by `filter`, in input order.
pub fn filter<'a>(
    transactions: &'a [Transaction],
    filter: &SummaryFilter,
    today: NaiveDate,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| match filter {
            SummaryFilter::Preset(range) => in_preset(t, *range, today),
            SummaryFilter::Custom(range) => in_custom(t, range),
        })
        .collect()
}

pub fn totals(transactions: &[&Transaction]) -> Totals {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for t in transactions {
        match t.r#type {
            TransactionKind::Income => income = income.saturating_add(t.amount),
            TransactionKind::Expense => expense = expense.saturating_add(t.amount),
        }
    }
    Totals {
        income,
        expense,
        balance: income.saturating_sub(expense),
    }
}

/// Per-category sums for one type, largest first.
pub fn breakdown(transactions: &[&Transaction], kind: TransactionKind) -> Vec<CategoryShare> {
    let mut sums: HashMap<&str, Decimal> = HashMap::new();
    for t in transactions.iter().filter(|t| t.r#type == kind) {
        let sum = sums.entry(t.category.as_str()).or_insert(Decimal::ZERO);
        *sum = sum.saturating_add(t.amount);
    }
    let total = sums
        .values()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v));
    let mut items: Vec<CategoryShare> = sums
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            category: category.to_string(),
            amount,
            percent: amount
                .checked_div(total)
                .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::ZERO),
        })
        .collect();
    items.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));
    items
}

pub fn granularity(filter: &SummaryFilter) -> Granularity {
    let monthly = match filter {
        SummaryFilter::Preset(range) => {
            matches!(range, PresetRange::CurrentYear | PresetRange::All)
        }
        SummaryFilter::Custom(range) => range.span_days() > DAILY_BUCKET_MAX_DAYS,
    };
    if monthly {
        Granularity::Monthly
    } else {
        Granularity::Daily
    }
}

/// Income/expense per bucket, oldest bucket first. Undated entries are left out.
pub fn trend(transactions: &[&Transaction], granularity: Granularity) -> Vec<TrendBucket> {
    let mut buckets: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for t in transactions {
        let Some(day) = parse_day(t) else {
            continue;
        };
        let key = match granularity {
            Granularity::Daily => day,
            Granularity::Monthly => day.with_day(1).unwrap_or(day),
        };
        let entry = buckets.entry(key).or_insert((Decimal::ZERO, Decimal::ZERO));
        match t.r#type {
            TransactionKind::Income => entry.0 = entry.0.saturating_add(t.amount),
            TransactionKind::Expense => entry.1 = entry.1.saturating_add(t.amount),
        }
    }
    let fmt = match granularity {
        Granularity::Daily => "%Y-%m-%d",
        Granularity::Monthly => "%Y-%m",
    };
    buckets
        .into_iter()
        .map(|(key, (income, expense))| TrendBucket {
            label: key.format(fmt).to_string(),
            income,
            expense,
        })
        .collect()
}

pub fn summarize(
    transactions: &[Transaction],
    summary_filter: &SummaryFilter,
    breakdown_type: TransactionKind,
    today: NaiveDate,
) -> Summary {
    let selected = filter(transactions, summary_filter, today);
    let granularity = granularity(summary_filter);
    Summary {
        totals: totals(&selected),
        breakdown_type,
        breakdown: breakdown(&selected, breakdown_type),
        granularity,
        trend: trend(&selected, granularity),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    /// `None` while the budget is unset, or when the ratio is out of range.
    pub used_ratio: Option<Decimal>,
}

/// Current-month spending against the global budget, within `scope`.
pub fn budget_status(
    transactions: &[Transaction],
    budget: Decimal,
    scope: &LedgerScope,
    today: NaiveDate,
) -> BudgetStatus {
    let month = today.format("%Y-%m").to_string();
    let spent: Decimal = transactions
        .iter()
        .filter(|t| {
            t.r#type == TransactionKind::Expense
                && t.date.starts_with(&month)
                && scope.matches(&t.ledger_id)
        })
        .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount));
    BudgetStatus {
        budget,
        spent,
        remaining: budget.saturating_sub(spent),
        used_ratio: spent.checked_div(budget),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup<'a> {
    pub day: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub transactions: Vec<&'a Transaction>,
}

/// Groups by calendar day, newest day first; entries within a day newest first.
pub fn group_by_day<'a>(transactions: &[&'a Transaction]) -> Vec<DayGroup<'a>> {
    let mut groups: BTreeMap<&str, Vec<&'a Transaction>> = BTreeMap::new();
    for &t in transactions {
        groups.entry(t.day()).or_default().push(t);
    }
    groups
        .into_iter()
        .rev()
        .map(|(day, mut txs)| {
            txs.sort_by(|a, b| {
                b.date
                    .cmp(&a.date)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
            let t = totals(&txs);
            DayGroup {
                day: day.to_string(),
                income: t.income,
                expense: t.expense,
                transactions: txs,
            }
        })
        .collect()
}
