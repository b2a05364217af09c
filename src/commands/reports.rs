// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::book::Book;
use crate::models::TransactionKind;
use crate::summary::{
    CustomRange, PresetRange, SummaryFilter, filter, granularity, group_by_day, summarize, trend,
};
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table, today};
use anyhow::{Result, anyhow};

pub fn handle(book: &Book, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(book, sub)?,
        Some(("trend", sub)) => trend_report(book, sub)?,
        Some(("days", sub)) => days(book, sub)?,
        _ => {}
    }
    Ok(())
}

/// `--from/--to` select a custom range; otherwise `--range` picks a preset.
pub fn filter_from_args(sub: &clap::ArgMatches) -> Result<SummaryFilter> {
    match (sub.get_one::<String>("from"), sub.get_one::<String>("to")) {
        (Some(from), Some(to)) => {
            let mut range = CustomRange::new(parse_date(from)?, parse_date(to)?);
            if let Some(ledger) = sub.get_one::<String>("ledger") {
                range.ledger = ledger.parse().unwrap_or_default();
            }
            if let Some(cats) = sub.get_many::<String>("category") {
                range.categories = cats.cloned().collect();
            }
            Ok(SummaryFilter::Custom(range))
        }
        _ => {
            let raw = sub
                .get_one::<String>("range")
                .map(String::as_str)
                .unwrap_or("current_month");
            let preset: PresetRange = raw.parse().map_err(|e: String| anyhow!(e))?;
            Ok(SummaryFilter::Preset(preset))
        }
    }
}

fn summary(book: &Book, sub: &clap::ArgMatches) -> Result<()> {
    let f = filter_from_args(sub)?;
    let kind: TransactionKind = sub
        .get_one::<String>("type")
        .map(String::as_str)
        .unwrap_or("expense")
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let s = summarize(book.transactions(), &f, kind, today());
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Income", "Expense", "Balance"],
            vec![vec![
                fmt_money(&s.totals.income),
                fmt_money(&s.totals.expense),
                fmt_money(&s.totals.balance),
            ]],
        )
    );
    let rows = s
        .breakdown
        .iter()
        .map(|c| {
            vec![
                c.category.clone(),
                fmt_money(&c.amount),
                format!("{:.1}%", c.percent),
            ]
        })
        .collect();
    let header = format!("Category ({})", kind);
    println!(
        "{}",
        pretty_table(&[header.as_str(), "Amount", "Share"], rows)
    );
    Ok(())
}

fn trend_report(book: &Book, sub: &clap::ArgMatches) -> Result<()> {
    let f = filter_from_args(sub)?;
    let selected = filter(book.transactions(), &f, today());
    let buckets = trend(&selected, granularity(&f));
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &buckets)? {
        return Ok(());
    }
    let rows = buckets
        .iter()
        .map(|b| vec![b.label.clone(), fmt_money(&b.income), fmt_money(&b.expense)])
        .collect();
    println!("{}", pretty_table(&["Period", "Income", "Expense"], rows));
    Ok(())
}

fn days(book: &Book, sub: &clap::ArgMatches) -> Result<()> {
    let f = filter_from_args(sub)?;
    let selected = filter(book.transactions(), &f, today());
    let groups = group_by_day(&selected);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &groups)? {
        return Ok(());
    }
    let rows = groups
        .iter()
        .map(|g| {
            vec![
                g.day.clone(),
                g.transactions.len().to_string(),
                fmt_money(&g.income),
                fmt_money(&g.expense),
                fmt_money(&(g.income - g.expense)),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Day", "Entries", "Income", "Expense", "Net"], rows)
    );
    Ok(())
}
