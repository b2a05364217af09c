// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::book::Book;
use crate::ingest::LOCAL_TIMESTAMP_FORMAT;
use crate::models::{LedgerScope, Transaction, TransactionFormData, TransactionKind};
use crate::summary::group_by_day;
use crate::utils::{fmt_money, maybe_print_json, now_local, parse_date, pretty_table, required};
use anyhow::{Result, anyhow};
use chrono::NaiveDateTime;

pub fn handle(book: &mut Book, scope: &LedgerScope, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(book, scope, sub)?,
        Some(("edit", sub)) => edit(book, sub)?,
        Some(("rm", sub)) => remove(book, sub)?,
        Some(("list", sub)) => list(book, scope, sub)?,
        _ => {}
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD` or a full local timestamp; anything else is an error.
fn normalize_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if NaiveDateTime::parse_from_str(raw, LOCAL_TIMESTAMP_FORMAT).is_ok() {
        return Ok(raw.to_string());
    }
    Ok(parse_date(raw)?.format("%Y-%m-%d").to_string())
}

fn kind_of(sub: &clap::ArgMatches) -> Result<Option<TransactionKind>> {
    sub.get_one::<String>("type")
        .map(|s| s.parse::<TransactionKind>().map_err(|e| anyhow!(e)))
        .transpose()
}

fn add(book: &mut Book, scope: &LedgerScope, sub: &clap::ArgMatches) -> Result<()> {
    let ledger_id = match sub.get_one::<String>("ledger") {
        Some(id) => {
            if !book.ledgers().iter().any(|l| &l.id == id) {
                return Err(anyhow!("Ledger '{}' not found", id));
            }
            id.clone()
        }
        None => book.entry_ledger(scope),
    };
    let date = match sub.get_one::<String>("date") {
        Some(d) => normalize_date(d)?,
        None => now_local().format(LOCAL_TIMESTAMP_FORMAT).to_string(),
    };
    let form = TransactionFormData {
        amount: required(sub, "amount")?.to_string(),
        r#type: kind_of(sub)?.unwrap_or(TransactionKind::Expense),
        category: required(sub, "category")?.to_string(),
        sub_category: sub.get_one::<String>("sub").cloned(),
        date,
        note: sub.get_one::<String>("note").cloned().unwrap_or_default(),
        ledger_id,
    };
    let tx = book.create_transaction(&form)?;
    println!(
        "Recorded {} {} in {} on {} (id: {})",
        tx.r#type,
        fmt_money(&tx.amount),
        tx.category,
        tx.day(),
        tx.id
    );
    Ok(())
}

fn edit(book: &mut Book, sub: &clap::ArgMatches) -> Result<()> {
    let id = required(sub, "id")?;
    let current = book
        .find_transaction(id)
        .ok_or_else(|| anyhow!("Transaction '{}' not found", id))?;
    let form = TransactionFormData {
        amount: sub
            .get_one::<String>("amount")
            .cloned()
            .unwrap_or_else(|| current.amount.to_string()),
        r#type: kind_of(sub)?.unwrap_or(current.r#type),
        category: sub
            .get_one::<String>("category")
            .cloned()
            .unwrap_or_else(|| current.category.clone()),
        sub_category: match sub.get_one::<String>("sub") {
            Some(s) if s.is_empty() => None,
            Some(s) => Some(s.clone()),
            None => current.sub_category.clone(),
        },
        date: match sub.get_one::<String>("date") {
            Some(d) => normalize_date(d)?,
            None => current.date.clone(),
        },
        note: sub
            .get_one::<String>("note")
            .cloned()
            .unwrap_or_else(|| current.note.clone()),
        ledger_id: sub
            .get_one::<String>("ledger")
            .cloned()
            .unwrap_or_else(|| current.ledger_id.clone()),
    };
    book.update_transaction(id, &form)?;
    println!("Updated transaction {}", id);
    Ok(())
}

fn remove(book: &mut Book, sub: &clap::ArgMatches) -> Result<()> {
    let id = required(sub, "id")?;
    if book.delete_transaction(id) {
        println!("Deleted transaction {}", id);
    } else {
        println!("No transaction with id {}", id);
    }
    Ok(())
}

/// Newest-first selection for `tx list`.
pub fn query_rows<'a>(
    book: &'a Book,
    scope: &LedgerScope,
    sub: &clap::ArgMatches,
) -> Vec<&'a Transaction> {
    let scope = match sub.get_one::<String>("ledger") {
        Some(raw) => raw.parse().unwrap_or_default(),
        None => scope.clone(),
    };
    let month = sub.get_one::<String>("month");
    let category = sub.get_one::<String>("category");
    let mut rows: Vec<&Transaction> = book
        .transactions()
        .iter()
        .filter(|t| scope.matches(&t.ledger_id))
        .filter(|t| month.is_none_or(|m| t.date.starts_with(m.as_str())))
        .filter(|t| category.is_none_or(|c| &t.category == c))
        .collect();
    rows.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }
    rows
}

fn list(book: &Book, scope: &LedgerScope, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let rows = query_rows(book, scope, sub);

    if sub.get_flag("by-day") {
        let groups = group_by_day(&rows);
        if maybe_print_json(json_flag, jsonl_flag, &groups)? {
            return Ok(());
        }
        for g in groups {
            println!(
                "{}  income {}  expense {}",
                g.day,
                fmt_money(&g.income),
                fmt_money(&g.expense)
            );
            println!("{}", pretty_table(&TABLE_HEADERS, table_rows(&g.transactions)));
        }
        return Ok(());
    }

    if !maybe_print_json(json_flag, jsonl_flag, &rows)? {
        println!("{}", pretty_table(&TABLE_HEADERS, table_rows(&rows)));
    }
    Ok(())
}

const TABLE_HEADERS: [&str; 8] = [
    "Date", "Type", "Amount", "Category", "Sub", "Note", "Ledger", "Id",
];

fn table_rows(rows: &[&Transaction]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|t| {
            vec![
                t.date.clone(),
                t.r#type.to_string(),
                fmt_money(&t.amount),
                t.category.clone(),
                t.sub_category.clone().unwrap_or_default(),
                t.note.clone(),
                t.ledger_id.clone(),
                t.id.clone(),
            ]
        })
        .collect()
}
