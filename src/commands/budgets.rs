// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::book::Book;
use crate::models::LedgerScope;
use crate::summary::budget_status;
use crate::utils::{fmt_money, maybe_print_json, pretty_table, required, today};
use anyhow::Result;
use rust_decimal::Decimal;

pub fn handle(book: &mut Book, scope: &LedgerScope, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let value = book.set_budget(required(sub, "amount")?)?;
            println!("Monthly budget set to {}", fmt_money(&value));
        }
        Some(("show", sub)) => show(book, scope, sub)?,
        _ => {}
    }
    Ok(())
}

fn show(book: &Book, scope: &LedgerScope, sub: &clap::ArgMatches) -> Result<()> {
    let status = budget_status(book.transactions(), book.budget(), scope, today());
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &status)? {
        return Ok(());
    }
    let used = status
        .used_ratio
        .map(|r| format!("{:.1}%", r.saturating_mul(Decimal::ONE_HUNDRED)))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}",
        pretty_table(
            &["Scope", "Budget", "Spent", "Remaining", "Used"],
            vec![vec![
                scope.to_string(),
                fmt_money(&status.budget),
                fmt_money(&status.spent),
                fmt_money(&status.remaining),
                used,
            ]],
        )
    );
    Ok(())
}
