// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::book::Book;
use crate::utils::required;
use anyhow::{Context, Result, anyhow};

pub fn handle(book: &Book, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(book, sub),
        Some(("snapshot", sub)) => export_snapshot(book, sub),
        _ => Ok(()),
    }
}

fn export_transactions(book: &Book, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub
        .get_one::<String>("format")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "json".to_string());
    let out = required(sub, "out")?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
            wtr.write_record([
                "id",
                "date",
                "type",
                "amount",
                "category",
                "subCategory",
                "note",
                "ledgerId",
                "createdAt",
            ])?;
            for t in book.transactions() {
                wtr.write_record([
                    t.id.clone(),
                    t.date.clone(),
                    t.r#type.to_string(),
                    t.amount.normalize().to_string(),
                    t.category.clone(),
                    t.sub_category.clone().unwrap_or_default(),
                    t.note.clone(),
                    t.ledger_id.clone(),
                    t.created_at.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, book.export_transactions()?)
                .with_context(|| format!("Write {}", out))?;
        }
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
    println!("Exported {} transactions to {}", book.transactions().len(), out);
    Ok(())
}

fn export_snapshot(book: &Book, sub: &clap::ArgMatches) -> Result<()> {
    let out = required(sub, "out")?;
    let snapshot = book.get_all_data();
    std::fs::write(out, serde_json::to_string_pretty(&snapshot)?)
        .with_context(|| format!("Write {}", out))?;
    println!("Exported snapshot to {}", out);
    Ok(())
}
