// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::book::Book;
use crate::models::AppData;
use crate::utils::required;
use anyhow::{Context, Result};

pub fn handle(book: &mut Book, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => import_transactions(book, sub),
        Some(("snapshot", sub)) => import_snapshot(book, sub),
        _ => Ok(()),
    }
}

/// Replaces the whole transaction list with the file's JSON array.
fn import_transactions(book: &mut Book, sub: &clap::ArgMatches) -> Result<()> {
    let path = required(sub, "path")?.trim();
    let raw = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
    let report = book
        .import_transactions(&raw)
        .with_context(|| format!("Import {}", path))?;
    if report.skipped > 0 {
        println!(
            "Imported {} transactions ({} unreadable records skipped)",
            report.imported, report.skipped
        );
    } else {
        println!("Imported {} transactions", report.imported);
    }
    Ok(())
}

fn import_snapshot(book: &mut Book, sub: &clap::ArgMatches) -> Result<()> {
    let path = required(sub, "path")?.trim();
    let raw = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
    let data: AppData =
        serde_json::from_str(&raw).with_context(|| format!("Parse snapshot {}", path))?;
    book.import_snapshot(data);
    println!(
        "Restored snapshot: {} transactions, {} ledgers",
        book.transactions().len(),
        book.ledgers().len()
    );
    Ok(())
}
