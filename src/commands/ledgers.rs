// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::models::{Ledger, LedgerScope};
use crate::utils::{maybe_print_json, pretty_table, required};
use anyhow::{Result, anyhow};

pub fn handle(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required(sub, "name")?.trim();
            if name.is_empty() {
                return Err(anyhow!("Ledger name must not be empty"));
            }
            let icon = sub.get_one::<String>("icon").map(String::as_str).unwrap_or("📒");
            let ledger = app.book.create_ledger(name, icon);
            println!("Created ledger '{}' (id: {})", ledger.name, ledger.id);
        }
        Some(("edit", sub)) => {
            let id = required(sub, "id")?;
            let mut ledger = app
                .book
                .ledgers()
                .iter()
                .find(|l| l.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("Ledger '{}' not found", id))?;
            if let Some(name) = sub.get_one::<String>("name") {
                ledger.name = name.clone();
            }
            if let Some(icon) = sub.get_one::<String>("icon") {
                ledger.icon = icon.clone();
            }
            app.book.save_ledger(ledger);
            println!("Updated ledger {}", id);
        }
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            if app.book.delete_ledger(id)? {
                println!("Deleted ledger {}", id);
                let repaired = app.scope();
                if repaired != app.settings.active_ledger {
                    app.set_scope(repaired)?;
                }
            } else {
                println!("No ledger with id {}", id);
            }
        }
        Some(("list", sub)) => list(app, sub)?,
        Some(("use", sub)) => {
            let scope: LedgerScope = required(sub, "id")?.parse().unwrap_or_default();
            if let LedgerScope::Ledger(id) = &scope {
                if !app.book.ledgers().iter().any(|l| &l.id == id) {
                    return Err(anyhow!("Ledger '{}' not found", id));
                }
            }
            app.set_scope(scope)?;
            println!("Active ledger: {}", app.settings.active_ledger);
        }
        _ => {}
    }
    Ok(())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let ledgers: &[Ledger] = app.book.ledgers();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &ledgers)? {
        return Ok(());
    }
    let active = app.scope();
    let rows = ledgers
        .iter()
        .map(|l| {
            vec![
                if active.matches(&l.id) && active != LedgerScope::All {
                    "*".to_string()
                } else {
                    String::new()
                },
                format!("{} {}", l.icon, l.name),
                l.id.clone(),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["", "Ledger", "Id"], rows));
    Ok(())
}
