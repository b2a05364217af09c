// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::book::Book;
use crate::models::{CategoryItem, TransactionKind};
use crate::utils::{maybe_print_json, pretty_table, required};
use anyhow::{Result, anyhow};

fn kind(sub: &clap::ArgMatches) -> Result<TransactionKind> {
    required(sub, "type")?.parse().map_err(|e: String| anyhow!(e))
}

pub fn handle(book: &mut Book, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind = kind(sub)?;
            let name = required(sub, "name")?.trim();
            if name.is_empty() {
                return Err(anyhow!("Category name must not be empty"));
            }
            let icon = sub.get_one::<String>("icon").map(String::as_str).unwrap_or("🏷️");
            let parent = sub.get_one::<String>("parent").map(String::as_str);
            book.add_category(CategoryItem::new(icon, name, kind), parent)?;
            match parent {
                Some(p) => println!("Added {} category '{}' under '{}'", kind, name, p),
                None => println!("Added {} category '{}'", kind, name),
            }
        }
        Some(("rm", sub)) => {
            let kind = kind(sub)?;
            let name = required(sub, "name")?;
            let removed = match sub.get_one::<String>("parent") {
                Some(parent) => book.delete_subcategory(kind, parent, name),
                None => book.delete_category(kind, name),
            };
            if removed {
                println!("Removed category '{}'", name);
            } else {
                println!("No {} category named '{}'", kind, name);
            }
        }
        Some(("list", sub)) => {
            let kinds = match sub.get_one::<String>("type") {
                Some(_) => vec![kind(sub)?],
                None => vec![TransactionKind::Expense, TransactionKind::Income],
            };
            let items: Vec<&CategoryItem> = kinds
                .iter()
                .flat_map(|k| book.categories().list(*k))
                .collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
                let rows = items
                    .iter()
                    .map(|c| {
                        let subs: Vec<&str> = c.children().iter().map(|s| s.name.as_str()).collect();
                        vec![
                            c.r#type.to_string(),
                            format!("{} {}", c.icon, c.name),
                            subs.join(", "),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Type", "Category", "Sub-categories"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
