// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Line-oriented session sharing one [`App`], so edits made in quick
//! succession collapse into a single debounced upload.

use crate::app::App;
use crate::cli::build_cli;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use tracing::debug;

pub fn run(app: &mut App) -> Result<()> {
    println!("miaoledger shell. Type `help` for commands, `exit` to leave.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("miao> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let args = match split_args(&line) {
            Ok(a) => a,
            Err(msg) => {
                eprintln!("{}", msg);
                continue;
            }
        };
        match args.first().map(String::as_str) {
            None => continue,
            Some("exit") | Some("quit") => break,
            Some("shell") => {
                eprintln!("Already in a shell");
                continue;
            }
            _ => {}
        }
        let matches = match build_cli().no_binary_name(true).try_get_matches_from(&args) {
            Ok(m) => m,
            Err(err) => {
                let _ = err.print();
                continue;
            }
        };
        if let Err(err) = app.dispatch(&matches) {
            eprintln!("Error: {:#}", err);
        }
    }
    debug!("shell closed");
    Ok(())
}

/// Splits a command line on whitespace, honouring single and double quotes
/// and backslash escapes.
pub fn split_args(line: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => match chars.next() {
                Some(n) => cur.push(n),
                None => return Err("Trailing backslash".to_string()),
            },
            (Some(_), c) => cur.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    out.push(std::mem::take(&mut cur));
                    in_word = false;
                }
            }
            (None, c) => {
                cur.push(c);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        return Err("Unterminated quote".to_string());
    }
    if in_word {
        out.push(cur);
    }
    Ok(out)
}
