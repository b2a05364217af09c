// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::assistant::{AssistError, AudioClip, TransactionParser};
use crate::book::{Book, Rejection};
use crate::ingest::{Candidate, ingest};
use crate::models::{LedgerScope, Transaction};
use crate::utils::{fmt_money, now_local, required};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::warn;

pub fn handle(
    book: &mut Book,
    parser: &dyn TransactionParser,
    scope: &LedgerScope,
    m: &clap::ArgMatches,
) -> Result<()> {
    let parsed = match m.subcommand() {
        Some(("text", sub)) => {
            let input: Vec<&str> = sub
                .get_many::<String>("input")
                .map(|v| v.map(String::as_str).collect())
                .unwrap_or_default();
            parser.parse_text(&input.join(" "), book.categories())
        }
        Some(("voice", sub)) => {
            let path = required(sub, "file")?;
            let data = std::fs::read(path).with_context(|| format!("Read audio {}", path))?;
            let mime_type = sub
                .get_one::<String>("mime")
                .cloned()
                .unwrap_or_else(|| guess_audio_mime(Path::new(path)).to_string());
            parser.parse_voice(&AudioClip { mime_type, data }, book.categories())
        }
        _ => return Ok(()),
    };
    match commit_parsed(book, parsed, scope, now_local()) {
        Ok(tx) => println!(
            "Recorded {} {} in {}{} on {} (id: {})",
            tx.r#type,
            fmt_money(&tx.amount),
            tx.category,
            tx.sub_category
                .as_deref()
                .map(|s| format!(" / {}", s))
                .unwrap_or_default(),
            tx.date,
            tx.id
        ),
        Err(SmartFailure::Parse(err)) => {
            warn!(error = %err, "assistant could not parse the input");
            println!("Could not understand that, nothing was recorded.");
        }
        Err(SmartFailure::Rejected(err)) => {
            println!("Nothing was recorded: {}", err);
        }
    }
    Ok(())
}

#[derive(Debug)]
pub enum SmartFailure {
    Parse(AssistError),
    Rejected(Rejection),
}

/// Commits a parser result. Parser failures and rejected candidates leave
/// the book untouched.
pub fn commit_parsed(
    book: &mut Book,
    parsed: Result<Candidate, AssistError>,
    scope: &LedgerScope,
    now: NaiveDateTime,
) -> Result<Transaction, SmartFailure> {
    let candidate = parsed.map_err(SmartFailure::Parse)?;
    ingest(book, candidate, scope, now).map_err(SmartFailure::Rejected)
}

pub fn guess_audio_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "audio/webm",
    }
}
