// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::assistant::{InsightProvider, ask};
use crate::book::Book;
use anyhow::Result;

/// Without a question the assistant offers a saving tip.
pub fn handle(book: &Book, provider: &dyn InsightProvider, m: &clap::ArgMatches) -> Result<()> {
    let question: Vec<&str> = m
        .get_many::<String>("question")
        .map(|v| v.map(String::as_str).collect())
        .unwrap_or_default();
    let question = question.join(" ");
    let q = Some(question.as_str()).filter(|q| !q.trim().is_empty());
    println!("{}", ask(provider, book.transactions(), q));
    Ok(())
}
