// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Turns a loosely typed parser guess into form data and commits it.
//! Amount is not validated here; the mutation API rejects bad amounts.

use crate::book::{Book, Rejection};
use crate::models::{
    FALLBACK_CATEGORY, LedgerScope, Transaction, TransactionFormData, TransactionKind,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseAmount {
    Number(f64),
    Text(String),
}

impl LooseAmount {
    fn into_text(self) -> String {
        match self {
            LooseAmount::Number(n) => n.to_string(),
            LooseAmount::Text(s) => s,
        }
    }
}

/// A candidate transaction as produced by an external parser. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub amount: Option<LooseAmount>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

fn present(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Candidate {
    /// Fills defaults for missing fields. The ledger is always `ledger_id`.
    pub fn into_form(self, ledger_id: &str, now: NaiveDateTime) -> TransactionFormData {
        let amount = self
            .amount
            .map(LooseAmount::into_text)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "0".to_string());
        let r#type = self
            .kind
            .and_then(|k| k.parse::<TransactionKind>().ok())
            .unwrap_or(TransactionKind::Expense);
        TransactionFormData {
            amount,
            r#type,
            category: present(self.category).unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
            sub_category: present(self.sub_category),
            date: present(self.date)
                .unwrap_or_else(|| now.format(LOCAL_TIMESTAMP_FORMAT).to_string()),
            note: self.note.unwrap_or_default(),
            ledger_id: ledger_id.to_string(),
        }
    }
}

/// Commits `candidate` into the ledger `scope` resolves to.
pub fn ingest(
    book: &mut Book,
    candidate: Candidate,
    scope: &LedgerScope,
    now: NaiveDateTime,
) -> Result<Transaction, Rejection> {
    let ledger_id = book.entry_ledger(scope);
    let form = candidate.into_form(&ledger_id, now);
    book.create_transaction(&form)
}
