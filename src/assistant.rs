// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Language-model collaborators: free text / voice to a candidate
//! transaction, and advisory answers about spending. Neither ever mutates
//! state; candidates go through [`crate::ingest`].

use crate::ingest::Candidate;
use crate::models::{Categories, Transaction, TransactionKind};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt::Write as _;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Most recent transactions sent along with an insight question.
pub const INSIGHT_HISTORY_LIMIT: usize = 500;
pub const INSIGHT_FALLBACK: &str = "喵？暂时无法分析您的账单，请稍后再试～";

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("Assistant API key is not set (set GEMINI_API_KEY or `config set assistant_api_key`)")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Assistant API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Assistant returned an empty response")]
    Empty,
    #[error("Assistant response was not a transaction: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub mime_type: String,
    pub data: Vec<u8>,
}

pub trait TransactionParser {
    fn parse_text(&self, input: &str, catalog: &Categories) -> Result<Candidate, AssistError>;
    fn parse_voice(&self, clip: &AudioClip, catalog: &Categories)
    -> Result<Candidate, AssistError>;
}

pub trait InsightProvider {
    fn insight(
        &self,
        transactions: &[Transaction],
        question: Option<&str>,
    ) -> Result<String, AssistError>;
}

/// Renders the category trees as prompt context.
pub fn category_context(catalog: &Categories) -> String {
    let mut out = String::from(
        "Categorize into one of these existing categories whenever one fits:\n",
    );
    for (title, kind) in [
        ("EXPENSE", TransactionKind::Expense),
        ("INCOME", TransactionKind::Income),
    ] {
        let _ = writeln!(out, "--- {} CATEGORIES ---", title);
        for c in catalog.list(kind) {
            let subs: Vec<&str> = c.children().iter().map(|s| s.name.as_str()).collect();
            if subs.is_empty() {
                let _ = writeln!(out, "Main: \"{}\"", c.name);
            } else {
                let _ = writeln!(out, "Main: \"{}\" | Sub-options: [{}]", c.name, subs.join(", "));
            }
        }
    }
    out
}

/// Token-lean view of one transaction for insight prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactTx<'a> {
    pub d: String,
    pub a: String,
    pub t: &'static str,
    pub c: &'a str,
    pub s: &'a str,
    pub n: &'a str,
    pub l: &'a str,
}

/// The first [`INSIGHT_HISTORY_LIMIT`] entries of a newest-first list, compacted.
pub fn compact_history(transactions: &[Transaction]) -> Vec<CompactTx<'_>> {
    transactions
        .iter()
        .take(INSIGHT_HISTORY_LIMIT)
        .map(|t| CompactTx {
            d: t.date.replace('T', " "),
            a: t.amount.normalize().to_string(),
            t: match t.r#type {
                TransactionKind::Expense => "out",
                TransactionKind::Income => "in",
            },
            c: &t.category,
            s: t.sub_category.as_deref().unwrap_or(""),
            n: &t.note,
            l: &t.ledger_id,
        })
        .collect()
}

/// Asks for an insight, degrading any failure to a friendly fallback line.
pub fn ask(provider: &dyn InsightProvider, transactions: &[Transaction], question: Option<&str>) -> String {
    match provider.insight(transactions, question) {
        Ok(answer) if !answer.trim().is_empty() => answer,
        Ok(_) => INSIGHT_FALLBACK.to_string(),
        Err(err) => {
            warn!(error = %err, "insight request failed");
            INSIGHT_FALLBACK.to_string()
        }
    }
}

fn transaction_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "amount": { "type": "NUMBER", "description": "The numeric monetary value." },
            "type": { "type": "STRING", "enum": ["income", "expense"] },
            "category": { "type": "STRING", "description": "Main category name." },
            "subCategory": { "type": "STRING", "description": "Sub-category name, optional." },
            "date": { "type": "STRING", "description": "ISO 8601, YYYY-MM-DDTHH:mm:ss" },
            "note": { "type": "STRING", "description": "Short description of the item." }
        },
        "required": ["amount", "type", "category", "date", "note"]
    })
}

/// Gemini `generateContent` over blocking HTTP.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: Option<String>, model: &str) -> Result<Self, AssistError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AssistError::MissingApiKey)?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    fn generate(&self, body: &Value) -> Result<String, AssistError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(AssistError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let v: Value = resp.json()?;
        let text: String = v
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AssistError::Empty);
        }
        Ok(text)
    }

    fn parse_candidate(&self, parts: Vec<Value>) -> Result<Candidate, AssistError> {
        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": transaction_schema()
            }
        });
        let text = self.generate(&body)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn now_iso() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

impl TransactionParser for GeminiClient {
    fn parse_text(&self, input: &str, catalog: &Categories) -> Result<Candidate, AssistError> {
        let prompt = format!(
            "Current datetime: {now}. Turn this bookkeeping note into structured data: \"{input}\".\n\n\
             {context}\n\
             Rules:\n\
             1. Missing year means the current year; missing date means today or the closest past date.\n\
             2. Missing time means the current time.\n\
             3. If the note matches a Sub-option, set category to its Main category and subCategory to the Sub-option.\n\
             4. Otherwise pick the closest Main category; invent a new name only if nothing fits.\n\
             5. note describes the item or activity and repeats neither date nor amount.\n\
             Output JSON.",
            now = now_iso(),
            input = input,
            context = category_context(catalog),
        );
        self.parse_candidate(vec![json!({ "text": prompt })])
    }

    fn parse_voice(&self, clip: &AudioClip, catalog: &Categories) -> Result<Candidate, AssistError> {
        let prompt = format!(
            "Current datetime: {now}. Listen to this recording and turn the bookkeeping note into structured JSON.\n\n\
             {context}\n\
             Rules:\n\
             1. Missing date means today or the closest past date.\n\
             2. Match the listed Main categories and Sub-options strictly.\n\
             3. note is a short description; ignore filler words.",
            now = now_iso(),
            context = category_context(catalog),
        );
        let mime = if clip.mime_type.is_empty() {
            "audio/webm"
        } else {
            clip.mime_type.as_str()
        };
        self.parse_candidate(vec![
            json!({ "inlineData": { "mimeType": mime, "data": BASE64.encode(&clip.data) } }),
            json!({ "text": prompt }),
        ])
    }
}

impl InsightProvider for GeminiClient {
    fn insight(
        &self,
        transactions: &[Transaction],
        question: Option<&str>,
    ) -> Result<String, AssistError> {
        let history = serde_json::to_string(&compact_history(transactions))?;
        let system = format!(
            "You are the personal finance assistant of a bookkeeping app. Current date: {}.\n\
             Records are a JSON array with d=date, a=amount, t=in/out, c=category, s=sub-category, n=note, l=ledger.\n\
             Answer the user's question from the records: sum 'out' entries for spending questions, \
             find matching notes or categories for item questions. Without a question, give one short, \
             specific saving tip. Be concise and friendly, use emojis, answer in Simplified Chinese.",
            now_iso()
        );
        let prompt = match question.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => format!("Transaction Data: {}\n\nUser Question: \"{}\"", history, q),
            None => format!(
                "Transaction Data: {}\n\nLook at my recent spending and give me one specific tip.",
                history
            ),
        };
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        self.generate(&body)
    }
}
