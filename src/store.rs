// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Entity store: the canonical in-memory copy of the four entities and the
//! load/save primitives against the `kv` table.
//!
//! Reads never fail: a missing or unparseable document yields the documented
//! default. Writes never fail either; errors are logged and the in-memory
//! state is kept.

use crate::models::{AppData, Categories, Ledger, Transaction, default_ledgers};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

pub const TRANSACTIONS_KEY: &str = "miaoledger_transactions";
pub const BUDGET_KEY: &str = "miaoledger_budget";
pub const CATEGORIES_KEY: &str = "miaoledger_categories";
pub const LEDGERS_KEY: &str = "miaoledger_ledgers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Transactions,
    Budget,
    Categories,
    Ledgers,
}

impl Entity {
    pub const ALL: [Entity; 4] = [
        Entity::Transactions,
        Entity::Budget,
        Entity::Categories,
        Entity::Ledgers,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Entity::Transactions => TRANSACTIONS_KEY,
            Entity::Budget => BUDGET_KEY,
            Entity::Categories => CATEGORIES_KEY,
            Entity::Ledgers => LEDGERS_KEY,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct BudgetDoc(#[serde(with = "rust_decimal::serde::float")] Decimal);

pub struct EntityStore {
    conn: Connection,
    data: AppData,
}

impl EntityStore {
    /// Wraps an initialised connection and loads every entity from it.
    pub fn open(conn: Connection) -> Self {
        let data = load_all(&conn);
        Self { conn, data }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut AppData {
        &mut self.data
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.data.transactions
    }

    pub fn budget(&self) -> Decimal {
        self.data.budget
    }

    pub fn categories(&self) -> &Categories {
        &self.data.categories
    }

    pub fn ledgers(&self) -> &[Ledger] {
        &self.data.ledgers
    }

    /// Re-reads every entity from storage, discarding in-memory state.
    pub fn reload(&mut self) {
        self.data = load_all(&self.conn);
    }

    /// Full state stamped with the current time, ready for upload or backup.
    pub fn snapshot(&self) -> AppData {
        let mut snap = self.data.clone();
        snap.last_synced_at = Some(chrono::Utc::now().timestamp_millis());
        snap
    }

    pub fn persist(&self, entity: Entity) {
        let d = &self.data;
        match entity {
            Entity::Transactions => save_doc(&self.conn, entity.key(), &d.transactions),
            Entity::Budget => save_doc(&self.conn, entity.key(), &BudgetDoc(d.budget)),
            Entity::Categories => save_doc(&self.conn, entity.key(), &d.categories),
            Entity::Ledgers => save_doc(&self.conn, entity.key(), &d.ledgers),
        }
    }

    pub fn persist_all(&self) {
        for e in Entity::ALL {
            self.persist(e);
        }
    }
}

pub fn load_all(conn: &Connection) -> AppData {
    AppData {
        transactions: load_transactions(conn),
        budget: load_budget(conn),
        categories: load_categories(conn),
        ledgers: load_ledgers(conn),
        last_synced_at: None,
    }
}

pub fn load_transactions(conn: &Connection) -> Vec<Transaction> {
    load_doc(conn, TRANSACTIONS_KEY).unwrap_or_default()
}

pub fn load_budget(conn: &Connection) -> Decimal {
    match load_doc::<BudgetDoc>(conn, BUDGET_KEY) {
        Some(BudgetDoc(b)) if b >= Decimal::ZERO => b,
        Some(BudgetDoc(b)) => {
            warn!(budget = %b, "stored budget is negative, treating as unset");
            Decimal::ZERO
        }
        None => Decimal::ZERO,
    }
}

pub fn load_categories(conn: &Connection) -> Categories {
    load_doc(conn, CATEGORIES_KEY).unwrap_or_default()
}

pub fn load_ledgers(conn: &Connection) -> Vec<Ledger> {
    match load_doc::<Vec<Ledger>>(conn, LEDGERS_KEY) {
        Some(l) if !l.is_empty() => l,
        _ => default_ledgers(),
    }
}

fn read_raw(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM kv WHERE key=?1", params![key], |r| {
        r.get(0)
    })
    .optional()
}

fn load_doc<T: DeserializeOwned>(conn: &Connection, key: &str) -> Option<T> {
    let raw = match read_raw(conn, key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "failed to read stored document");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!(key, error = %err, "stored document is corrupt, using default");
            None
        }
    }
}

fn save_doc<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(err) => {
            error!(key, error = %err, "failed to serialize document");
            return;
        }
    };
    let res = conn.execute(
        "INSERT INTO kv(key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
        params![key, raw],
    );
    match res {
        Ok(_) => debug!(key, bytes = raw.len(), "saved document"),
        Err(err) => error!(key, error = %err, "failed to save document"),
    }
}
