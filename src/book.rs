// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The mutation API. Every change to transactions, categories, ledgers or the
//! budget goes through [`Book`]; a successful change is persisted and then
//! announced to the commit hook.

use crate::models::{
    AppData, CategoryItem, Ledger, LedgerScope, Transaction, TransactionFormData, TransactionKind,
};
use crate::store::{Entity, EntityStore};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Invalid amount '{0}': expected a number greater than zero")]
    InvalidAmount(String),
    #[error("Invalid budget '{0}': expected a number of zero or more")]
    InvalidBudget(String),
    #[error("At least one ledger must remain")]
    LastLedger,
    #[error("The default ledger '{0}' cannot be deleted")]
    DefaultLedger(String),
    #[error("Category '{0}' already exists")]
    DuplicateCategory(String),
    #[error("Parent category '{0}' not found")]
    UnknownParent(String),
    #[error("Category '{0}' would nest deeper than two levels")]
    TooDeep(String),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Import file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Import file must contain a JSON array of transactions")]
    NotAnArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Receives the full state after every successful mutation.
pub trait CommitHook {
    fn on_commit(&self, snapshot: &AppData);
}

pub struct Book {
    store: EntityStore,
    hook: Option<Box<dyn CommitHook>>,
}

impl Book {
    pub fn open(conn: Connection) -> Self {
        Self::from_store(EntityStore::open(conn))
    }

    pub fn from_store(store: EntityStore) -> Self {
        Self { store, hook: None }
    }

    pub fn set_commit_hook(&mut self, hook: Box<dyn CommitHook>) {
        self.hook = Some(hook);
    }

    pub fn clear_commit_hook(&mut self) {
        self.hook = None;
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn connection(&self) -> &Connection {
        self.store.connection()
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.store.transactions()
    }

    pub fn budget(&self) -> Decimal {
        self.store.budget()
    }

    pub fn categories(&self) -> &crate::models::Categories {
        self.store.categories()
    }

    pub fn ledgers(&self) -> &[Ledger] {
        self.store.ledgers()
    }

    pub fn find_transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions().iter().find(|t| t.id == id)
    }

    fn commit(&mut self, entities: &[Entity]) {
        for e in entities {
            self.store.persist(*e);
        }
        if let Some(hook) = &self.hook {
            hook.on_commit(&self.store.snapshot());
        }
    }

    // --- transactions ---

    /// Validates the form and prepends a new record (newest first).
    pub fn create_transaction(
        &mut self,
        form: &TransactionFormData,
    ) -> Result<Transaction, Rejection> {
        let amount = parse_amount(&form.amount)?;
        let tx = Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            amount,
            r#type: form.r#type,
            category: form.category.clone(),
            sub_category: form.sub_category.clone(),
            date: form.date.clone(),
            note: form.note.clone(),
            ledger_id: form.ledger_id.clone(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        self.store.data_mut().transactions.insert(0, tx.clone());
        self.commit(&[Entity::Transactions]);
        Ok(tx)
    }

    /// Replaces every mutable field of the matching record; `id` and
    /// `createdAt` are kept. An unknown id is not an error.
    pub fn update_transaction(
        &mut self,
        id: &str,
        form: &TransactionFormData,
    ) -> Result<(), Rejection> {
        let amount = parse_amount(&form.amount)?;
        let Some(tx) = self
            .store
            .data_mut()
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
        else {
            return Ok(());
        };
        tx.amount = amount;
        tx.r#type = form.r#type;
        tx.category = form.category.clone();
        tx.sub_category = form.sub_category.clone();
        tx.date = form.date.clone();
        tx.note = form.note.clone();
        tx.ledger_id = form.ledger_id.clone();
        self.commit(&[Entity::Transactions]);
        Ok(())
    }

    /// Returns whether a record was removed.
    pub fn delete_transaction(&mut self, id: &str) -> bool {
        let list = &mut self.store.data_mut().transactions;
        let before = list.len();
        list.retain(|t| t.id != id);
        let removed = list.len() != before;
        if removed {
            self.commit(&[Entity::Transactions]);
        }
        removed
    }

    /// Replaces the transaction list wholesale.
    pub fn replace_transactions(&mut self, transactions: Vec<Transaction>) {
        self.store.data_mut().transactions = transactions;
        self.commit(&[Entity::Transactions]);
    }

    /// Imports a JSON array of transactions, replacing the current list.
    /// Records that do not describe a transaction are skipped.
    pub fn import_transactions(&mut self, raw: &str) -> Result<ImportReport, ImportError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let serde_json::Value::Array(items) = value else {
            return Err(ImportError::NotAnArray);
        };
        let total = items.len();
        let transactions: Vec<Transaction> = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value(item) {
                Ok(t) => Some(t),
                Err(err) => {
                    warn!(index = i, error = %err, "skipping unreadable import record");
                    None
                }
            })
            .collect();
        let report = ImportReport {
            imported: transactions.len(),
            skipped: total - transactions.len(),
        };
        self.replace_transactions(transactions);
        info!(imported = report.imported, skipped = report.skipped, "imported transactions");
        Ok(report)
    }

    pub fn export_transactions(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self.transactions())
    }

    // --- categories ---

    /// Adds a root category to its type's tree, or a child under `parent`.
    /// Children take the parent's type and may not carry children themselves.
    pub fn add_category(
        &mut self,
        mut item: CategoryItem,
        parent: Option<&str>,
    ) -> Result<(), Rejection> {
        let kind = item.r#type;
        let list = self.store.data_mut().categories.list_mut(kind);
        match parent {
            Some(parent_name) => {
                if !item.children().is_empty() {
                    return Err(Rejection::TooDeep(item.name));
                }
                let parent = list
                    .iter_mut()
                    .find(|c| c.name == parent_name)
                    .ok_or_else(|| Rejection::UnknownParent(parent_name.to_string()))?;
                if parent.children().iter().any(|c| c.name == item.name) {
                    return Err(Rejection::DuplicateCategory(item.name));
                }
                item.r#type = parent.r#type;
                item.children = None;
                parent.children.get_or_insert_with(Vec::new).push(item);
            }
            None => {
                if item.children().iter().any(|c| !c.children().is_empty()) {
                    return Err(Rejection::TooDeep(item.name));
                }
                if list.iter().any(|c| c.name == item.name) {
                    return Err(Rejection::DuplicateCategory(item.name));
                }
                if let Some(children) = item.children.as_mut() {
                    for c in children.iter_mut() {
                        c.r#type = kind;
                    }
                }
                list.push(item);
            }
        }
        self.commit(&[Entity::Categories]);
        Ok(())
    }

    /// Removes the first root of `kind` named `name`. Transactions keep their
    /// category text.
    pub fn delete_category(&mut self, kind: TransactionKind, name: &str) -> bool {
        let list = self.store.data_mut().categories.list_mut(kind);
        let Some(pos) = list.iter().position(|c| c.name == name) else {
            return false;
        };
        list.remove(pos);
        self.commit(&[Entity::Categories]);
        true
    }

    pub fn delete_subcategory(&mut self, kind: TransactionKind, parent: &str, name: &str) -> bool {
        let list = self.store.data_mut().categories.list_mut(kind);
        let Some(children) = list
            .iter_mut()
            .find(|c| c.name == parent)
            .and_then(|p| p.children.as_mut())
        else {
            return false;
        };
        let Some(pos) = children.iter().position(|c| c.name == name) else {
            return false;
        };
        children.remove(pos);
        self.commit(&[Entity::Categories]);
        true
    }

    // --- ledgers ---

    /// Upsert by id: an existing ledger is replaced in place, a new one appended.
    pub fn save_ledger(&mut self, ledger: Ledger) {
        let list = &mut self.store.data_mut().ledgers;
        match list.iter_mut().find(|l| l.id == ledger.id) {
            Some(slot) => *slot = ledger,
            None => list.push(ledger),
        }
        self.commit(&[Entity::Ledgers]);
    }

    pub fn create_ledger(&mut self, name: &str, icon: &str) -> Ledger {
        let ledger = Ledger {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            is_default: false,
        };
        self.save_ledger(ledger.clone());
        ledger
    }

    /// Removes a ledger unless it is the last one or the default one. Its
    /// transactions are kept and still reference the removed id. Returns
    /// whether a ledger was removed.
    pub fn delete_ledger(&mut self, id: &str) -> Result<bool, Rejection> {
        let list = &mut self.store.data_mut().ledgers;
        if list.len() <= 1 {
            warn!(ledger = id, "refusing to delete the last remaining ledger");
            return Err(Rejection::LastLedger);
        }
        if list.iter().any(|l| l.id == id && l.is_default) {
            warn!(ledger = id, "refusing to delete the default ledger");
            return Err(Rejection::DefaultLedger(id.to_string()));
        }
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if removed {
            self.commit(&[Entity::Ledgers]);
        }
        Ok(removed)
    }

    /// Ledger that new entries go to under `scope`.
    pub fn entry_ledger(&self, scope: &LedgerScope) -> String {
        match scope {
            LedgerScope::Ledger(id) if self.ledgers().iter().any(|l| &l.id == id) => id.clone(),
            _ => self
                .ledgers()
                .first()
                .map(|l| l.id.clone())
                .unwrap_or_else(|| crate::models::DEFAULT_LEDGER_ID.to_string()),
        }
    }

    /// Falls back to the first ledger when `scope` names a ledger that no longer exists.
    pub fn rescope(&self, scope: &LedgerScope) -> LedgerScope {
        match scope {
            LedgerScope::Ledger(id) if !self.ledgers().iter().any(|l| &l.id == id) => self
                .ledgers()
                .first()
                .map(|l| LedgerScope::Ledger(l.id.clone()))
                .unwrap_or(LedgerScope::All),
            other => other.clone(),
        }
    }

    // --- budget ---

    pub fn set_budget(&mut self, raw: &str) -> Result<Decimal, Rejection> {
        let value = parse_number(raw)
            .filter(|v| *v >= Decimal::ZERO)
            .ok_or_else(|| Rejection::InvalidBudget(raw.to_string()))?;
        self.store.data_mut().budget = value;
        self.commit(&[Entity::Budget]);
        Ok(value)
    }

    // --- whole state ---

    pub fn get_all_data(&self) -> AppData {
        self.store.snapshot()
    }

    /// Replaces all four entities wholesale and persists them. Does not fire
    /// the commit hook: applied state is not a local edit.
    /// An empty ledger list is replaced by the default ledger and a negative
    /// budget by zero.
    pub fn restore_applied(&mut self, data: AppData) {
        let target = self.store.data_mut();
        target.transactions = data.transactions;
        target.budget = if data.budget < Decimal::ZERO {
            warn!(budget = %data.budget, "negative budget in applied state, using 0");
            Decimal::ZERO
        } else {
            data.budget
        };
        target.categories = data.categories;
        target.ledgers = if data.ledgers.is_empty() {
            warn!("applied state has no ledgers, restoring the default ledger");
            crate::models::default_ledgers()
        } else {
            data.ledgers
        };
        self.store.persist_all();
    }

    /// User-driven snapshot import: like [`Book::restore_applied`] but counts as an edit.
    pub fn import_snapshot(&mut self, data: AppData) {
        self.restore_applied(data);
        self.commit(&[]);
    }
}

/// Parses a number, accepting plain decimals and anything `f64` reads finitely.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = s.parse::<Decimal>() {
        return Some(d);
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Decimal::from_f64)
}

pub fn parse_amount(raw: &str) -> Result<Decimal, Rejection> {
    parse_number(raw)
        .filter(|d| *d > Decimal::ZERO)
        .ok_or_else(|| Rejection::InvalidAmount(raw.to_string()))
}
