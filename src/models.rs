// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category used when a parsed candidate carries no category at all.
pub const FALLBACK_CATEGORY: &str = "其他";

pub const DEFAULT_LEDGER_ID: &str = "default_1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "in" => Ok(TransactionKind::Income),
            "expense" | "out" => Ok(TransactionKind::Expense),
            other => Err(format!("Unknown transaction type '{}' (use income|expense)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryItem {
    pub icon: String,
    pub name: String,
    pub r#type: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<CategoryItem>>,
}

impl CategoryItem {
    pub fn new(icon: &str, name: &str, r#type: TransactionKind) -> Self {
        Self {
            icon: icon.to_string(),
            name: name.to_string(),
            r#type,
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<CategoryItem>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn children(&self) -> &[CategoryItem] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// The two category trees. Each root may hold one level of children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categories {
    pub expense: Vec<CategoryItem>,
    pub income: Vec<CategoryItem>,
}

impl Categories {
    pub fn list(&self, kind: TransactionKind) -> &[CategoryItem] {
        match kind {
            TransactionKind::Expense => &self.expense,
            TransactionKind::Income => &self.income,
        }
    }

    pub fn list_mut(&mut self, kind: TransactionKind) -> &mut Vec<CategoryItem> {
        match kind {
            TransactionKind::Expense => &mut self.expense,
            TransactionKind::Income => &mut self.income,
        }
    }

    pub fn find_root(&self, kind: TransactionKind, name: &str) -> Option<&CategoryItem> {
        self.list(kind).iter().find(|c| c.name == name)
    }
}

impl Default for Categories {
    fn default() -> Self {
        use TransactionKind::{Expense, Income};
        let leaf = |icon: &str, name: &str| CategoryItem::new(icon, name, Expense);
        Self {
            expense: vec![
                CategoryItem::new("🍛", "餐饮", Expense).with_children(vec![
                    leaf("🍔", "快餐"),
                    leaf("🍢", "烧烤"),
                    leaf("🥘", "火锅"),
                    leaf("🧋", "奶茶"),
                    leaf("☕", "咖啡"),
                    leaf("🍹", "饮品"),
                    leaf("🍰", "甜品"),
                    leaf("🍎", "水果"),
                    leaf("🍿", "零食"),
                    leaf("🥦", "买菜"),
                ]),
                CategoryItem::new("🚕", "交通", Expense)
                    .with_children(vec![leaf("🚇", "地铁"), leaf("🚕", "打车")]),
                CategoryItem::new("🛍️", "购物", Expense).with_children(vec![
                    leaf("👗", "服饰"),
                    leaf("💄", "美妆"),
                    leaf("🏠", "日用"),
                ]),
                CategoryItem::new("🎬", "娱乐", Expense),
                CategoryItem::new("🏠", "居住", Expense),
                CategoryItem::new("💊", "医疗", Expense),
                CategoryItem::new("📚", "学习", Expense),
                CategoryItem::new("🐾", "宠物", Expense),
                CategoryItem::new("🧧", "红包", Expense),
                CategoryItem::new("🔧", FALLBACK_CATEGORY, Expense),
            ],
            income: vec![
                CategoryItem::new("💰", "工资", Income),
                CategoryItem::new("📈", "理财", Income),
                CategoryItem::new("🤝", "兼职", Income),
                CategoryItem::new("🎁", "礼金", Income),
                CategoryItem::new("🪙", FALLBACK_CATEGORY, Income),
            ],
        }
    }
}

pub fn default_ledgers() -> Vec<Ledger> {
    vec![Ledger {
        id: DEFAULT_LEDGER_ID.to_string(),
        name: "日常账本".to_string(),
        icon: "📒".to_string(),
        is_default: true,
    }]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub r#type: TransactionKind,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    pub date: String, // YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS
    #[serde(default)]
    pub note: String,
    pub ledger_id: String,
    pub created_at: i64, // unix millis
}

impl Transaction {
    /// Calendar-day part of `date`, ignoring any time component.
    pub fn day(&self) -> &str {
        date_part(&self.date)
    }
}

pub fn date_part(date: &str) -> &str {
    let end = date.find(['T', ' ']).unwrap_or(date.len());
    &date[..end]
}

/// Unvalidated form input; `amount` is still text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFormData {
    pub amount: String,
    pub r#type: TransactionKind,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    pub date: String,
    #[serde(default)]
    pub note: String,
    pub ledger_id: String,
}

/// The whole local state as one document. Unit of cloud sync and of snapshot backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub transactions: Vec<Transaction>,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget: Decimal,
    pub categories: Categories,
    pub ledgers: Vec<Ledger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<i64>,
}

impl AppData {
    /// Equality over the four entities, ignoring the sync stamp.
    pub fn same_entities(&self, other: &AppData) -> bool {
        self.transactions == other.transactions
            && self.budget == other.budget
            && self.categories == other.categories
            && self.ledgers == other.ledgers
    }
}

/// Which ledger a view is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LedgerScope {
    #[default]
    All,
    Ledger(String),
}

impl LedgerScope {
    pub fn matches(&self, ledger_id: &str) -> bool {
        match self {
            LedgerScope::All => true,
            LedgerScope::Ledger(id) => id == ledger_id,
        }
    }
}

impl fmt::Display for LedgerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerScope::All => f.write_str("all"),
            LedgerScope::Ledger(id) => f.write_str(id),
        }
    }
}

impl FromStr for LedgerScope {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "all" {
            Ok(LedgerScope::All)
        } else {
            Ok(LedgerScope::Ledger(s.to_string()))
        }
    }
}
