// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{book, form};
use miaoledger::book::Book;
use miaoledger::models::{DEFAULT_LEDGER_ID, LedgerScope, TransactionKind};
use miaoledger::{cli, commands::transactions};
use rust_decimal::Decimal;

fn setup() -> (Book, String) {
    let mut b = book();
    let l2 = b.create_ledger("旅行", "✈️");
    for i in 1..=3 {
        b.create_transaction(&form("10", "餐饮", &format!("2025-01-0{}", i), DEFAULT_LEDGER_ID))
            .unwrap();
    }
    b.create_transaction(&form("99", "交通", "2025-02-01", &l2.id))
        .unwrap();
    (b, l2.id)
}

fn run(b: &mut Book, scope: &LedgerScope, args: &[&str]) {
    let mut full = vec!["miaoledger", "tx"];
    full.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(full);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        transactions::handle(b, scope, tx_m).unwrap();
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn list_limit_respected() {
    let (b, _) = setup();
    let matches = cli::build_cli().get_matches_from(["miaoledger", "tx", "list", "--limit", "2"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let rows = transactions::query_rows(&b, &LedgerScope::All, list_m);
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].date, "2025-02-01");
            assert_eq!(rows[1].date, "2025-01-03");
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn list_follows_active_scope_unless_overridden() {
    let (b, l2) = setup();
    let scope = LedgerScope::Ledger(DEFAULT_LEDGER_ID.to_string());

    let matches = cli::build_cli().get_matches_from(["miaoledger", "tx", "list"]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    assert_eq!(transactions::query_rows(&b, &scope, list_m).len(), 3);

    let matches =
        cli::build_cli().get_matches_from(["miaoledger", "tx", "list", "--ledger", l2.as_str()]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    let rows = transactions::query_rows(&b, &scope, list_m);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, "交通");
}

#[test]
fn add_goes_to_scoped_ledger() {
    let (mut b, l2) = setup();
    let scope = LedgerScope::Ledger(l2.clone());
    run(
        &mut b,
        &scope,
        &["add", "-a", "15.5", "-c", "餐饮", "--sub", "奶茶", "--date", "2025-03-01", "-t", "expense"],
    );
    let tx = &b.transactions()[0];
    assert_eq!(tx.ledger_id, l2);
    assert_eq!(tx.amount, Decimal::new(155, 1));
    assert_eq!(tx.sub_category.as_deref(), Some("奶茶"));
    assert_eq!(tx.date, "2025-03-01");
}

#[test]
fn add_rejects_bad_amount() {
    let (mut b, _) = setup();
    let matches = cli::build_cli().get_matches_from(["miaoledger", "tx", "add", "-a", "0", "-c", "餐饮"]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    assert!(transactions::handle(&mut b, &LedgerScope::All, tx_m).is_err());
    assert_eq!(b.transactions().len(), 4);
}

#[test]
fn edit_changes_only_given_fields() {
    let (mut b, _) = setup();
    let id = b.transactions()[0].id.clone();
    run(&mut b, &LedgerScope::All, &["edit", id.as_str(), "-t", "income", "--note", "refund"]);
    let tx = b.find_transaction(&id).unwrap();
    assert_eq!(tx.r#type, TransactionKind::Income);
    assert_eq!(tx.note, "refund");
    assert_eq!(tx.amount, Decimal::from(99));
    assert_eq!(tx.category, "交通");
}

#[test]
fn rm_deletes() {
    let (mut b, _) = setup();
    let id = b.transactions()[1].id.clone();
    run(&mut b, &LedgerScope::All, &["rm", id.as_str()]);
    assert!(b.find_transaction(&id).is_none());
    assert_eq!(b.transactions().len(), 3);
}
