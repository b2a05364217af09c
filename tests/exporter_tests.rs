// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{book, form};
use miaoledger::book::Book;
use miaoledger::models::{AppData, DEFAULT_LEDGER_ID};
use miaoledger::{cli, commands::exporter};
use serde_json::json;
use tempfile::tempdir;

fn run(b: &Book, args: &[&str]) -> anyhow::Result<()> {
    let mut full = vec!["miaoledger", "export"];
    full.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(full);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(b, export_m)
    } else {
        panic!("no export subcommand");
    }
}

fn sample() -> Book {
    let mut b = book();
    let mut f = form("12.34", "餐饮", "2025-01-02", DEFAULT_LEDGER_ID);
    f.note = "Weekly run".into();
    f.sub_category = Some("买菜".into());
    b.create_transaction(&f).unwrap();
    b
}

#[test]
fn export_transactions_streams_pretty_json() {
    let b = sample();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    run(&b, &["transactions", "--format", "json", "--out", out_str.as_str()]).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let t = &b.transactions()[0];
    assert_eq!(
        parsed,
        json!([
            {
                "id": t.id,
                "amount": 12.34,
                "type": "expense",
                "category": "餐饮",
                "subCategory": "买菜",
                "date": "2025-01-02",
                "note": "Weekly run",
                "ledgerId": "default_1",
                "createdAt": t.created_at
            }
        ])
    );
}

#[test]
fn export_transactions_as_csv() {
    let b = sample();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    run(&b, &["transactions", "--format", "CSV", "--out", out_str.as_str()]).unwrap();

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[3], "amount");
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][3], "12.34");
    assert_eq!(&rows[0][5], "买菜");
}

#[test]
fn export_transactions_rejects_unknown_format() {
    let b = sample();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");
    let out_str = out_path.to_string_lossy().to_string();

    assert!(run(&b, &["transactions", "--format", "xml", "--out", out_str.as_str()]).is_err());
    assert!(!out_path.exists());
}

#[test]
fn export_snapshot_writes_whole_state() {
    let mut b = sample();
    b.set_budget("3000").unwrap();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("snapshot.json");
    let out_str = out_path.to_string_lossy().to_string();

    run(&b, &["snapshot", "--out", out_str.as_str()]).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let snap: AppData = serde_json::from_str(&contents).unwrap();
    assert!(snap.same_entities(&b.get_all_data()));
    assert!(snap.last_synced_at.is_some());
}
