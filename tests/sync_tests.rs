// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{MemoryCloud, book, form};
use miaoledger::models::{AppData, DEFAULT_LEDGER_ID, LedgerScope};
use miaoledger::sync::remote::{CloudBackend, SignUpOutcome};
use miaoledger::sync::{PullOutcome, SyncCoordinator, SyncState};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};

const ALICE: &str = "alice@example.com";

fn coordinator(cloud: &Arc<MemoryCloud>, window: Duration) -> SyncCoordinator {
    let mut sync = SyncCoordinator::new(window);
    sync.attach(Arc::clone(cloud) as Arc<dyn CloudBackend>);
    sync
}

#[test]
fn state_follows_configuration_and_auth() {
    let mut sync = SyncCoordinator::new(Duration::from_millis(50));
    assert_eq!(sync.state(), SyncState::Unconfigured);

    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw"));
    sync.attach(Arc::clone(&cloud) as Arc<dyn CloudBackend>);
    assert_eq!(sync.state(), SyncState::SignedOut);

    assert!(sync.login(ALICE, "wrong").is_err());
    assert_eq!(sync.state(), SyncState::SignedOut);

    let user = sync.login(ALICE, "pw").unwrap();
    assert_eq!(sync.state(), SyncState::SignedIn(user));

    sync.logout().unwrap();
    assert_eq!(sync.state(), SyncState::SignedOut);

    sync.detach();
    assert_eq!(sync.state(), SyncState::Unconfigured);
}

#[test]
fn attach_picks_up_an_existing_session() {
    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw").signed_in_as(ALICE));
    let sync = coordinator(&cloud, Duration::from_millis(50));
    assert!(sync.is_signed_in());
}

#[test]
fn register_signs_in() {
    let cloud = Arc::new(MemoryCloud::new());
    let mut sync = coordinator(&cloud, Duration::from_millis(50));
    let outcome = sync.register("bob@example.com", "pw").unwrap();
    assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
    assert!(sync.is_signed_in());
}

#[test]
fn pull_is_skipped_when_not_signed_in() {
    let mut b = book();
    let sync = SyncCoordinator::new(Duration::from_millis(50));
    assert_eq!(sync.pull(&mut b), PullOutcome::Skipped);

    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw"));
    let sync = coordinator(&cloud, Duration::from_millis(50));
    assert_eq!(sync.pull(&mut b), PullOutcome::Skipped);
}

#[test]
fn pull_without_remote_document_changes_nothing() {
    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw").signed_in_as(ALICE));
    let sync = coordinator(&cloud, Duration::from_millis(50));
    let mut b = book();
    b.create_transaction(&form("5", "餐饮", "2024-01-01", DEFAULT_LEDGER_ID))
        .unwrap();
    let before = b.get_all_data();

    assert_eq!(sync.pull(&mut b), PullOutcome::NothingToApply);
    assert!(b.get_all_data().same_entities(&before));
}

#[test]
fn pull_replaces_local_state_wholesale() {
    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw").signed_in_as(ALICE));

    let mut remote_book = book();
    remote_book
        .create_transaction(&form("42", "交通", "2024-03-01", DEFAULT_LEDGER_ID))
        .unwrap();
    remote_book.set_budget("1500").unwrap();
    let remote: AppData = remote_book.get_all_data();
    cloud.put_document(&MemoryCloud::user_id(ALICE), remote.clone());

    let sync = coordinator(&cloud, Duration::from_millis(50));
    let mut b = book();
    b.create_transaction(&form("1", "餐饮", "2024-01-01", DEFAULT_LEDGER_ID))
        .unwrap();

    assert_eq!(sync.pull(&mut b), PullOutcome::Applied);
    assert!(b.get_all_data().same_entities(&remote));
    assert_eq!(b.budget(), Decimal::from(1500));
    // applied state is not re-uploaded
    sync.flush();
    assert!(cloud.uploads().is_empty());
}

#[test]
fn push_now_is_idempotent() {
    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw").signed_in_as(ALICE));
    let sync = coordinator(&cloud, Duration::from_millis(50));
    let mut b = book();
    b.create_transaction(&form("7", "餐饮", "2024-01-01", DEFAULT_LEDGER_ID))
        .unwrap();
    let snap = b.get_all_data();

    assert!(sync.push_now(&snap));
    assert!(sync.push_now(&snap));
    let doc = cloud.document(&MemoryCloud::user_id(ALICE)).unwrap();
    assert!(doc.same_entities(&snap));
    assert_eq!(cloud.uploads().len(), 2);
}

#[test]
fn uploads_are_dropped_when_signed_out() {
    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw"));
    let sync = coordinator(&cloud, Duration::from_millis(20));
    let mut b = book();
    b.set_commit_hook(sync.commit_hook().unwrap());
    b.create_transaction(&form("7", "餐饮", "2024-01-01", DEFAULT_LEDGER_ID))
        .unwrap();
    sync.flush();
    assert!(!sync.push_now(&b.get_all_data()));
    assert!(cloud.uploads().is_empty());
}

#[test]
fn failed_upload_keeps_local_state() {
    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw").signed_in_as(ALICE));
    cloud.fail_uploads(true);
    let sync = coordinator(&cloud, Duration::from_millis(20));
    let mut b = book();
    b.set_commit_hook(sync.commit_hook().unwrap());
    let tx = b
        .create_transaction(&form("7", "餐饮", "2024-01-01", DEFAULT_LEDGER_ID))
        .unwrap();
    sync.flush();
    assert!(b.find_transaction(&tx.id).is_some());
    assert!(cloud.document(&MemoryCloud::user_id(ALICE)).is_none());
}

#[test]
fn burst_of_edits_uploads_once_after_quiet_window() {
    let window = Duration::from_millis(200);
    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw").signed_in_as(ALICE));
    let sync = coordinator(&cloud, window);
    let mut b = book();
    b.set_commit_hook(sync.commit_hook().unwrap());

    let t0 = Instant::now();
    b.create_transaction(&form("1", "餐饮", "2024-01-01", DEFAULT_LEDGER_ID))
        .unwrap();
    std::thread::sleep(Duration::from_millis(50));
    b.create_transaction(&form("2", "餐饮", "2024-01-02", DEFAULT_LEDGER_ID))
        .unwrap();
    std::thread::sleep(Duration::from_millis(50));
    let last_edit = Instant::now();
    b.create_transaction(&form("3", "餐饮", "2024-01-03", DEFAULT_LEDGER_ID))
        .unwrap();

    std::thread::sleep(window * 4);
    let uploads = cloud.uploads();
    assert_eq!(uploads.len(), 1);
    let (at, user, doc) = &uploads[0];
    assert!(*at >= last_edit + window);
    assert!(*at >= t0 + Duration::from_millis(300));
    assert_eq!(user, &MemoryCloud::user_id(ALICE));
    assert_eq!(doc.transactions.len(), 3);
}

#[test]
fn flush_sends_pending_upload_immediately() {
    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw").signed_in_as(ALICE));
    let sync = coordinator(&cloud, Duration::from_secs(60));
    let mut b = book();
    b.set_commit_hook(sync.commit_hook().unwrap());
    b.create_ledger("旅行", "✈️");
    assert!(cloud.uploads().is_empty());

    sync.flush();
    let uploads = cloud.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].2.ledgers.len(), 2);

    sync.flush();
    assert_eq!(cloud.uploads().len(), 1);
}

#[test]
fn reattaching_sends_pending_upload_to_previous_backend() {
    let first = Arc::new(MemoryCloud::new().with_account(ALICE, "pw").signed_in_as(ALICE));
    let mut sync = coordinator(&first, Duration::from_secs(60));
    let mut b = book();
    b.set_commit_hook(sync.commit_hook().unwrap());
    b.set_budget("750").unwrap();
    assert!(first.uploads().is_empty());

    let second = Arc::new(MemoryCloud::new().with_account(ALICE, "pw"));
    sync.attach(Arc::clone(&second) as Arc<dyn CloudBackend>);

    let uploads = first.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].2.budget, Decimal::from(750));
    assert!(second.uploads().is_empty());
}

#[test]
fn rejected_edit_schedules_nothing() {
    let cloud = Arc::new(MemoryCloud::new().with_account(ALICE, "pw").signed_in_as(ALICE));
    let sync = coordinator(&cloud, Duration::from_secs(60));
    let mut b = book();
    b.set_commit_hook(sync.commit_hook().unwrap());
    assert!(b.delete_ledger(DEFAULT_LEDGER_ID).is_err());
    assert!(b.create_transaction(&form("0", "餐饮", "2024-01-01", DEFAULT_LEDGER_ID)).is_err());
    sync.flush();
    assert!(cloud.uploads().is_empty());
    assert_eq!(b.rescope(&LedgerScope::All), LedgerScope::All);
}
