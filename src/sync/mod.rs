// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Sync coordinator: debounced upload of the whole [`AppData`] document and
//! explicit download-and-apply. Remote state is authoritative on download;
//! uploads overwrite the remote row. There is no merge.

pub mod debounce;
pub mod remote;

use crate::book::{Book, CommitHook};
use crate::models::AppData;
use debounce::UploadWorker;
use remote::{AuthUser, CloudBackend, SignUpOutcome, SyncError};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

pub use debounce::{DEFAULT_QUIET_WINDOW, DebounceTimer, MAX_QUIET_WINDOW, SyncTrigger};

/// Decides what local state becomes after a download.
pub trait ReconcileStrategy: Send + Sync {
    fn reconcile(&self, local: &AppData, remote: AppData) -> AppData;
}

/// Last writer wins: the downloaded document replaces local state wholesale.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoteWins;

impl ReconcileStrategy for RemoteWins {
    fn reconcile(&self, _local: &AppData, remote: AppData) -> AppData {
        remote
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Unconfigured,
    SignedOut,
    SignedIn(AuthUser),
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Unconfigured => f.write_str("unconfigured"),
            SyncState::SignedOut => f.write_str("configured, signed out"),
            SyncState::SignedIn(u) => match &u.email {
                Some(email) => write!(f, "signed in as {}", email),
                None => write!(f, "signed in as {}", u.id),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Not configured or not signed in.
    Skipped,
    /// No remote document exists yet for this account.
    NothingToApply,
    Applied,
    Failed,
}

impl fmt::Display for PullOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PullOutcome::Skipped => "skipped (cloud not configured or not signed in)",
            PullOutcome::NothingToApply => "no cloud data yet",
            PullOutcome::Applied => "applied cloud data",
            PullOutcome::Failed => "failed (see log)",
        })
    }
}

type Identity = Arc<Mutex<Option<AuthUser>>>;

fn identity_guard(identity: &Identity) -> MutexGuard<'_, Option<AuthUser>> {
    identity.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct SyncCoordinator {
    backend: Option<Arc<dyn CloudBackend>>,
    strategy: Box<dyn ReconcileStrategy>,
    identity: Identity,
    quiet_window: Duration,
    worker: Option<UploadWorker>,
}

impl SyncCoordinator {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            backend: None,
            strategy: Box::new(RemoteWins),
            identity: Arc::new(Mutex::new(None)),
            quiet_window,
            worker: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ReconcileStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn quiet_window(&self) -> Duration {
        self.quiet_window
    }

    /// Connects a backend (Unconfigured -> SignedOut) and picks up any
    /// session it already carries (-> SignedIn). A pending upload goes to
    /// the previous backend first.
    pub fn attach(&mut self, backend: Arc<dyn CloudBackend>) {
        self.flush();
        self.detach();
        let worker_backend = Arc::clone(&backend);
        let identity = Arc::clone(&self.identity);
        let worker = UploadWorker::spawn(self.quiet_window, move |snapshot| {
            let user = identity_guard(&identity).clone();
            upload(worker_backend.as_ref(), user.as_ref(), snapshot);
        });
        match worker {
            Ok(w) => self.worker = Some(w),
            Err(err) => warn!(error = %err, "could not start sync worker, auto upload disabled"),
        }
        self.backend = Some(backend);
        self.refresh_state();
    }

    /// Back to Unconfigured. A pending upload is dropped.
    pub fn detach(&mut self) {
        self.worker = None;
        self.backend = None;
        *identity_guard(&self.identity) = None;
    }

    pub fn backend(&self) -> Option<&Arc<dyn CloudBackend>> {
        self.backend.as_ref()
    }

    pub fn state(&self) -> SyncState {
        if self.backend.is_none() {
            return SyncState::Unconfigured;
        }
        match identity_guard(&self.identity).clone() {
            Some(user) => SyncState::SignedIn(user),
            None => SyncState::SignedOut,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state(), SyncState::SignedIn(_))
    }

    /// Asks the backend who is signed in. Errors leave the coordinator signed out.
    pub fn refresh_state(&mut self) -> SyncState {
        let user = match &self.backend {
            None => None,
            Some(backend) => match backend.current_user() {
                Ok(user) => user,
                Err(err) => {
                    warn!(error = %err, "could not resolve current user");
                    None
                }
            },
        };
        *identity_guard(&self.identity) = user;
        self.state()
    }

    fn require_backend(&self) -> Result<&Arc<dyn CloudBackend>, SyncError> {
        self.backend.as_ref().ok_or(SyncError::NotConfigured)
    }

    pub fn register(&mut self, email: &str, password: &str) -> Result<SignUpOutcome, SyncError> {
        let outcome = self.require_backend()?.sign_up(email, password)?;
        if let SignUpOutcome::SignedIn(user) = &outcome {
            *identity_guard(&self.identity) = Some(user.clone());
        }
        Ok(outcome)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<AuthUser, SyncError> {
        let user = self.require_backend()?.sign_in(email, password)?;
        *identity_guard(&self.identity) = Some(user.clone());
        Ok(user)
    }

    /// Signs out locally even when the remote call fails.
    pub fn logout(&mut self) -> Result<(), SyncError> {
        let res = match &self.backend {
            Some(backend) => backend.sign_out(),
            None => Ok(()),
        };
        *identity_guard(&self.identity) = None;
        res
    }

    /// Hook to install on the [`Book`] so every commit schedules an upload.
    pub fn commit_hook(&self) -> Option<Box<dyn CommitHook>> {
        self.worker
            .as_ref()
            .map(|w| Box::new(w.trigger()) as Box<dyn CommitHook>)
    }

    /// Uploads `snapshot` immediately, bypassing the debounce. Returns whether
    /// the remote row was written.
    pub fn push_now(&self, snapshot: &AppData) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };
        let user = identity_guard(&self.identity).clone();
        upload(backend.as_ref(), user.as_ref(), snapshot)
    }

    /// Sends any pending debounced upload now and waits for it.
    pub fn flush(&self) {
        if let Some(worker) = &self.worker {
            worker.flush();
        }
    }

    /// Downloads the remote document and, if present, replaces local state with it.
    pub fn pull(&self, book: &mut Book) -> PullOutcome {
        let Some(backend) = &self.backend else {
            return PullOutcome::Skipped;
        };
        let Some(user) = identity_guard(&self.identity).clone() else {
            return PullOutcome::Skipped;
        };
        match backend.fetch_document(&user.id) {
            Ok(None) => {
                debug!(user = %user.id, "no remote document yet");
                PullOutcome::NothingToApply
            }
            Ok(Some(remote)) => {
                let next = self.strategy.reconcile(book.store().data(), remote);
                book.restore_applied(next);
                info!(user = %user.id, "applied remote document");
                PullOutcome::Applied
            }
            Err(err) => {
                warn!(user = %user.id, error = %err, "download failed");
                PullOutcome::Failed
            }
        }
    }
}

fn upload(backend: &dyn CloudBackend, user: Option<&AuthUser>, snapshot: &AppData) -> bool {
    let Some(user) = user else {
        debug!("not signed in, skipping upload");
        return false;
    };
    match backend.upsert_document(&user.id, snapshot) {
        Ok(()) => {
            info!(user = %user.id, transactions = snapshot.transactions.len(), "uploaded snapshot");
            true
        }
        Err(err) => {
            warn!(user = %user.id, error = %err, "upload failed");
            false
        }
    }
}
