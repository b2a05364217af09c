// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use miaoledger::assistant::{AssistError, AudioClip, TransactionParser};
use miaoledger::book::Book;
use miaoledger::db;
use miaoledger::ingest::Candidate;
use miaoledger::models::{AppData, Categories, TransactionFormData, TransactionKind};
use miaoledger::sync::remote::{AuthUser, CloudBackend, SignUpOutcome, SyncError};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

pub fn book() -> Book {
    Book::open(db::open_in_memory().unwrap())
}

pub fn form(amount: &str, category: &str, date: &str, ledger: &str) -> TransactionFormData {
    TransactionFormData {
        amount: amount.to_string(),
        r#type: TransactionKind::Expense,
        category: category.to_string(),
        sub_category: None,
        date: date.to_string(),
        note: String::new(),
        ledger_id: ledger.to_string(),
    }
}

#[derive(Default)]
struct CloudState {
    accounts: HashMap<String, (String, String)>,
    current: Option<AuthUser>,
    documents: HashMap<String, AppData>,
    uploads: Vec<(Instant, String, AppData)>,
    fail_uploads: bool,
}

/// In-process stand-in for the remote: accounts, one document per user and
/// a log of every upload.
#[derive(Default)]
pub struct MemoryCloud {
    state: Mutex<CloudState>,
}

impl MemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        let id = format!("user-{}", email);
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(email.to_string(), (password.to_string(), id));
        self
    }

    pub fn signed_in_as(self, email: &str) -> Self {
        {
            let mut s = self.state.lock().unwrap();
            let (_, id) = s.accounts.get(email).cloned().unwrap();
            s.current = Some(AuthUser {
                id,
                email: Some(email.to_string()),
            });
        }
        self
    }

    pub fn user_id(email: &str) -> String {
        format!("user-{}", email)
    }

    pub fn put_document(&self, user_id: &str, data: AppData) {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(user_id.to_string(), data);
    }

    pub fn document(&self, user_id: &str) -> Option<AppData> {
        self.state.lock().unwrap().documents.get(user_id).cloned()
    }

    pub fn uploads(&self) -> Vec<(Instant, String, AppData)> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.state.lock().unwrap().fail_uploads = fail;
    }
}

impl CloudBackend for MemoryCloud {
    fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, SyncError> {
        let mut s = self.state.lock().unwrap();
        if s.accounts.contains_key(email) {
            return Err(SyncError::Remote {
                status: 422,
                message: "User already registered".into(),
            });
        }
        let id = Self::user_id(email);
        s.accounts
            .insert(email.to_string(), (password.to_string(), id.clone()));
        let user = AuthUser {
            id,
            email: Some(email.to_string()),
        };
        s.current = Some(user.clone());
        Ok(SignUpOutcome::SignedIn(user))
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, SyncError> {
        let mut s = self.state.lock().unwrap();
        match s.accounts.get(email) {
            Some((pw, id)) if pw == password => {
                let user = AuthUser {
                    id: id.clone(),
                    email: Some(email.to_string()),
                };
                s.current = Some(user.clone());
                Ok(user)
            }
            _ => Err(SyncError::Remote {
                status: 400,
                message: "Invalid login credentials".into(),
            }),
        }
    }

    fn sign_out(&self) -> Result<(), SyncError> {
        self.state.lock().unwrap().current = None;
        Ok(())
    }

    fn current_user(&self) -> Result<Option<AuthUser>, SyncError> {
        Ok(self.state.lock().unwrap().current.clone())
    }

    fn fetch_document(&self, user_id: &str) -> Result<Option<AppData>, SyncError> {
        Ok(self.state.lock().unwrap().documents.get(user_id).cloned())
    }

    fn upsert_document(&self, user_id: &str, content: &AppData) -> Result<(), SyncError> {
        let mut s = self.state.lock().unwrap();
        if s.fail_uploads {
            return Err(SyncError::Remote {
                status: 503,
                message: "unavailable".into(),
            });
        }
        s.uploads
            .push((Instant::now(), user_id.to_string(), content.clone()));
        s.documents.insert(user_id.to_string(), content.clone());
        Ok(())
    }
}

/// Parser double replaying queued answers; `None` plays back as a failure.
#[derive(Default)]
pub struct ScriptedParser {
    answers: Mutex<VecDeque<Option<Candidate>>>,
    inputs: Mutex<Vec<String>>,
}

impl ScriptedParser {
    pub fn answering(answers: Vec<Option<Candidate>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    fn next(&self) -> Result<Candidate, AssistError> {
        match self.answers.lock().unwrap().pop_front() {
            Some(Some(c)) => Ok(c),
            _ => Err(AssistError::Empty),
        }
    }
}

impl TransactionParser for ScriptedParser {
    fn parse_text(&self, input: &str, _catalog: &Categories) -> Result<Candidate, AssistError> {
        self.inputs.lock().unwrap().push(input.to_string());
        self.next()
    }

    fn parse_voice(
        &self,
        clip: &AudioClip,
        _catalog: &Categories,
    ) -> Result<Candidate, AssistError> {
        self.inputs
            .lock()
            .unwrap()
            .push(format!("<{} bytes of {}>", clip.data.len(), clip.mime_type));
        self.next()
    }
}
