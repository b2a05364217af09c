// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Process-wide context: the book, the sync coordinator and loaded settings.
//! One `App` lives for the whole process, so the debounce timer spans every
//! command run in a `shell` session.

use crate::assistant::GeminiClient;
use crate::book::Book;
use crate::commands;
use crate::config::{self, Settings};
use crate::db;
use crate::models::LedgerScope;
use crate::sync::remote::{CloudBackend, SupabaseClient};
use crate::sync::{PullOutcome, SyncCoordinator};
use crate::utils::http_client;
use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const CLOUD_TIMEOUT: Duration = Duration::from_secs(15);
const ASSISTANT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct App {
    pub book: Book,
    pub sync: SyncCoordinator,
    pub settings: Settings,
    cloud: Option<Arc<SupabaseClient>>,
}

impl App {
    /// Loads settings and local state, then connects the cloud client if
    /// credentials are stored.
    pub fn open(conn: Connection) -> Result<Self> {
        let mut app = Self::offline(conn)?;
        app.connect_cloud()?;
        Ok(app)
    }

    /// Like [`App::open`] without touching the network.
    pub fn offline(conn: Connection) -> Result<Self> {
        let settings = Settings::load(&conn)?;
        let sync = SyncCoordinator::new(settings.quiet_window);
        Ok(Self {
            book: Book::open(conn),
            sync,
            settings,
            cloud: None,
        })
    }

    pub fn connection(&self) -> &Connection {
        self.book.connection()
    }

    /// (Re)builds the cloud client from stored credentials. Without
    /// credentials the coordinator goes back to unconfigured.
    pub fn connect_cloud(&mut self) -> Result<()> {
        let Some(creds) = config::remote_credentials(self.connection())? else {
            self.disconnect_cloud();
            return Ok(());
        };
        let client = Arc::new(SupabaseClient::new(http_client(CLOUD_TIMEOUT)?, creds));
        client.restore_session(config::remote_session(self.connection())?);
        self.cloud = Some(Arc::clone(&client));
        self.attach_backend(client);
        debug!(state = %self.sync.state(), "cloud client connected");
        Ok(())
    }

    /// Attaches any backend and routes book commits to its upload worker.
    pub fn attach_backend(&mut self, backend: Arc<dyn CloudBackend>) {
        self.sync.attach(backend);
        match self.sync.commit_hook() {
            Some(hook) => self.book.set_commit_hook(hook),
            None => self.book.clear_commit_hook(),
        }
    }

    pub fn disconnect_cloud(&mut self) {
        self.book.clear_commit_hook();
        self.sync.detach();
        self.cloud = None;
    }

    /// Downloads once at startup when enabled and signed in.
    pub fn startup_pull(&mut self) -> PullOutcome {
        if !self.settings.pull_on_start || !self.sync.is_signed_in() {
            return PullOutcome::Skipped;
        }
        let outcome = self.sync.pull(&mut self.book);
        info!(%outcome, "startup download");
        outcome
    }

    /// Stores the client's current session (tokens may have been refreshed).
    pub fn persist_session(&self) -> Result<()> {
        match &self.cloud {
            Some(client) => config::save_remote_session(self.connection(), client.session().as_ref()),
            None => Ok(()),
        }
    }

    /// Active ledger scope, repaired if the stored ledger was deleted.
    pub fn scope(&self) -> LedgerScope {
        self.book.rescope(&self.settings.active_ledger)
    }

    pub fn set_scope(&mut self, scope: LedgerScope) -> Result<()> {
        config::set_active_ledger(self.connection(), &scope)?;
        self.settings.active_ledger = scope;
        Ok(())
    }

    pub fn reload_settings(&mut self) -> Result<()> {
        self.settings = Settings::load(self.connection())?;
        Ok(())
    }

    pub fn assistant(&self) -> Result<GeminiClient> {
        Ok(GeminiClient::new(
            http_client(ASSISTANT_TIMEOUT)?,
            self.settings.assistant_api_key.clone(),
            &self.settings.assistant_model,
        )?)
    }

    /// Sends a pending upload before the process goes away.
    pub fn shutdown(&mut self) -> Result<()> {
        self.sync.flush();
        self.persist_session()
    }

    pub fn dispatch(&mut self, matches: &ArgMatches) -> Result<()> {
        match matches.subcommand() {
            Some(("init", _)) => {
                println!("Database initialized at {}", db::db_path()?.display());
            }
            Some(("tx", sub)) => {
                let scope = self.scope();
                commands::transactions::handle(&mut self.book, &scope, sub)?
            }
            Some(("category", sub)) => commands::categories::handle(&mut self.book, sub)?,
            Some(("ledger", sub)) => commands::ledgers::handle(self, sub)?,
            Some(("budget", sub)) => {
                let scope = self.scope();
                commands::budgets::handle(&mut self.book, &scope, sub)?
            }
            Some(("report", sub)) => commands::reports::handle(&self.book, sub)?,
            Some(("smart", sub)) => {
                let parser = self.assistant()?;
                let scope = self.scope();
                commands::smart::handle(&mut self.book, &parser, &scope, sub)?
            }
            Some(("ask", sub)) => {
                let provider = self.assistant()?;
                commands::ask::handle(&self.book, &provider, sub)?
            }
            Some(("export", sub)) => commands::exporter::handle(&self.book, sub)?,
            Some(("import", sub)) => commands::importer::handle(&mut self.book, sub)?,
            Some(("cloud", sub)) => commands::cloud::handle(self, sub)?,
            Some(("config", sub)) => commands::settings::handle(self, sub)?,
            Some(("shell", _)) => crate::shell::run(self)?,
            _ => {
                crate::cli::build_cli().print_help()?;
                println!();
            }
        }
        Ok(())
    }
}
