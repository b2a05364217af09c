// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::config;
use crate::sync::PullOutcome;
use crate::sync::remote::{RemoteCredentials, SignUpOutcome};
use crate::utils::required;
use anyhow::{Result, anyhow};
use tracing::warn;

pub fn handle(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("configure", sub)) => {
            let creds = RemoteCredentials::new(required(sub, "url")?, required(sub, "key")?);
            if creds.url.is_empty() || creds.key.is_empty() {
                return Err(anyhow!("Both --url and --key are required"));
            }
            config::save_remote_credentials(app.connection(), &creds)?;
            app.connect_cloud()?;
            println!("Cloud configured: {}", app.sync.state());
        }
        Some(("clear", _)) => {
            config::clear_remote_credentials(app.connection())?;
            app.disconnect_cloud();
            println!("Cloud configuration removed");
        }
        Some(("register", sub)) => {
            let outcome = app
                .sync
                .register(required(sub, "email")?, required(sub, "password")?)?;
            app.persist_session()?;
            match outcome {
                SignUpOutcome::SignedIn(user) => {
                    println!("Registered and signed in as {}", user.email.unwrap_or(user.id));
                    report_pull(sync_down(app));
                }
                SignUpOutcome::ConfirmationRequired(user) => println!(
                    "Registered {}; confirm the account from your email, then run `cloud login`",
                    user.email.unwrap_or(user.id)
                ),
            }
        }
        Some(("login", sub)) => {
            let user = app
                .sync
                .login(required(sub, "email")?, required(sub, "password")?)?;
            app.persist_session()?;
            println!("Signed in as {}", user.email.unwrap_or(user.id));
            report_pull(sync_down(app));
        }
        Some(("logout", _)) => {
            if let Err(err) = app.sync.logout() {
                warn!(error = %err, "remote sign-out failed, signed out locally");
            }
            config::save_remote_session(app.connection(), None)?;
            println!("Signed out");
        }
        Some(("status", _)) => {
            println!("Cloud: {}", app.sync.state());
            if let Some(creds) = config::remote_credentials(app.connection())? {
                println!("Project: {}", creds.url);
            }
            println!("Upload delay: {} ms", app.sync.quiet_window().as_millis());
        }
        Some(("sync", _)) => report_pull(sync_down(app)),
        Some(("push", _)) => {
            if !app.sync.is_signed_in() {
                return Err(anyhow!("Not signed in (run `cloud login`)"));
            }
            let snapshot = app.book.get_all_data();
            if app.sync.push_now(&snapshot) {
                println!("Uploaded {} transactions", snapshot.transactions.len());
            } else {
                println!("Upload failed (see log)");
            }
        }
        _ => {}
    }
    Ok(())
}

fn sync_down(app: &mut App) -> PullOutcome {
    let outcome = app.sync.pull(&mut app.book);
    if outcome == PullOutcome::Applied {
        let repaired = app.scope();
        if repaired != app.settings.active_ledger {
            if let Err(err) = app.set_scope(repaired) {
                warn!(error = %err, "could not store repaired ledger scope");
            }
        }
    }
    outcome
}

fn report_pull(outcome: PullOutcome) {
    println!("Sync: {}", outcome);
}
