// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::assistant::DEFAULT_MODEL;
use crate::models::LedgerScope;
use crate::sync::{DEFAULT_QUIET_WINDOW, MAX_QUIET_WINDOW};
use crate::sync::remote::{RemoteCredentials, Session};
use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use std::time::Duration;

pub const QUIET_WINDOW_KEY: &str = "quiet_window_ms";
pub const PULL_ON_START_KEY: &str = "pull_on_start";
pub const ASSISTANT_MODEL_KEY: &str = "assistant_model";
pub const ASSISTANT_API_KEY_KEY: &str = "assistant_api_key";
pub const ACTIVE_LEDGER_KEY: &str = "active_ledger";
pub const REMOTE_URL_KEY: &str = "remote_url";
pub const REMOTE_KEY_KEY: &str = "remote_key";
pub const REMOTE_SESSION_KEY: &str = "remote_session";

/// Keys `config set` accepts. Credentials and sessions have their own commands.
pub const USER_KEYS: [&str; 5] = [
    QUIET_WINDOW_KEY,
    PULL_ON_START_KEY,
    ASSISTANT_MODEL_KEY,
    ASSISTANT_API_KEY_KEY,
    ACTIVE_LEDGER_KEY,
];

pub const QUIET_WINDOW_ENV: &str = "MIAOLEDGER_QUIET_MS";

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn remove_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key=?1", params![key])?;
    Ok(())
}

pub fn list_settings(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub quiet_window: Duration,
    pub pull_on_start: bool,
    pub assistant_model: String,
    pub assistant_api_key: Option<String>,
    pub active_ledger: LedgerScope,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quiet_window: DEFAULT_QUIET_WINDOW,
            pull_on_start: true,
            assistant_model: DEFAULT_MODEL.to_string(),
            assistant_api_key: None,
            active_ledger: LedgerScope::All,
        }
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Invalid boolean '{}' for {}", other, key)),
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    let ms: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid milliseconds '{}' for {}", raw, key))?;
    let window = Duration::from_millis(ms);
    if window > MAX_QUIET_WINDOW {
        bail!(
            "{} must be at most {} ms, got {}",
            key,
            MAX_QUIET_WINDOW.as_millis(),
            ms
        );
    }
    Ok(window)
}

/// Checks a value before `config set` stores it.
pub fn validate(key: &str, value: &str) -> Result<()> {
    match key {
        QUIET_WINDOW_KEY => parse_millis(key, value).map(|_| ()),
        PULL_ON_START_KEY => parse_bool(key, value).map(|_| ()),
        k if USER_KEYS.contains(&k) => Ok(()),
        other => Err(anyhow!(
            "Unknown setting '{}' (known: {})",
            other,
            USER_KEYS.join(", ")
        )),
    }
}

impl Settings {
    /// Stored settings, then environment overrides.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut s = Settings::default();
        if let Some(v) = get_setting(conn, QUIET_WINDOW_KEY)? {
            s.quiet_window = parse_millis(QUIET_WINDOW_KEY, &v)?;
        }
        if let Some(v) = get_setting(conn, PULL_ON_START_KEY)? {
            s.pull_on_start = parse_bool(PULL_ON_START_KEY, &v)?;
        }
        if let Some(v) = get_setting(conn, ASSISTANT_MODEL_KEY)? {
            s.assistant_model = v;
        }
        s.assistant_api_key = get_setting(conn, ASSISTANT_API_KEY_KEY)?;
        if let Some(v) = get_setting(conn, ACTIVE_LEDGER_KEY)? {
            s.active_ledger = v.parse().unwrap_or_default();
        }

        if let Ok(v) = std::env::var(QUIET_WINDOW_ENV) {
            s.quiet_window = parse_millis(QUIET_WINDOW_ENV, &v)?;
        }
        if let Some(key) = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .find_map(|k| std::env::var(k).ok().filter(|v| !v.trim().is_empty()))
        {
            s.assistant_api_key = Some(key);
        }
        Ok(s)
    }
}

pub fn set_active_ledger(conn: &Connection, scope: &LedgerScope) -> Result<()> {
    set_setting(conn, ACTIVE_LEDGER_KEY, &scope.to_string())
}

pub fn remote_credentials(conn: &Connection) -> Result<Option<RemoteCredentials>> {
    let url = get_setting(conn, REMOTE_URL_KEY)?.filter(|s| !s.is_empty());
    let key = get_setting(conn, REMOTE_KEY_KEY)?.filter(|s| !s.is_empty());
    Ok(match (url, key) {
        (Some(url), Some(key)) => Some(RemoteCredentials::new(&url, &key)),
        _ => None,
    })
}

pub fn save_remote_credentials(conn: &Connection, creds: &RemoteCredentials) -> Result<()> {
    set_setting(conn, REMOTE_URL_KEY, &creds.url)?;
    set_setting(conn, REMOTE_KEY_KEY, &creds.key)?;
    remove_setting(conn, REMOTE_SESSION_KEY)
}

pub fn clear_remote_credentials(conn: &Connection) -> Result<()> {
    for key in [REMOTE_URL_KEY, REMOTE_KEY_KEY, REMOTE_SESSION_KEY] {
        remove_setting(conn, key)?;
    }
    Ok(())
}

/// A stored session that no longer parses is treated as signed out.
pub fn remote_session(conn: &Connection) -> Result<Option<Session>> {
    Ok(get_setting(conn, REMOTE_SESSION_KEY)?.and_then(|raw| serde_json::from_str(&raw).ok()))
}

pub fn save_remote_session(conn: &Connection, session: Option<&Session>) -> Result<()> {
    match session {
        Some(s) => set_setting(conn, REMOTE_SESSION_KEY, &serde_json::to_string(s)?),
        None => remove_setting(conn, REMOTE_SESSION_KEY),
    }
}
