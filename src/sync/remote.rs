// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::AppData;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::{Mutex, MutexGuard, RwLock};
use thiserror::Error;
use tracing::{debug, info};

/// Table holding one `{ id, content, updated_at }` row per user.
pub const DOCUMENT_TABLE: &str = "user_data";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Cloud sync is not configured")]
    NotConfigured,
    #[error("Not signed in")]
    NotSignedIn,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },
    #[error("Malformed remote payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The stored row. `content` is the whole [`AppData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: String,
    pub content: AppData,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(AuthUser),
    /// The account exists but must be confirmed before it can sign in.
    ConfirmationRequired(AuthUser),
}

/// Auth plus single-document storage. Writes are upserts keyed by user id.
pub trait CloudBackend: Send + Sync {
    fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, SyncError>;
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, SyncError>;
    fn sign_out(&self) -> Result<(), SyncError>;
    fn current_user(&self) -> Result<Option<AuthUser>, SyncError>;
    fn fetch_document(&self, user_id: &str) -> Result<Option<AppData>, SyncError>;
    fn upsert_document(&self, user_id: &str, content: &AppData) -> Result<(), SyncError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub url: String,
    pub key: String,
}

impl RemoteCredentials {
    pub fn new(url: &str, key: &str) -> Self {
        Self {
            url: url.trim().trim_end_matches('/').to_string(),
            key: key.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Supabase-compatible REST client (`/auth/v1`, `/rest/v1`).
pub struct SupabaseClient {
    http: Client,
    creds: RwLock<RemoteCredentials>,
    session: Mutex<Option<Session>>,
}

impl SupabaseClient {
    pub fn new(http: Client, creds: RemoteCredentials) -> Self {
        Self {
            http,
            creds: RwLock::new(creds),
            session: Mutex::new(None),
        }
    }

    /// Points the client at another project. Any session is dropped.
    pub fn reconfigure(&self, url: &str, key: &str) {
        *self.creds.write().unwrap_or_else(|e| e.into_inner()) = RemoteCredentials::new(url, key);
        *self.session_guard() = None;
    }

    pub fn credentials(&self) -> RemoteCredentials {
        self.creds.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.session_guard().clone()
    }

    pub fn restore_session(&self, session: Option<Session>) {
        *self.session_guard() = session;
    }

    fn session_guard(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let creds = self.credentials();
        self.http
            .request(method, format!("{}{}", creds.url, path))
            .header("apikey", creds.key)
    }

    fn authed(&self, method: reqwest::Method, path: &str) -> Result<RequestBuilder, SyncError> {
        let token = self
            .session_guard()
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(SyncError::NotSignedIn)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    fn password_grant(&self, email: &str, password: &str) -> Result<Session, SyncError> {
        let resp = self
            .request(reqwest::Method::POST, "/auth/v1/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }))
            .send()?;
        let body: Value = check(resp)?.json()?;
        session_from(&body).ok_or_else(|| malformed("token response without session"))
    }

    fn refresh(&self) -> Result<Option<Session>, SyncError> {
        let Some(refresh_token) = self.session_guard().as_ref().and_then(|s| s.refresh_token.clone())
        else {
            return Ok(None);
        };
        let resp = self
            .request(reqwest::Method::POST, "/auth/v1/token?grant_type=refresh_token")
            .json(&json!({ "refresh_token": refresh_token }))
            .send()?;
        if is_auth_failure(resp.status()) {
            return Ok(None);
        }
        let body: Value = check(resp)?.json()?;
        let session = session_from(&body);
        if session.is_some() {
            debug!("refreshed remote session");
        }
        Ok(session)
    }
}

impl CloudBackend for SupabaseClient {
    fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, SyncError> {
        let resp = self
            .request(reqwest::Method::POST, "/auth/v1/signup")
            .json(&json!({ "email": email, "password": password }))
            .send()?;
        let body: Value = check(resp)?.json()?;
        if let Some(session) = session_from(&body) {
            let user = session.user.clone();
            *self.session_guard() = Some(session);
            info!(user = %user.id, "registered and signed in");
            return Ok(SignUpOutcome::SignedIn(user));
        }
        let user_value = body.get("user").unwrap_or(&body);
        let user: AuthUser = serde_json::from_value(user_value.clone())?;
        Ok(SignUpOutcome::ConfirmationRequired(user))
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, SyncError> {
        let session = self.password_grant(email, password)?;
        let user = session.user.clone();
        *self.session_guard() = Some(session);
        info!(user = %user.id, "signed in");
        Ok(user)
    }

    fn sign_out(&self) -> Result<(), SyncError> {
        let req = match self.authed(reqwest::Method::POST, "/auth/v1/logout") {
            Ok(req) => req,
            Err(SyncError::NotSignedIn) => return Ok(()),
            Err(err) => return Err(err),
        };
        // The local session is dropped even when the server call fails.
        *self.session_guard() = None;
        let resp = req.send()?;
        if !is_auth_failure(resp.status()) {
            check(resp)?;
        }
        Ok(())
    }

    fn current_user(&self) -> Result<Option<AuthUser>, SyncError> {
        if self.session_guard().is_none() {
            return Ok(None);
        }
        let resp = self.authed(reqwest::Method::GET, "/auth/v1/user")?.send()?;
        if is_auth_failure(resp.status()) {
            let refreshed = self.refresh()?;
            let user = refreshed.as_ref().map(|s| s.user.clone());
            *self.session_guard() = refreshed;
            return Ok(user);
        }
        let user: AuthUser = check(resp)?.json()?;
        Ok(Some(user))
    }

    fn fetch_document(&self, user_id: &str) -> Result<Option<AppData>, SyncError> {
        let path = format!("/rest/v1/{DOCUMENT_TABLE}?id=eq.{user_id}&select=content");
        let resp = self.authed(reqwest::Method::GET, &path)?.send()?;
        let rows: Vec<Value> = check(resp)?.json()?;
        match rows.into_iter().next().and_then(|mut r| r.get_mut("content").map(Value::take)) {
            None | Some(Value::Null) => Ok(None),
            Some(content) => Ok(Some(serde_json::from_value(content)?)),
        }
    }

    fn upsert_document(&self, user_id: &str, content: &AppData) -> Result<(), SyncError> {
        let doc = RemoteDocument {
            id: user_id.to_string(),
            content: content.clone(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        let resp = self
            .authed(reqwest::Method::POST, &format!("/rest/v1/{DOCUMENT_TABLE}"))?
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[doc])
            .send()?;
        check(resp)?;
        Ok(())
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn check(resp: Response) -> Result<Response, SyncError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or(body);
    Err(SyncError::Remote {
        status: status.as_u16(),
        message,
    })
}

fn session_from(body: &Value) -> Option<Session> {
    let access_token = body.get("access_token")?.as_str()?.to_string();
    let refresh_token = body
        .get("refresh_token")
        .and_then(Value::as_str)
        .map(str::to_string);
    let user: AuthUser = serde_json::from_value(body.get("user")?.clone()).ok()?;
    Some(Session {
        access_token,
        refresh_token,
        user,
    })
}

fn malformed(what: &str) -> SyncError {
    SyncError::Remote {
        status: 200,
        message: what.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_trimmed() {
        let c = RemoteCredentials::new(" https://x.supabase.co/ ", " key ");
        assert_eq!(c.url, "https://x.supabase.co");
        assert_eq!(c.key, "key");
    }

    #[test]
    fn session_parsed_from_token_response() {
        let body = json!({
            "access_token": "a",
            "refresh_token": "r",
            "user": { "id": "u1", "email": "cat@example.com", "role": "authenticated" }
        });
        let s = session_from(&body).unwrap();
        assert_eq!(s.user.id, "u1");
        assert_eq!(s.refresh_token.as_deref(), Some("r"));
        assert!(session_from(&json!({ "id": "u1" })).is_none());
    }
}
