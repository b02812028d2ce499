// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Supabase HTTP client (GoTrue auth + PostgREST).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use super::session_file::SessionFile;
use super::{AuthError, DataStore, FetchError, IdentityProvider};
use crate::models::session::{Session, User};

/// Supabase project client.
///
/// The anon key is stored as a `SecretString` so it stays out of debug output.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: SecretString,
    session_file: Option<SessionFile>,
}

/// GoTrue token grant response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .map(|secs| Utc::now() + TimeDelta::seconds(secs))
            });
        Session {
            user: self.user,
            access_token: SecretString::new(self.access_token),
            refresh_token: SecretString::new(self.refresh_token),
            expires_at,
        }
    }
}

/// Error bodies differ between GoTrue versions and PostgREST; collect every known key.
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    fn text(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

impl SupabaseClient {
    /// Create a client for the project at `base_url` (e.g. `https://xyz.supabase.co`).
    pub fn new(
        base_url: impl Into<String>,
        anon_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            anon_key,
            session_file: None,
        })
    }

    /// Persist sessions to `file` so the next start resolves them.
    pub fn with_session_file(mut self, file: SessionFile) -> Self {
        self.session_file = Some(file);
        self
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, endpoint)
    }

    fn with_keys(&self, request: RequestBuilder, bearer: Option<&SecretString>) -> RequestBuilder {
        let bearer = bearer.unwrap_or(&self.anon_key);
        request
            .header("apikey", self.anon_key.expose_secret())
            .header(
                "Authorization",
                format!("Bearer {}", bearer.expose_secret()),
            )
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Response, AuthError> {
        let response = self
            .with_keys(self.client.post(self.auth_url("token")), None)
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;
        Ok(response)
    }

    async fn fetch_user(&self, access_token: &SecretString) -> Result<User, AuthError> {
        let response = self
            .with_keys(self.client.get(self.auth_url("user")), Some(access_token))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::SessionExpired),
            _ => Err(auth_error(response).await),
        }
    }

    fn persist(&self, session: &Session) {
        if let Some(file) = &self.session_file {
            if let Err(err) = file.save(session) {
                warn!("Could not persist session: {err:#}");
            }
        }
    }

    fn forget(&self) {
        if let Some(file) = &self.session_file {
            if let Err(err) = file.clear() {
                warn!("Could not remove persisted session: {err:#}");
            }
        }
    }

    async fn refresh_or_forget(&self, session: &Session) -> Result<Option<Session>, AuthError> {
        match self.refresh(session).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(AuthError::SessionExpired) => {
                self.forget();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Map a failed GoTrue response onto the auth taxonomy.
async fn auth_error(response: Response) -> AuthError {
    let status = response.status();
    let raw = response.text().await.unwrap_or_default();
    let body = ErrorBody::parse(&raw);

    let code = body.error_code.as_deref().unwrap_or_default();
    let text = body.text().unwrap_or_default();
    if code == "invalid_credentials" || text == "Invalid login credentials" {
        return AuthError::InvalidCredentials;
    }
    if code == "email_not_confirmed" || text == "Email not confirmed" {
        return AuthError::EmailNotConfirmed;
    }

    let message = match body.text() {
        Some(text) => text.to_string(),
        None if !raw.is_empty() => raw,
        None => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };
    AuthError::Provider {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    #[instrument(skip(self))]
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(file) = &self.session_file else {
            return Ok(None);
        };
        let stored = match file.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(None),
            Err(err) => {
                warn!("Ignoring unreadable session file: {err:#}");
                return Ok(None);
            }
        };

        if stored.needs_refresh(Utc::now(), TimeDelta::zero()) {
            debug!("Persisted session expired, refreshing");
            return self.refresh_or_forget(&stored).await;
        }

        match self.fetch_user(&stored.access_token).await {
            Ok(user) => Ok(Some(Session { user, ..stored })),
            Err(AuthError::SessionExpired) => self.refresh_or_forget(&stored).await,
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, email, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }

        let session = response.json::<TokenResponse>().await?.into_session();
        self.persist(&session);
        Ok(session)
    }

    #[instrument(skip(self, email, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let response = self
            .with_keys(self.client.post(self.auth_url("signup")), None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        self.forget();

        let response = self
            .with_keys(
                self.client.post(self.auth_url("logout")),
                Some(&session.access_token),
            )
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            // Token already invalid: nothing left to revoke.
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(auth_error(response).await),
        }
    }

    #[instrument(skip(self, session))]
    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let response = self
            .token_grant(
                "refresh_token",
                json!({ "refresh_token": session.refresh_token.expose_secret() }),
            )
            .await?;

        match response.status() {
            s if s.is_success() => {
                let fresh = response.json::<TokenResponse>().await?.into_session();
                self.persist(&fresh);
                Ok(fresh)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AuthError::SessionExpired)
            }
            _ => Err(auth_error(response).await),
        }
    }

    fn sync_persisted(&self, session: Option<&Session>) {
        match session {
            Some(session) => self.persist(session),
            None => self.forget(),
        }
    }
}

#[async_trait]
impl DataStore for SupabaseClient {
    #[instrument(skip(self, access_token))]
    async fn select(
        &self,
        table: &str,
        access_token: Option<&SecretString>,
    ) -> Result<Vec<Value>, FetchError> {
        let response = self
            .with_keys(
                self.client
                    .get(format!("{}/rest/v1/{}", self.base_url, table)),
                access_token,
            )
            .query(&[("select", "*")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = ErrorBody::parse(&raw)
                .text()
                .map(str::to_string)
                .unwrap_or(raw);
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let rows: Vec<Value> = serde_json::from_slice(&response.bytes().await?)?;
        debug!(rows = rows.len(), "Fetched table rows");
        Ok(rows)
    }
}
