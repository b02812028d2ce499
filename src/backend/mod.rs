// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Boundary to the hosted backend: identity provider and table queries.
//!
//! The rest of the application only sees the two traits below, so the
//! session store and repository can be exercised against in-memory fakes.

pub mod error;
pub mod session_file;
pub mod supabase;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;

use crate::models::session::Session;

pub use error::{AuthError, FetchError};
pub use supabase::SupabaseClient;

/// Email/password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Session the provider already holds (e.g. persisted from a previous run).
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Create an account. Confirmation happens out of band, so no session is returned.
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;

    /// Exchange the refresh token for a new session.
    async fn refresh(&self, session: &Session) -> Result<Session, AuthError>;

    /// Overwrite any locally persisted session with `session` (or remove it).
    fn sync_persisted(&self, _session: Option<&Session>) {}
}

/// Read-only table access: `select * from <table>` with no filter or ordering.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(
        &self,
        table: &str,
        access_token: Option<&SecretString>,
    ) -> Result<Vec<Value>, FetchError>;
}
