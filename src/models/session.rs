// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Authenticated identity types.

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;
use serde::Deserialize;

/// Account returned by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Short name for greetings: the local part of the email, or the id.
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Provider session with bearer tokens.
#[derive(Clone, Debug)]
pub struct Session {
    pub user: User,
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// True once `now` is within `margin` of the access token expiry.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        self.expires_at.is_some_and(|at| at - margin <= now)
    }
}

/// Token-free view of the session state handed to the UI and subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    /// True only until the first session resolution finishes.
    pub loading: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// Store transition counter at the time the snapshot was taken; higher is newer.
    pub version: u64,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            expires_at: None,
            version: 0,
        }
    }
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Stable identity key used to detect user changes.
    pub fn identity(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            user: User {
                id: "u1".into(),
                email: Some("staff@example.com".into()),
            },
            access_token: SecretString::new("access".into()),
            refresh_token: SecretString::new("refresh".into()),
            expires_at,
        }
    }

    #[test]
    fn display_name_uses_email_local_part() {
        let user = User {
            id: "u1".into(),
            email: Some("maria.silva@example.com".into()),
        };
        assert_eq!(user.display_name(), "maria.silva");

        let anonymous = User {
            id: "u2".into(),
            email: None,
        };
        assert_eq!(anonymous.display_name(), "u2");
    }

    #[test]
    fn needs_refresh_respects_margin() {
        let now = Utc::now();
        let margin = TimeDelta::seconds(60);

        assert!(!session(Some(now + TimeDelta::seconds(600))).needs_refresh(now, margin));
        assert!(session(Some(now + TimeDelta::seconds(30))).needs_refresh(now, margin));
        assert!(!session(None).needs_refresh(now, margin));
    }

    #[test]
    fn default_snapshot_is_loading_and_anonymous() {
        let snapshot = SessionSnapshot::default();
        assert!(snapshot.loading);
        assert!(!snapshot.is_authenticated());
        assert_eq!(snapshot.identity(), None);
    }
}
