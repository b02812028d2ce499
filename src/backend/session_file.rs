// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! On-disk persistence of the provider session between runs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::models::session::{Session, User};

#[derive(Serialize, Deserialize)]
struct StoredSession {
    user_id: String,
    email: Option<String>,
    access_token: String,
    refresh_token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// JSON file holding the last session, readable only by the owner on Unix.
#[derive(Clone, Debug)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, `None` when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {:?}", self.path))?;
        let stored: StoredSession = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse session file: {:?}", self.path))?;

        Ok(Some(Session {
            user: User {
                id: stored.user_id,
                email: stored.email,
            },
            access_token: SecretString::new(stored.access_token),
            refresh_token: SecretString::new(stored.refresh_token),
            expires_at: stored.expires_at,
        }))
    }

    /// Overwrite the file with `session`, creating parent directories.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let stored = StoredSession {
            user_id: session.user.id.clone(),
            email: session.user.email.clone(),
            access_token: session.access_token.expose_secret().clone(),
            refresh_token: session.refresh_token.expose_secret().clone(),
            expires_at: session.expires_at,
        };
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file: {:?}", self.path))?;
        restrict_permissions(&self.path)
    }

    /// Remove the file if present.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to remove session file: {:?}", self.path)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to set permissions on {:?}", path))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
