// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Backend error taxonomy.

use thiserror::Error;

/// Failures of sign-in, sign-up, sign-out and token refresh.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Provider rejected the request; the message is shown to the user verbatim.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    /// Refresh token revoked or expired; the session must be discarded.
    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of a table query.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
