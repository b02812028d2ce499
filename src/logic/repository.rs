// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Registration repository over the backend [`DataStore`].

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::{Map, Value};
use tracing::{error, instrument, warn};

use crate::backend::{DataStore, FetchError};
use crate::models::registration::Registration;

pub const REGISTRATIONS_TABLE: &str = "inscricoes";
pub const USERS_TABLE: &str = "usuarios";

/// Typed access to the registration tables.
#[derive(Clone)]
pub struct RegistrationRepository {
    store: Arc<dyn DataStore>,
}

impl RegistrationRepository {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Every registration, in the order the backend returns them.
    ///
    /// Rows that do not match the expected shape are skipped with a warning.
    /// A failed query is logged and returned as an error, never as an empty list.
    #[instrument(skip_all)]
    pub async fn list_registrations(
        &self,
        access_token: Option<&SecretString>,
    ) -> Result<Vec<Registration>, FetchError> {
        let rows = self
            .store
            .select(REGISTRATIONS_TABLE, access_token)
            .await
            .inspect_err(|err| error!("Failed to fetch registrations: {err}"))?;
        Ok(parse_registrations(rows))
    }

    /// Raw rows of the `usuarios` table. No view consumes these yet.
    #[allow(dead_code)]
    #[instrument(skip_all)]
    pub async fn list_users(
        &self,
        access_token: Option<&SecretString>,
    ) -> Result<Vec<Map<String, Value>>, FetchError> {
        let rows = self
            .store
            .select(USERS_TABLE, access_token)
            .await
            .inspect_err(|err| error!("Failed to fetch users: {err}"))?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }
}

fn parse_registrations(rows: Vec<Value>) -> Vec<Registration> {
    rows.into_iter()
        .enumerate()
        .filter_map(
            |(index, row)| match serde_json::from_value::<Registration>(row) {
                Ok(registration) => Some(registration),
                Err(err) => {
                    warn!(row = index, "Skipping malformed registration: {err}");
                    None
                }
            },
        )
        .collect()
}
