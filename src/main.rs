// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

mod app;
mod backend;
mod config;
mod logic;
mod models;
mod mvu;
mod session;
mod ui;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::backend::session_file::SessionFile;
use crate::backend::{DataStore, IdentityProvider, SupabaseClient};
use crate::config::Config;
use crate::logic::repository::RegistrationRepository;
use crate::logic::routes::Route;
use crate::mvu::{AppModel, Services};
use crate::session::SessionStore;

fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config.log_level);

    let mut client = SupabaseClient::new(
        config.backend.url.clone(),
        config.backend.anon_key.clone(),
        config.backend.timeout,
    )
    .context("Failed to create backend client")?;
    if let Some(path) = &config.auth.session_file {
        let file = SessionFile::new(path);
        info!("Persisting session to {}", file.path().display());
        client = client.with_session_file(file);
    }
    let client = Arc::new(client);

    let services = Services {
        session: Arc::new(SessionStore::new(
            Arc::clone(&client) as Arc<dyn IdentityProvider>
        )),
        registrations: RegistrationRepository::new(client as Arc<dyn DataStore>),
    };

    // Optional start route, e.g. `inscricoes /signup`.
    let route = std::env::args()
        .nth(1)
        .map(|path| Route::from_path(&path))
        .unwrap_or_default();
    let model = AppModel::new(route, config.messaging.clone());

    info!(backend = %config.backend.url, "Starting Inscrições FutVôlei");
    app::run(services, model).map_err(|err| anyhow!("UI terminated with an error: {err}"))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
