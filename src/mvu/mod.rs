// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Root Model-View-Update kernel wiring routing, session state, component
//! state, messages, and commands.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};

use crate::backend::AuthError;
use crate::config::MessagingConfig;
use crate::logic::repository::RegistrationRepository;
use crate::logic::routes::{self, Page, Resolution, Route};
use crate::models::session::SessionSnapshot;
use crate::session::SessionStore;
use crate::ui::components::auth_form::{
    self, AuthFormCommand, AuthFormEvent, AuthFormKind, AuthFormModel, AuthFormMsg,
    SIGNUP_SUCCESS,
};
use crate::ui::components::dashboard::{self, DashboardCommand, DashboardModel, DashboardMsg};

/// Refresh the access token this long before it expires.
const REFRESH_MARGIN_SECS: i64 = 60;
/// Wait before retrying a refresh that failed for a reason other than expiry.
const REFRESH_RETRY_SECS: i64 = 15;

/// Top-level application state.
pub struct AppModel {
    /// Requested route; settled through the guard after every update.
    pub route: Route,
    /// Latest session state reported by the store.
    pub session: SessionSnapshot,
    pub login: AuthFormModel,
    pub signup: AuthFormModel,
    pub dashboard: DashboardModel,
    /// Latest status message to display.
    pub status: Option<String>,
    /// Latest error message to display in modal.
    pub error: Option<String>,
    /// Count of queued background commands.
    pub pending_commands: usize,
    /// Expiry a refresh was already issued for.
    refresh_attempted_for: Option<DateTime<Utc>>,
    /// Earliest retry after a failed refresh.
    refresh_retry_at: Option<DateTime<Utc>>,
}

impl Default for AppModel {
    fn default() -> Self {
        Self::new(Route::Root, MessagingConfig::default())
    }
}

impl AppModel {
    pub fn new(route: Route, messaging: MessagingConfig) -> Self {
        Self {
            route,
            session: SessionSnapshot::default(),
            login: AuthFormModel::new(AuthFormKind::Login),
            signup: AuthFormModel::new(AuthFormKind::Signup),
            dashboard: DashboardModel::new(messaging),
            status: None,
            error: None,
            pending_commands: 0,
            refresh_attempted_for: None,
            refresh_retry_at: None,
        }
    }

    /// What the central panel shows for the current route.
    pub fn resolution(&self) -> Resolution {
        routes::resolve(self.route, &self.session)
    }

    /// Moment the access token should be refreshed, if one is pending.
    pub fn refresh_deadline(&self) -> Option<DateTime<Utc>> {
        if !self.session.is_authenticated() {
            return None;
        }
        let expires_at = self.session.expires_at?;
        if self.refresh_attempted_for == Some(expires_at) {
            return None;
        }
        let due = expires_at - TimeDelta::seconds(REFRESH_MARGIN_SECS);
        Some(self.refresh_retry_at.map_or(due, |retry| retry.max(due)))
    }

    pub fn refresh_due(&self, now: DateTime<Utc>) -> bool {
        self.refresh_deadline().is_some_and(|at| at <= now)
    }
}

/// Application messages routed through the update function.
pub enum Msg {
    /// Snapshot pushed by the session store subscription.
    SessionChanged(SessionSnapshot),
    SessionResolved {
        snapshot: SessionSnapshot,
        error: Option<String>,
    },
    SignInFinished {
        snapshot: SessionSnapshot,
        result: Result<(), String>,
    },
    SignUpFinished(Result<(), String>),
    SignOutFinished {
        snapshot: SessionSnapshot,
        result: Result<(), String>,
    },
    RefreshDue,
    RefreshFinished {
        snapshot: SessionSnapshot,
        result: Result<(), AuthFailure>,
    },
    LinkOpened(Result<(), String>),
    DismissError,
    Login(AuthFormMsg),
    Signup(AuthFormMsg),
    Dashboard(DashboardMsg),
}

/// Refresh failures the kernel distinguishes.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthFailure {
    Expired,
    Other(String),
}

/// Commands represent side-effects executed between frames.
pub enum Command {
    ResolveSession,
    SignIn {
        email: String,
        password: SecretString,
    },
    SignUp {
        email: String,
        password: SecretString,
    },
    SignOut,
    RefreshSession,
    FetchRegistrations {
        generation: u64,
    },
    OpenLink(String),
}

/// Shared handles the command workers execute against.
#[derive(Clone)]
pub struct Services {
    pub session: Arc<SessionStore>,
    pub registrations: RegistrationRepository,
}

/// Commands to issue once at startup.
pub fn init(model: &mut AppModel, cmds: &mut Vec<Command>) {
    cmds.push(Command::ResolveSession);
    sync_route(model, cmds);
}

/// Update the application model and enqueue commands.
pub fn update(model: &mut AppModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::SessionChanged(snapshot) => adopt_session(model, snapshot),
        Msg::SessionResolved { snapshot, error } => {
            adopt_session(model, snapshot);
            if let Some(err) = error {
                surface_event(
                    model,
                    format!("Não foi possível restaurar a sessão: {err}"),
                    false,
                );
            }
        }
        Msg::SignInFinished { snapshot, result } => {
            adopt_session(model, snapshot);
            let event = auth_form::update(
                &mut model.login,
                AuthFormMsg::Completed(result),
                &mut Vec::new(),
            );
            if event == Some(AuthFormEvent::Succeeded) {
                model.route = Route::Dashboard;
                surface_event(model, "Login realizado.".into(), false);
            }
        }
        Msg::SignUpFinished(result) => {
            let event = auth_form::update(
                &mut model.signup,
                AuthFormMsg::Completed(result),
                &mut Vec::new(),
            );
            if event == Some(AuthFormEvent::Succeeded) {
                let email = std::mem::take(&mut model.signup.email);
                model.signup = AuthFormModel::new(AuthFormKind::Signup);
                model.login = AuthFormModel {
                    email,
                    notice: Some(SIGNUP_SUCCESS.into()),
                    ..AuthFormModel::new(AuthFormKind::Login)
                };
                model.route = Route::Login;
                surface_event(model, SIGNUP_SUCCESS.into(), false);
            }
        }
        Msg::SignOutFinished { snapshot, result } => {
            adopt_session(model, snapshot);
            model.route = Route::Login;
            match result {
                Ok(()) => surface_event(model, "Sessão encerrada.".into(), false),
                Err(err) => surface_event(model, format!("Erro ao sair: {err}"), true),
            }
        }
        Msg::RefreshDue => {
            if model.refresh_due(Utc::now()) {
                model.refresh_attempted_for = model.session.expires_at;
                cmds.push(Command::RefreshSession);
            }
        }
        Msg::RefreshFinished { snapshot, result } => {
            adopt_session(model, snapshot);
            model.refresh_retry_at = None;
            match result {
                Ok(()) => {}
                Err(AuthFailure::Expired) => {
                    surface_event(model, "Sessão expirada. Entre novamente.".into(), false)
                }
                Err(AuthFailure::Other(err)) => {
                    model.refresh_attempted_for = None;
                    model.refresh_retry_at =
                        Some(Utc::now() + TimeDelta::seconds(REFRESH_RETRY_SECS));
                    surface_event(model, format!("Falha ao renovar a sessão: {err}"), false)
                }
            }
        }
        Msg::LinkOpened(result) => {
            if let Err(err) = result {
                surface_event(
                    model,
                    format!("Não foi possível abrir o link:\n\n{err}"),
                    true,
                );
            }
        }
        Msg::DismissError => model.error = None,
        Msg::Login(m) => {
            let mut form_cmds = Vec::new();
            let event = auth_form::update(&mut model.login, m, &mut form_cmds);
            cmds.extend(form_cmds.into_iter().map(auth_command));
            if event == Some(AuthFormEvent::SwitchRequested) {
                model.route = Route::Signup;
            }
        }
        Msg::Signup(m) => {
            let mut form_cmds = Vec::new();
            let event = auth_form::update(&mut model.signup, m, &mut form_cmds);
            cmds.extend(form_cmds.into_iter().map(auth_command));
            if event == Some(AuthFormEvent::SwitchRequested) {
                model.route = Route::Login;
            }
        }
        Msg::Dashboard(m) => {
            let mut dash_cmds = Vec::new();
            if let Some(status) = dashboard::update(&mut model.dashboard, m, &mut dash_cmds) {
                surface_event(model, status, false);
            }
            cmds.extend(dash_cmds.into_iter().map(dashboard_command));
        }
    }

    sync_route(model, cmds);
}

/// Take `snapshot` unless a newer one was already applied.
fn adopt_session(model: &mut AppModel, snapshot: SessionSnapshot) {
    if snapshot.version < model.session.version {
        debug!(
            version = snapshot.version,
            current = model.session.version,
            "Ignoring stale session snapshot"
        );
        return;
    }
    model.session = snapshot;
}

/// Settle redirects and mount, refresh or unmount the dashboard to match.
fn sync_route(model: &mut AppModel, cmds: &mut Vec<Command>) {
    let (route, resolution) = routes::settle(model.route, &model.session);
    if route != model.route {
        debug!(from = model.route.path(), to = route.path(), "Redirected");
    }
    model.route = route;

    let identity = model.session.identity().map(str::to_string);
    let msg = if resolution == Resolution::Render(Page::Dashboard) {
        if !model.dashboard.is_mounted() {
            Some(DashboardMsg::Mounted { identity })
        } else if model.dashboard.identity() != identity.as_deref() {
            Some(DashboardMsg::SessionChanged { identity })
        } else {
            None
        }
    } else if model.dashboard.is_mounted() {
        Some(DashboardMsg::Unmounted)
    } else {
        None
    };

    if let Some(msg) = msg {
        let mut dash_cmds = Vec::new();
        dashboard::update(&mut model.dashboard, msg, &mut dash_cmds);
        cmds.extend(dash_cmds.into_iter().map(dashboard_command));
    }
}

fn auth_command(cmd: AuthFormCommand) -> Command {
    match cmd {
        AuthFormCommand::SignIn { email, password } => Command::SignIn { email, password },
        AuthFormCommand::SignUp { email, password } => Command::SignUp { email, password },
    }
}

fn dashboard_command(cmd: DashboardCommand) -> Command {
    match cmd {
        DashboardCommand::FetchRegistrations { generation } => {
            Command::FetchRegistrations { generation }
        }
        DashboardCommand::SignOut => Command::SignOut,
        DashboardCommand::OpenLink(url) => Command::OpenLink(url),
    }
}

/// Execute a command against the backend and return the resulting message.
#[instrument(skip_all)]
pub async fn run_command(services: &Services, cmd: Command) -> Msg {
    let store = &services.session;
    match cmd {
        Command::ResolveSession => {
            let error = store.resolve_initial().await.err().map(|e| e.to_string());
            Msg::SessionResolved {
                snapshot: store.snapshot(),
                error,
            }
        }
        Command::SignIn { email, password } => {
            let result = store
                .sign_in(&email, password.expose_secret())
                .await
                .map(|_| ())
                .map_err(|e| {
                    warn!("Sign-in failed: {e}");
                    e.to_string()
                });
            Msg::SignInFinished {
                snapshot: store.snapshot(),
                result,
            }
        }
        Command::SignUp { email, password } => {
            let result = store
                .sign_up(&email, password.expose_secret())
                .await
                .map_err(|e| {
                    warn!("Sign-up failed: {e}");
                    e.to_string()
                });
            Msg::SignUpFinished(result)
        }
        Command::SignOut => {
            let result = store.sign_out().await.map_err(|e| {
                warn!("Remote sign-out failed: {e}");
                e.to_string()
            });
            Msg::SignOutFinished {
                snapshot: store.snapshot(),
                result,
            }
        }
        Command::RefreshSession => {
            let result = match store.refresh().await {
                Ok(_) => Ok(()),
                Err(AuthError::SessionExpired) => Err(AuthFailure::Expired),
                Err(err) => {
                    warn!("Token refresh failed: {err}");
                    Err(AuthFailure::Other(err.to_string()))
                }
            };
            Msg::RefreshFinished {
                snapshot: store.snapshot(),
                result,
            }
        }
        Command::FetchRegistrations { generation } => {
            let token = store.access_token();
            let result = services
                .registrations
                .list_registrations(token.as_ref())
                .await
                .map_err(|e| e.to_string());
            Msg::Dashboard(DashboardMsg::Loaded { generation, result })
        }
        Command::OpenLink(url) => {
            info!("Opening confirmation link");
            Msg::LinkOpened(open::that(&url).map_err(|e| e.to_string()))
        }
    }
}

/// Update status/error fields consistently for user feedback.
fn surface_event(model: &mut AppModel, message: String, is_error: bool) {
    if is_error {
        model.error = Some(message.clone());
    }
    model.status = Some(message);
}
