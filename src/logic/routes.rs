// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Route table and the protected-route guard.
//!
//! Everything here is a pure mapping; actual navigation is done by the MVU
//! kernel when it sees a [`Resolution::Redirect`].

use crate::models::session::SessionSnapshot;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    /// `/`, always forwarded to the dashboard.
    #[default]
    Root,
    Login,
    Signup,
    /// Protected.
    Dashboard,
}

impl Route {
    /// Parse a path. Unknown paths fall back to `/`.
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/login" => Self::Login,
            "/signup" => Self::Signup,
            "/dashboard" => Self::Dashboard,
            _ => Self::Root,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Dashboard => "/dashboard",
        }
    }
}

/// Outcome of guarding a protected view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Loading,
    RedirectToLogin,
    Render,
}

/// Guard a protected view on `(session present, loading)`.
pub fn guard(session_present: bool, loading: bool) -> GuardDecision {
    match (loading, session_present) {
        (true, _) => GuardDecision::Loading,
        (false, false) => GuardDecision::RedirectToLogin,
        (false, true) => GuardDecision::Render,
    }
}

/// Page actually rendered once routing settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Login,
    Signup,
    Dashboard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Transient placeholder while the session is being resolved.
    Loading,
    Redirect(Route),
    Render(Page),
}

/// Resolve what to show for `route` given the current session state.
pub fn resolve(route: Route, session: &SessionSnapshot) -> Resolution {
    match route {
        Route::Root => Resolution::Redirect(Route::Dashboard),
        Route::Login => Resolution::Render(Page::Login),
        Route::Signup => Resolution::Render(Page::Signup),
        Route::Dashboard => match guard(session.is_authenticated(), session.loading) {
            GuardDecision::Loading => Resolution::Loading,
            GuardDecision::RedirectToLogin => Resolution::Redirect(Route::Login),
            GuardDecision::Render => Resolution::Render(Page::Dashboard),
        },
    }
}

/// Follow redirects until a page or the loading placeholder is reached.
pub fn settle(mut route: Route, session: &SessionSnapshot) -> (Route, Resolution) {
    // The table has at most two hops (`/` -> `/dashboard` -> `/login`).
    for _ in 0..4 {
        match resolve(route, session) {
            Resolution::Redirect(next) => route = next,
            other => return (route, other),
        }
    }
    (route, resolve(route, session))
}
