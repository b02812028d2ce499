// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Process-wide session store with an explicit subscriber list.
//!
//! The store caches the provider session and a `loading` flag that is true
//! only until the first resolution completes. Every transition (sign-in,
//! sign-out, token refresh, invalidation) is broadcast to subscribers as a
//! token-free [`SessionSnapshot`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::backend::{AuthError, IdentityProvider};
use crate::models::session::{Session, SessionSnapshot};

type Listener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

#[derive(Default)]
struct State {
    session: Option<Session>,
    resolved: bool,
    /// Bumped by every transition. Async results captured against an older
    /// value are not applied.
    generation: u64,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Cached authentication state shared by the UI and the command workers.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    state: Mutex<State>,
    listeners: Arc<Mutex<Listeners>>,
}

/// Registration handle returned by [`SessionStore::subscribe`]; dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Deregister explicitly (same as dropping).
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).entries.retain(|(id, _)| *id != self.id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionStore {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(State::default()),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// Cached session, if any.
    pub fn current_session(&self) -> Option<Session> {
        lock(&self.state).session.clone()
    }

    /// Bearer token for data requests.
    pub fn access_token(&self) -> Option<SecretString> {
        lock(&self.state)
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        snapshot_of(&lock(&self.state))
    }

    /// Register `listener` for every session transition.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Ask the provider for an existing session. Ends the initial loading phase.
    ///
    /// When another transition (e.g. a sign-in) lands while the provider is
    /// queried, that newer session is kept and only the loading flag changes.
    pub async fn resolve_initial(&self) -> Result<Option<Session>, AuthError> {
        let seen = lock(&self.state).generation;
        let result = self.provider.current_session().await;
        let session = match &result {
            Ok(session) => session.clone(),
            Err(err) => {
                warn!("Initial session resolution failed: {err}");
                None
            }
        };

        let mut applied = false;
        let restored = session.as_ref().map(|s| s.user.id.clone());
        self.transition(|state| {
            if state.generation == seen {
                state.session = session;
                applied = true;
            }
            state.resolved = true;
        });

        if !applied {
            debug!("Session changed during initial resolution, keeping the newer one");
            self.sync_persisted();
        } else if let Some(user) = restored {
            info!(%user, "Restored session");
        }
        result
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        info!(user = %session.user.id, "Signed in");
        let cached = session.clone();
        self.transition(|state| state.session = Some(cached));
        Ok(session)
    }

    /// Create an account; the cached session is left untouched.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.provider.sign_up(email, password).await?;
        info!("Sign-up submitted, awaiting email confirmation");
        Ok(())
    }

    /// Clear the cached session and revoke it remotely.
    ///
    /// Local state is cleared even when the provider call fails; the error is still returned.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.current_session() else {
            return Ok(());
        };
        self.transition(|state| state.session = None);
        info!(user = %session.user.id, "Signed out");
        self.provider.sign_out(&session).await
    }

    /// Refresh the access token. A rejected refresh token clears the session.
    ///
    /// Returns `Ok(None)` without touching state when there is no session, or
    /// when the session was replaced or cleared while the provider answered.
    pub async fn refresh(&self) -> Result<Option<Session>, AuthError> {
        let (seen, current) = {
            let state = lock(&self.state);
            (state.generation, state.session.clone())
        };
        let Some(current) = current else {
            return Ok(None);
        };

        let result = self.provider.refresh(&current).await;
        match result {
            Ok(fresh) => {
                let cached = fresh.clone();
                if self.transition_if(seen, |state| state.session = Some(cached)) {
                    return Ok(Some(fresh));
                }
            }
            Err(AuthError::SessionExpired) => {
                if self.transition_if(seen, |state| state.session = None) {
                    warn!(user = %current.user.id, "Session invalidated by provider");
                    return Err(AuthError::SessionExpired);
                }
            }
            Err(err) if lock(&self.state).generation == seen => return Err(err),
            Err(_) => {}
        }

        debug!(user = %current.user.id, "Discarding refresh result for a replaced session");
        self.sync_persisted();
        Ok(None)
    }

    /// Mutate state under the lock, then notify listeners outside it.
    fn transition(&self, apply: impl FnOnce(&mut State)) {
        let snapshot = {
            let mut state = lock(&self.state);
            apply(&mut state);
            state.generation += 1;
            snapshot_of(&state)
        };
        self.notify(&snapshot);
    }

    /// [`transition`](Self::transition) only if nothing else happened since `seen`.
    fn transition_if(&self, seen: u64, apply: impl FnOnce(&mut State)) -> bool {
        let snapshot = {
            let mut state = lock(&self.state);
            if state.generation != seen {
                return false;
            }
            apply(&mut state);
            state.generation += 1;
            snapshot_of(&state)
        };
        self.notify(&snapshot);
        true
    }

    fn notify(&self, snapshot: &SessionSnapshot) {
        let listeners: Vec<Listener> = lock(&self.listeners)
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    /// Point the provider's persisted copy back at the cached session after a
    /// discarded result may have overwritten it.
    fn sync_persisted(&self) {
        let current = self.current_session();
        self.provider.sync_persisted(current.as_ref());
    }
}

fn snapshot_of(state: &State) -> SessionSnapshot {
    SessionSnapshot {
        user: state.session.as_ref().map(|s| s.user.clone()),
        loading: !state.resolved,
        expires_at: state.session.as_ref().and_then(|s| s.expires_at),
        version: state.generation,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::session::User;
    use async_trait::async_trait;
    use secrecy::ExposeSecret;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::time::Duration;

    /// In-memory provider with switchable failures. `persisted` behaves like
    /// the session file: written on sign-in and refresh, cleared on sign-out.
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        pub persisted: Mutex<Option<Session>>,
        pub fail_sign_out: AtomicBool,
        pub expire_refresh: AtomicBool,
        pub fail_resolve: AtomicBool,
        /// Latency of `current_session` and `refresh`.
        pub delay_ms: AtomicU64,
    }

    impl FakeProvider {
        async fn lag(&self) {
            let ms = self.delay_ms.load(Ordering::SeqCst);
            if ms > 0 {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
        }
    }

    pub(crate) fn session_for(email: &str, token: &str) -> Session {
        Session {
            user: User {
                id: format!("id-{email}"),
                email: Some(email.into()),
            },
            access_token: SecretString::new(token.into()),
            refresh_token: SecretString::new("refresh".into()),
            expires_at: None,
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn current_session(&self) -> Result<Option<Session>, AuthError> {
            self.lag().await;
            if self.fail_resolve.load(Ordering::SeqCst) {
                return Err(AuthError::Provider {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(lock(&self.persisted).clone())
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            if password != "secret" {
                return Err(AuthError::InvalidCredentials);
            }
            let session = session_for(email, "access");
            *lock(&self.persisted) = Some(session.clone());
            Ok(session)
        }

        async fn sign_up(&self, _email: &str, _password: &str) -> Result<(), AuthError> {
            Ok(())
        }

        async fn sign_out(&self, _session: &Session) -> Result<(), AuthError> {
            *lock(&self.persisted) = None;
            if self.fail_sign_out.load(Ordering::SeqCst) {
                return Err(AuthError::Provider {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(())
        }

        async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
            self.lag().await;
            if self.expire_refresh.load(Ordering::SeqCst) {
                return Err(AuthError::SessionExpired);
            }
            let mut fresh = session.clone();
            fresh.access_token = SecretString::new("refreshed".into());
            *lock(&self.persisted) = Some(fresh.clone());
            Ok(fresh)
        }

        fn sync_persisted(&self, session: Option<&Session>) {
            *lock(&self.persisted) = session.cloned();
        }
    }

    fn recording(store: &SessionStore) -> (Subscription, Arc<Mutex<Vec<SessionSnapshot>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = store.subscribe(move |snap| lock(&sink).push(snap.clone()));
        (sub, seen)
    }

    #[tokio::test]
    async fn loading_ends_once_after_initial_resolution() {
        let store = SessionStore::new(Arc::new(FakeProvider::default()));
        assert!(store.snapshot().loading);

        store.resolve_initial().await.unwrap();
        assert!(!store.snapshot().loading);

        store.sign_in("a@b.c", "secret").await.unwrap();
        store.sign_out().await.unwrap();
        assert!(!store.snapshot().loading);
    }

    #[tokio::test]
    async fn failed_resolution_still_ends_loading() {
        let provider = FakeProvider::default();
        provider.fail_resolve.store(true, Ordering::SeqCst);
        let store = SessionStore::new(Arc::new(provider));
        let (_sub, seen) = recording(&store);

        assert!(store.resolve_initial().await.is_err());

        let snapshots = lock(&seen);
        assert_eq!(snapshots.len(), 1);
        assert!(!snapshots[0].loading);
        assert!(snapshots[0].user.is_none());
    }

    #[tokio::test]
    async fn resolve_restores_persisted_session() {
        let provider = FakeProvider::default();
        *lock(&provider.persisted) = Some(session_for("staff@example.com", "old"));
        let store = SessionStore::new(Arc::new(provider));

        let restored = store.resolve_initial().await.unwrap();

        assert!(restored.is_some());
        assert_eq!(
            store.snapshot().identity(),
            Some("id-staff@example.com")
        );
    }

    #[tokio::test]
    async fn sign_in_caches_and_notifies() {
        let store = SessionStore::new(Arc::new(FakeProvider::default()));
        let (_sub, seen) = recording(&store);

        store.sign_in("staff@example.com", "secret").await.unwrap();

        assert!(store.current_session().is_some());
        let snapshots = lock(&seen);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(
            snapshots[0].user.as_ref().and_then(|u| u.email.as_deref()),
            Some("staff@example.com")
        );
    }

    #[tokio::test]
    async fn failed_sign_in_keeps_state_and_stays_silent() {
        let store = SessionStore::new(Arc::new(FakeProvider::default()));
        let (_sub, seen) = recording(&store);

        let result = store.sign_in("staff@example.com", "wrong").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(store.current_session().is_none());
        assert!(lock(&seen).is_empty());
    }

    #[tokio::test]
    async fn sign_up_does_not_establish_session() {
        let store = SessionStore::new(Arc::new(FakeProvider::default()));
        let (_sub, seen) = recording(&store);

        store.sign_up("new@example.com", "secret").await.unwrap();

        assert!(store.current_session().is_none());
        assert!(lock(&seen).is_empty());
    }

    #[tokio::test]
    async fn sign_out_clears_even_when_provider_fails() {
        let provider = Arc::new(FakeProvider::default());
        provider.fail_sign_out.store(true, Ordering::SeqCst);
        let store = SessionStore::new(provider);
        store.sign_in("staff@example.com", "secret").await.unwrap();
        let (_sub, seen) = recording(&store);

        assert!(store.sign_out().await.is_err());

        assert!(store.current_session().is_none());
        assert!(lock(&seen).last().is_some_and(|s| s.user.is_none()));
    }

    #[tokio::test]
    async fn refresh_replaces_token_and_notifies() {
        let store = SessionStore::new(Arc::new(FakeProvider::default()));
        store.sign_in("staff@example.com", "secret").await.unwrap();
        let (_sub, seen) = recording(&store);

        store.refresh().await.unwrap();

        let token = store.access_token().unwrap();
        assert_eq!(token.expose_secret(), "refreshed");
        assert_eq!(lock(&seen).len(), 1);
    }

    #[tokio::test]
    async fn rejected_refresh_invalidates_session() {
        let provider = Arc::new(FakeProvider::default());
        let store = SessionStore::new(Arc::clone(&provider) as Arc<dyn IdentityProvider>);
        store.sign_in("staff@example.com", "secret").await.unwrap();
        provider.expire_refresh.store(true, Ordering::SeqCst);
        let (_sub, seen) = recording(&store);

        let result = store.refresh().await;

        assert!(matches!(result, Err(AuthError::SessionExpired)));
        assert!(store.current_session().is_none());
        assert!(lock(&seen).last().is_some_and(|s| !s.is_authenticated()));
    }

    #[tokio::test]
    async fn dropped_subscription_stops_notifications() {
        let store = SessionStore::new(Arc::new(FakeProvider::default()));
        let (sub, seen) = recording(&store);

        sub.unsubscribe();
        store.sign_in("staff@example.com", "secret").await.unwrap();

        assert!(lock(&seen).is_empty());
    }

    #[tokio::test]
    async fn snapshot_versions_increase_with_each_transition() {
        let store = SessionStore::new(Arc::new(FakeProvider::default()));
        let (_sub, seen) = recording(&store);

        store.resolve_initial().await.unwrap();
        store.sign_in("staff@example.com", "secret").await.unwrap();
        store.refresh().await.unwrap();
        store.sign_out().await.unwrap();

        let versions: Vec<u64> = lock(&seen).iter().map(|s| s.version).collect();
        assert_eq!(versions, vec![1, 2, 3, 4]);
        assert_eq!(store.snapshot().version, 4);
    }

    #[tokio::test]
    async fn sign_out_during_refresh_stays_signed_out() {
        let provider = Arc::new(FakeProvider::default());
        let store = SessionStore::new(Arc::clone(&provider) as Arc<dyn IdentityProvider>);
        store.sign_in("staff@example.com", "secret").await.unwrap();
        provider.delay_ms.store(50, Ordering::SeqCst);

        let (refreshed, signed_out) = tokio::join!(store.refresh(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.sign_out().await
        });

        assert!(matches!(refreshed, Ok(None)));
        assert!(signed_out.is_ok());
        assert!(store.current_session().is_none());
        assert!(!store.snapshot().is_authenticated());
        assert!(lock(&provider.persisted).is_none());
    }

    #[tokio::test]
    async fn expiry_reported_for_a_replaced_session_is_ignored() {
        let provider = Arc::new(FakeProvider::default());
        let store = SessionStore::new(Arc::clone(&provider) as Arc<dyn IdentityProvider>);
        store.sign_in("old@example.com", "secret").await.unwrap();
        provider.expire_refresh.store(true, Ordering::SeqCst);
        provider.delay_ms.store(50, Ordering::SeqCst);

        let (refreshed, _) = tokio::join!(store.refresh(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.sign_in("new@example.com", "secret").await
        });

        assert!(matches!(refreshed, Ok(None)));
        assert_eq!(store.snapshot().identity(), Some("id-new@example.com"));
    }

    #[tokio::test]
    async fn sign_in_during_initial_resolution_is_kept() {
        let provider = Arc::new(FakeProvider::default());
        *lock(&provider.persisted) = Some(session_for("old@example.com", "old"));
        provider.delay_ms.store(50, Ordering::SeqCst);
        let store = SessionStore::new(Arc::clone(&provider) as Arc<dyn IdentityProvider>);

        let (resolved, signed_in) = tokio::join!(store.resolve_initial(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.sign_in("new@example.com", "secret").await
        });

        assert!(resolved.is_ok());
        assert!(signed_in.is_ok());
        let snapshot = store.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.identity(), Some("id-new@example.com"));
        assert_eq!(
            lock(&provider.persisted).as_ref().map(|s| s.user.id.as_str()),
            Some("id-new@example.com")
        );
    }
}
