//! Application-scoped session registry
//!
//! Live sessions keyed by access token. The store is written only by the
//! listener task spawned with [`spawn_session_listener`], which applies the
//! auth service's events in order. Handlers read it to answer "who am I"
//! without a round trip to the auth service.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{AuthEvent, AuthService, Session};

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live session; expired sessions are treated as absent
    pub fn get(&self, access_token: &str) -> Option<Session> {
        let session = self.sessions.get(access_token)?.value().clone();
        if session.is_expired_at(Utc::now().timestamp()) {
            return None;
        }
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn apply(&self, event: AuthEvent) {
        let now = Utc::now().timestamp();
        self.sessions.retain(|_, s| !s.is_expired_at(now));

        match event {
            AuthEvent::SignedIn(session) => {
                debug!("Session opened for user {}", session.user.id);
                self.sessions.insert(session.access_token.clone(), session);
            }
            AuthEvent::SignedOut { access_token } => {
                if self.sessions.remove(&access_token).is_some() {
                    debug!("Session closed");
                }
            }
        }
    }
}

/// Spawn the task that keeps `store` in sync with `auth`'s events
///
/// The task ends when the auth service drops its sender.
pub fn spawn_session_listener(
    auth: &dyn AuthService,
    store: Arc<SessionStore>,
) -> JoinHandle<()> {
    let mut events = auth.subscribe();

    tokio::spawn(async move {
        info!("Session listener started");
        loop {
            match events.recv().await {
                Ok(event) => store.apply(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Session listener lagged, {} auth events dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!("Session listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::User;

    fn session(token: &str, expires_at: Option<i64>) -> Session {
        Session {
            access_token: token.into(),
            refresh_token: None,
            expires_at,
            user: User {
                id: "u1".into(),
                email: Some("admin@example.com".into()),
            },
        }
    }

    #[test]
    fn test_apply_sign_in_and_out() {
        let store = SessionStore::new();
        store.apply(AuthEvent::SignedIn(session("t1", None)));
        assert!(store.get("t1").is_some());

        store.apply(AuthEvent::SignedOut {
            access_token: "t1".into(),
        });
        assert!(store.get("t1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_sessions_are_hidden_and_pruned() {
        let store = SessionStore::new();
        let past = Utc::now().timestamp() - 10;
        store.apply(AuthEvent::SignedIn(session("old", Some(past))));
        assert!(store.get("old").is_none());

        store.apply(AuthEvent::SignedIn(session("new", None)));
        assert_eq!(store.len(), 1);
    }
}
