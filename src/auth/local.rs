//! In-process auth service for dev mode and tests
//!
//! Accounts live in memory with argon2id password hashes. Access tokens are
//! HS256 JWTs; each carries a session id that is revoked on sign-out, so a
//! signed-out token stops resolving even before it expires.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use super::jwt::{JwtValidator, TokenInput, EXPIRY_LEEWAY_SECONDS};
use super::password::{hash_password, verify_password};
use super::{AuthEvent, AuthService, Session, User, AUTH_EVENT_CAPACITY};
use crate::types::{FolioError, Result};

#[derive(Debug, Clone)]
struct LocalAccount {
    id: Uuid,
    password_hash: String,
}

pub struct LocalAuth {
    jwt: JwtValidator,
    /// Accounts keyed by email
    accounts: DashMap<String, LocalAccount>,
    /// Signed-out session ids and the expiry of their token
    revoked: DashMap<String, u64>,
    events: broadcast::Sender<AuthEvent>,
}

impl LocalAuth {
    pub fn new(jwt: JwtValidator) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            jwt,
            accounts: DashMap::new(),
            revoked: DashMap::new(),
            events,
        }
    }

    /// Register an account, replacing any existing one with the same email
    pub fn add_account(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(FolioError::Validation(
                "Email and password are required".into(),
            ));
        }

        let account = LocalAccount {
            id: Uuid::new_v4(),
            password_hash: hash_password(password)?,
        };
        let user = User {
            id: account.id.to_string(),
            email: Some(email.to_string()),
        };
        self.accounts.insert(email.to_string(), account);

        info!("Registered local account {}", email);
        Ok(user)
    }

    /// Forget revocations whose token no longer verifies anyway
    fn prune_revoked(&self, now: u64) {
        self.revoked
            .retain(|_, exp| exp.saturating_add(EXPIRY_LEEWAY_SECONDS) >= now);
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl AuthService for LocalAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let invalid = || FolioError::Auth("Invalid login credentials".into());

        let account = self
            .accounts
            .get(email)
            .map(|entry| entry.value().clone())
            .ok_or_else(invalid)?;

        if !verify_password(password, &account.password_hash)? {
            return Err(invalid());
        }

        let (access_token, claims) = self.jwt.generate_token(TokenInput {
            user_id: account.id.to_string(),
            email: email.to_string(),
            session_id: Uuid::new_v4().to_string(),
        })?;

        let session = Session {
            access_token,
            refresh_token: None,
            expires_at: Some(claims.exp as i64),
            user: User {
                id: claims.sub,
                email: Some(claims.email),
            },
        };

        debug!("Local sign-in for {}", email);
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let result = self.jwt.verify_token(access_token);
        let claims = match result.claims {
            Some(claims) if result.valid => claims,
            _ => {
                return Err(FolioError::Unauthorized(
                    result.error.unwrap_or_else(|| "Invalid token".into()),
                ))
            }
        };

        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        self.prune_revoked(now);
        self.revoked.insert(claims.sid, claims.exp);
        self.publish(AuthEvent::SignedOut {
            access_token: access_token.to_string(),
        });
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>> {
        let result = self.jwt.verify_token(access_token);
        let claims = match result.claims {
            Some(claims) if result.valid => claims,
            _ => return Ok(None),
        };

        if self.revoked.contains_key(&claims.sid) {
            return Ok(None);
        }

        // Account may have been replaced since the token was issued
        let current = self
            .accounts
            .get(&claims.email)
            .is_some_and(|entry| entry.id.to_string() == claims.sub);
        if !current {
            return Ok(None);
        }

        Ok(Some(User {
            id: claims.sub,
            email: Some(claims.email),
        }))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> LocalAuth {
        let jwt = JwtValidator::new(
            "local-auth-test-secret-with-32-plus-chars".into(),
            3600,
        )
        .unwrap();
        LocalAuth::new(jwt)
    }

    #[tokio::test]
    async fn test_sign_in_and_get_user() {
        let auth = auth();
        auth.add_account("editor@example.com", "hunter22").unwrap();

        let session = auth
            .sign_in_with_password("editor@example.com", "hunter22")
            .await
            .unwrap();
        let user = auth.get_user(&session.access_token).await.unwrap().unwrap();

        assert_eq!(user.email.as_deref(), Some("editor@example.com"));
        assert_eq!(user, session.user);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_account() {
        let auth = auth();
        auth.add_account("editor@example.com", "hunter22").unwrap();

        let err = auth
            .sign_in_with_password("editor@example.com", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Auth(_)));

        let err = auth
            .sign_in_with_password("ghost@example.com", "hunter22")
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Auth(_)));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_only_that_session() {
        let auth = auth();
        auth.add_account("editor@example.com", "hunter22").unwrap();

        let first = auth
            .sign_in_with_password("editor@example.com", "hunter22")
            .await
            .unwrap();
        let second = auth
            .sign_in_with_password("editor@example.com", "hunter22")
            .await
            .unwrap();

        auth.sign_out(&first.access_token).await.unwrap();

        assert!(auth.get_user(&first.access_token).await.unwrap().is_none());
        assert!(auth.get_user(&second.access_token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_revocations_are_pruned() {
        let auth = auth();
        auth.add_account("editor@example.com", "hunter22").unwrap();

        let session = auth
            .sign_in_with_password("editor@example.com", "hunter22")
            .await
            .unwrap();
        auth.sign_out(&session.access_token).await.unwrap();
        assert_eq!(auth.revoked.len(), 1);

        let exp = session.expires_at.unwrap() as u64;
        auth.prune_revoked(exp + EXPIRY_LEEWAY_SECONDS);
        assert_eq!(auth.revoked.len(), 1);

        auth.prune_revoked(exp + EXPIRY_LEEWAY_SECONDS + 1);
        assert!(auth.revoked.is_empty());
    }

    #[tokio::test]
    async fn test_events_are_published() {
        let auth = auth();
        auth.add_account("editor@example.com", "hunter22").unwrap();
        let mut rx = auth.subscribe();

        let session = auth
            .sign_in_with_password("editor@example.com", "hunter22")
            .await
            .unwrap();
        auth.sign_out(&session.access_token).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedIn(session.clone()));
        assert_eq!(
            rx.recv().await.unwrap(),
            AuthEvent::SignedOut {
                access_token: session.access_token
            }
        );
    }

    #[tokio::test]
    async fn test_garbage_token_resolves_to_none() {
        let auth = auth();
        assert!(auth.get_user("not-a-jwt").await.unwrap().is_none());
        assert!(auth.sign_out("not-a-jwt").await.is_err());
    }
}
