//! Authentication boundary
//!
//! The auth service only proves that a credential pair is valid. Whether a
//! user may reach the admin surface is decided by the [`SessionGuard`] and
//! its [`AdminAllowList`]; nothing else re-implements that check.
//!
//! Two backends implement [`AuthService`]:
//! - [`RestAuth`] talks to the hosted auth service
//! - [`LocalAuth`] keeps accounts in memory and issues HS256 JWTs (dev mode)

pub mod guard;
pub mod jwt;
pub mod local;
pub mod password;
pub mod rest;
pub mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::Result;

pub use guard::{AdminAllowList, Authorization, SessionGuard};
pub use jwt::{extract_token_from_header, Claims, JwtValidator};
pub use local::LocalAuth;
pub use password::{hash_password, verify_password};
pub use rest::RestAuth;
pub use session::{spawn_session_listener, SessionStore};

/// Capacity of the auth event channel
pub const AUTH_EVENT_CAPACITY: usize = 64;

/// Authenticated account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as a Unix timestamp (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now_unix)
    }
}

/// Session transition published by an auth service
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut { access_token: String },
}

/// Sign-in, sign-out and current-user lookup
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange an email/password pair for a session
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// End the session behind the access token
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Resolve the user behind an access token, `None` if it is not valid
    async fn get_user(&self, access_token: &str) -> Result<Option<User>>;

    /// Subscribe to session transitions
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
