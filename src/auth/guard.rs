//! Session guard
//!
//! The single place that decides admin access. A valid credential pair is not
//! enough: the user's email must also be on the allow-list.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AuthService, Session, User};
use crate::types::{FolioError, Result};

/// Message reported when a valid non-admin account tries to sign in
pub const ADMIN_ONLY: &str = "admin access only";

/// Emails allowed onto the admin surface
///
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    emails: HashSet<String>,
}

impl AdminAllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    pub fn is_admin_user(&self, user: &User) -> bool {
        user.email.as_deref().is_some_and(|email| self.is_admin(email))
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    Authorized(User),
    Unauthorized,
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Authorized(_))
    }
}

pub struct SessionGuard {
    auth: Arc<dyn AuthService>,
    allow_list: AdminAllowList,
}

impl SessionGuard {
    pub fn new(auth: Arc<dyn AuthService>, allow_list: AdminAllowList) -> Self {
        Self { auth, allow_list }
    }

    pub fn allow_list(&self) -> &AdminAllowList {
        &self.allow_list
    }

    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.auth
    }

    /// Decide whether the bearer of `access_token` is an admin
    ///
    /// Fails closed: a missing token, an unknown user and a failing auth
    /// service all yield `Unauthorized`.
    pub async fn check_authorization(&self, access_token: Option<&str>) -> Authorization {
        let Some(token) = access_token else {
            return Authorization::Unauthorized;
        };

        match self.auth.get_user(token).await {
            Ok(Some(user)) if self.allow_list.is_admin_user(&user) => {
                Authorization::Authorized(user)
            }
            Ok(Some(user)) => {
                debug!("User {} is not on the admin allow-list", user.id);
                Authorization::Unauthorized
            }
            Ok(None) => Authorization::Unauthorized,
            Err(e) => {
                warn!("Authorization check failed, denying: {}", e);
                Authorization::Unauthorized
            }
        }
    }

    /// `check_authorization` as a `Result`, for handlers that propagate with `?`
    pub async fn require_admin(&self, access_token: Option<&str>) -> Result<User> {
        match self.check_authorization(access_token).await {
            Authorization::Authorized(user) => Ok(user),
            Authorization::Unauthorized => Err(FolioError::Unauthorized(
                "Admin session required".into(),
            )),
        }
    }

    /// Password sign-in restricted to admins
    ///
    /// A valid non-admin account is signed straight back out.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(FolioError::Validation(
                "Email and password are required".into(),
            ));
        }

        let session = match self.auth.sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Login failed for {}: {}", email, e);
                return Err(e);
            }
        };

        if !self.allow_list.is_admin_user(&session.user) {
            warn!("Login rejected for non-admin account {}", email);
            if let Err(e) = self.auth.sign_out(&session.access_token).await {
                warn!("Failed to sign out rejected session: {}", e);
            }
            return Err(FolioError::Unauthorized(ADMIN_ONLY.into()));
        }

        info!("Admin signed in: {}", email);
        Ok(session)
    }

    pub async fn logout(&self, access_token: &str) -> Result<()> {
        self.auth.sign_out(access_token).await
    }
}
