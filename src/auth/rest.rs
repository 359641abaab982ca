//! REST client for the hosted auth service
//!
//! Speaks the GoTrue dialect under `/auth/v1`. Session transitions made
//! through this client are published to subscribers; sessions created
//! elsewhere (another server instance, a browser) are not observed.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::{AuthEvent, AuthService, Session, User, AUTH_EVENT_CAPACITY};
use crate::db::RestStoreConfig;
use crate::types::{FolioError, Result};

/// Token grant response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl From<TokenResponse> for Session {
    fn from(t: TokenResponse) -> Self {
        let expires_at = t
            .expires_at
            .or_else(|| t.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Session {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            expires_at,
            user: t.user,
        }
    }
}

/// GoTrue-backed auth service
pub struct RestAuth {
    config: Arc<RestStoreConfig>,
    client: Client,
    events: broadcast::Sender<AuthEvent>,
}

impl RestAuth {
    pub fn new(config: RestStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FolioError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            client,
            events,
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/auth/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    /// Pull a human message out of a GoTrue error body
    async fn error_message(response: Response) -> String {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| {
                ["error_description", "msg", "message", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(Value::as_str).map(String::from))
            })
            .unwrap_or_else(|| format!("{}: {}", status.as_u16(), text))
    }
}

#[async_trait]
impl AuthService for RestAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            // 4xx is a credential problem, anything else the service itself
            return Err(if status.is_client_error() {
                FolioError::Auth(message)
            } else {
                FolioError::Store(message)
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FolioError::Store(format!("Invalid token response: {}", e)))?;
        let session = Session::from(token);

        debug!("Hosted sign-in for user {}", session.user.id);
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            return Err(if status.is_client_error() {
                FolioError::Unauthorized(message)
            } else {
                FolioError::Store(message)
            });
        }

        let _ = self.events.send(AuthEvent::SignedOut {
            access_token: access_token.to_string(),
        });
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>> {
        let response = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let user = response
                    .json::<User>()
                    .await
                    .map_err(|e| FolioError::Store(format!("Invalid user response: {}", e)))?;
                Ok(Some(user))
            }
            _ => Err(FolioError::Store(Self::error_message(response).await)),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
