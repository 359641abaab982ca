//! Authentication routes
//!
//! - POST /auth/login: admin password sign-in through the session guard
//! - POST /auth/logout: end the bearer's session
//! - GET /auth/session: who the bearer is, answered from the session store

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::response::{
    bearer_token, cors_preflight, error_response, json_response, method_not_allowed,
    not_found_response, parse_json_body, BoxBody,
};
use crate::server::AppState;
use crate::types::{FolioError, Result};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Answer to "who am I"
#[derive(Debug, Serialize, PartialEq)]
pub struct SessionStatus {
    #[serde(rename = "signedIn")]
    pub signed_in: bool,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub email: Option<String>,
}

async fn handle_login<B>(req: Request<B>, state: Arc<AppState>) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let login: LoginRequest = parse_json_body(req).await?;
    let session = state.guard.login(&login.email, &login.password).await?;
    Ok(json_response(StatusCode::OK, &session))
}

async fn handle_logout(token: Option<String>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let token = token.ok_or_else(|| FolioError::Unauthorized("Missing bearer token".into()))?;
    state.guard.logout(&token).await?;

    info!("Session signed out");
    Ok(json_response(
        StatusCode::OK,
        &serde_json::json!({ "signedOut": true }),
    ))
}

fn handle_session(token: Option<String>, state: &AppState) -> Response<BoxBody> {
    let session = token.and_then(|t| state.sessions.get(&t));

    let status = match session {
        Some(session) => SessionStatus {
            signed_in: true,
            is_admin: state.guard.allow_list().is_admin_user(&session.user),
            email: session.user.email,
        },
        None => SessionStatus {
            signed_in: false,
            is_admin: false,
            email: None,
        },
    };

    json_response(StatusCode::OK, &status)
}

/// Dispatch `/auth/*`
pub async fn handle_auth_request<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if method == Method::OPTIONS {
        return cors_preflight();
    }

    let token = bearer_token(&req);

    let result = match (&method, path.as_str()) {
        (&Method::POST, "/auth/login") => handle_login(req, state).await,
        (&Method::POST, "/auth/logout") => handle_logout(token, state).await,
        (&Method::GET, "/auth/session") => Ok(handle_session(token, &state)),

        (_, "/auth/login") | (_, "/auth/logout") | (_, "/auth/session") => {
            Ok(method_not_allowed())
        }

        _ => Ok(not_found_response(&path)),
    };

    result.unwrap_or_else(error_response)
}
