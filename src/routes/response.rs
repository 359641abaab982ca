//! Shared request/response helpers for the HTTP handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{self, HeaderValue};
use hyper::{Request, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::auth::extract_token_from_header;
use crate::types::{FolioError, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest request body accepted (1 MiB)
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Where the SPA sends a visitor whose admin session is not valid
pub const LOGIN_PATH: &str = "/login";

/// Error body: `{ "error": ..., "code": ... }`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    full_body(Bytes::new())
}

fn with_cors(mut response: Response<BoxBody>) -> Response<BoxBody> {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

/// JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Failed to serialize response","code":"INTERNAL_ERROR"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(full_body(bytes));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    with_cors(response)
}

/// Map a `FolioError` to its JSON error response
pub fn error_response(err: FolioError) -> Response<BoxBody> {
    let status = err.status_code();
    if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
        error!("{}", err);
    }
    json_response(
        status,
        &ErrorResponse {
            code: Some(err.code()),
            error: err.to_string(),
            redirect: None,
        },
    )
}

/// Error response for the admin surface; 401s point the client at the login page
pub fn admin_error_response(err: FolioError) -> Response<BoxBody> {
    if !matches!(err, FolioError::Unauthorized(_)) {
        return error_response(err);
    }
    json_response(
        StatusCode::UNAUTHORIZED,
        &ErrorResponse {
            code: Some(err.code()),
            error: err.to_string(),
            redirect: Some(LOGIN_PATH),
        },
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    with_cors(response)
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("No route for {}", path),
            code: Some("NOT_FOUND"),
            redirect: None,
        },
    )
}

pub fn method_not_allowed() -> Response<BoxBody> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorResponse {
            error: "Method not allowed".into(),
            code: None,
            redirect: None,
        },
    )
}

/// Read and decode a JSON request body, rejecting bodies over 1 MiB
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T>
where
    T: DeserializeOwned,
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                FolioError::BadRequest("Request body too large".into())
            } else {
                FolioError::BadRequest(format!("Failed to read body: {}", e))
            }
        })?;

    serde_json::from_slice(&body.to_bytes())
        .map_err(|e| FolioError::BadRequest(format!("Invalid JSON: {}", e)))
}

/// Bearer token from the `Authorization` header
pub fn bearer_token<B>(req: &Request<B>) -> Option<String> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    extract_token_from_header(header).map(String::from)
}

/// First value of a query-string parameter
pub fn query_param<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.uri().query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key != name {
            return None;
        }
        urlencoding::decode(value).ok().map(|v| v.into_owned())
    })
}

/// Parse a path segment as a row id
pub fn parse_id(segment: &str) -> Result<Uuid> {
    Uuid::parse_str(segment).map_err(|_| FolioError::BadRequest(format!("Invalid id: {}", segment)))
}

/// Decode a percent-encoded path segment (slugs)
pub fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .uri(uri)
            .header("Authorization", "Bearer tok-123")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[test]
    fn test_query_param() {
        let req = request("/admin/blogs/x?confirm=true&note=hello%20there");
        assert_eq!(query_param(&req, "confirm").as_deref(), Some("true"));
        assert_eq!(query_param(&req, "note").as_deref(), Some("hello there"));
        assert_eq!(query_param(&req, "missing"), None);
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&request("/")).as_deref(), Some("tok-123"));
    }

    #[test]
    fn test_admin_unauthorized_carries_redirect() {
        let response = admin_error_response(FolioError::Unauthorized("no".into()));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = admin_error_response(FolioError::NotFound("x".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let big = vec![b' '; MAX_BODY_BYTES + 1];
        let req = Request::builder()
            .uri("/")
            .body(Full::new(Bytes::from(big)))
            .unwrap();

        let result: Result<serde_json::Value> = parse_json_body(req).await;
        assert!(matches!(result, Err(FolioError::BadRequest(ref m)) if m.contains("too large")));
    }
}
