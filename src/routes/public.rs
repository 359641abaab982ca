//! Public API routes
//!
//! Everything under `/api` is anonymous and sees published content only;
//! comment threads of drafts read as missing.
//!
//! - GET  /api/blogs, /api/blogs/{slug}
//! - GET  /api/blogs/{id}/comments, POST /api/blogs/{id}/comments
//! - GET  /api/articles, /api/articles/featured, /api/articles/{slug}
//! - POST /api/articles/{id}/download
//! - GET  /api/resume
//! - POST /api/contact

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use super::response::{
    cors_preflight, decode_segment, error_response, json_response, method_not_allowed,
    not_found_response, parse_id, parse_json_body, BoxBody, ErrorResponse,
};
use crate::db::schemas::PublicComment;
use crate::server::AppState;
use crate::services::{CommentSubmission, ContactMessage};
use crate::types::Result;

async fn list_comments(state: &AppState, blog_id: &str) -> Result<Response<BoxBody>> {
    let blog_id = parse_id(blog_id)?;
    state.access().get_published_blog(blog_id).await?;
    let comments: Vec<PublicComment> = state
        .comments()
        .list(blog_id)
        .await?
        .into_iter()
        .map(PublicComment::from)
        .collect();
    Ok(json_response(StatusCode::OK, &comments))
}

async fn submit_comment<B>(
    req: Request<B>,
    state: &AppState,
    blog_id: &str,
) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let blog_id = parse_id(blog_id)?;
    state.access().get_published_blog(blog_id).await?;
    let submission: CommentSubmission = parse_json_body(req).await?;
    let comment = state.comments().submit(blog_id, submission).await?;
    Ok(json_response(
        StatusCode::CREATED,
        &PublicComment::from(comment),
    ))
}

fn record_download(state: &AppState, id: &str) -> Result<Response<BoxBody>> {
    let id = parse_id(id)?;
    let access = state.access();

    // Detached so a client hanging up does not cancel the count
    tokio::spawn(async move { access.increment_downloads(id).await });

    Ok(json_response(StatusCode::ACCEPTED, &json!({ "accepted": true })))
}

async fn send_contact<B>(req: Request<B>, state: &AppState) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let Some(relay) = state.contact.as_ref() else {
        return Ok(json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &ErrorResponse {
                error: "Contact form is not configured".into(),
                code: Some("CONTACT_DISABLED"),
                redirect: None,
            },
        ));
    };

    let message: ContactMessage = parse_json_body(req).await?;
    relay.send(&message).await?;
    Ok(json_response(StatusCode::OK, &json!({ "sent": true })))
}

/// Dispatch `/api/*`
pub async fn handle_api_request<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if method == Method::OPTIONS {
        return cors_preflight();
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let access = state.access();

    let result = match (&method, segments.as_slice()) {
        (&Method::GET, ["api", "blogs"]) => access
            .list_published_blogs()
            .await
            .map(|posts| json_response(StatusCode::OK, &posts)),
        (&Method::GET, ["api", "blogs", slug]) => access
            .view_blog(&decode_segment(slug))
            .await
            .map(|post| json_response(StatusCode::OK, &post)),
        (&Method::GET, ["api", "blogs", id, "comments"]) => list_comments(&state, id).await,
        (&Method::POST, ["api", "blogs", id, "comments"]) => submit_comment(req, &state, id).await,

        (&Method::GET, ["api", "articles"]) => access
            .list_published_articles()
            .await
            .map(|articles| json_response(StatusCode::OK, &articles)),
        (&Method::GET, ["api", "articles", "featured"]) => access
            .list_featured_articles()
            .await
            .map(|articles| json_response(StatusCode::OK, &articles)),
        (&Method::GET, ["api", "articles", slug]) => access
            .view_article(&decode_segment(slug))
            .await
            .map(|article| json_response(StatusCode::OK, &article)),
        (&Method::POST, ["api", "articles", id, "download"]) => record_download(&state, id),

        (&Method::GET, ["api", "resume"]) => access
            .get_resume()
            .await
            .map(|resume| json_response(StatusCode::OK, &resume)),

        (&Method::POST, ["api", "contact"]) => send_contact(req, &state).await,

        (_, ["api", "blogs"])
        | (_, ["api", "blogs", _])
        | (_, ["api", "blogs", _, "comments"])
        | (_, ["api", "articles"])
        | (_, ["api", "articles", _])
        | (_, ["api", "articles", _, "download"])
        | (_, ["api", "resume"])
        | (_, ["api", "contact"]) => Ok(method_not_allowed()),

        _ => Ok(not_found_response(&path)),
    };

    result.unwrap_or_else(error_response)
}
