//! Admin routes
//!
//! Every `/admin/*` request passes the session guard before anything else
//! runs. Writes go through a store handle carrying the admin's access token.
//! Deletes are irreversible and require `?confirm=true`.

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::response::{
    admin_error_response, bearer_token, cors_preflight, json_response, method_not_allowed,
    not_found_response, parse_id, parse_json_body, query_param, BoxBody,
};
use crate::db::schemas::{Education, Experience, Interest, ResumeInfo, ResumeSection, Skill};
use crate::server::AppState;
use crate::services::{ArticleDraft, BlogDraft, CommentService, ContentEditor};
use crate::types::{FolioError, Result};

/// Create/update body: the editable fields plus the draft-or-publish choice
#[derive(Debug, Deserialize)]
struct SaveRequest<T> {
    #[serde(flatten)]
    draft: T,
    #[serde(default)]
    publish: bool,
}

fn require_confirmation(confirm: Option<&str>) -> Result<()> {
    match confirm {
        Some("true") => Ok(()),
        _ => Err(FolioError::BadRequest(
            "Deletion is permanent; repeat with ?confirm=true".into(),
        )),
    }
}

fn deleted(id: Uuid) -> Response<BoxBody> {
    json_response(StatusCode::OK, &json!({ "deleted": id }))
}

async fn save_entry<T, B>(req: Request<B>, editor: &ContentEditor) -> Result<Response<BoxBody>>
where
    T: ResumeSection,
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let entry: T = parse_json_body(req).await?;
    let saved = editor.save_resume_entry(entry).await?;
    Ok(json_response(StatusCode::OK, &saved))
}

async fn route<B>(
    req: Request<B>,
    path: &str,
    method: &Method,
    confirm: Option<&str>,
    editor: &ContentEditor,
    comments: &CommentService,
) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let response = match (method, segments.as_slice()) {
        (&Method::GET, ["admin", "dashboard"]) => {
            json_response(StatusCode::OK, &editor.dashboard().await?)
        }

        // blogs
        (&Method::GET, ["admin", "blogs"]) => {
            json_response(StatusCode::OK, &editor.list_all_blogs().await?)
        }
        (&Method::POST, ["admin", "blogs"]) => {
            let body: SaveRequest<BlogDraft> = parse_json_body(req).await?;
            let post = editor.create_blog(body.draft, body.publish).await?;
            json_response(StatusCode::CREATED, &post)
        }
        (&Method::GET, ["admin", "blogs", id]) => {
            json_response(StatusCode::OK, &editor.get_blog(parse_id(id)?).await?)
        }
        (&Method::PUT, ["admin", "blogs", id]) => {
            let id = parse_id(id)?;
            let body: SaveRequest<BlogDraft> = parse_json_body(req).await?;
            let post = editor.update_blog(id, body.draft, body.publish).await?;
            json_response(StatusCode::OK, &post)
        }
        (&Method::DELETE, ["admin", "blogs", id]) => {
            let id = parse_id(id)?;
            require_confirmation(confirm)?;
            editor.delete_blog(id).await?;
            deleted(id)
        }
        (&Method::POST, ["admin", "blogs", id, "toggle"]) => {
            let post = editor.toggle_blog_published(parse_id(id)?).await?;
            json_response(StatusCode::OK, &post)
        }

        // research
        (&Method::GET, ["admin", "research"]) => {
            json_response(StatusCode::OK, &editor.list_all_articles().await?)
        }
        (&Method::POST, ["admin", "research"]) => {
            let body: SaveRequest<ArticleDraft> = parse_json_body(req).await?;
            let article = editor.create_article(body.draft, body.publish).await?;
            json_response(StatusCode::CREATED, &article)
        }
        (&Method::GET, ["admin", "research", id]) => {
            json_response(StatusCode::OK, &editor.get_article(parse_id(id)?).await?)
        }
        (&Method::PUT, ["admin", "research", id]) => {
            let id = parse_id(id)?;
            let body: SaveRequest<ArticleDraft> = parse_json_body(req).await?;
            let article = editor.update_article(id, body.draft, body.publish).await?;
            json_response(StatusCode::OK, &article)
        }
        (&Method::DELETE, ["admin", "research", id]) => {
            let id = parse_id(id)?;
            require_confirmation(confirm)?;
            editor.delete_article(id).await?;
            deleted(id)
        }
        (&Method::POST, ["admin", "research", id, "toggle"]) => {
            let article = editor.toggle_article_published(parse_id(id)?).await?;
            json_response(StatusCode::OK, &article)
        }

        // comments
        (&Method::DELETE, ["admin", "comments", id]) => {
            let id = parse_id(id)?;
            require_confirmation(confirm)?;
            comments.delete(id).await?;
            deleted(id)
        }

        // resume
        (&Method::GET, ["admin", "resume"]) => {
            json_response(StatusCode::OK, &editor.get_resume().await?)
        }
        (&Method::PUT, ["admin", "resume", "info"]) => {
            let info: ResumeInfo = parse_json_body(req).await?;
            json_response(StatusCode::OK, &editor.save_resume_info(info).await?)
        }
        (&Method::POST, ["admin", "resume", "education"]) => {
            save_entry::<Education, B>(req, editor).await?
        }
        (&Method::POST, ["admin", "resume", "experience"]) => {
            save_entry::<Experience, B>(req, editor).await?
        }
        (&Method::POST, ["admin", "resume", "skills"]) => {
            save_entry::<Skill, B>(req, editor).await?
        }
        (&Method::POST, ["admin", "resume", "interests"]) => {
            save_entry::<Interest, B>(req, editor).await?
        }
        (&Method::DELETE, ["admin", "resume", section, id]) => {
            let id = parse_id(id)?;
            require_confirmation(confirm)?;
            editor.delete_resume_entry(section, id).await?;
            deleted(id)
        }

        (_, ["admin", "dashboard"])
        | (_, ["admin", "blogs" | "research"])
        | (_, ["admin", "blogs" | "research", _])
        | (_, ["admin", "blogs" | "research", _, "toggle"])
        | (_, ["admin", "comments", _])
        | (_, ["admin", "resume"])
        | (_, ["admin", "resume", _])
        | (_, ["admin", "resume", _, _]) => method_not_allowed(),

        _ => not_found_response(path),
    };

    Ok(response)
}

/// Dispatch `/admin/*`
pub async fn handle_admin_request<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
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
    let confirm = query_param(&req, "confirm");

    let user = match state.guard.require_admin(token.as_deref()).await {
        Ok(user) => user,
        Err(e) => return admin_error_response(e),
    };
    // Authorized implies a token was presented
    let Some(token) = token else {
        return admin_error_response(FolioError::Unauthorized("Missing bearer token".into()));
    };
    debug!("Admin request {} {} by {}", method, path, user.id);

    let editor = state.editor_for(&token);
    let comments = state.comments_for(&token);

    route(req, &path, &method, confirm.as_deref(), &editor, &comments)
        .await
        .unwrap_or_else(admin_error_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_confirmation() {
        assert!(require_confirmation(Some("true")).is_ok());
        assert!(require_confirmation(Some("yes")).is_err());
        assert!(require_confirmation(None).is_err());
    }

    #[test]
    fn test_save_request_flattens_draft() {
        let body: SaveRequest<BlogDraft> = serde_json::from_value(json!({
            "title": "Oaxaca",
            "excerpt": "Markets",
            "content": "<p>Mole</p>",
            "publish": true
        }))
        .unwrap();

        assert!(body.publish);
        assert_eq!(body.draft.title, "Oaxaca");
    }
}
