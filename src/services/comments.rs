//! Visitor comments on blog posts
//!
//! Comments are published on submission; there is no moderation queue and
//! no edit operation. Admins may delete.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::schemas::{Comment, CommentRecord, COMMENT_COLLECTION};
use crate::db::{decode_row, encode_row, select_rows, ContentStore, Query};
use crate::types::{FolioError, Result};

/// Comment form as submitted by a visitor
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CommentSubmission {
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub comment_text: String,
}

impl CommentSubmission {
    /// Trim every field and reject blanks
    fn into_record(self, blog_id: Uuid) -> Result<CommentRecord> {
        let author_name = self.author_name.trim().to_string();
        let author_email = self.author_email.trim().to_string();
        let comment_text = self.comment_text.trim().to_string();

        if author_name.is_empty() || author_email.is_empty() || comment_text.is_empty() {
            return Err(FolioError::Validation(
                "Name, email and comment are required".into(),
            ));
        }

        Ok(CommentRecord {
            blog_id,
            author_name,
            author_email,
            comment_text,
            approved: true,
        })
    }
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn ContentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Validate and store a comment; nothing is written if validation fails
    pub async fn submit(&self, blog_id: Uuid, submission: CommentSubmission) -> Result<Comment> {
        let record = submission.into_record(blog_id)?;

        let rows = self
            .store
            .insert(COMMENT_COLLECTION, vec![encode_row(&record)?])
            .await
            .map_err(|e| {
                warn!("Comment submission for blog {} failed: {}", blog_id, e);
                e
            })?;

        let row = rows.into_iter().next().ok_or_else(|| {
            FolioError::Store("Comment insert returned no row".into())
        })?;
        let comment: Comment = decode_row(COMMENT_COLLECTION, row)?;

        info!("Comment {} added to blog {}", comment.id, blog_id);
        Ok(comment)
    }

    /// All comments on a post, newest first
    pub async fn list(&self, blog_id: Uuid) -> Result<Vec<Comment>> {
        let query = Query::new()
            .eq("blog_id", blog_id.to_string())
            .order_desc("created_at");
        select_rows(self.store.as_ref(), &query).await
    }

    /// All comments across posts, newest first
    pub async fn list_all(&self) -> Result<Vec<Comment>> {
        select_rows(self.store.as_ref(), &Query::new().order_desc("created_at")).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete(COMMENT_COLLECTION, &id.to_string()).await?;
        info!("Deleted comment {}", id);
        Ok(())
    }
}
