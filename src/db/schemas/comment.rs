//! Blog comment schema
//!
//! Comments are auto-approved: `approved` is always written as true and no
//! moderation state exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Row;

/// Collection name for blog comments
pub const COMMENT_COLLECTION: &str = "blog_comments";

/// Comment as stored
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub author_name: String,
    pub author_email: String,
    pub comment_text: String,
    #[serde(default = "default_true")]
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Row for Comment {
    const COLLECTION: &'static str = COMMENT_COLLECTION;
}

/// Columns written when a visitor submits a comment
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CommentRecord {
    pub blog_id: Uuid,
    pub author_name: String,
    pub author_email: String,
    pub comment_text: String,
    pub approved: bool,
}

/// Comment as shown to the public (no email address)
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PublicComment {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub author_name: String,
    pub comment_text: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for PublicComment {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            blog_id: c.blog_id,
            author_name: c.author_name,
            comment_text: c.comment_text,
            approved: c.approved,
            created_at: c.created_at,
        }
    }
}
