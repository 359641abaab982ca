//! Application services over the store and auth boundaries

pub mod access;
pub mod comments;
pub mod contact;
pub mod editing;
pub mod slug;

pub use access::ContentAccess;
pub use comments::{CommentService, CommentSubmission};
pub use contact::{ContactMessage, ContactRelay};
pub use editing::{ArticleDraft, BlogDraft, ContentEditor, Dashboard, DashboardComment, PostRef};
pub use slug::slugify;
