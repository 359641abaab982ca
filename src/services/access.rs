//! Public, read-only access to published content
//!
//! Every lookup here is filtered to `published = true`, whoever the caller
//! is. Counter updates are separate operations from the reads they follow;
//! `view_blog` and `view_article` compose the two and never let a counter
//! failure fail the read.

use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::db::schemas::{
    BlogPost, Education, Experience, Interest, ResearchArticle, Resume, ResumeInfo, ResumePdf,
    Skill, BLOG_COLLECTION, BLOG_LIST_LIMIT, DISPLAY_ORDER, FEATURED_LIMIT,
};
use crate::db::{
    select_rows, ContentStore, Query, INCREMENT_RESEARCH_DOWNLOADS, INCREMENT_RESEARCH_VIEWS,
};
use crate::types::{FolioError, Result};

#[derive(Clone)]
pub struct ContentAccess {
    store: Arc<dyn ContentStore>,
}

impl ContentAccess {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    fn published() -> Query {
        Query::new().eq("published", true)
    }

    /// Published blog posts, newest first, capped at 50
    pub async fn list_published_blogs(&self) -> Result<Vec<BlogPost>> {
        let query = Self::published()
            .order_desc("created_at")
            .limit(BLOG_LIST_LIMIT);
        select_rows(self.store.as_ref(), &query).await
    }

    /// Published research articles, latest publication date first
    pub async fn list_published_articles(&self) -> Result<Vec<ResearchArticle>> {
        let query = Self::published().order_desc("publication_date");
        select_rows(self.store.as_ref(), &query).await
    }

    /// Published and featured articles, at most three
    pub async fn list_featured_articles(&self) -> Result<Vec<ResearchArticle>> {
        let query = Self::published()
            .eq("featured", true)
            .order_desc("publication_date")
            .limit(FEATURED_LIMIT);
        select_rows(self.store.as_ref(), &query).await
    }

    pub async fn get_blog_by_slug(&self, slug: &str) -> Result<BlogPost> {
        let query = Self::published().eq("slug", slug).limit(1);
        select_rows(self.store.as_ref(), &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FolioError::NotFound(format!("Blog post '{}'", slug)))
    }

    /// A published post by id; drafts read as missing
    pub async fn get_published_blog(&self, id: Uuid) -> Result<BlogPost> {
        let query = Self::published().eq("id", id.to_string()).limit(1);
        select_rows(self.store.as_ref(), &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FolioError::NotFound(format!("Blog post {}", id)))
    }

    pub async fn get_article_by_slug(&self, slug: &str) -> Result<ResearchArticle> {
        let query = Self::published().eq("slug", slug).limit(1);
        select_rows(self.store.as_ref(), &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FolioError::NotFound(format!("Research article '{}'", slug)))
    }

    /// Count one view of a post
    ///
    /// Writes `views + 1` based on the row as it was read, so concurrent
    /// views can lose increments.
    ///
    /// An update that touches no row (deleted meanwhile, or refused by the
    /// store's row policies) counts as not recorded.
    pub async fn record_blog_view(&self, post: &BlogPost) -> Result<()> {
        let updated = self
            .store
            .update(
                BLOG_COLLECTION,
                &post.id.to_string(),
                json!({ "views": post.views + 1 }),
            )
            .await?;
        if updated.is_empty() {
            return Err(FolioError::NotFound(format!("Blog post {}", post.id)));
        }
        Ok(())
    }

    /// Count one view of an article through the store's counter procedure
    pub async fn record_article_view(&self, id: Uuid) -> Result<()> {
        self.store
            .rpc(INCREMENT_RESEARCH_VIEWS, json!({ "article_id": id }))
            .await?;
        Ok(())
    }

    /// Fetch a published post and count the view
    ///
    /// The returned post reflects the view when it was recorded.
    pub async fn view_blog(&self, slug: &str) -> Result<BlogPost> {
        let mut post = self.get_blog_by_slug(slug).await?;
        match self.record_blog_view(&post).await {
            Ok(()) => post.views += 1,
            Err(e) => warn!("Failed to record view for blog {}: {}", post.id, e),
        }
        Ok(post)
    }

    /// Fetch a published article and count the view
    pub async fn view_article(&self, slug: &str) -> Result<ResearchArticle> {
        let mut article = self.get_article_by_slug(slug).await?;
        match self.record_article_view(article.id).await {
            Ok(()) => article.views += 1,
            Err(e) => warn!("Failed to record view for article {}: {}", article.id, e),
        }
        Ok(article)
    }

    /// Count one download; failures are logged, never returned
    pub async fn increment_downloads(&self, id: Uuid) {
        if let Err(e) = self
            .store
            .rpc(INCREMENT_RESEARCH_DOWNLOADS, json!({ "article_id": id }))
            .await
        {
            warn!("Failed to record download for article {}: {}", id, e);
        }
    }

    /// The full resume; all sections are fetched concurrently
    pub async fn get_resume(&self) -> Result<Resume> {
        let store = self.store.as_ref();
        let by_order = Query::new().order_asc(DISPLAY_ORDER);
        let info_query = Query::new().limit(1);
        let pdf_query = Query::new().order_desc("uploaded_at").limit(1);

        let (info, education, experience, skills, interests, pdf) = futures::try_join!(
            select_rows::<ResumeInfo>(store, &info_query),
            select_rows::<Education>(store, &by_order),
            select_rows::<Experience>(store, &by_order),
            select_rows::<Skill>(store, &by_order),
            select_rows::<Interest>(store, &by_order),
            select_rows::<ResumePdf>(store, &pdf_query),
        )?;

        Ok(Resume {
            info: info.into_iter().next(),
            education,
            experience,
            skills,
            interests,
            pdf: pdf.into_iter().next(),
        })
    }
}
