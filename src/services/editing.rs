//! Admin editing of blogs, research articles and the resume
//!
//! Nothing here filters on `published`: editors see drafts. Every write is a
//! single store call, so a store failure leaves nothing half-written. Callers
//! build an editor from a store handle carrying the admin's credentials.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::access::ContentAccess;
use super::comments::CommentService;
use super::slug::slugify;
use crate::db::schemas::{
    section_collection, ArticleAuthor, ArticleType, BlogCategory, BlogPost, BlogRecord, Comment,
    Publication, ResearchArticle, ResearchRecord, Resume, ResumeInfo, ResumeSection,
    BLOG_COLLECTION, DEFAULT_READ_TIME, RESEARCH_COLLECTION, RESUME_INFO_COLLECTION,
};
use crate::db::{decode_row, encode_row, select_rows, ContentStore, Query, Row};
use crate::types::{FolioError, Result};

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FolioError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Slug from an explicit value, falling back to the title
fn derive_slug(explicit: Option<&str>, title: &str) -> Result<String> {
    let source = explicit.filter(|s| !s.trim().is_empty()).unwrap_or(title);
    let slug = slugify(source);
    if slug.is_empty() {
        return Err(FolioError::Validation(
            "Slug must contain at least one letter or digit".into(),
        ));
    }
    Ok(slug)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Editable fields of a blog post as submitted by the editor
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BlogDraft {
    #[serde(default)]
    pub title: String,
    /// Explicit slug; derived from the title when absent on create, kept
    /// unchanged when absent on update
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category: BlogCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub read_time: Option<u32>,
    #[serde(default)]
    pub author: Option<String>,
}

impl BlogDraft {
    pub fn validate(&self) -> Result<()> {
        require(&self.title, "title")?;
        require(&self.excerpt, "excerpt")?;
        require(&self.content, "content")
    }

    fn into_record(self, slug: String, author: String, published: bool) -> BlogRecord {
        BlogRecord {
            title: self.title.trim().to_string(),
            slug,
            excerpt: self.excerpt,
            content: self.content,
            cover_image: non_blank(self.cover_image),
            category: self.category,
            tags: self.tags,
            location: non_blank(self.location),
            read_time: self
                .read_time
                .filter(|&t| t > 0)
                .unwrap_or(DEFAULT_READ_TIME),
            author,
            published,
        }
    }
}

/// Editable fields of a research article as submitted by the editor
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ArticleDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_html: String,
    #[serde(rename = "type", default)]
    pub article_type: ArticleType,
    #[serde(default)]
    pub authors: Vec<ArticleAuthor>,
    #[serde(default)]
    pub publication: Publication,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl ArticleDraft {
    pub fn validate(&self) -> Result<()> {
        require(&self.title, "title")?;
        require(&self.abstract_html, "abstract")
    }

    fn into_record(self, slug: String, published: bool) -> ResearchRecord {
        let publication_date: Option<NaiveDate> = self.publication.parsed_date();
        ResearchRecord {
            title: self.title.trim().to_string(),
            slug,
            abstract_html: self.abstract_html,
            article_type: self.article_type,
            authors: self
                .authors
                .into_iter()
                .filter(|a| !a.name.trim().is_empty())
                .collect(),
            publication: self.publication,
            publication_date,
            keywords: self.keywords,
            categories: self.categories,
            tags: self.tags,
            cover_image: non_blank(self.cover_image),
            pdf_url: non_blank(self.pdf_url),
            external_link: non_blank(self.external_link),
            featured: self.featured,
            published,
        }
    }
}

/// Post a comment was left on, as shown on the dashboard
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PostRef {
    pub title: String,
    pub slug: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DashboardComment {
    #[serde(flatten)]
    pub comment: Comment,
    /// `None` when the post no longer exists
    pub blog: Option<PostRef>,
}

/// Everything the admin dashboard lists
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub blogs: Vec<BlogPost>,
    pub comments: Vec<DashboardComment>,
    pub articles: Vec<ResearchArticle>,
}

#[derive(Clone)]
pub struct ContentEditor {
    store: Arc<dyn ContentStore>,
    default_author: String,
}

impl ContentEditor {
    pub fn new(store: Arc<dyn ContentStore>, default_author: impl Into<String>) -> Self {
        Self {
            store,
            default_author: default_author.into(),
        }
    }

    fn newest_first() -> Query {
        Query::new().order_desc("created_at")
    }

    async fn fetch_by_id<T: Row>(&self, id: Uuid, kind: &str) -> Result<T> {
        let query = Query::new().eq("id", id.to_string()).limit(1);
        select_rows(self.store.as_ref(), &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FolioError::NotFound(format!("{} {}", kind, id)))
    }

    async fn write_one<T: Row>(&self, id: Uuid, patch: Value, kind: &str) -> Result<T> {
        let rows = self
            .store
            .update(T::COLLECTION, &id.to_string(), patch)
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| FolioError::NotFound(format!("{} {}", kind, id)))?;
        decode_row(T::COLLECTION, row)
    }

    async fn insert_one<T: Row>(&self, record: Value) -> Result<T> {
        let rows = self.store.insert(T::COLLECTION, vec![record]).await?;
        let row = rows.into_iter().next().ok_or_else(|| {
            FolioError::Store(format!("Insert into {} returned no row", T::COLLECTION))
        })?;
        decode_row(T::COLLECTION, row)
    }

    // ---- blogs ----

    /// All posts including drafts, newest first
    pub async fn list_all_blogs(&self) -> Result<Vec<BlogPost>> {
        select_rows(self.store.as_ref(), &Self::newest_first()).await
    }

    pub async fn get_blog(&self, id: Uuid) -> Result<BlogPost> {
        self.fetch_by_id(id, "Blog post").await
    }

    pub async fn create_blog(&self, draft: BlogDraft, publish: bool) -> Result<BlogPost> {
        draft.validate()?;
        let slug = derive_slug(draft.slug.as_deref(), &draft.title)?;
        let author = non_blank(draft.author.clone()).unwrap_or_else(|| self.default_author.clone());

        let record = draft.into_record(slug, author, publish);
        let post: BlogPost = self.insert_one(encode_row(&record)?).await?;

        info!("Created blog post {} ({}), published={}", post.id, post.slug, publish);
        Ok(post)
    }

    /// Replace every editable field of a post
    pub async fn update_blog(&self, id: Uuid, draft: BlogDraft, publish: bool) -> Result<BlogPost> {
        draft.validate()?;
        let existing = self.get_blog(id).await?;

        let slug = match draft.slug.as_deref() {
            Some(explicit) => derive_slug(Some(explicit), &draft.title)?,
            None => existing.slug,
        };
        let author = non_blank(draft.author.clone()).unwrap_or(existing.author);

        let record = draft.into_record(slug, author, publish);
        let post = self
            .write_one::<BlogPost>(id, encode_row(&record)?, "Blog post")
            .await?;

        info!("Updated blog post {}, published={}", id, publish);
        Ok(post)
    }

    pub async fn toggle_blog_published(&self, id: Uuid) -> Result<BlogPost> {
        let existing = self.get_blog(id).await?;
        let post = self
            .write_one::<BlogPost>(
                id,
                json!({ "published": !existing.published }),
                "Blog post",
            )
            .await?;

        info!("Blog post {} published={}", id, post.published);
        Ok(post)
    }

    /// Hard delete; callers confirm before calling
    pub async fn delete_blog(&self, id: Uuid) -> Result<()> {
        self.store.delete(BLOG_COLLECTION, &id.to_string()).await?;
        info!("Deleted blog post {}", id);
        Ok(())
    }

    // ---- research ----

    pub async fn list_all_articles(&self) -> Result<Vec<ResearchArticle>> {
        select_rows(self.store.as_ref(), &Self::newest_first()).await
    }

    pub async fn get_article(&self, id: Uuid) -> Result<ResearchArticle> {
        self.fetch_by_id(id, "Research article").await
    }

    pub async fn create_article(
        &self,
        draft: ArticleDraft,
        publish: bool,
    ) -> Result<ResearchArticle> {
        draft.validate()?;
        let slug = derive_slug(draft.slug.as_deref(), &draft.title)?;

        let record = draft.into_record(slug, publish);
        let article: ResearchArticle = self.insert_one(encode_row(&record)?).await?;

        info!(
            "Created research article {} ({}), published={}",
            article.id, article.slug, publish
        );
        Ok(article)
    }

    pub async fn update_article(
        &self,
        id: Uuid,
        draft: ArticleDraft,
        publish: bool,
    ) -> Result<ResearchArticle> {
        draft.validate()?;
        let existing = self.get_article(id).await?;

        let slug = match draft.slug.as_deref() {
            Some(explicit) => derive_slug(Some(explicit), &draft.title)?,
            None => existing.slug,
        };

        let record = draft.into_record(slug, publish);
        let article = self
            .write_one::<ResearchArticle>(id, encode_row(&record)?, "Research article")
            .await?;

        info!("Updated research article {}, published={}", id, publish);
        Ok(article)
    }

    pub async fn toggle_article_published(&self, id: Uuid) -> Result<ResearchArticle> {
        let existing = self.get_article(id).await?;
        let article = self
            .write_one::<ResearchArticle>(
                id,
                json!({ "published": !existing.published }),
                "Research article",
            )
            .await?;

        info!("Research article {} published={}", id, article.published);
        Ok(article)
    }

    pub async fn delete_article(&self, id: Uuid) -> Result<()> {
        self.store
            .delete(RESEARCH_COLLECTION, &id.to_string())
            .await?;
        info!("Deleted research article {}", id);
        Ok(())
    }

    // ---- dashboard ----

    /// Blogs, comments and articles, fetched concurrently
    pub async fn dashboard(&self) -> Result<Dashboard> {
        let comments = CommentService::new(self.store.clone());
        let (blogs, comments, articles) = futures::try_join!(
            self.list_all_blogs(),
            comments.list_all(),
            self.list_all_articles(),
        )?;

        let comments = comments
            .into_iter()
            .map(|comment| {
                let blog = blogs
                    .iter()
                    .find(|post| post.id == comment.blog_id)
                    .map(|post| PostRef {
                        title: post.title.clone(),
                        slug: post.slug.clone(),
                    });
                DashboardComment { comment, blog }
            })
            .collect();

        Ok(Dashboard {
            blogs,
            comments,
            articles,
        })
    }

    // ---- resume ----

    pub async fn get_resume(&self) -> Result<Resume> {
        ContentAccess::new(self.store.clone()).get_resume().await
    }

    /// Save the singleton resume header
    ///
    /// A draft without an id takes over the existing row, if any.
    pub async fn save_resume_info(&self, mut info: ResumeInfo) -> Result<ResumeInfo> {
        if info.id.is_none() {
            let existing =
                select_rows::<ResumeInfo>(self.store.as_ref(), &Query::new().limit(1)).await?;
            info.id = Some(
                existing
                    .into_iter()
                    .next()
                    .and_then(|row| row.id)
                    .unwrap_or_else(Uuid::new_v4),
            );
        }

        let row = self
            .store
            .upsert(RESUME_INFO_COLLECTION, encode_row(&info)?)
            .await?;
        info!("Saved resume info");
        decode_row(RESUME_INFO_COLLECTION, row)
    }

    /// Insert a new section entry, or replace an existing one by id
    pub async fn save_resume_entry<T: ResumeSection>(&self, entry: T) -> Result<T> {
        entry.validate()?;

        let saved = match entry.id() {
            Some(_) => {
                let row = self.store.upsert(T::COLLECTION, encode_row(&entry)?).await?;
                decode_row(T::COLLECTION, row)?
            }
            None => self.insert_one::<T>(encode_row(&entry)?).await?,
        };

        info!("Saved resume {} entry", T::SECTION);
        Ok(saved)
    }

    /// Delete a section entry by section name (`education`, `skills`, ...)
    pub async fn delete_resume_entry(&self, section: &str, id: Uuid) -> Result<()> {
        let collection = section_collection(section)
            .ok_or_else(|| FolioError::NotFound(format!("Resume section '{}'", section)))?;

        self.store.delete(collection, &id.to_string()).await?;
        info!("Deleted resume {} entry {}", section, id);
        Ok(())
    }
}
