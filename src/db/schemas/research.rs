//! Research article schema

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use uuid::Uuid;

use crate::db::Row;

/// Collection name for research articles
pub const RESEARCH_COLLECTION: &str = "research_articles";

/// Cap on featured articles returned to the home page
pub const FEATURED_LIMIT: usize = 3;

/// Kind of research output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArticleType {
    #[default]
    ResearchPaper,
    PolicyBrief,
    WorkingPaper,
    ConferencePresentation,
    Report,
    Thesis,
}

impl ArticleType {
    /// Human label, e.g. "Policy Brief"
    pub fn label(&self) -> &'static str {
        match self {
            ArticleType::ResearchPaper => "Research Paper",
            ArticleType::PolicyBrief => "Policy Brief",
            ArticleType::WorkingPaper => "Working Paper",
            ArticleType::ConferencePresentation => "Conference Presentation",
            ArticleType::Report => "Report",
            ArticleType::Thesis => "Thesis",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ArticleAuthor {
    pub name: String,
    #[serde(default)]
    pub affiliation: String,
}

/// Publication metadata; which fields are filled depends on the article type
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Publication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

impl Publication {
    /// Parse `date` as a calendar date (`YYYY-MM-DD`, or `YYYY-MM` as the 1st)
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d"))
            .ok()
    }
}

/// Research article as stored
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResearchArticle {
    pub id: Uuid,

    pub title: String,

    pub slug: String,

    /// Rich abstract (HTML)
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename = "abstract", default)]
    pub abstract_html: String,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(rename = "type", default)]
    pub article_type: ArticleType,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub authors: Vec<ArticleAuthor>,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub publication: Publication,

    /// Ordering key for public listings
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub categories: Vec<String>,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub cover_image: Option<String>,

    #[serde(default)]
    pub pdf_url: Option<String>,

    #[serde(default)]
    pub external_link: Option<String>,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub featured: bool,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub published: bool,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub views: u64,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub downloads: u64,

    pub created_at: DateTime<Utc>,
}

impl Row for ResearchArticle {
    const COLLECTION: &'static str = RESEARCH_COLLECTION;
}

/// Editable columns of a research article
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ResearchRecord {
    pub title: String,
    pub slug: String,
    #[serde(rename = "abstract")]
    pub abstract_html: String,
    #[serde(rename = "type")]
    pub article_type: ArticleType,
    pub authors: Vec<ArticleAuthor>,
    pub publication: Publication,
    pub publication_date: Option<NaiveDate>,
    pub keywords: Vec<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub pdf_url: Option<String>,
    pub external_link: Option<String>,
    pub featured: bool,
    pub published: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_and_abstract_wire_names() {
        let article: ResearchArticle = serde_json::from_value(json!({
            "id": "0b5bde7e-4a5c-4f5e-9d38-1ad6c7a5f001",
            "title": "Trade Corridors",
            "slug": "trade-corridors",
            "abstract": "<p>Summary</p>",
            "type": "policy_brief",
            "created_at": "2024-03-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(article.article_type, ArticleType::PolicyBrief);
        assert_eq!(article.abstract_html, "<p>Summary</p>");
        assert_eq!(article.article_type.label(), "Policy Brief");
    }

    #[test]
    fn test_publication_date_parsing() {
        let full = Publication {
            date: Some("2023-11-20".into()),
            ..Default::default()
        };
        assert_eq!(full.parsed_date(), NaiveDate::from_ymd_opt(2023, 11, 20));

        let month = Publication {
            date: Some("2023-11".into()),
            ..Default::default()
        };
        assert_eq!(month.parsed_date(), NaiveDate::from_ymd_opt(2023, 11, 1));

        let junk = Publication {
            date: Some("fall semester".into()),
            ..Default::default()
        };
        assert_eq!(junk.parsed_date(), None);
    }
}
