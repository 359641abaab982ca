//! Blog post schema
//!
//! Travel blog posts. Rows start as drafts (`published = false`) and only
//! published rows are visible through the public access layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use std::fmt;
use uuid::Uuid;

use crate::db::Row;

/// Collection name for blog posts
pub const BLOG_COLLECTION: &str = "blogs";

/// Public listing cap for blog posts
pub const BLOG_LIST_LIMIT: usize = 50;

/// Reading time used when none (or zero) is given
pub const DEFAULT_READ_TIME: u32 = 5;

/// Fixed set of blog categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BlogCategory {
    #[default]
    #[serde(rename = "Travel Stories")]
    TravelStories,
    #[serde(rename = "Cultural Insights")]
    CulturalInsights,
    #[serde(rename = "International Relations")]
    InternationalRelations,
    #[serde(rename = "Personal Reflections")]
    PersonalReflections,
    #[serde(rename = "Photography")]
    Photography,
    #[serde(rename = "Food & Culture")]
    FoodAndCulture,
}

impl BlogCategory {
    pub const ALL: [BlogCategory; 6] = [
        BlogCategory::TravelStories,
        BlogCategory::CulturalInsights,
        BlogCategory::InternationalRelations,
        BlogCategory::PersonalReflections,
        BlogCategory::Photography,
        BlogCategory::FoodAndCulture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlogCategory::TravelStories => "Travel Stories",
            BlogCategory::CulturalInsights => "Cultural Insights",
            BlogCategory::InternationalRelations => "International Relations",
            BlogCategory::PersonalReflections => "Personal Reflections",
            BlogCategory::Photography => "Photography",
            BlogCategory::FoodAndCulture => "Food & Culture",
        }
    }
}

impl fmt::Display for BlogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blog post as stored
///
/// Older rows may carry explicit nulls in the optional-looking columns; those
/// decode to the column default.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BlogPost {
    pub id: Uuid,

    pub title: String,

    /// URL-safe identifier used in public links
    pub slug: String,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub excerpt: String,

    /// Rich content (HTML)
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub cover_image: Option<String>,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub category: BlogCategory,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub location: Option<String>,

    /// Reading time in minutes; null or zero reads as the default
    #[serde(default = "default_read_time", deserialize_with = "read_time_or_default")]
    pub read_time: u32,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub author: String,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub views: u64,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub published: bool,

    pub created_at: DateTime<Utc>,
}

fn default_read_time() -> u32 {
    DEFAULT_READ_TIME
}

fn read_time_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = Option::<u32>::deserialize(deserializer)?;
    Ok(minutes.filter(|m| *m > 0).unwrap_or(DEFAULT_READ_TIME))
}

impl Row for BlogPost {
    const COLLECTION: &'static str = BLOG_COLLECTION;
}

/// Editable columns of a blog post, written in full on create and update
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BlogRecord {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub category: BlogCategory,
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub read_time: u32,
    pub author: String,
    pub published: bool,
}
