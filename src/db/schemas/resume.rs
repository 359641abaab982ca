//! Resume schemas
//!
//! `resume_info` is a singleton row. The four list sections are ordered by
//! `display_order` ascending and have no publish flag. `resume_pdf` keeps an
//! upload history; the newest row is the current file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use uuid::Uuid;

use crate::db::Row;
use crate::types::{FolioError, Result};

pub const RESUME_INFO_COLLECTION: &str = "resume_info";
pub const EDUCATION_COLLECTION: &str = "resume_education";
pub const EXPERIENCE_COLLECTION: &str = "resume_experience";
pub const SKILLS_COLLECTION: &str = "resume_skills";
pub const INTERESTS_COLLECTION: &str = "resume_interests";
pub const RESUME_PDF_COLLECTION: &str = "resume_pdf";

/// Ordering column shared by every list section
pub const DISPLAY_ORDER: &str = "display_order";

/// Personal details shown at the top of the resume
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ResumeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub full_name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub professional_title: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub email: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub phone: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub location: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub linkedin_url: String,
}

impl Row for ResumeInfo {
    const COLLECTION: &'static str = RESUME_INFO_COLLECTION;
}

#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Education {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub degree_title: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub institution: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub location: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub start_date: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub end_date: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub specialization: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub display_order: i32,
}

#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Experience {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub position_title: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub company: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub location: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub start_date: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub end_date: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub description: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub display_order: i32,
}

#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Skill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub display_order: i32,
}

#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Interest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub display_order: i32,
}

/// Uploaded resume PDF
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResumePdf {
    pub id: Uuid,
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Row for ResumePdf {
    const COLLECTION: &'static str = RESUME_PDF_COLLECTION;
}

/// Ordered, independently edited resume list entry
pub trait ResumeSection: Row + Clone {
    /// Section name used in routes (`education`, `experience`, ...)
    const SECTION: &'static str;

    fn id(&self) -> Option<Uuid>;

    /// Reject entries missing their primary text field
    fn validate(&self) -> Result<()>;
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FolioError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

impl Row for Education {
    const COLLECTION: &'static str = EDUCATION_COLLECTION;
}

impl ResumeSection for Education {
    const SECTION: &'static str = "education";

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require(&self.degree_title, "degree_title")
    }
}

impl Row for Experience {
    const COLLECTION: &'static str = EXPERIENCE_COLLECTION;
}

impl ResumeSection for Experience {
    const SECTION: &'static str = "experience";

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require(&self.position_title, "position_title")
    }
}

impl Row for Skill {
    const COLLECTION: &'static str = SKILLS_COLLECTION;
}

impl ResumeSection for Skill {
    const SECTION: &'static str = "skills";

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require(&self.name, "name")
    }
}

impl Row for Interest {
    const COLLECTION: &'static str = INTERESTS_COLLECTION;
}

impl ResumeSection for Interest {
    const SECTION: &'static str = "interests";

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require(&self.name, "name")
    }
}

/// Collection backing a section name, `None` for unknown sections
pub fn section_collection(section: &str) -> Option<&'static str> {
    [
        (Education::SECTION, Education::COLLECTION),
        (Experience::SECTION, Experience::COLLECTION),
        (Skill::SECTION, Skill::COLLECTION),
        (Interest::SECTION, Interest::COLLECTION),
    ]
    .into_iter()
    .find_map(|(name, collection)| (name == section).then_some(collection))
}

/// The whole resume as rendered on the public page
#[derive(Serialize, Clone, Debug, PartialEq, Default)]
pub struct Resume {
    pub info: Option<ResumeInfo>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub skills: Vec<Skill>,
    pub interests: Vec<Interest>,
    pub pdf: Option<ResumePdf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_validation() {
        assert!(Education::default().validate().is_err());
        assert!(Education {
            degree_title: "MA International Affairs".into(),
            ..Default::default()
        }
        .validate()
        .is_ok());

        assert!(Skill {
            name: "   ".into(),
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_section_collection() {
        assert_eq!(section_collection("skills"), Some(SKILLS_COLLECTION));
        assert_eq!(section_collection("experience"), Some(EXPERIENCE_COLLECTION));
        assert_eq!(section_collection("hobbies"), None);
    }

    #[test]
    fn test_new_entries_serialize_without_id() {
        let value = serde_json::to_value(Interest {
            name: "Hiking".into(),
            ..Default::default()
        })
        .unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["display_order"], 0);
    }
}
