//! Row schemas for the hosted store's collections

mod blog;
mod comment;
mod research;
mod resume;

pub use blog::{BlogCategory, BlogPost, BlogRecord, BLOG_COLLECTION, BLOG_LIST_LIMIT, DEFAULT_READ_TIME};
pub use comment::{Comment, CommentRecord, PublicComment, COMMENT_COLLECTION};
pub use research::{
    ArticleAuthor, ArticleType, Publication, ResearchArticle, ResearchRecord, FEATURED_LIMIT,
    RESEARCH_COLLECTION,
};
pub use resume::{
    section_collection, Education, Experience, Interest, Resume, ResumeInfo, ResumePdf,
    ResumeSection, Skill,
    DISPLAY_ORDER, EDUCATION_COLLECTION, EXPERIENCE_COLLECTION, INTERESTS_COLLECTION,
    RESUME_INFO_COLLECTION, RESUME_PDF_COLLECTION, SKILLS_COLLECTION,
};
