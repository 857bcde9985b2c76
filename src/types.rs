//! Core types for artindex

use serde::{Deserialize, Serialize};

/// Unique identifier for an article
pub type ArticleId = String;

/// An article record as it appears on one line of an input file.
///
/// The schema is fixed: unknown fields fail the parse, and `id` is the only
/// required field. Absent optional fields are left out of the indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Article {
    /// Unique identifier
    pub id: ArticleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Language tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Vec<String>>,
    /// Publication date, passed through as-is (the index mapping decides the format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Publication type tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_types: Option<Vec<String>>,
}

impl Article {
    /// Create an article with only an id set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            article_title: None,
            abstract_text: None,
            language: None,
            pub_date: None,
            filter_sources: None,
            keywords: None,
            pub_types: None,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.article_title = Some(title.into());
        self
    }

    /// Set the abstract text
    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    /// Set the publication date
    pub fn with_pub_date(mut self, date: impl Into<String>) -> Self {
        self.pub_date = Some(date.into());
        self
    }

    /// Set the language tags
    pub fn with_language(mut self, language: Vec<String>) -> Self {
        self.language = Some(language);
        self
    }

    /// Set the keywords
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }
}
