//! Catalog entities
//!
//! Field order of every struct matches the order properties are written to
//! newly created source entries.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Top-level grouping of topics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Identifier, kept equal to `slug`
    pub id: String,
    /// Display title, unique case-insensitively
    pub title: String,
    /// URL slug, unique case-insensitively
    #[serde(default)]
    pub slug: String,
    /// Owned topics in display order
    #[serde(default)]
    pub items: Vec<TopicRef>,
}

impl Category {
    /// Create an empty category whose id is its slug
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: slug.clone(),
            title: title.into(),
            slug,
            items: Vec::new(),
        }
    }

    /// Find an owned topic by slug
    #[must_use]
    pub fn topic(&self, slug: &str) -> Option<&TopicRef> {
        self.items.iter().find(|t| t.slug == slug)
    }

    /// Whether any topic is owned
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Index view of a topic, stored inside its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRef {
    /// Identifier, kept equal to `slug`
    pub id: String,
    /// Owning category id
    pub category_id: String,
    /// Display name
    pub name: String,
    /// URL slug, also the per-topic directory name
    pub slug: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Cover image URL or path
    #[serde(default)]
    pub image: String,
}

/// Input for creating a topic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTopic {
    /// Display name
    pub name: String,
    /// URL slug
    pub slug: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Cover image
    #[serde(default)]
    pub image: String,
}

impl NewTopic {
    /// Build the index entry for this topic under `category_id`
    #[must_use]
    pub fn into_ref(self, category_id: impl Into<String>) -> TopicRef {
        TopicRef {
            id: self.slug.clone(),
            category_id: category_id.into(),
            name: self.name,
            slug: self.slug,
            description: self.description,
            image: self.image,
        }
    }
}

/// Detail view of a topic, stored in its own data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Identifier, kept equal to `slug`
    #[serde(default)]
    pub id: String,
    /// Owning category id
    pub category_id: String,
    /// Display name
    pub name: String,
    /// URL slug
    pub slug: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Cover image
    #[serde(default)]
    pub image: String,
    /// Ordered chapters
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Topic {
    /// Topic with no chapters, derived from its index entry
    #[must_use]
    pub fn from_ref(topic_ref: &TopicRef) -> Self {
        Self {
            id: topic_ref.slug.clone(),
            category_id: topic_ref.category_id.clone(),
            name: topic_ref.name.clone(),
            slug: topic_ref.slug.clone(),
            description: topic_ref.description.clone(),
            image: topic_ref.image.clone(),
            chapters: Vec::new(),
        }
    }

    /// Index entry for this topic
    #[must_use]
    pub fn to_ref(&self) -> TopicRef {
        TopicRef {
            id: self.slug.clone(),
            category_id: self.category_id.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
        }
    }

    /// All articles across chapters, in order
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.chapters.iter().flat_map(|c| c.articles.iter())
    }

    /// Total article count
    #[inline]
    #[must_use]
    pub fn article_count(&self) -> usize {
        self.chapters.iter().map(|c| c.articles.len()).sum()
    }
}

/// Ordered group of articles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// 1-based position, recomputed on every rewrite
    #[serde(default)]
    pub id: String,
    /// Chapter title
    pub title: String,
    /// Chapter description
    #[serde(default)]
    pub description: String,
    /// Ordered articles
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// A single document entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// `"<chapter>.<article>"`, empty for articles not yet written
    #[serde(default)]
    pub id: String,
    /// Document file stem, unique within the topic
    pub slug: String,
    /// Article title
    pub title: String,
    /// One-line summary
    #[serde(default)]
    pub summary: String,
    /// Publication status
    #[serde(default)]
    pub status: ArticleStatus,
}

/// Publication status of an article
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Published
    Completed,
    /// Being written
    #[default]
    #[serde(alias = "in-progress")]
    Draft,
    /// Announced, nothing written yet
    Planned,
}

impl ArticleStatus {
    /// Lowercase name as stored in source and front matter
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Draft => "draft",
            Self::Planned => "planned",
        }
    }
}

impl Display for ArticleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "draft" | "in-progress" => Ok(Self::Draft),
            "planned" => Ok(Self::Planned),
            other => Err(format!("unknown article status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn category_new_sets_id_to_slug() {
        let c = Category::new("Backend", "backend");
        assert_eq!(c.id, "backend");
        assert_eq!(c.slug, "backend");
        assert!(c.is_empty());
    }

    #[test]
    fn topic_serializes_camel_case_in_field_order() {
        let topic = Topic::from_ref(&NewTopic {
            name: "Go".into(),
            slug: "go".into(),
            ..NewTopic::default()
        }
        .into_ref("backend"));

        let json = serde_json::to_string(&topic).unwrap();
        assert_eq!(
            json,
            r#"{"id":"go","categoryId":"backend","name":"Go","slug":"go","description":"","image":"","chapters":[]}"#
        );
    }

    #[test]
    fn legacy_in_progress_status_reads_as_draft() {
        let article: Article =
            serde_json::from_str(r#"{"slug":"a","title":"A","status":"in-progress"}"#).unwrap();
        assert_eq!(article.status, ArticleStatus::Draft);
        assert_eq!(article.id, "");
    }

    #[test]
    fn status_parses_and_displays() {
        assert_eq!("planned".parse::<ArticleStatus>(), Ok(ArticleStatus::Planned));
        assert_eq!(ArticleStatus::Completed.to_string(), "completed");
        assert!("done".parse::<ArticleStatus>().is_err());
    }

    #[test]
    fn article_count_sums_chapters() {
        let mut topic = Topic::from_ref(&NewTopic::default().into_ref("c"));
        for n in [2, 0, 1] {
            topic.chapters.push(Chapter {
                id: String::new(),
                title: "t".into(),
                description: String::new(),
                articles: (0..n)
                    .map(|i| Article {
                        id: String::new(),
                        slug: format!("a{i}"),
                        title: "x".into(),
                        summary: String::new(),
                        status: ArticleStatus::Draft,
                    })
                    .collect(),
            });
        }
        assert_eq!(topic.article_count(), 3);
        assert_eq!(topic.articles().count(), 3);
    }
}
