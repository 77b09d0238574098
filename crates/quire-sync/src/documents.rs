//! Article document files
//!
//! A document is a YAML front matter block between `---` fences followed by
//! a free-form body.

use crate::error::{SyncError, SyncResult};
use chrono::NaiveDate;
use quire_model::{Article, ArticleStatus};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const FENCE: &str = "---";

/// Metadata block of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Article title
    #[serde(default)]
    pub title: String,
    /// Creation date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Publication status
    #[serde(default)]
    pub status: ArticleStatus,
    /// One-line summary
    #[serde(default)]
    pub summary: String,
}

impl FrontMatter {
    /// Front matter for a new document of `article`
    #[must_use]
    pub fn for_article(article: &Article, date: NaiveDate) -> Self {
        Self {
            title: article.title.clone(),
            date: Some(date.format("%Y-%m-%d").to_string()),
            status: article.status,
            summary: article.summary.clone(),
        }
    }
}

/// One parsed document file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// File stem, the article slug
    pub slug: String,
    /// File location
    pub path: PathBuf,
    /// Metadata, defaulted when the file has none
    pub front_matter: FrontMatter,
    /// Text after the metadata block
    pub body: String,
}

/// Split `text` into the YAML between the fences and the body
fn split(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix(FENCE)?
        .strip_prefix('\n')
        .or_else(|| text.strip_prefix("---\r\n"))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parse a document's text
///
/// # Errors
/// Returns [`SyncError::FrontMatter`] when the metadata block is not valid YAML.
pub fn parse_document(path: &Path, text: &str) -> SyncResult<Document> {
    let slug = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (front_matter, body) = match split(text) {
        Some((yaml, body)) if yaml.trim().is_empty() => (FrontMatter::default(), body),
        Some((yaml, body)) => {
            let front_matter = serde_yaml::from_str(yaml).map_err(|e| SyncError::FrontMatter {
                path: path.to_path_buf(),
                source: e,
            })?;
            (front_matter, body)
        }
        None => (FrontMatter::default(), text),
    };
    Ok(Document {
        slug,
        path: path.to_path_buf(),
        front_matter,
        body: body.trim_start_matches(['\r', '\n']).to_string(),
    })
}

/// Render front matter and body as document text
///
/// # Errors
/// Returns [`SyncError::FrontMatter`] if the metadata can not be serialized.
pub fn render_document(path: &Path, front_matter: &FrontMatter, body: &str) -> SyncResult<String> {
    let yaml = serde_yaml::to_string(front_matter).map_err(|e| SyncError::FrontMatter {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(format!("{FENCE}\n{yaml}{FENCE}\n\n{body}"))
}

/// Placeholder text for an article that has no document yet
///
/// # Errors
/// Same as [`render_document`].
pub fn placeholder(path: &Path, article: &Article, date: NaiveDate) -> SyncResult<String> {
    let body = format!(
        "# {}\n\nThis article is yet to be written.\n",
        article.title
    );
    render_document(path, &FrontMatter::for_article(article, date), &body)
}

/// Parse every document in `dir`, sorted by slug.
///
/// A missing directory yields no documents. Files with another extension
/// and hidden files are ignored.
///
/// # Errors
/// Returns [`SyncError::Io`] or [`SyncError::FrontMatter`].
pub async fn read_documents(dir: &Path, extension: &str) -> SyncResult<Vec<Document>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SyncError::io_error(dir, e)),
    };

    let mut documents = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SyncError::io_error(dir, e))?
    {
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SyncError::io_error(&path, e))?;
        documents.push(parse_document(&path, &text)?);
    }
    documents.sort_by(|a, b| a.slug.cmp(&b.slug));
    debug!("read {} document(s) from {}", documents.len(), dir.display());
    Ok(documents)
}
