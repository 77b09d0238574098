//! The three kinds of catalog source modules
//!
//! ```text
//! <config>/index.ts      export const topics: TopicCategory[] = [...]
//! <data>/index.ts        export const topicsData: TopicsData = { go: goTopic }
//! <data>/<slug>/index.ts export const goTopic: Topic = {...}
//! ```

use crate::error::{SyncError, SyncResult};
use quire_model::{topic_binding, Category, Topic};
use quire_source::{Edit, EditOutcome, ExportDecl, ImportDecl, Literal, SourceModule, Statement};
use std::path::{Path, PathBuf};

/// Exported name of the category list
pub const CATEGORIES_EXPORT: &str = "topics";

/// Exported name of the slug → topic map
pub const TOPICS_DATA_EXPORT: &str = "topicsData";

pub(crate) const CONFIG_TYPES: &str = "\
export interface TopicItem {
  id: string
  categoryId: string
  name: string
  slug: string
  description: string
  image: string
}

export interface TopicCategory {
  id: string
  title: string
  slug: string
  items: TopicItem[]
}
";

pub(crate) const DATA_TYPES: &str = "\
export type ArticleStatus = 'completed' | 'draft' | 'planned'

export interface Article {
  id: string
  slug: string
  title: string
  summary: string
  status: ArticleStatus
}

export interface Chapter {
  id: string
  title: string
  description: string
  articles: Article[]
}

export interface Topic {
  id: string
  categoryId: string
  name: string
  slug: string
  description: string
  image: string
  chapters: Chapter[]
}

export type TopicsData = Record<string, Topic>
";

/// A parsed catalog module and where it lives
#[derive(Debug, Clone)]
pub(crate) struct SourceFile {
    pub(crate) path: PathBuf,
    pub(crate) module: SourceModule,
}

impl SourceFile {
    /// Read and parse `path`
    pub(crate) async fn load(path: &Path) -> SyncResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::io_error(path, e))?;
        Self::parse(path, &text)
    }

    pub(crate) fn parse(path: &Path, text: &str) -> SyncResult<Self> {
        let module = SourceModule::parse(text).map_err(|e| SyncError::source_error(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            module,
        })
    }

    pub(crate) fn render(&self) -> String {
        self.module.render()
    }

    /// Apply one structural edit
    pub(crate) fn apply(&mut self, name: &str, edit: Edit) -> SyncResult<EditOutcome> {
        self.module
            .apply(name, edit)
            .map_err(|e| SyncError::source_error(&self.path, e))
    }

    /// Decode the category list
    pub(crate) fn categories(&self) -> SyncResult<Vec<Category>> {
        let value = self
            .module
            .read_json(CATEGORIES_EXPORT)
            .map_err(|e| SyncError::source_error(&self.path, e))?;
        serde_json::from_value(value).map_err(|e| SyncError::data_error(&self.path, e))
    }

    /// Binding of the topic export: the derived name, or the only export
    pub(crate) fn topic_binding(&self, slug: &str) -> SyncResult<String> {
        let derived = topic_binding(slug);
        if self.module.declaration(&derived).is_ok() {
            return Ok(derived);
        }
        self.module
            .sole_export()
            .map(|e| e.name.clone())
            .ok_or_else(|| {
                SyncError::source_error(
                    &self.path,
                    quire_source::SourceError::DeclarationNotFound(derived),
                )
            })
    }

    /// Decode the topic stored in a per-topic module
    pub(crate) fn topic(&self, slug: &str) -> SyncResult<Topic> {
        let binding = self.topic_binding(slug)?;
        let value = self
            .module
            .read_json(&binding)
            .map_err(|e| SyncError::source_error(&self.path, e))?;
        serde_json::from_value(value).map_err(|e| SyncError::data_error(&self.path, e))
    }
}

/// Literal form of any catalog value
pub(crate) fn to_literal<T: serde::Serialize>(path: &Path, value: &T) -> SyncResult<Literal> {
    let json = serde_json::to_value(value).map_err(|e| SyncError::data_error(path, e))?;
    Ok(Literal::from_json(&json))
}

/// Empty category index
pub(crate) fn category_index_module() -> SourceModule {
    SourceModule::new()
        .with(
            Statement::Import(ImportDecl::named(["TopicCategory"], "./types")),
            false,
        )
        .with(
            Statement::Export(ExportDecl::constant(
                CATEGORIES_EXPORT,
                Some("TopicCategory[]"),
                Literal::Array(quire_source::ArrayLiteral::new()),
            )),
            true,
        )
        .with(Statement::Verbatim("export * from './types'".into()), true)
}

/// Empty topic-data index
pub(crate) fn data_index_module() -> SourceModule {
    SourceModule::new()
        .with(
            Statement::Import(ImportDecl::named(["TopicsData"], "./types").type_only()),
            false,
        )
        .with(
            Statement::Export(ExportDecl::constant(
                TOPICS_DATA_EXPORT,
                Some("TopicsData"),
                Literal::Object(quire_source::ObjectLiteral::new()),
            )),
            true,
        )
        .with(
            Statement::Verbatim("export type { Article, Chapter, Topic, TopicsData } from './types'".into()),
            true,
        )
}

/// Fresh per-topic module holding `topic`
pub(crate) fn topic_module(path: &Path, topic: &Topic) -> SyncResult<SourceModule> {
    Ok(SourceModule::new()
        .with(Statement::Import(ImportDecl::named(["Topic"], "../types")), false)
        .with(
            Statement::Export(ExportDecl::constant(
                topic_binding(&topic.slug),
                Some("Topic"),
                to_literal(path, topic)?,
            )),
            true,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_model::TopicRef;

    #[test]
    fn empty_templates() {
        assert_eq!(
            category_index_module().render(),
            "import { TopicCategory } from './types'\n\nexport const topics: TopicCategory[] = []\n\nexport * from './types'\n"
        );
        assert_eq!(
            data_index_module().render(),
            "import type { TopicsData } from './types'\n\nexport const topicsData: TopicsData = {}\n\nexport type { Article, Chapter, Topic, TopicsData } from './types'\n"
        );
    }

    #[test]
    fn topic_module_round_trips() {
        let path = Path::new("data/web-api/index.ts");
        let topic = Topic::from_ref(&TopicRef {
            id: "web-api".into(),
            category_id: "backend".into(),
            name: "Web API".into(),
            slug: "web-api".into(),
            description: String::new(),
            image: String::new(),
        });
        let text = topic_module(path, &topic).unwrap().render();
        assert!(text.contains("export const webApiTopic: Topic = {\n  id: 'web-api',\n"));
        assert!(text.ends_with("  chapters: []\n}\n"));

        let file = SourceFile::parse(path, &text).unwrap();
        assert_eq!(file.topic("web-api").unwrap(), topic);
    }

    #[test]
    fn topic_read_accepts_other_binding() {
        let text = "import { Topic } from '../types'\n\nexport const legacy: Topic = {\n  id: 'go',\n  categoryId: 'b',\n  name: 'Go',\n  slug: 'go',\n  chapters: []\n}\n";
        let file = SourceFile::parse(Path::new("go/index.ts"), text).unwrap();
        assert_eq!(file.topic_binding("go").unwrap(), "legacy");
        assert_eq!(file.topic("go").unwrap().name, "Go");
    }

    #[test]
    fn categories_with_wrong_fields_are_data_errors() {
        let text = "export const topics = [\n  {\n    title: 'No id'\n  }\n]\n";
        let file = SourceFile::parse(Path::new("index.ts"), text).unwrap();
        let err = file.categories().unwrap_err();
        assert!(err.is_structural());
    }
}
