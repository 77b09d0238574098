//! Category operations

use crate::error::{SyncError, SyncResult};
use crate::report::{Saga, Synced};
use crate::sources::{to_literal, CATEGORIES_EXPORT};
use crate::sync::CatalogSync;
use quire_model::{ensure_unique_category, validate_slug, validate_title, Category};
use quire_source::{Edit, Literal, Matcher, PatchOp};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Requested change to a category; absent fields keep their value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    /// New title
    #[serde(default)]
    pub title: Option<String>,
    /// New slug, which also becomes the id
    #[serde(default)]
    pub slug: Option<String>,
}

impl CatalogSync {
    /// Append an empty category
    ///
    /// # Errors
    /// Returns a validation error for a bad or taken title or slug.
    pub async fn add_category(&self, title: &str, slug: &str) -> SyncResult<Synced<Category>> {
        let title = title.trim();
        validate_title(title)?;
        validate_slug(slug)?;

        let mut index = self.load_index().await?;
        ensure_unique_category(&index.categories()?, title, slug, None)?;

        let category = Category::new(title, slug);
        index.apply(
            CATEGORIES_EXPORT,
            Edit::Insert {
                element: to_literal(&index.path, &category)?,
                index: None,
            },
        )?;

        let mut saga = Saga::new("add category");
        saga.required("insert category", self.target(&index.path), self.save(&index))
            .await?;
        info!("added category {}", category.id);
        Ok(saga.finish(category))
    }

    /// Rename a category.
    ///
    /// A new slug becomes the id and is propagated into every owned topic
    /// reference and topic file. Topic files are updated best-effort.
    ///
    /// # Errors
    /// Returns [`SyncError::CategoryNotFound`] or a validation error before
    /// any write.
    pub async fn update_category(
        &self,
        id: &str,
        update: CategoryUpdate,
    ) -> SyncResult<Synced<Category>> {
        let mut index = self.load_index().await?;
        let categories = index.categories()?;
        let current = categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| SyncError::CategoryNotFound(id.to_string()))?;

        let title = update
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| current.title.clone());
        // legacy ids may differ from the slug; the slug wins
        let slug = update.slug.unwrap_or_else(|| {
            if current.slug.is_empty() {
                current.id.clone()
            } else {
                current.slug.clone()
            }
        });
        validate_title(&title)?;
        validate_slug(&slug)?;
        ensure_unique_category(&categories, &title, &slug, Some(id))?;

        let moved = slug != current.id;
        let mut patch = vec![
            PatchOp::set("id", Literal::string(&slug)),
            PatchOp::set("title", Literal::string(&title)),
            PatchOp::set("slug", Literal::string(&slug)),
        ];
        if moved {
            patch.push(PatchOp::SetInEach {
                field: "items".into(),
                subfield: "categoryId".into(),
                value: Literal::string(&slug),
            });
        }
        index.apply(
            CATEGORIES_EXPORT,
            Edit::UpdateWhere {
                matcher: Matcher::field("id", id),
                patch,
            },
        )?;

        let mut saga = Saga::new("update category");
        saga.required("update category", self.target(&index.path), self.save(&index))
            .await?;

        let mut updated = current.clone();
        updated.id.clone_from(&slug);
        updated.slug.clone_from(&slug);
        updated.title = title;
        if moved {
            for item in &mut updated.items {
                item.category_id.clone_from(&slug);
                let file = self.paths().topic_file(&item.slug);
                saga.best_effort(
                    "update topic category",
                    self.target(&file),
                    self.set_topic_category(&item.slug, &slug),
                )
                .await;
            }
            info!("renamed category {} to {}", id, slug);
        } else {
            info!("updated category {}", id);
        }
        Ok(saga.finish(updated))
    }

    /// Remove an empty category
    ///
    /// # Errors
    /// Returns [`SyncError::CategoryNotEmpty`] while it owns topics.
    pub async fn delete_category(&self, id: &str) -> SyncResult<Synced<Category>> {
        let mut index = self.load_index().await?;
        let category = index
            .categories()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| SyncError::CategoryNotFound(id.to_string()))?;
        if !category.is_empty() {
            return Err(SyncError::CategoryNotEmpty {
                id: id.to_string(),
                topics: category.items.iter().map(|t| t.slug.clone()).collect(),
            });
        }

        index.apply(CATEGORIES_EXPORT, Edit::DeleteWhere(Matcher::field("id", id)))?;
        let mut saga = Saga::new("delete category");
        saga.required("remove category", self.target(&index.path), self.save(&index))
            .await?;
        info!("deleted category {}", id);
        Ok(saga.finish(category))
    }

    /// Put categories in the given order. Unlisted categories follow in
    /// their current order.
    ///
    /// # Errors
    /// Returns [`SyncError::UnknownId`] for an id that is not a category.
    pub async fn reorder_categories(&self, ids: &[String]) -> SyncResult<Synced<Vec<String>>> {
        let mut index = self.load_index().await?;
        let categories = index.categories()?;
        if let Some(unknown) = ids.iter().find(|id| !categories.iter().any(|c| &c.id == *id)) {
            return Err(SyncError::UnknownId(unknown.clone()));
        }

        index.apply(
            CATEGORIES_EXPORT,
            Edit::Reorder {
                field: "id".into(),
                order: ids.to_vec(),
            },
        )?;
        let order: Vec<String> = index.categories()?.into_iter().map(|c| c.id).collect();

        let mut saga = Saga::new("reorder categories");
        saga.required("reorder categories", self.target(&index.path), self.save(&index))
            .await?;
        info!("reordered categories: {}", order.join(", "));
        Ok(saga.finish(order))
    }
}
