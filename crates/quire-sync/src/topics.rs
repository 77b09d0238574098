//! Topic operations

use crate::documents::placeholder;
use crate::error::{SyncError, SyncResult};
use crate::plan::DocumentPlan;
use crate::report::{Saga, Synced};
use crate::sources::{to_literal, topic_module, SourceFile, CATEGORIES_EXPORT};
use crate::sync::{exists, CatalogSync};
use chrono::Utc;
use quire_model::{
    ensure_unique_article_slugs, renumber, topic_binding, validate_slug, Category, NewTopic,
    Topic, TopicRef, ValidationError,
};
use quire_source::{Annotated, ArrayLiteral, Edit, Literal, Matcher, PatchOp};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

fn validate_name(name: &str) -> SyncResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty("name").into());
    }
    Ok(())
}

fn owner_of<'a>(categories: &'a [Category], slug: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.topic(slug).is_some())
}

fn require_category(categories: &[Category], id: &str) -> SyncResult<()> {
    if categories.iter().any(|c| c.id == id) {
        Ok(())
    } else {
        Err(SyncError::CategoryNotFound(id.to_string()))
    }
}

impl CatalogSync {
    /// Create a topic under a category.
    ///
    /// Writes the topic reference, an empty per-topic file and the data
    /// index registration, then creates the document directory.
    ///
    /// # Errors
    /// Returns [`SyncError::CategoryNotFound`] or a validation error before
    /// any write. Topic slugs are unique across the whole catalog.
    pub async fn add_topic(&self, category_id: &str, new: NewTopic) -> SyncResult<Synced<Topic>> {
        validate_slug(&new.slug)?;
        validate_name(&new.name)?;

        let mut index = self.load_index().await?;
        let categories = index.categories()?;
        require_category(&categories, category_id)?;
        if owner_of(&categories, &new.slug).is_some() {
            return Err(ValidationError::duplicate_slug(new.slug).into());
        }

        let topic_ref = new.into_ref(category_id);
        let topic = Topic::from_ref(&topic_ref);
        index.apply(
            CATEGORIES_EXPORT,
            Edit::UpdateWhere {
                matcher: Matcher::field("id", category_id),
                patch: vec![PatchOp::Push {
                    field: "items".into(),
                    value: to_literal(&index.path, &topic_ref)?,
                }],
            },
        )?;

        let topic_path = self.paths().topic_file(&topic.slug);
        let topic_text = topic_module(&topic_path, &topic)?.render();
        let mut data_index = self.load_data_index().await?;
        Self::register_topic(&mut data_index, &topic.slug, &topic_binding(&topic.slug))?;

        let mut saga = Saga::new("add topic");
        saga.required("insert topic reference", self.target(&index.path), self.save(&index))
            .await?;
        saga.required(
            "write topic file",
            self.target(&topic_path),
            self.write(&topic_path, &topic_text),
        )
        .await?;
        saga.required("register topic", self.target(&data_index.path), self.save(&data_index))
            .await?;

        let doc_dir = self.paths().document_dir(&topic.slug);
        saga.best_effort("create document directory", self.target(&doc_dir), async {
            tokio::fs::create_dir_all(&doc_dir)
                .await
                .map_err(|e| SyncError::io_error(&doc_dir, e))
        })
        .await;

        info!("added topic {} to {}", topic.slug, category_id);
        Ok(saga.finish(topic))
    }

    /// Replace a topic's detail.
    ///
    /// Chapter and article ids are recomputed from position. Documents of
    /// removed articles are deleted, renamed articles have their documents
    /// moved and new articles get placeholder documents. A changed
    /// `categoryId` moves the topic reference to that category.
    ///
    /// # Errors
    /// Returns [`SyncError::CategoryNotFound`] or a validation error before
    /// any write.
    pub async fn update_topic_detail(&self, topic: Topic) -> SyncResult<Synced<Topic>> {
        let mut topic = topic;
        validate_slug(&topic.slug)?;
        validate_name(&topic.name)?;
        ensure_unique_article_slugs(&topic.chapters)?;

        let mut index = self.load_index().await?;
        let categories = index.categories()?;
        require_category(&categories, &topic.category_id)?;
        let owner = owner_of(&categories, &topic.slug).map(|c| c.id.clone());

        let previous_file = self.load_topic_file(&topic.slug).await?;
        let previous = previous_file
            .as_ref()
            .map(|f| f.topic(&topic.slug))
            .transpose()?;
        let plan = DocumentPlan::diff(previous.as_ref(), &topic);
        renumber(&mut topic);

        // index membership
        let topic_ref = topic.to_ref();
        let target = topic.category_id.clone();
        match owner.as_deref() {
            Some(owner) if owner == target => {
                let fields = vec![
                    PatchOp::set("name", Literal::string(&topic_ref.name)),
                    PatchOp::set("description", Literal::string(&topic_ref.description)),
                    PatchOp::set("image", Literal::string(&topic_ref.image)),
                ];
                index.apply(
                    CATEGORIES_EXPORT,
                    Edit::UpdateWhere {
                        matcher: Matcher::field("id", owner),
                        patch: vec![PatchOp::UpdateIn {
                            field: "items".into(),
                            matcher: Matcher::field("slug", &topic.slug),
                            patch: fields,
                        }],
                    },
                )?;
            }
            other => {
                if let Some(owner) = other {
                    debug!("moving topic {} from {} to {}", topic.slug, owner, target);
                    index.apply(
                        CATEGORIES_EXPORT,
                        Edit::UpdateWhere {
                            matcher: Matcher::field("id", owner),
                            patch: vec![PatchOp::RemoveWhere {
                                field: "items".into(),
                                matcher: Matcher::field("slug", &topic.slug),
                            }],
                        },
                    )?;
                }
                index.apply(
                    CATEGORIES_EXPORT,
                    Edit::UpdateWhere {
                        matcher: Matcher::field("id", &target),
                        patch: vec![PatchOp::Push {
                            field: "items".into(),
                            value: to_literal(&index.path, &topic_ref)?,
                        }],
                    },
                )?;
            }
        }

        // topic file, keeping the existing binding name
        let topic_path = self.paths().topic_file(&topic.slug);
        let (topic_text, binding) = match previous_file {
            Some(mut file) => {
                let binding = file.topic_binding(&topic.slug)?;
                file.apply(&binding, Edit::Replace(to_literal(&topic_path, &topic)?))?;
                (file.render(), binding)
            }
            None => (
                topic_module(&topic_path, &topic)?.render(),
                topic_binding(&topic.slug),
            ),
        };
        let mut data_index = self.load_data_index().await?;
        let registration_changed = Self::register_topic(&mut data_index, &topic.slug, &binding)?;

        let mut saga = Saga::new("update topic");
        saga.required("update topic reference", self.target(&index.path), self.save(&index))
            .await?;
        saga.required(
            "write topic file",
            self.target(&topic_path),
            self.write(&topic_path, &topic_text),
        )
        .await?;
        if registration_changed {
            saga.best_effort(
                "register topic",
                self.target(&data_index.path),
                self.save(&data_index),
            )
            .await;
        }

        self.sync_documents(&mut saga, &topic, &plan).await;
        info!(
            "updated topic {} ({} chapters, {} articles)",
            topic.slug,
            topic.chapters.len(),
            topic.article_count()
        );
        Ok(saga.finish(topic))
    }

    /// Delete, rename and create documents after a topic rewrite
    async fn sync_documents(&self, saga: &mut Saga, topic: &Topic, plan: &DocumentPlan) {
        let slug = &topic.slug;
        if !plan.is_empty() {
            self.move_documents(saga, slug, plan).await;
        }

        let today = Utc::now().date_naive();
        for article in topic.articles() {
            let path = self.paths().document(slug, &article.slug);
            let created = match placeholder(&path, article, today) {
                Ok(text) => self.guard().create(&path, &text).await.map_err(SyncError::from),
                Err(e) => Err(e),
            };
            match created {
                Ok(true) => saga.record("create placeholder", self.target(&path)),
                Ok(false) => {}
                Err(e) => saga.skip("create placeholder", self.target(&path), e),
            }
        }
    }

    /// Delete removed documents before renamed ones move onto their slugs
    async fn move_documents(&self, saga: &mut Saga, slug: &str, plan: &DocumentPlan) {
        for article in &plan.removed {
            let path = self.paths().document(slug, article);
            match self.guard().remove_file(&path).await {
                Ok(true) => saga.record("delete document", self.target(&path)),
                Ok(false) => {}
                Err(e) => saga.skip("delete document", self.target(&path), e),
            }
        }

        // two phases through hidden names, so swapped slugs never collide
        let sources: HashSet<&str> = plan.renamed.iter().map(|(from, _)| from.as_str()).collect();
        let mut staged = Vec::new();
        for (n, (from, to)) in plan.renamed.iter().enumerate() {
            let from_path = self.paths().document(slug, from);
            let to_path = self.paths().document(slug, to);
            let target = format!("{} -> {}", self.target(&from_path), self.target(&to_path));
            match (exists(&from_path).await, exists(&to_path).await) {
                (Ok(false), _) => {
                    saga.skip("rename document", target, "source document is missing");
                    continue;
                }
                (_, Ok(true)) if !sources.contains(to.as_str()) => {
                    saga.skip("rename document", target, "target document already exists");
                    continue;
                }
                (Err(e), _) | (_, Err(e)) => {
                    saga.skip("rename document", target, e);
                    continue;
                }
                _ => {}
            }
            let temp = self
                .paths()
                .document_dir(slug)
                .join(format!(".{from}.{n}.renaming"));
            match self.guard().rename(&from_path, &temp).await {
                Ok(()) => staged.push((from_path, temp, to_path, target)),
                Err(e) => saga.skip("rename document", target, e),
            }
        }
        for (from_path, temp, to_path, target) in staged {
            match self.guard().rename(&temp, &to_path).await {
                Ok(()) => saga.record("rename document", target),
                Err(e) => {
                    if let Err(back) = self.guard().rename(&temp, &from_path).await {
                        debug!("could not move {} back: {}", temp.display(), back);
                    }
                    saga.skip("rename document", target, e);
                }
            }
        }
    }

    /// Delete a topic that owns no articles.
    ///
    /// Removes the topic reference, the data index entry, the per-topic
    /// directory and the document directory, in that order.
    ///
    /// # Errors
    /// Returns [`SyncError::TopicNotFound`] or [`SyncError::TopicHasArticles`]
    /// before any write.
    pub async fn delete_topic(&self, slug: &str) -> SyncResult<Synced<TopicRef>> {
        let mut index = self.load_index().await?;
        let categories = index.categories()?;
        let owner = owner_of(&categories, slug)
            .ok_or_else(|| SyncError::TopicNotFound(slug.to_string()))?;
        let topic_ref = owner
            .topic(slug)
            .cloned()
            .ok_or_else(|| SyncError::TopicNotFound(slug.to_string()))?;

        if let Some(file) = self.load_topic_file(slug).await? {
            let articles = file.topic(slug)?.article_count();
            if articles > 0 {
                return Err(SyncError::TopicHasArticles {
                    slug: slug.to_string(),
                    articles,
                });
            }
        }

        index.apply(
            CATEGORIES_EXPORT,
            Edit::UpdateWhere {
                matcher: Matcher::field("id", &owner.id),
                patch: vec![PatchOp::RemoveWhere {
                    field: "items".into(),
                    matcher: Matcher::field("slug", slug),
                }],
            },
        )?;
        let mut data_index = self.load_data_index().await?;
        let registered = Self::unregister_topic(&mut data_index, slug)?;

        let mut saga = Saga::new("delete topic");
        saga.required("remove topic reference", self.target(&index.path), self.save(&index))
            .await?;
        if registered {
            saga.best_effort(
                "unregister topic",
                self.target(&data_index.path),
                self.save(&data_index),
            )
            .await;
        }

        let topic_file = self.paths().topic_file(slug);
        saga.best_effort("remove topic file", self.target(&topic_file), async {
            self.guard()
                .remove_file(&topic_file)
                .await
                .map_err(SyncError::from)
        })
        .await;
        for dir in [self.paths().topic_dir(slug), self.paths().document_dir(slug)] {
            saga.best_effort("remove directory", self.target(&dir), async {
                self.guard()
                    .remove_dir_all(&dir)
                    .await
                    .map_err(SyncError::from)
            })
            .await;
        }

        info!("deleted topic {}", slug);
        Ok(saga.finish(topic_ref))
    }

    /// Redistribute topics among categories.
    ///
    /// Each listed category's items become exactly its list, followed by
    /// any of its current topics listed nowhere. Moved topics get their
    /// `categoryId` rewritten in the index and, best-effort, in their file.
    ///
    /// # Errors
    /// Returns [`SyncError::CategoryNotFound`], [`SyncError::TopicNotFound`]
    /// or a duplicate-slug error for a topic listed twice, before any write.
    pub async fn reorder_topics_across_categories(
        &self,
        order: &BTreeMap<String, Vec<String>>,
    ) -> SyncResult<Synced<Vec<Category>>> {
        let mut index = self.load_index().await?;
        let categories = index.categories()?;

        let mut owners: HashMap<&str, &str> = HashMap::new();
        for category in &categories {
            for item in &category.items {
                owners.insert(item.slug.as_str(), category.id.as_str());
            }
        }
        let mut listed: HashMap<&str, &str> = HashMap::new();
        for (category_id, slugs) in order {
            require_category(&categories, category_id)?;
            for slug in slugs {
                if !owners.contains_key(slug.as_str()) {
                    return Err(SyncError::TopicNotFound(slug.clone()));
                }
                if listed.insert(slug.as_str(), category_id.as_str()).is_some() {
                    return Err(ValidationError::duplicate_slug(slug.clone()).into());
                }
            }
        }

        // final slug list per category
        let assignment: Vec<(String, Vec<String>)> = categories
            .iter()
            .map(|category| {
                let mut slugs: Vec<String> = order.get(&category.id).cloned().unwrap_or_default();
                slugs.extend(
                    category
                        .items
                        .iter()
                        .filter(|t| !listed.contains_key(t.slug.as_str()))
                        .map(|t| t.slug.clone()),
                );
                (category.id.clone(), slugs)
            })
            .collect();
        let moved: Vec<(String, String)> = listed
            .iter()
            .filter(|(slug, category)| owners.get(*slug).copied() != Some(**category))
            .map(|(slug, category)| ((*slug).to_string(), (*category).to_string()))
            .collect();

        let rebuilt = rebuild_items(&index, &assignment)?;
        index.apply(CATEGORIES_EXPORT, Edit::Replace(rebuilt))?;
        let result = index.categories()?;

        let mut saga = Saga::new("reorder topics");
        saga.required("reorder topics", self.target(&index.path), self.save(&index))
            .await?;
        let mut moved = moved;
        moved.sort();
        for (slug, category) in &moved {
            let file = self.paths().topic_file(slug);
            saga.best_effort(
                "update topic category",
                self.target(&file),
                self.set_topic_category(slug, category),
            )
            .await;
        }
        info!("reordered topics, {} moved between categories", moved.len());
        Ok(saga.finish(result))
    }
}

/// Rebuild every category's `items` from its existing elements, keeping
/// each topic reference's comments and setting `categoryId` to its new owner
fn rebuild_items(index: &SourceFile, assignment: &[(String, Vec<String>)]) -> SyncResult<Literal> {
    let shape_error = |found: &str| {
        SyncError::source_error(
            &index.path,
            quire_source::SourceError::shape(CATEGORIES_EXPORT, "an array of objects", found),
        )
    };
    let mut value = index
        .module
        .read(CATEGORIES_EXPORT)
        .map_err(|e| SyncError::source_error(&index.path, e))?
        .clone();
    let found = value.kind_name();
    let Literal::Array(array) = &mut value else {
        return Err(shape_error(found));
    };

    let mut pool: HashMap<String, Annotated<Literal>> = HashMap::new();
    let mut dangling: HashMap<String, Vec<String>> = HashMap::new();
    for element in &mut array.elements {
        let Some(category) = element.value.as_object_mut() else {
            continue;
        };
        let id = category.get_str("id").unwrap_or_default().to_string();
        if let Some(Literal::Array(items)) = category.get_mut("items") {
            dangling.insert(id, std::mem::take(&mut items.dangling));
            for item in std::mem::take(&mut items.elements) {
                if let Some(slug) = item.value.as_object().and_then(|o| o.get_str("slug")) {
                    pool.insert(slug.to_string(), item);
                }
            }
        }
    }

    for element in &mut array.elements {
        let Some(category) = element.value.as_object_mut() else {
            continue;
        };
        let id = category.get_str("id").unwrap_or_default().to_string();
        let Some((_, slugs)) = assignment.iter().find(|(c, _)| *c == id) else {
            continue;
        };
        let mut items = ArrayLiteral {
            elements: Vec::with_capacity(slugs.len()),
            dangling: dangling.remove(&id).unwrap_or_default(),
        };
        for slug in slugs {
            if let Some(mut item) = pool.remove(slug) {
                if let Some(object) = item.value.as_object_mut() {
                    object.set("categoryId", Literal::string(&id));
                }
                items.elements.push(item);
            }
        }
        category.set("items", Literal::Array(items));
    }
    Ok(value)
}
