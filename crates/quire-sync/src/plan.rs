//! Document changes implied by a topic rewrite
//!
//! Articles are matched across the rewrite by their stable `id`, never by
//! slug: the same id under a new slug is a rename, an id that disappears
//! is a removal. Articles without a known id are new.

use quire_model::Topic;
use std::collections::{HashMap, HashSet};

/// File-level consequences of replacing one topic with another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DocumentPlan {
    /// Slugs whose documents are deleted
    pub(crate) removed: Vec<String>,
    /// `(from, to)` slug pairs whose documents are moved
    pub(crate) renamed: Vec<(String, String)>,
}

impl DocumentPlan {
    /// Compare the stored topic with the incoming one, before renumbering
    pub(crate) fn diff(previous: Option<&Topic>, next: &Topic) -> Self {
        let Some(previous) = previous else {
            return Self::default();
        };
        let before: HashMap<&str, &str> = previous
            .articles()
            .filter(|a| !a.id.is_empty())
            .map(|a| (a.id.as_str(), a.slug.as_str()))
            .collect();
        let kept: HashSet<&str> = next
            .articles()
            .filter(|a| before.contains_key(a.id.as_str()))
            .map(|a| a.id.as_str())
            .collect();
        let reused: HashSet<&str> = next
            .articles()
            .filter(|a| !before.contains_key(a.id.as_str()))
            .map(|a| a.slug.as_str())
            .collect();

        // a new article taking over a removed slug keeps its document;
        // a rename onto it does not
        let removed = previous
            .articles()
            .filter(|a| !a.id.is_empty() && !kept.contains(a.id.as_str()))
            .filter(|a| !reused.contains(a.slug.as_str()))
            .map(|a| a.slug.clone())
            .collect();

        let renamed = next
            .articles()
            .filter_map(|a| {
                let old = before.get(a.id.as_str())?;
                (*old != a.slug).then(|| ((*old).to_string(), a.slug.clone()))
            })
            .collect();

        Self { removed, renamed }
    }

    /// Whether nothing moves or disappears
    pub(crate) fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.renamed.is_empty()
    }
}
