//! Pure validation rules

use crate::catalog::{Category, Chapter};
use crate::error::{ValidationError, ValidationResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9-]+$").unwrap_or_else(|e| unreachable!("slug pattern: {e}"))
});

/// Check slug format
///
/// # Errors
/// Returns [`ValidationError::InvalidSlug`] unless the slug is non-empty and
/// consists of lowercase ASCII letters, digits and `-`.
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if SLUG_PATTERN.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSlug(slug.to_string()))
    }
}

/// Check that a title is not blank
///
/// # Errors
/// Returns [`ValidationError::Empty`] for blank titles.
pub fn validate_title(title: &str) -> ValidationResult<()> {
    if title.trim().is_empty() {
        Err(ValidationError::Empty("title"))
    } else {
        Ok(())
    }
}

/// Check that `title` and `slug` are free among `categories`.
///
/// Comparison is case-insensitive. The category whose id equals `exclude`
/// is skipped so a category may keep its own title and slug on update.
///
/// # Errors
/// Returns [`ValidationError::DuplicateSlug`] first, then
/// [`ValidationError::DuplicateTitle`].
pub fn ensure_unique_category(
    categories: &[Category],
    title: &str,
    slug: &str,
    exclude: Option<&str>,
) -> ValidationResult<()> {
    let others = || {
        categories
            .iter()
            .filter(move |c| exclude.map_or(true, |id| c.id != id))
    };

    if others().any(|c| c.slug.eq_ignore_ascii_case(slug) || c.id.eq_ignore_ascii_case(slug)) {
        return Err(ValidationError::duplicate_slug(slug));
    }
    let wanted = title.to_lowercase();
    if others().any(|c| c.title.to_lowercase() == wanted) {
        return Err(ValidationError::duplicate_title(title));
    }
    Ok(())
}

/// Check article slugs of a topic: valid format and unique within the topic
///
/// # Errors
/// Returns the first invalid or duplicated slug.
pub fn ensure_unique_article_slugs(chapters: &[Chapter]) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for article in chapters.iter().flat_map(|c| c.articles.iter()) {
        validate_slug(&article.slug)?;
        if !seen.insert(article.slug.as_str()) {
            return Err(ValidationError::duplicate_slug(article.slug.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Article, ArticleStatus};
    use proptest::prelude::*;

    fn categories() -> Vec<Category> {
        vec![Category::new("Frontend", "frontend"), Category::new("Backend", "backend")]
    }

    #[test]
    fn slug_format() {
        assert!(validate_slug("go").is_ok());
        assert!(validate_slug("web-api-2").is_ok());
        assert_eq!(validate_slug(""), Err(ValidationError::InvalidSlug(String::new())));
        assert!(validate_slug("Go").is_err());
        assert!(validate_slug("web_api").is_err());
        assert!(validate_slug("a b").is_err());
    }

    #[test]
    fn blank_title_rejected() {
        assert_eq!(validate_title("  "), Err(ValidationError::Empty("title")));
        assert!(validate_title("Ops").is_ok());
    }

    #[test]
    fn duplicate_slug_is_case_insensitive() {
        let err = ensure_unique_category(&categories(), "Data", "BACKEND", None).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateSlug(_)));
    }

    #[test]
    fn duplicate_title_is_case_insensitive() {
        let err = ensure_unique_category(&categories(), "frontEND", "web", None).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateTitle(_)));
    }

    #[test]
    fn excluded_category_may_keep_its_values() {
        assert!(ensure_unique_category(&categories(), "Backend", "backend", Some("backend")).is_ok());
        assert!(ensure_unique_category(&categories(), "Frontend", "x", Some("backend")).is_err());
    }

    #[test]
    fn article_slugs_unique_within_topic() {
        let article = |slug: &str| Article {
            id: String::new(),
            slug: slug.into(),
            title: slug.into(),
            summary: String::new(),
            status: ArticleStatus::Draft,
        };
        let chapter = |slugs: &[&str]| Chapter {
            id: String::new(),
            title: "c".into(),
            description: String::new(),
            articles: slugs.iter().map(|s| article(s)).collect(),
        };

        assert!(ensure_unique_article_slugs(&[chapter(&["a", "b"]), chapter(&["c"])]).is_ok());
        assert_eq!(
            ensure_unique_article_slugs(&[chapter(&["a"]), chapter(&["a"])]),
            Err(ValidationError::DuplicateSlug("a".into()))
        );
        assert!(ensure_unique_article_slugs(&[chapter(&["Bad"])]).is_err());
    }

    proptest! {
        #[test]
        fn generated_slugs_validate(slug in "[a-z0-9-]{1,24}") {
            prop_assert!(validate_slug(&slug).is_ok());
        }

        #[test]
        fn uppercase_never_validates(prefix in "[a-z]{0,5}", upper in "[A-Z]", suffix in "[a-z]{0,5}") {
            let slug = format!("{prefix}{upper}{suffix}");
            prop_assert!(validate_slug(&slug).is_err());
        }
    }
}
