//! Positional ids and source bindings

use crate::catalog::Topic;

/// Id of the chapter at zero-based `index`
#[inline]
#[must_use]
pub fn chapter_id(index: usize) -> String {
    (index + 1).to_string()
}

/// Id of the article at zero-based `article` inside zero-based `chapter`
#[inline]
#[must_use]
pub fn article_id(chapter: usize, article: usize) -> String {
    format!("{}.{}", chapter + 1, article + 1)
}

/// Recompute every positional id of a topic.
///
/// The topic id becomes its slug, chapters are numbered from 1 and each
/// article gets `"<chapter>.<article>"`.
pub fn renumber(topic: &mut Topic) {
    topic.id.clone_from(&topic.slug);
    for (c, chapter) in topic.chapters.iter_mut().enumerate() {
        chapter.id = chapter_id(c);
        for (a, article) in chapter.articles.iter_mut().enumerate() {
            article.id = article_id(c, a);
        }
    }
}

/// Name of the exported binding in a per-topic data file.
///
/// The slug is camel-cased and suffixed with `Topic`:
/// `go` → `goTopic`, `web-api` → `webApiTopic`, `3d` → `_3dTopic`.
#[must_use]
pub fn topic_binding(slug: &str) -> String {
    let mut out = String::with_capacity(slug.len() + 6);
    let mut upper = false;
    for ch in slug.chars() {
        if ch == '-' {
            upper = !out.is_empty();
            continue;
        }
        if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out.push_str("Topic");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Article, ArticleStatus, Chapter, NewTopic};
    use pretty_assertions::assert_eq;

    fn article(slug: &str) -> Article {
        Article {
            id: String::new(),
            slug: slug.into(),
            title: slug.into(),
            summary: String::new(),
            status: ArticleStatus::Planned,
        }
    }

    #[test]
    fn renumber_assigns_positions() {
        let mut topic = Topic::from_ref(
            &NewTopic {
                name: "Go".into(),
                slug: "go".into(),
                ..NewTopic::default()
            }
            .into_ref("backend"),
        );
        topic.id = "stale".into();
        topic.chapters = vec![
            Chapter {
                id: "9".into(),
                title: "Basics".into(),
                description: String::new(),
                articles: vec![article("a"), article("b")],
            },
            Chapter {
                id: String::new(),
                title: "More".into(),
                description: String::new(),
                articles: vec![article("c")],
            },
        ];

        renumber(&mut topic);

        assert_eq!(topic.id, "go");
        let ids: Vec<_> = topic
            .chapters
            .iter()
            .map(|c| (c.id.as_str(), c.articles.iter().map(|a| a.id.as_str()).collect::<Vec<_>>()))
            .collect();
        assert_eq!(ids, vec![("1", vec!["1.1", "1.2"]), ("2", vec!["2.1"])]);
    }

    #[test]
    fn binding_camel_cases_slug() {
        assert_eq!(topic_binding("go"), "goTopic");
        assert_eq!(topic_binding("web-api"), "webApiTopic");
        assert_eq!(topic_binding("a--b-"), "aBTopic");
        assert_eq!(topic_binding("3d-graphics"), "_3dGraphicsTopic");
    }
}
