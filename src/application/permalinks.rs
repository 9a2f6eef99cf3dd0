use url::Url;

use crate::domain::entities::{CategoryRecord, PostRecord};

const CATEGORY_BASE: &str = "category";

/// Builds public links to posts and category archives.
#[derive(Debug, Clone)]
pub struct Permalinks {
    base: Url,
}

impl Permalinks {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn post(&self, post: &PostRecord) -> String {
        self.with_segments(&[post.slug.as_str()])
    }

    pub fn category(&self, category: &CategoryRecord) -> String {
        self.with_segments(&[CATEGORY_BASE, category.slug.as_str()])
    }

    fn with_segments(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments).push("");
        }
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;

    fn post(slug: &str) -> PostRecord {
        PostRecord {
            id: Uuid::nil(),
            slug: slug.to_string(),
            title: "Title".into(),
            excerpt: String::new(),
            content_html: String::new(),
            category_ids: Vec::new(),
            comment_count: 0,
            published_at: datetime!(2024-03-05 12:00 UTC),
            thumbnail: None,
        }
    }

    #[test]
    fn post_links_hang_off_the_base() {
        let links = Permalinks::new(Url::parse("https://example.com/blog").expect("valid url"));
        assert_eq!(links.post(&post("hello")), "https://example.com/blog/hello/");

        let links = Permalinks::new(Url::parse("https://example.com/").expect("valid url"));
        assert_eq!(links.post(&post("hello")), "https://example.com/hello/");
    }

    #[test]
    fn category_links_are_encoded() {
        let links = Permalinks::new(Url::parse("https://example.com").expect("valid url"));
        let category = CategoryRecord {
            id: Uuid::nil(),
            slug: "news & notes".into(),
            name: "News".into(),
        };
        assert_eq!(
            links.category(&category),
            "https://example.com/category/news%20&%20notes/"
        );
    }
}
