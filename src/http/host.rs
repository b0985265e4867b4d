//! The embedded host: maps URLs to host queries and serves configured content.
//!
//! # Data Flow
//! ```text
//! GET /events/summer-gala?step=checkout
//!     → page=events, name=summer-gala, step=checkout
//!     → post "summer-gala" found → post_type=espresso_events
//! ```

use std::collections::BTreeMap;

use crate::assets::{ContentBlock, SidebarWidgets};
use crate::config::FrontConfig;
use crate::routing::HostQuery;

/// Content and widget placement owned by the host.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedHost {
    posts: Vec<ContentBlock>,
    widgets: SidebarWidgets,
}

impl EmbeddedHost {
    pub fn new(posts: Vec<ContentBlock>, widgets: SidebarWidgets) -> Self {
        Self { posts, widgets }
    }

    pub fn from_config(config: &FrontConfig) -> Self {
        let posts = config
            .posts
            .iter()
            .map(|post| ContentBlock {
                slug: post.slug.clone(),
                title: post.title.clone(),
                body: post.body.clone(),
                post_type: post.post_type.clone(),
            })
            .collect();
        let widgets = SidebarWidgets::new(config.assets.widgets.clone(), config.sidebars.clone());
        Self::new(posts, widgets)
    }

    pub fn widgets(&self) -> &SidebarWidgets {
        &self.widgets
    }

    /// Main query for a request path plus its query-string params.
    pub fn query_for(&self, path: &str, params: &BTreeMap<String, String>) -> HostQuery {
        let mut query = HostQuery::main();
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if let Some(page) = segments.next() {
            query.set("page", page);
        }
        if let Some(name) = segments.next() {
            query.set("name", name);
        }
        for (key, value) in params {
            query.set(key.clone(), value.clone());
        }
        if !query.contains("post_type") {
            if let Some(post) = self.lookup(&query) {
                query.set("post_type", post.post_type.clone());
            }
        }
        query
    }

    /// Posts the main query returns.
    pub fn posts_for(&self, query: &HostQuery) -> Vec<ContentBlock> {
        if query.page().is_none() && query.get("name").is_none() {
            return self
                .posts
                .iter()
                .filter(|post| post.post_type == "post")
                .cloned()
                .collect();
        }
        self.lookup(query).cloned().into_iter().collect()
    }

    fn lookup(&self, query: &HostQuery) -> Option<&ContentBlock> {
        let slug = query.get("name").or_else(|| query.page())?;
        self.posts.iter().find(|post| post.slug == slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> EmbeddedHost {
        EmbeddedHost::new(
            vec![
                ContentBlock::new("about", "About us"),
                ContentBlock {
                    slug: "summer-gala".into(),
                    title: "Summer Gala".into(),
                    body: "Dancing".into(),
                    post_type: "espresso_events".into(),
                },
                ContentBlock {
                    slug: "news".into(),
                    title: "News".into(),
                    body: "[ESPRESSO_EVENTS]".into(),
                    post_type: "post".into(),
                },
            ],
            SidebarWidgets::default(),
        )
    }

    #[test]
    fn test_query_from_path_segments() {
        let params = [("step".to_string(), "checkout".to_string())].into();
        let query = host().query_for("/events/summer-gala/", &params);
        assert!(query.is_main_query());
        assert_eq!(query.page(), Some("events"));
        assert_eq!(query.get("name"), Some("summer-gala"));
        assert_eq!(query.get("step"), Some("checkout"));
        assert_eq!(query.post_type(), Some("espresso_events"));
    }

    #[test]
    fn test_posts_for_page_and_home() {
        let host = host();
        let about = host.posts_for(&host.query_for("/about", &BTreeMap::new()));
        assert_eq!(about.len(), 1);
        assert_eq!(about[0].body, "About us");

        let home = host.posts_for(&host.query_for("/", &BTreeMap::new()));
        assert_eq!(home.len(), 1);
        assert_eq!(home[0].slug, "news");

        assert!(host.posts_for(&host.query_for("/missing", &BTreeMap::new())).is_empty());
    }
}
