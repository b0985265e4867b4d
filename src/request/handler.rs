//! Request handler: turns raw host query state into a normalized route.
//!
//! # Responsibilities
//! - Normalize page slugs (trim, lowercase, strip slashes)
//! - Decide whether the request targets a plugin page
//!
//! # Design Decisions
//! - Parsing is pure; the result is a [`ParsedRequest`] queried many times
//! - Plugin pages: explicit `ee` query var, configured page slugs, or any
//!   plugin-owned post type or taxonomy

use std::collections::BTreeSet;

use crate::routing::{HostQuery, Route};

/// Prefix shared by the plugin's post types and taxonomies.
pub const PLUGIN_TYPE_PREFIX: &str = "espresso_";

/// Query var that forces plugin handling of a request.
pub const PLUGIN_QUERY_VAR: &str = "ee";

/// Collaborator that normalizes the host query.
pub trait RequestHandler: Send + Sync + std::fmt::Debug {
    fn parse(&self, raw: &HostQuery) -> ParsedRequest;
}

/// The normalized request.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    route: Route,
    plugin_page: bool,
}

impl ParsedRequest {
    pub fn new(route: Route, plugin_page: bool) -> Self {
        Self { route, plugin_page }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn query(&self) -> &HostQuery {
        self.route.query()
    }

    pub fn is_plugin_page(&self) -> bool {
        self.plugin_page
    }
}

/// Default handler working from host query vars.
#[derive(Debug, Clone, Default)]
pub struct QueryRequestHandler {
    plugin_pages: BTreeSet<String>,
}

impl QueryRequestHandler {
    pub fn new<I, S>(plugin_pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            plugin_pages: plugin_pages
                .into_iter()
                .map(|p| normalize_slug(p.as_ref()))
                .collect(),
        }
    }

    fn is_plugin_query(&self, query: &HostQuery) -> bool {
        query.contains(PLUGIN_QUERY_VAR)
            || query.page().is_some_and(|p| self.plugin_pages.contains(p))
            || query.post_type().is_some_and(|t| t.starts_with(PLUGIN_TYPE_PREFIX))
            || query.taxonomy().is_some_and(|t| t.starts_with(PLUGIN_TYPE_PREFIX))
    }
}

impl RequestHandler for QueryRequestHandler {
    fn parse(&self, raw: &HostQuery) -> ParsedRequest {
        let mut query = raw.clone();
        if let Some(page) = raw.page() {
            query.set("page", normalize_slug(page));
        }
        let plugin_page = self.is_plugin_query(&query);
        ParsedRequest::new(Route::new(query), plugin_page)
    }
}

fn normalize_slug(slug: &str) -> String {
    slug.trim().trim_matches('/').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> QueryRequestHandler {
        QueryRequestHandler::new(["Registration-Checkout", "events"])
    }

    #[test]
    fn test_normalizes_page_slug() {
        let parsed = handler().parse(&HostQuery::main().with_var("page", " /Registration-Checkout/ "));
        assert_eq!(parsed.query().page(), Some("registration-checkout"));
        assert!(parsed.is_plugin_page());
        assert!(parsed.query().is_main_query());
    }

    #[test]
    fn test_plugin_page_sources() {
        let h = handler();
        assert!(h.parse(&HostQuery::main().with_var("ee", "process_ticket_selections")).is_plugin_page());
        assert!(h.parse(&HostQuery::main().with_var("post_type", "espresso_events")).is_plugin_page());
        assert!(h.parse(&HostQuery::main().with_var("taxonomy", "espresso_event_type")).is_plugin_page());
        assert!(!h.parse(&HostQuery::main().with_var("page", "about")).is_plugin_page());
        assert!(!h.parse(&HostQuery::main()).is_plugin_page());
    }
}
