//! Route matching logic.
//!
//! # Responsibilities
//! - Match page slug (case-insensitive)
//! - Match post type and query vars (case-sensitive)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Page slugs are normalized to lowercase by the request handler
//! - Empty condition set = always matches (validation forbids it for modules)
//! - No regex, matching is a handful of map lookups

use crate::config::MatchConfig;
use crate::routing::route::HostQuery;

/// Trait for matching host queries against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the query matches this condition.
    fn matches(&self, query: &HostQuery) -> bool;
}

/// Matches the requested page slug.
#[derive(Debug, Clone)]
pub struct PageMatcher {
    expected_page: String,
}

impl PageMatcher {
    /// The slug is normalized to lowercase for case-insensitive matching.
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            expected_page: page.into().to_lowercase(),
        }
    }
}

impl Matcher for PageMatcher {
    fn matches(&self, query: &HostQuery) -> bool {
        query
            .page()
            .map(|p| p.to_lowercase() == self.expected_page)
            .unwrap_or(false)
    }
}

/// Matches the post type of the queried object.
#[derive(Debug, Clone)]
pub struct PostTypeMatcher {
    post_type: String,
}

impl PostTypeMatcher {
    pub fn new(post_type: impl Into<String>) -> Self {
        Self {
            post_type: post_type.into(),
        }
    }
}

impl Matcher for PostTypeMatcher {
    fn matches(&self, query: &HostQuery) -> bool {
        query.post_type() == Some(self.post_type.as_str())
    }
}

/// Matches a query var, either by exact value or by presence.
#[derive(Debug, Clone)]
pub struct QueryVarMatcher {
    key: String,
    value: Option<String>,
}

impl QueryVarMatcher {
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn present(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

impl Matcher for QueryVarMatcher {
    fn matches(&self, query: &HostQuery) -> bool {
        match (&self.value, query.get(&self.key)) {
            (Some(expected), Some(actual)) => expected == actual,
            (None, found) => found.is_some(),
            (Some(_), None) => false,
        }
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Compile the declarative conditions of a module.
    pub fn from_config(conditions: &MatchConfig) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(page) = &conditions.page {
            matchers.push(Box::new(PageMatcher::new(page.clone())));
        }
        if let Some(post_type) = &conditions.post_type {
            matchers.push(Box::new(PostTypeMatcher::new(post_type.clone())));
        }
        for (key, value) in &conditions.query {
            matchers.push(Box::new(QueryVarMatcher::equals(key.clone(), value.clone())));
        }
        for key in &conditions.present {
            matchers.push(Box::new(QueryVarMatcher::present(key.clone())));
        }
        Self::new(matchers)
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, query: &HostQuery) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_matcher() {
        let matcher = PageMatcher::new("Registration-Checkout");

        let q1 = HostQuery::main().with_var("page", "registration-checkout");
        assert!(matcher.matches(&q1));

        let q2 = HostQuery::main().with_var("page", "REGISTRATION-CHECKOUT");
        assert!(matcher.matches(&q2)); // Case insensitive

        let q3 = HostQuery::main().with_var("page", "events");
        assert!(!matcher.matches(&q3));
        assert!(!matcher.matches(&HostQuery::main()));
    }

    #[test]
    fn test_query_var_matcher() {
        let equals = QueryVarMatcher::equals("step", "payment");
        let present = QueryVarMatcher::present("ee");

        let q = HostQuery::main().with_var("step", "payment").with_var("ee", "");
        assert!(equals.matches(&q));
        assert!(present.matches(&q));

        let q = HostQuery::main().with_var("step", "attendee");
        assert!(!equals.matches(&q));
        assert!(!present.matches(&q));
    }

    #[test]
    fn test_and_matcher_from_config() {
        let conditions = MatchConfig {
            page: Some("events".into()),
            post_type: None,
            query: [("view".to_string(), "grid".to_string())].into(),
            present: vec![],
        };
        let matcher = AndMatcher::from_config(&conditions);

        let q = HostQuery::main().with_var("page", "events").with_var("view", "grid");
        assert!(matcher.matches(&q));

        let q = HostQuery::main().with_var("page", "events");
        assert!(!matcher.matches(&q));
    }
}
