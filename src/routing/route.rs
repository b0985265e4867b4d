//! Route model.
//!
//! A [`HostQuery`] is the host's query state as the plugin sees it; a
//! [`Route`] wraps one snapshot of it for a single dispatch pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::module::ModuleRef;

/// Query state handed over by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostQuery {
    vars: BTreeMap<String, String>,
    main_query: bool,
}

impl HostQuery {
    /// The host's main query for the current request.
    pub fn main() -> Self {
        Self {
            vars: BTreeMap::new(),
            main_query: true,
        }
    }

    /// Builder-style variant of [`HostQuery::set`].
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn is_main_query(&self) -> bool {
        self.main_query
    }

    /// Same vars, flagged as a secondary query.
    pub fn as_secondary(&self) -> Self {
        Self {
            vars: self.vars.clone(),
            main_query: false,
        }
    }

    pub fn page(&self) -> Option<&str> {
        self.get("page")
    }

    pub fn post_type(&self) -> Option<&str> {
        self.get("post_type")
    }

    pub fn taxonomy(&self) -> Option<&str> {
        self.get("taxonomy")
    }

    pub fn is_feed(&self) -> bool {
        self.contains("feed")
    }
}

/// What a request is asking for during one dispatch pass.
#[derive(Debug, Clone)]
pub struct Route {
    query: HostQuery,
    matched_module: Option<ModuleRef>,
    view_name: Option<String>,
}

impl Route {
    pub fn new(query: HostQuery) -> Self {
        Self {
            query,
            matched_module: None,
            view_name: None,
        }
    }

    pub fn query(&self) -> &HostQuery {
        &self.query
    }

    pub fn matched_module(&self) -> Option<&ModuleRef> {
        self.matched_module.as_ref()
    }

    pub fn view_name(&self) -> Option<&str> {
        self.view_name.as_deref()
    }

    /// A copy of this route recording the module that claimed it.
    pub fn resolved(&self, module: ModuleRef, view_name: Option<String>) -> Self {
        Self {
            query: self.query.clone(),
            matched_module: Some(module),
            view_name,
        }
    }
}
