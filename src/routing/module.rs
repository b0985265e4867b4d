//! Module handler capability.
//!
//! A module owns a narrow slice of request handling (ticket selector,
//! checkout, thank-you page). It claims routes through
//! [`ModuleHandler::can_handle`] and services them through
//! [`ModuleHandler::handle`].

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::routing::route::Route;

/// Capability implemented by every registered module.
pub trait ModuleHandler: Send + Sync + fmt::Debug {
    /// Unique module name.
    fn name(&self) -> &str;

    /// Whether this module claims the route.
    fn can_handle(&self, route: &Route) -> bool;

    /// Service a claimed route.
    fn handle(&self, route: &Route) -> Result<ModuleOutcome, ModuleError>;
}

/// What a module produced for a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleOutcome {
    /// View to render, if the module selects one.
    pub view: Option<String>,

    /// Query vars to set before the next route pass.
    pub query_updates: Vec<(String, String)>,

    /// The request turned out to be a plugin page.
    pub plugin_page: bool,
}

impl ModuleOutcome {
    pub fn view(view: impl Into<String>) -> Self {
        Self {
            view: Some(view.into()),
            ..Self::default()
        }
    }

    pub fn with_query_update(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_updates.push((key.into(), value.into()));
        self
    }

    pub fn marking_plugin_page(mut self) -> Self {
        self.plugin_page = true;
        self
    }
}

/// A module failed while servicing a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("module `{module}` failed: {message}")]
pub struct ModuleError {
    pub module: String,
    pub message: String,
}

impl ModuleError {
    pub fn new(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            message: message.into(),
        }
    }
}

/// Shared handle to a registered module.
#[derive(Clone)]
pub struct ModuleRef {
    name: Arc<str>,
    handler: Arc<dyn ModuleHandler>,
}

impl ModuleRef {
    pub fn new(handler: Arc<dyn ModuleHandler>) -> Self {
        Self {
            name: Arc::from(handler.name()),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &dyn ModuleHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRef").field("name", &self.name).finish()
    }
}
