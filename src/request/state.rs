//! Per-request state threaded through the lifecycle phases.
//!
//! # Invariants
//! - Asset flags only ever turn on
//! - `errors_shown` flips false → true at most once
//! - Plugin-page flag only ever turns on

use serde::Serialize;

use crate::routing::Route;

/// Mutable record of one request.
#[derive(Debug, Default)]
pub struct RequestState {
    route: Option<Route>,
    plugin_page: bool,
    cpt_strategy: bool,
    view: Option<String>,
    template_path: Option<String>,
    template_name: Option<String>,
    load_css: bool,
    load_js: bool,
    errors_shown: bool,
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_plugin_page(&self) -> bool {
        self.plugin_page
    }

    pub fn mark_plugin_page(&mut self) {
        self.plugin_page = true;
    }

    pub fn cpt_strategy(&self) -> bool {
        self.cpt_strategy
    }

    pub(crate) fn employ_cpt_strategy(&mut self) {
        self.cpt_strategy = true;
    }

    /// The most recently resolved route.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub(crate) fn record_route(&mut self, route: Route) {
        self.route = Some(route);
    }

    /// View requested by the last module that named one.
    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    /// Resolved template path, set only by template selection.
    pub fn template_path(&self) -> Option<&str> {
        self.template_path.as_deref()
    }

    pub fn template_name(&self) -> Option<&str> {
        self.template_name.as_deref()
    }

    pub(crate) fn set_view(&mut self, view: impl Into<String>) {
        self.view = Some(view.into());
    }

    pub(crate) fn record_template(&mut self, path: String, name: String) {
        self.template_path = Some(path);
        self.template_name = Some(name);
    }

    pub fn load_css(&self) -> bool {
        self.load_css
    }

    pub fn load_js(&self) -> bool {
        self.load_js
    }

    pub(crate) fn enable_assets(&mut self) {
        self.load_css = true;
        self.load_js = true;
    }

    pub fn errors_shown(&self) -> bool {
        self.errors_shown
    }

    /// Returns true only for the call that performs the transition.
    pub(crate) fn mark_errors_shown(&mut self) -> bool {
        !std::mem::replace(&mut self.errors_shown, true)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            plugin_page: self.plugin_page,
            cpt_strategy: self.cpt_strategy,
            view: self.view.clone(),
            template_path: self.template_path.clone(),
            template_name: self.template_name.clone(),
            load_css: self.load_css,
            load_js: self.load_js,
            errors_shown: self.errors_shown,
        }
    }
}

/// Serializable copy of the flags, carried by the request summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub plugin_page: bool,
    pub cpt_strategy: bool,
    pub view: Option<String>,
    pub template_path: Option<String>,
    pub template_name: Option<String>,
    pub load_css: bool,
    pub load_js: bool,
    pub errors_shown: bool,
}
