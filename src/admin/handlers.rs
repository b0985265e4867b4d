use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::templates::TemplateSelection;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: &'static str,
    pub modules: usize,
    pub matched_modules: usize,
    pub plugin_pages: Vec<String>,
}

#[derive(Serialize)]
pub struct ModuleStatus {
    pub name: String,
    pub position: usize,
    pub matched: bool,
}

#[derive(Serialize)]
pub struct ModuleListing {
    pub registered: Vec<ModuleStatus>,
    pub matched: Vec<String>,
}

#[derive(Deserialize)]
pub struct TemplateParams {
    #[serde(default)]
    pub view: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: state.controller.settings().version.clone(),
        status: "operational",
        modules: state.controller.modules().count(),
        matched_modules: state.controller.matched_module_names().len(),
        plugin_pages: state.config.plugin_pages.0.clone(),
    })
}

pub async fn get_modules(State(state): State<AppState>) -> Json<ModuleListing> {
    let matched = state.controller.matched_module_names();
    let registered = state
        .controller
        .modules()
        .enumerate()
        .map(|(position, module)| ModuleStatus {
            name: module.name().to_string(),
            position,
            matched: matched.iter().any(|name| name == module.name()),
        })
        .collect();
    Json(ModuleListing { registered, matched })
}

/// Dry-run template resolution for a view name.
pub async fn get_templates(
    State(state): State<AppState>,
    Query(params): Query<TemplateParams>,
) -> Json<TemplateSelection> {
    let controller = &state.controller;
    Json(
        controller
            .resolver()
            .resolve(&params.view, &[], controller.default_template()),
    )
}
