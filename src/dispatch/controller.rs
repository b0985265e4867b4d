//! The front controller and its per-request lifecycle.
//!
//! # Data Flow
//! ```text
//! FrontController (process-wide, built once)
//!     router + request handler + resolver + gate + hooks
//!     matched-module map (name → ModuleRef)
//!
//! begin_request() → RequestLifecycle (one per request)
//!     init_strategy   → CPT integration flag
//!     parse_request   → RequestHandler::parse
//!     resolve_routes  → router loop, main query only
//!     pre_render      → asset gate
//!     enqueue_assets  → pipeline registrations from gate flags
//!     emit_head       → meta tags, structured data
//!     display_errors  → notices, rendered once
//!     select_template → template filter
//!     finish          → RequestSummary
//! ```
//!
//! # Design Decisions
//! - Phases never run backwards and never run twice; a skipped phase is
//!   logged and its method returns a neutral value
//! - Nothing here aborts a request: failures become queued notices

use std::path::{Path, PathBuf};
use std::time::Instant;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::json;

use crate::assets::{
    Asset, AssetGate, AssetPipeline, ContentBlock, GateReason, ShortcodeScanner, WidgetRegistry,
};
use crate::config::{AssetConfig, FrontConfig, FrontSettings, TemplateConfig};
use crate::dispatch::filters::maybe_force_admin_ajax_ssl;
use crate::dispatch::hooks::{HookContext, HookPoint, HookTable};
use crate::dispatch::phase::{Phase, PhaseSkip, PhaseTracker};
use crate::notices::{ErrorNotices, AJAX_NOTICES_CONTAINER};
use crate::observability::metrics;
use crate::request::{ParsedRequest, QueryRequestHandler, RequestHandler, RequestState, StateSnapshot};
use crate::routing::{
    registry_from_config, HostQuery, ModuleHandler, ModuleRef, ModuleRegistry,
    ModuleRequestRouter, Route, RouteCursor,
};
use crate::templates::{TemplateResolver, TemplateRoots, TemplateStorage};

/// Taxonomy whose archives are kept out of search engines.
pub const EVENT_TYPE_TAXONOMY: &str = "espresso_event_type";

/// Post type of single event pages.
pub const EVENT_POST_TYPE: &str = "espresso_events";

/// Process-wide dispatcher state.
#[derive(Debug)]
pub struct FrontController {
    router: ModuleRequestRouter,
    request_handler: Box<dyn RequestHandler>,
    resolver: TemplateResolver,
    gate: AssetGate,
    hooks: HookTable,
    settings: FrontSettings,
    assets: AssetConfig,
    templates: TemplateConfig,
    matched: DashMap<String, ModuleRef>,
}

impl FrontController {
    /// Start from configuration: declared modules, plugin pages, template roots.
    pub fn builder(config: &FrontConfig) -> FrontControllerBuilder {
        FrontControllerBuilder {
            registry: registry_from_config(&config.modules),
            request_handler: Box::new(QueryRequestHandler::new(&config.plugin_pages.0)),
            hooks: HookTable::new(),
            settings: config.front.clone(),
            assets: config.assets.clone(),
            templates: config.templates.clone(),
        }
    }

    /// Open the lifecycle of one request.
    pub fn begin_request(&self, request_id: impl Into<String>) -> RequestLifecycle<'_> {
        RequestLifecycle {
            controller: self,
            request_id: request_id.into(),
            secure: self.settings.ssl,
            tracker: PhaseTracker::new(),
            state: RequestState::new(),
            notices: ErrorNotices::new(),
            parsed: None,
            cursor: RouteCursor::new(),
            resolved_modules: Vec::new(),
            selected: None,
            started: Instant::now(),
        }
    }

    /// Module most recently matched under `name`, by any request.
    pub fn matched_module(&self, name: &str) -> Option<ModuleRef> {
        self.matched.get(name).map(|entry| entry.value().clone())
    }

    pub fn matched_module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.matched.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Registered modules in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleRef> {
        self.router.modules()
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    pub fn settings(&self) -> &FrontSettings {
        &self.settings
    }

    pub fn default_template(&self) -> &Path {
        &self.templates.default_template
    }
}

/// Assembles a [`FrontController`]; everything is frozen by [`build`](Self::build).
pub struct FrontControllerBuilder {
    registry: ModuleRegistry,
    request_handler: Box<dyn RequestHandler>,
    hooks: HookTable,
    settings: FrontSettings,
    assets: AssetConfig,
    templates: TemplateConfig,
}

impl FrontControllerBuilder {
    /// Register a module after the configured ones.
    pub fn module<H: ModuleHandler + 'static>(mut self, handler: H) -> Self {
        self.registry.register(handler);
        self
    }

    /// Replace the whole registry.
    pub fn registry(mut self, registry: ModuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn request_handler<R: RequestHandler + 'static>(mut self, handler: R) -> Self {
        self.request_handler = Box::new(handler);
        self
    }

    /// Attach a callback to a hook point.
    pub fn hook<F>(mut self, point: HookPoint, name: impl Into<String>, priority: i32, callback: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) + Send + Sync + 'static,
    {
        self.hooks.add(point, name, priority, callback);
        self
    }

    pub fn build(self) -> FrontController {
        let router = ModuleRequestRouter::new(self.registry);
        tracing::info!(
            modules = router.modules().count(),
            hooks = !self.hooks.is_empty(),
            "Front controller ready"
        );
        FrontController {
            router,
            request_handler: self.request_handler,
            resolver: TemplateResolver::new(TemplateRoots::from_config(&self.templates)),
            gate: AssetGate::new(ShortcodeScanner::new(self.assets.shortcodes.iter().cloned())),
            hooks: self.hooks,
            settings: self.settings,
            assets: self.assets,
            templates: self.templates,
            matched: DashMap::new(),
        }
    }
}

/// Where the host's content loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopContext {
    pub main_query: bool,
    pub in_the_loop: bool,
    pub feed: bool,
}

impl LoopContext {
    /// Inside the main loop of a regular page.
    pub fn main_loop() -> Self {
        Self {
            main_query: true,
            in_the_loop: true,
            feed: false,
        }
    }

    /// Inside a widget or related-posts loop.
    pub fn secondary_loop() -> Self {
        Self {
            main_query: false,
            in_the_loop: true,
            feed: false,
        }
    }
}

/// What happened to one request, for logs, headers and the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    pub request_id: String,
    #[serde(flatten)]
    pub state: StateSnapshot,
    /// Template handed back to the host, plugin page or not.
    pub selected: Option<PathBuf>,
    pub modules: Vec<String>,
    pub pending_notices: usize,
    pub phases: Vec<Phase>,
}

/// Lifecycle of a single request.
pub struct RequestLifecycle<'c> {
    controller: &'c FrontController,
    request_id: String,
    secure: bool,
    tracker: PhaseTracker,
    state: RequestState,
    notices: ErrorNotices,
    parsed: Option<ParsedRequest>,
    cursor: RouteCursor,
    resolved_modules: Vec<String>,
    selected: Option<PathBuf>,
    started: Instant,
}

impl<'c> RequestLifecycle<'c> {
    /// Mark the request as served over https.
    pub fn secure(mut self, is_ssl: bool) -> Self {
        self.secure = self.secure || is_ssl;
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn notices(&self) -> &ErrorNotices {
        &self.notices
    }

    pub fn has_fired(&self, phase: Phase) -> bool {
        self.tracker.has_fired(phase)
    }

    /// Template chosen for the request: full path or file name. `None` until
    /// TEMPLATE_SELECT has resolved a plugin page.
    pub fn selected_template(&self, with_path: bool) -> Option<&str> {
        if with_path {
            self.state.template_path()
        } else {
            self.state.template_name()
        }
    }

    fn begin(&mut self, phase: Phase) -> bool {
        match self.tracker.enter(phase) {
            Ok(()) => {
                tracing::trace!(request_id = %self.request_id, %phase, "Phase start");
                self.run_hooks(HookPoint::before(phase));
                true
            }
            Err(PhaseSkip::AlreadyFired) => {
                tracing::debug!(request_id = %self.request_id, %phase, "Phase already fired, skipping");
                false
            }
            Err(PhaseSkip::OutOfOrder { last }) => {
                tracing::warn!(
                    request_id = %self.request_id,
                    %phase,
                    last = %last,
                    "Phase invoked out of order, skipping"
                );
                false
            }
        }
    }

    fn end(&mut self, phase: Phase) {
        self.run_hooks(HookPoint::after(phase));
    }

    fn run_hooks(&mut self, point: HookPoint) {
        let mut ctx = HookContext {
            point,
            request_id: &self.request_id,
            state: &self.state,
            notices: &mut self.notices,
        };
        self.controller.hooks.run(&mut ctx);
    }

    /// INIT_STRATEGY: decide how custom post types join the host query.
    pub fn init_strategy(&mut self) {
        if !self.begin(Phase::InitStrategy) {
            return;
        }
        if self.controller.settings.employ_cpt_strategy {
            self.state.employ_cpt_strategy();
            tracing::debug!(request_id = %self.request_id, "CPT strategy employed");
        }
        self.end(Phase::InitStrategy);
    }

    /// REQUEST_PARSE: normalize the raw host query.
    pub fn parse_request(&mut self, raw: &HostQuery) {
        if !self.begin(Phase::RequestParse) {
            return;
        }
        let parsed = self.controller.request_handler.parse(raw);
        if parsed.is_plugin_page() {
            self.state.mark_plugin_page();
        }
        tracing::debug!(
            request_id = %self.request_id,
            page = ?parsed.query().page(),
            plugin_page = parsed.is_plugin_page(),
            "Request parsed"
        );
        self.parsed = Some(parsed);
        self.end(Phase::RequestParse);
    }

    /// ROUTE_RESOLUTION: let modules claim the route, main query only.
    ///
    /// Returns the number of routes resolved.
    pub fn resolve_routes(&mut self, query: &HostQuery) -> usize {
        if !query.is_main_query() {
            tracing::trace!(request_id = %self.request_id, "Secondary query, route resolution skipped");
            return 0;
        }
        let Some(mut current) = self.parsed.as_ref().map(|p| p.query().clone()) else {
            tracing::warn!(request_id = %self.request_id, "Route resolution before request parse, skipping");
            return 0;
        };
        if !self.begin(Phase::RouteResolution) {
            return 0;
        }

        let router = &self.controller.router;
        let mut resolved = 0;
        loop {
            let route = Route::new(current.clone());
            match router.resolve_next_route(&route, &mut self.cursor) {
                Ok(Some(resolution)) => {
                    let name = resolution.module.name().to_string();
                    if let Some(view) = resolution.view_name() {
                        self.state.set_view(view);
                    }
                    if resolution.outcome.plugin_page {
                        self.state.mark_plugin_page();
                    }
                    for (key, value) in &resolution.outcome.query_updates {
                        current.set(key.clone(), value.clone());
                    }
                    tracing::debug!(
                        request_id = %self.request_id,
                        module = %name,
                        view = ?resolution.view_name(),
                        "Route resolved"
                    );
                    self.state.record_route(
                        route.resolved(resolution.module.clone(), resolution.outcome.view.clone()),
                    );
                    self.controller.matched.insert(name.clone(), resolution.module);
                    metrics::record_route_resolution(&name);
                    self.resolved_modules.push(name);
                    resolved += 1;
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(
                        request_id = %self.request_id,
                        module = %err.module,
                        error = %err,
                        "Module failed, halting route resolution"
                    );
                    metrics::record_routing_failure(&err.module);
                    self.notices
                        .add_error(err.to_string(), Phase::RouteResolution.as_str());
                    break;
                }
            }
        }

        self.end(Phase::RouteResolution);
        resolved
    }

    /// PRE_RENDER: the once-per-request asset decision.
    pub fn pre_render(
        &mut self,
        content: &[ContentBlock],
        widgets: &dyn WidgetRegistry,
    ) -> Option<GateReason> {
        if !self.begin(Phase::PreRender) {
            return None;
        }
        let reason = if content.is_empty() && !self.state.is_plugin_page() {
            tracing::debug!(request_id = %self.request_id, "No content to render, assets stay off");
            None
        } else {
            self.controller.gate.evaluate(&mut self.state, content, widgets)
        };
        if let Some(reason) = reason {
            tracing::debug!(request_id = %self.request_id, reason = reason.as_str(), "Assets enabled");
            metrics::record_asset_gate(reason.as_str());
        }
        self.end(Phase::PreRender);
        reason
    }

    /// ASSET_ENQUEUE: register and enqueue what the gate enabled.
    pub fn enqueue_assets(&mut self, pipeline: &mut dyn AssetPipeline) {
        if !self.begin(Phase::AssetEnqueue) {
            return;
        }
        let controller = self.controller;
        let settings = &controller.settings;
        let assets = &controller.assets;
        let urls = &assets.urls;
        let storage = controller.resolver.storage();
        let version = Some(settings.version.as_str());

        if self.state.load_css() {
            if let Some(sheet) = &assets.custom_style_sheet {
                let src = format!("{}css/{}", urls.upload, sheet);
                pipeline.register_style(Asset::new("espresso_custom_css", &src, &[], version));
                pipeline.enqueue_style("espresso_custom_css");
            }

            let upload_default = controller
                .templates
                .upload_dir
                .as_ref()
                .map(|dir| dir.join("css").join("espresso_default.css"))
                .filter(|path| storage.is_readable(path));
            let default_src = match upload_default {
                Some(_) => format!("{}css/espresso_default.css", urls.upload),
                None => format!("{}css/espresso_default.css", urls.global_assets),
            };
            pipeline.register_style(Asset::new("espresso_default", &default_src, &["dashicons"], version));
            pipeline.enqueue_style("espresso_default");

            // Registered only; themes enqueue it when they want it.
            let theme = &controller.templates.current_theme;
            let theme_style = controller
                .templates
                .theme_dir
                .as_ref()
                .map(|dir| dir.join(theme).join("style.css"))
                .filter(|path| storage.is_readable(path));
            let style_src = match theme_style {
                Some(_) => format!("{}{}/style.css", urls.theme, theme),
                None => format!("{}{}/style.css", urls.templates, theme),
            };
            pipeline.register_style(Asset::new(
                "espresso_style",
                &style_src,
                &["dashicons", "espresso_default"],
                None,
            ));
        }

        if self.state.load_js() {
            pipeline.enqueue_script("jquery");
            if !pipeline.is_script_registered("jquery") {
                self.notices.add_error(
                    "jQuery is not loaded! Event Espresso is unable to load jQuery due to a conflict with your theme or another plugin.",
                    Phase::AssetEnqueue.as_str(),
                );
            }
            let src = format!("{}scripts/espresso_core.js", urls.global_assets);
            pipeline.register_script(Asset::new("espresso_core", &src, &["jquery"], version).in_footer());
            pipeline.enqueue_script("espresso_core");

            let ajax_url = format!("{}/wp-admin/admin-ajax.php", settings.site_url.trim_end_matches('/'));
            let ajax_url = if settings.force_admin_ajax_ssl {
                maybe_force_admin_ajax_ssl(&ajax_url, self.secure).into_owned()
            } else {
                ajax_url
            };
            pipeline.localize_script("espresso_core", "eei18n", json!({ "ajax_url": ajax_url }));
        }

        if assets.load_qtip {
            let src = format!("{}qtip/jquery.qtip.js", urls.third_party);
            pipeline.register_script(Asset::new("qtip", &src, &["jquery"], Some("2.2.0")).in_footer());
            pipeline.enqueue_script("qtip");
            let css = format!("{}qtip/jquery.qtip.css", urls.third_party);
            pipeline.register_style(Asset::new("qtip-css", &css, &[], Some("2.2.0")));
            pipeline.enqueue_style("qtip-css");
        }

        if assets.load_accounting_js {
            let core = format!("{}accounting/accounting.js", urls.third_party);
            pipeline.register_script(Asset::new("ee-accounting-core", &core, &["underscore"], Some("0.3.2")).in_footer());
            let cfg = format!("{}scripts/ee-accounting-config.js", urls.global_assets);
            pipeline.register_script(Asset::new("ee-accounting", &cfg, &["ee-accounting-core"], version).in_footer());
            pipeline.enqueue_script("ee-accounting");
            pipeline.localize_script("ee-accounting", "EE_ACCOUNTING_CFG", accounting_config(assets));
        }

        if !pipeline.has_head_output() {
            self.notices.add_error(
                "Missing wp_head() function. The theme does not print the document head; please contact the theme developer before using Event Espresso.",
                Phase::AssetEnqueue.as_str(),
            );
        }
        if !pipeline.has_footer_output() {
            self.notices.add_error(
                "Missing wp_footer() function. The theme does not print the document footer; please contact the theme developer before using Event Espresso.",
                Phase::AssetEnqueue.as_str(),
            );
        }

        self.end(Phase::AssetEnqueue);
    }

    /// HEAD_EMIT: meta tags and structured data for the document head.
    pub fn emit_head(&mut self, content: &[ContentBlock]) -> String {
        if !self.begin(Phase::HeadEmit) {
            return String::new();
        }
        let settings = &self.controller.settings;
        let mut out = String::new();

        if settings.generator_meta {
            out.push_str(&format!(
                "<meta name=\"generator\" content=\"Event Espresso Version {}\" />\n",
                settings.version
            ));
        }

        let query = self.parsed.as_ref().map(ParsedRequest::query);
        if query.and_then(HostQuery::taxonomy) == Some(EVENT_TYPE_TAXONOMY) && settings.blog_public {
            out.push_str("<meta name=\"robots\" content=\"noindex,follow\" />\n");
        }

        if query.and_then(HostQuery::post_type) == Some(EVENT_POST_TYPE) {
            if let [event] = content {
                if event.post_type == EVENT_POST_TYPE {
                    out.push_str(&event_json_ld(event, &settings.site_url));
                }
            }
        }

        self.end(Phase::HeadEmit);
        out
    }

    /// ERROR_DISPLAY: render queued notices, once per request.
    pub fn display_errors(&mut self, ctx: LoopContext) -> Option<String> {
        if !self.begin(Phase::ErrorDisplay) {
            return None;
        }
        let feed = ctx.feed
            || self
                .parsed
                .as_ref()
                .is_some_and(|p| p.query().is_feed());
        let mut rendered = None;
        if !self.state.errors_shown()
            && self.controller.settings.display_errors
            && ctx.main_query
            && !feed
            && ctx.in_the_loop
            && self.state.is_plugin_page()
            && self.state.mark_errors_shown()
        {
            let mut markup = self.notices.get_notices();
            markup.push_str(AJAX_NOTICES_CONTAINER);
            tracing::debug!(request_id = %self.request_id, "Notices displayed");
            rendered = Some(markup);
        }
        self.end(Phase::ErrorDisplay);
        rendered
    }

    /// TEMPLATE_SELECT: filter the host's proposed template.
    pub fn select_template(&mut self, host_default: &Path) -> PathBuf {
        if !self.begin(Phase::TemplateSelect) {
            return self
                .selected
                .clone()
                .unwrap_or_else(|| host_default.to_path_buf());
        }

        let selected = if self.state.is_plugin_page() {
            let requested = self
                .state
                .view()
                .filter(|view| !view.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| file_name(host_default));
            let selection = self.controller.resolver.resolve(&requested, &[], host_default);
            let path = selection.resolved_path;
            self.state
                .record_template(path.display().to_string(), file_name(&path));
            tracing::info!(
                request_id = %self.request_id,
                requested = %requested,
                template = %path.display(),
                found = selection.found,
                "Template selected"
            );
            path
        } else {
            host_default.to_path_buf()
        };

        self.selected = Some(selected.clone());
        self.end(Phase::TemplateSelect);
        selected
    }

    /// RESPONSE_SENT: close the lifecycle and report.
    pub fn finish(mut self) -> RequestSummary {
        if self.begin(Phase::ResponseSent) {
            self.end(Phase::ResponseSent);
        }
        metrics::record_request(self.state.is_plugin_page(), self.started);
        let summary = RequestSummary {
            request_id: self.request_id.clone(),
            state: self.state.snapshot(),
            selected: self.selected.clone(),
            modules: std::mem::take(&mut self.resolved_modules),
            pending_notices: self.notices.len(),
            phases: self.tracker.fired(),
        };
        tracing::debug!(
            request_id = %summary.request_id,
            plugin_page = summary.state.plugin_page,
            cpt_strategy = summary.state.cpt_strategy,
            modules = ?summary.modules,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Request lifecycle complete"
        );
        summary
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn accounting_config(assets: &AssetConfig) -> serde_json::Value {
    let c = &assets.currency;
    let (pos, neg, zero) = if c.sign_b4 {
        ("%s%v", "- %s%v", "%s--")
    } else {
        ("%v%s", "- %v%s", "--%s")
    };
    json!({
        "currency": {
            "symbol": c.sign,
            "format": { "pos": pos, "neg": neg, "zero": zero },
            "decimal": c.dec_mrk,
            "thousand": c.thsnds,
            "precision": c.dec_plc,
        },
        "number": {
            "precision": 0,
            "thousand": c.thsnds,
            "decimal": c.dec_mrk,
        },
    })
}

fn event_json_ld(event: &ContentBlock, site_url: &str) -> String {
    let data = json!({
        "@context": "http://schema.org",
        "@type": "Event",
        "name": event.title,
        "description": event.body,
        "url": format!("{}/{}/", site_url.trim_end_matches('/'), event.slug),
    });
    // `</` would close the script element early.
    let body = data.to_string().replace("</", "<\\/");
    format!("<script type=\"application/ld+json\">{}</script>\n", body)
}
