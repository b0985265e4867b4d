//! HTTP server setup and the page handler.
//!
//! # Responsibilities
//! - Create the Axum router (pages, optional admin API)
//! - Wire up middleware (timeout, tracing, request ID)
//! - Drive the front controller through every phase for each page request
//! - Render the selected template
//! - Serve until the shutdown signal fires

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::assets::{AssetManifest, ContentBlock};
use crate::config::FrontConfig;
use crate::dispatch::{FrontController, LoopContext, RequestSummary};
use crate::http::host::EmbeddedHost;
use crate::http::request::{self, propagate_request_id_layer, set_request_id_layer};
use crate::notices::escape_html;

/// Response header naming the selected template file.
pub const X_ESPRESSO_TEMPLATE: &str = "x-espresso-template";

/// Cookie used by the front end to detect disabled cookies.
pub const TEST_COOKIE: &str = "ee_cookie_test";

/// Used when the selected template cannot be read.
const FALLBACK_LAYOUT: &str = "<!DOCTYPE html>\n<html>\n<head>\n<title>{{title}}</title>\n{{head}}</head>\n<body>\n{{notices}}\n{{content}}\n{{footer}}</body>\n</html>\n";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("listener error: {0}")]
    Listener(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<FrontController>,
    pub host: Arc<EmbeddedHost>,
    pub config: Arc<FrontConfig>,
}

/// HTTP server for the embedded host.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Build the controller from configuration and create the server.
    pub fn new(config: FrontConfig) -> Self {
        let controller = FrontController::builder(&config).build();
        Self::with_controller(config, controller)
    }

    /// Create the server around an already built controller.
    pub fn with_controller(config: FrontConfig, controller: FrontController) -> Self {
        let state = AppState {
            controller: Arc::new(controller),
            host: Arc::new(EmbeddedHost::from_config(&config)),
            config: Arc::new(config),
        };
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let timeout = Duration::from_secs(state.config.timeouts.request_secs);
        let mut router = Router::new()
            .route("/", get(page_handler))
            .route("/{*path}", get(page_handler));
        if state.config.admin.enabled {
            router = router.merge(crate::admin::setup_admin_router(state.clone()));
        }
        router
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn controller(&self) -> &Arc<FrontController> {
        &self.state.controller
    }

    pub fn config(&self) -> &FrontConfig {
        &self.state.config
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Output of one full lifecycle, ready to be laid out.
struct RenderedPage {
    head: String,
    notices: String,
    footer: String,
    template: PathBuf,
    posts: Vec<ContentBlock>,
    summary: RequestSummary,
}

/// Fire every phase in host order. Synchronous; nothing here awaits.
fn run_lifecycle(
    state: &AppState,
    request_id: String,
    secure: bool,
    uri: &Uri,
    params: &BTreeMap<String, String>,
) -> RenderedPage {
    let controller = &state.controller;
    let query = state.host.query_for(uri.path(), params);
    let posts = state.host.posts_for(&query);

    let mut run = controller.begin_request(request_id).secure(secure);
    run.init_strategy();
    run.parse_request(&query);
    run.resolve_routes(&query);
    run.pre_render(&posts, state.host.widgets());

    let mut manifest = AssetManifest::with_host_scripts();
    run.enqueue_assets(&mut manifest);
    let mut head = manifest.render_head();
    head.push_str(&run.emit_head(&posts));

    let notices = run
        .display_errors(LoopContext::main_loop())
        .unwrap_or_default();
    let template = run.select_template(controller.default_template());
    let footer = manifest.render_footer();

    RenderedPage {
        head,
        notices,
        footer,
        template,
        posts,
        summary: run.finish(),
    }
}

/// Serves every page through the front controller.
async fn page_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let request_id = request::request_id(&headers);
    let secure = request::is_secure(&headers);

    let page = run_lifecycle(&state, request_id, secure, &uri, &params);
    let posts = &page.posts;

    let layout = match tokio::fs::read_to_string(&page.template).await {
        Ok(layout) => layout,
        Err(e) => {
            tracing::error!(
                request_id = %page.summary.request_id,
                template = %page.template.display(),
                error = %e,
                "Failed to read template, using fallback layout"
            );
            FALLBACK_LAYOUT.to_string()
        }
    };

    let title = posts
        .first()
        .map(|post| escape_html(&post.title))
        .unwrap_or_default();
    let content: String = posts
        .iter()
        .map(|post| format!("<article class=\"{}\">{}</article>\n", escape_html(&post.slug), post.body))
        .collect();
    let body = layout
        .replace("{{title}}", &title)
        .replace("{{head}}", &page.head)
        .replace("{{notices}}", &page.notices)
        .replace("{{content}}", &content)
        .replace("{{footer}}", &page.footer);

    let status = if posts.is_empty() && !page.summary.state.plugin_page {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    let mut response = (status, Html(body)).into_response();
    let template_name = page
        .template
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Ok(value) = HeaderValue::from_str(&template_name) {
        response.headers_mut().insert(X_ESPRESSO_TEMPLATE, value);
    }
    if state.config.front.set_test_cookie {
        let cookie = format!("{}={}; Max-Age=86400; Path=/", TEST_COOKIE, uuid::Uuid::new_v4().simple());
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}
