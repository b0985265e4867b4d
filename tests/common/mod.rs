//! Shared fixtures for integration tests.

use std::fs;
use std::path::Path;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use espresso_front::config::{FrontConfig, MatchConfig, ModuleConfig, PostConfig};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "test-admin-key";

/// Config plus the temporary template tree it points at.
pub struct Fixture {
    pub dir: TempDir,
    pub config: FrontConfig,
}

fn write_layout(path: &Path, marker: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        path,
        format!(
            "<html><head><title>{{{{title}}}}</title>\n{{{{head}}}}</head>\n<body data-layout=\"{marker}\">\n{{{{notices}}}}\n{{{{content}}}}\n{{{{footer}}}}</body></html>\n"
        ),
    )
    .unwrap();
}

fn module(name: &str, conditions: MatchConfig, view: &str) -> ModuleConfig {
    ModuleConfig {
        name: name.into(),
        conditions,
        view: Some(view.into()),
        plugin_page: false,
        set: Default::default(),
        fail_with: None,
    }
}

fn post(slug: &str, title: &str, post_type: &str, body: &str) -> PostConfig {
    PostConfig {
        slug: slug.into(),
        title: title.into(),
        body: body.into(),
        post_type: post_type.into(),
    }
}

/// Template tree:
/// ```text
/// index.html                           host default
/// secret.html                          outside every search root
/// theme/single-espresso_events.html    theme override
/// plugin/single-espresso_events.html
/// plugin/archive-espresso_events.html
/// ```
pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_layout(&root.join("index.html"), "host-default");
    write_layout(&root.join("secret.html"), "secret");
    write_layout(&root.join("theme/single-espresso_events.html"), "theme-single");
    write_layout(&root.join("plugin/single-espresso_events.html"), "plugin-single");
    write_layout(&root.join("plugin/archive-espresso_events.html"), "plugin-archive");

    let mut config = FrontConfig::default();
    config.templates.theme_dir = Some(root.join("theme"));
    config.templates.plugin_dir = root.join("plugin");
    config.templates.default_template = root.join("index.html");
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();

    config.modules = vec![
        module(
            "event_list",
            MatchConfig {
                page: Some("events".into()),
                ..MatchConfig::default()
            },
            "archive-espresso_events.html",
        ),
        module(
            "event_single",
            MatchConfig {
                post_type: Some("espresso_events".into()),
                ..MatchConfig::default()
            },
            "single-espresso_events.html",
        ),
        ModuleConfig {
            fail_with: Some("Registration is <closed>".into()),
            ..module(
                "flaky",
                MatchConfig {
                    present: vec!["fail".into()],
                    ..MatchConfig::default()
                },
                "never.html",
            )
        },
        module(
            "escape",
            MatchConfig {
                present: vec!["escape".into()],
                ..MatchConfig::default()
            },
            "../secret.html",
        ),
    ];

    config.posts = vec![
        post("about", "About", "page", "<p>We run events.</p>"),
        post("news", "News", "post", "<p>Soon:</p>[ESPRESSO_EVENTS limit=3]"),
        post(
            "summer-gala",
            "Summer Gala",
            "espresso_events",
            "<p>Music all night.</p>[ESPRESSO_TICKET_SELECTOR]",
        ),
    ];

    Fixture { dir, config }
}

/// Send a GET through the router in-process.
pub async fn get(router: &Router, uri: &str, bearer: Option<&str>) -> (Response<Body>, String) {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = bearer {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let response = router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    (
        Response::from_parts(parts, Body::empty()),
        String::from_utf8(bytes.to_vec()).unwrap(),
    )
}
