//! Asset pipeline boundary and an in-memory manifest implementation.
//!
//! The controller never touches the pipeline outside the enqueue phase; the
//! manifest records registrations so the host can print tags into the page.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

/// Registration data for a script or style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub handle: String,
    pub src: String,
    pub deps: Vec<String>,
    pub version: Option<String>,
    pub in_footer: bool,
}

impl Asset {
    pub fn new(handle: &str, src: &str, deps: &[&str], version: Option<&str>) -> Self {
        Self {
            handle: handle.to_string(),
            src: src.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            version: version.map(String::from),
            in_footer: false,
        }
    }

    pub fn in_footer(mut self) -> Self {
        self.in_footer = true;
        self
    }

    fn url(&self) -> String {
        match &self.version {
            Some(ver) => format!("{}?ver={}", self.src, ver),
            None => self.src.clone(),
        }
    }
}

/// Script and style registry of the host.
pub trait AssetPipeline {
    fn register_style(&mut self, asset: Asset);
    fn enqueue_style(&mut self, handle: &str);
    fn register_script(&mut self, asset: Asset);
    fn enqueue_script(&mut self, handle: &str);
    fn is_script_registered(&self, handle: &str) -> bool;
    fn localize_script(&mut self, handle: &str, object_name: &str, data: Value);

    /// Whether the active theme prints the document head.
    fn has_head_output(&self) -> bool;

    /// Whether the active theme prints the document footer.
    fn has_footer_output(&self) -> bool;
}

/// Recorded registrations, printable as HTML.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetManifest {
    styles: BTreeMap<String, Asset>,
    scripts: BTreeMap<String, Asset>,
    enqueued_styles: Vec<String>,
    enqueued_scripts: Vec<String>,
    localized: Vec<(String, String, Value)>,
    head_output: bool,
    footer_output: bool,
}

impl AssetManifest {
    /// Empty manifest for a theme with head and footer output.
    pub fn new() -> Self {
        Self {
            head_output: true,
            footer_output: true,
            ..Self::default()
        }
    }

    /// Manifest pre-loaded with the libraries every host ships.
    pub fn with_host_scripts() -> Self {
        let mut manifest = Self::new();
        manifest.register_script(Asset::new("jquery", "/includes/js/jquery/jquery.js", &[], None));
        manifest.register_script(Asset::new("underscore", "/includes/js/underscore.min.js", &[], None));
        manifest.register_style(Asset::new("dashicons", "/includes/css/dashicons.min.css", &[], None));
        manifest
    }

    pub fn without_head_output(mut self) -> Self {
        self.head_output = false;
        self
    }

    pub fn without_footer_output(mut self) -> Self {
        self.footer_output = false;
        self
    }

    pub fn style(&self, handle: &str) -> Option<&Asset> {
        self.styles.get(handle)
    }

    pub fn script(&self, handle: &str) -> Option<&Asset> {
        self.scripts.get(handle)
    }

    pub fn enqueued_styles(&self) -> &[String] {
        &self.enqueued_styles
    }

    pub fn enqueued_scripts(&self) -> &[String] {
        &self.enqueued_scripts
    }

    pub fn localized(&self, object_name: &str) -> Option<&Value> {
        self.localized
            .iter()
            .find(|(_, name, _)| name == object_name)
            .map(|(_, _, data)| data)
    }

    /// Tags for the document head: styles, localized data, head scripts.
    pub fn render_head(&self) -> String {
        let mut out = String::new();
        for style in self.resolve(&self.enqueued_styles, &self.styles) {
            let _ = writeln!(
                out,
                r#"<link rel="stylesheet" id="{}-css" href="{}" />"#,
                style.handle,
                style.url()
            );
        }
        for (_, object_name, data) in &self.localized {
            let _ = writeln!(out, "<script>var {} = {};</script>", object_name, data);
        }
        for script in self.resolve(&self.enqueued_scripts, &self.scripts) {
            if !script.in_footer {
                let _ = writeln!(out, r#"<script src="{}"></script>"#, script.url());
            }
        }
        out
    }

    /// Scripts registered for the footer.
    pub fn render_footer(&self) -> String {
        let mut out = String::new();
        for script in self.resolve(&self.enqueued_scripts, &self.scripts) {
            if script.in_footer {
                let _ = writeln!(out, r#"<script src="{}"></script>"#, script.url());
            }
        }
        out
    }

    /// Enqueued handles expanded with their dependencies, each printed once.
    fn resolve<'a>(&'a self, handles: &[String], registry: &'a BTreeMap<String, Asset>) -> Vec<&'a Asset> {
        fn visit<'a>(
            handle: &str,
            registry: &'a BTreeMap<String, Asset>,
            seen: &mut Vec<String>,
            out: &mut Vec<&'a Asset>,
        ) {
            if seen.iter().any(|h| h == handle) {
                return;
            }
            seen.push(handle.to_string());
            if let Some(asset) = registry.get(handle) {
                for dep in &asset.deps {
                    visit(dep, registry, seen, out);
                }
                out.push(asset);
            }
        }

        let mut seen = Vec::new();
        let mut out = Vec::new();
        for handle in handles {
            visit(handle, registry, &mut seen, &mut out);
        }
        out
    }
}

impl AssetPipeline for AssetManifest {
    fn register_style(&mut self, asset: Asset) {
        self.styles.entry(asset.handle.clone()).or_insert(asset);
    }

    fn enqueue_style(&mut self, handle: &str) {
        if self.styles.contains_key(handle) && !self.enqueued_styles.iter().any(|h| h == handle) {
            self.enqueued_styles.push(handle.to_string());
        }
    }

    fn register_script(&mut self, asset: Asset) {
        self.scripts.entry(asset.handle.clone()).or_insert(asset);
    }

    fn enqueue_script(&mut self, handle: &str) {
        if self.scripts.contains_key(handle) && !self.enqueued_scripts.iter().any(|h| h == handle) {
            self.enqueued_scripts.push(handle.to_string());
        }
    }

    fn is_script_registered(&self, handle: &str) -> bool {
        self.scripts.contains_key(handle)
    }

    fn localize_script(&mut self, handle: &str, object_name: &str, data: Value) {
        if self.scripts.contains_key(handle) {
            self.localized
                .push((handle.to_string(), object_name.to_string(), data));
        }
    }

    fn has_head_output(&self) -> bool {
        self.head_output
    }

    fn has_footer_output(&self) -> bool {
        self.footer_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enqueue_requires_registration() {
        let mut manifest = AssetManifest::new();
        manifest.enqueue_script("espresso_core");
        assert!(manifest.enqueued_scripts().is_empty());

        manifest.register_script(Asset::new("espresso_core", "/core.js", &[], Some("1.0")));
        manifest.enqueue_script("espresso_core");
        manifest.enqueue_script("espresso_core");
        assert_eq!(manifest.enqueued_scripts(), ["espresso_core"]);
    }

    #[test]
    fn test_render_orders_dependencies_first() {
        let mut manifest = AssetManifest::with_host_scripts();
        manifest.register_script(Asset::new("espresso_core", "/core.js", &["jquery"], Some("1.0")).in_footer());
        manifest.enqueue_script("espresso_core");
        manifest.localize_script("espresso_core", "eei18n", json!({"ajax_url": "/admin-ajax.php"}));

        let head = manifest.render_head();
        assert!(head.contains(r#"<script src="/includes/js/jquery/jquery.js"></script>"#));
        assert!(head.contains(r#"var eei18n = {"ajax_url":"/admin-ajax.php"};"#));
        assert!(!head.contains("/core.js"));

        let footer = manifest.render_footer();
        assert_eq!(footer, "<script src=\"/core.js?ver=1.0\"></script>\n");
    }
}
