//! Asset gate: decides once per request whether plugin CSS/JS load.
//!
//! # Decision (short-circuit OR)
//! ```text
//! plugin page?                       → PluginPage
//! shortcode in any content block?    → Shortcode
//! plugin widget in active sidebar?   → Widget
//! otherwise                          → no assets
//! ```
//!
//! # Design Decisions
//! - The gate only flips flags on the request state; enqueueing is a later phase
//! - Flags are monotonic: a negative decision never clears them
//! - The widget check is an upper bound: a widget in an active sidebar may
//!   still not be rendered by the current template

use serde::Serialize;

use crate::assets::widgets::WidgetRegistry;
use crate::request::RequestState;

/// A block of content the host is about to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub post_type: String,
}

impl ContentBlock {
    pub fn new(slug: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            body: body.into(),
            post_type: "page".to_string(),
            ..Self::default()
        }
    }
}

/// Why the gate enabled assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    PluginPage,
    Shortcode,
    Widget,
}

impl GateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PluginPage => "plugin_page",
            Self::Shortcode => "shortcode",
            Self::Widget => "widget",
        }
    }
}

/// Finds plugin shortcodes such as `[ESPRESSO_EVENTS limit=5]` in content.
#[derive(Debug, Clone)]
pub struct ShortcodeScanner {
    tags: Vec<String>,
}

impl ShortcodeScanner {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// True if `text` contains an opening tag for one of the plugin shortcodes.
    pub fn contains_shortcode(&self, text: &str) -> bool {
        text.match_indices('[').any(|(start, _)| {
            let rest = &text[start + 1..];
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(rest.len());
            let name = &rest[..end];
            !name.is_empty() && self.tags.iter().any(|tag| tag == name)
        })
    }
}

/// The once-per-request asset decision.
#[derive(Debug, Clone)]
pub struct AssetGate {
    scanner: ShortcodeScanner,
}

impl AssetGate {
    pub fn new(scanner: ShortcodeScanner) -> Self {
        Self { scanner }
    }

    /// Pure decision; see the module docs for the order of checks.
    pub fn should_load_assets(
        &self,
        state: &RequestState,
        content: &[ContentBlock],
        widgets: &dyn WidgetRegistry,
    ) -> Option<GateReason> {
        if state.is_plugin_page() {
            return Some(GateReason::PluginPage);
        }
        if content
            .iter()
            .any(|block| self.scanner.contains_shortcode(&block.body))
        {
            return Some(GateReason::Shortcode);
        }
        if widgets
            .plugin_widget_ids()
            .iter()
            .any(|id| widgets.is_active_in_any_sidebar(id))
        {
            return Some(GateReason::Widget);
        }
        None
    }

    /// Decide and record the decision on the request state.
    pub fn evaluate(
        &self,
        state: &mut RequestState,
        content: &[ContentBlock],
        widgets: &dyn WidgetRegistry,
    ) -> Option<GateReason> {
        let reason = self.should_load_assets(state, content, widgets);
        if reason.is_some() {
            state.enable_assets();
        }
        reason
    }
}
