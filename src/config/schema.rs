//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the front
//! controller and the embedded host that drives it.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FrontConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Template search roots.
    pub templates: TemplateConfig,

    /// Front controller behaviour toggles.
    pub front: FrontSettings,

    /// Asset gate and enqueue settings.
    pub assets: AssetConfig,

    /// Declarative module handlers, in registration order.
    pub modules: Vec<ModuleConfig>,

    /// Page slugs that always belong to the plugin.
    pub plugin_pages: PluginPages,

    /// Content served by the embedded host.
    pub posts: Vec<PostConfig>,

    /// Sidebar name -> widget instance ids.
    pub sidebars: BTreeMap<String, Vec<String>>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds. Owned by the host, not the plugin core.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Template search roots, in fallback order after any explicit paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Active theme override directory.
    pub theme_dir: Option<PathBuf>,

    /// Plugin upload override directory.
    pub upload_dir: Option<PathBuf>,

    /// Templates bundled with the plugin.
    pub plugin_dir: PathBuf,

    /// The host's own default template.
    pub default_template: PathBuf,

    /// Theme subdirectory holding the plugin stylesheet.
    pub current_theme: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            theme_dir: None,
            upload_dir: None,
            plugin_dir: PathBuf::from("templates/espresso"),
            default_template: PathBuf::from("templates/index.html"),
            current_theme: "espresso_default".to_string(),
        }
    }
}

/// Front controller behaviour toggles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontSettings {
    /// Integrate custom post types with the host query at init.
    pub employ_cpt_strategy: bool,

    /// Render queued notices inside the main loop.
    pub display_errors: bool,

    /// Set the `ee_cookie_test` cookie on page responses.
    pub set_test_cookie: bool,

    /// Rewrite admin-ajax URLs to https on secure requests.
    pub force_admin_ajax_ssl: bool,

    /// Whether search engines may index the site.
    pub blog_public: bool,

    /// Emit the generator meta tag.
    pub generator_meta: bool,

    /// Plugin version reported in meta tags and asset URLs.
    pub version: String,

    /// Public site URL.
    pub site_url: String,

    /// Treat every request as served over https.
    pub ssl: bool,
}

impl Default for FrontSettings {
    fn default() -> Self {
        Self {
            employ_cpt_strategy: true,
            display_errors: true,
            set_test_cookie: true,
            force_admin_ajax_ssl: true,
            blog_public: true,
            generator_meta: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
            site_url: "http://localhost:8080".to_string(),
            ssl: false,
        }
    }
}

/// Asset gate and enqueue settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Shortcode tags owned by the plugin.
    pub shortcodes: Vec<String>,

    /// Widget id bases owned by the plugin.
    pub widgets: Vec<String>,

    /// Custom stylesheet file name under `<upload_url>/css/`.
    pub custom_style_sheet: Option<String>,

    /// Load the qtip tooltip library.
    pub load_qtip: bool,

    /// Load accounting.js with the currency configuration.
    pub load_accounting_js: bool,

    /// Public base URLs for asset sources.
    pub urls: AssetUrls,

    /// Currency formatting handed to accounting.js.
    pub currency: CurrencyConfig,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            shortcodes: [
                "ESPRESSO_EVENTS",
                "ESPRESSO_EVENT_ATTENDEES",
                "ESPRESSO_TICKET_SELECTOR",
                "ESPRESSO_CHECKOUT",
                "ESPRESSO_THANK_YOU",
                "ESPRESSO_TXN_PAGE",
                "ESPRESSO_CANCELLED",
                "ESPRESSO_VENUES",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            widgets: vec!["espresso_upcoming_events".to_string()],
            custom_style_sheet: None,
            load_qtip: false,
            load_accounting_js: false,
            urls: AssetUrls::default(),
            currency: CurrencyConfig::default(),
        }
    }
}

/// Public base URLs, each ending with `/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetUrls {
    pub global_assets: String,
    pub upload: String,
    pub templates: String,
    pub theme: String,
    pub third_party: String,
}

impl Default for AssetUrls {
    fn default() -> Self {
        Self {
            global_assets: "/plugins/event-espresso/assets/".to_string(),
            upload: "/uploads/espresso/".to_string(),
            templates: "/plugins/event-espresso/templates/".to_string(),
            theme: "/themes/active/".to_string(),
            third_party: "/plugins/event-espresso/third_party/".to_string(),
        }
    }
}

/// Currency formatting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CurrencyConfig {
    pub sign: String,
    /// Sign placed before the value.
    pub sign_b4: bool,
    pub dec_mrk: String,
    pub thsnds: String,
    pub dec_plc: u8,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            sign: "$".to_string(),
            sign_b4: true,
            dec_mrk: ".".to_string(),
            thsnds: ",".to_string(),
            dec_plc: 2,
        }
    }
}

/// A declarative module handler.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleConfig {
    /// Unique module name; key of the matched-module map.
    pub name: String,

    /// Conditions that must all hold for the module to claim a route.
    #[serde(rename = "match", default)]
    pub conditions: MatchConfig,

    /// View the module selects when it handles a route.
    #[serde(default)]
    pub view: Option<String>,

    /// Mark the request as a plugin page when handled.
    #[serde(default)]
    pub plugin_page: bool,

    /// Query vars written for subsequent route passes.
    #[serde(default)]
    pub set: BTreeMap<String, String>,

    /// Make the module fail with this message when handling.
    #[serde(default)]
    pub fail_with: Option<String>,
}

/// Route conditions (AND semantics).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MatchConfig {
    /// Page slug (case-insensitive).
    pub page: Option<String>,

    /// Post type of the queried object.
    pub post_type: Option<String>,

    /// Query vars that must equal the given value.
    pub query: BTreeMap<String, String>,

    /// Query vars that must be present with any value.
    pub present: Vec<String>,
}

impl MatchConfig {
    pub fn is_empty(&self) -> bool {
        self.page.is_none() && self.post_type.is_none() && self.query.is_empty() && self.present.is_empty()
    }
}

/// Page slugs owned by the plugin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PluginPages(pub Vec<String>);

impl Default for PluginPages {
    fn default() -> Self {
        Self(
            [
                "events",
                "registration-checkout",
                "transactions",
                "thank-you",
                "registration-cancelled",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }
}

/// A post stored by the embedded host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostConfig {
    pub slug: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(default = "default_post_type")]
    pub post_type: String,
}

fn default_post_type() -> String {
    "page".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin API under `/admin`.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
