//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FrontConfig (validated, immutable)
//!     → shared via Arc with the controller and the host
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, AssetConfig, FrontConfig, FrontSettings, ListenerConfig, LogFormat, MatchConfig,
    ModuleConfig, ObservabilityConfig, PostConfig, TemplateConfig,
};
