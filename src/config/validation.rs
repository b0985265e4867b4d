//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Module names unique and non-empty, every module has a condition
//! - Bind addresses parse, timeouts > 0
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FrontConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::FrontConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    BindAddress(String),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("module at position {0} has an empty name")]
    EmptyModuleName(usize),

    #[error("module `{0}` is declared more than once")]
    DuplicateModule(String),

    #[error("module `{0}` has no match conditions")]
    UnconditionalModule(String),

    #[error("module `{0}` declares an empty view")]
    EmptyView(String),

    #[error("asset configuration declares no shortcodes")]
    NoShortcodes,

    #[error("admin API enabled with an empty api key")]
    EmptyApiKey,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &FrontConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut seen = HashSet::new();
    for (index, module) in config.modules.iter().enumerate() {
        if module.name.trim().is_empty() {
            errors.push(ValidationError::EmptyModuleName(index));
            continue;
        }
        if !seen.insert(module.name.as_str()) {
            errors.push(ValidationError::DuplicateModule(module.name.clone()));
        }
        if module.conditions.is_empty() {
            errors.push(ValidationError::UnconditionalModule(module.name.clone()));
        }
        if module.view.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.push(ValidationError::EmptyView(module.name.clone()));
        }
    }

    if config.assets.shortcodes.is_empty() {
        errors.push(ValidationError::NoShortcodes);
    }
    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::EmptyApiKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
