//! Modules declared in configuration.

use std::collections::BTreeMap;

use crate::config::ModuleConfig;
use crate::routing::matcher::{AndMatcher, Matcher};
use crate::routing::module::{ModuleError, ModuleHandler, ModuleOutcome};
use crate::routing::route::Route;
use crate::routing::router::ModuleRegistry;

/// A module whose claim conditions and outcome come from a [`ModuleConfig`].
#[derive(Debug)]
pub struct ConfiguredModule {
    name: String,
    matcher: AndMatcher,
    view: Option<String>,
    plugin_page: bool,
    set: BTreeMap<String, String>,
    fail_with: Option<String>,
}

impl ConfiguredModule {
    pub fn from_config(config: &ModuleConfig) -> Self {
        Self {
            name: config.name.clone(),
            matcher: AndMatcher::from_config(&config.conditions),
            view: config.view.clone(),
            plugin_page: config.plugin_page,
            set: config.set.clone(),
            fail_with: config.fail_with.clone(),
        }
    }
}

impl ModuleHandler for ConfiguredModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, route: &Route) -> bool {
        self.matcher.matches(route.query())
    }

    fn handle(&self, _route: &Route) -> Result<ModuleOutcome, ModuleError> {
        if let Some(message) = &self.fail_with {
            return Err(ModuleError::new(&self.name, message.clone()));
        }
        let mut outcome = match &self.view {
            Some(view) => ModuleOutcome::view(view.clone()),
            None => ModuleOutcome::default(),
        };
        for (key, value) in &self.set {
            outcome = outcome.with_query_update(key.clone(), value.clone());
        }
        if self.plugin_page {
            outcome = outcome.marking_plugin_page();
        }
        Ok(outcome)
    }
}

/// Build the registry from configured modules, preserving declaration order.
pub fn registry_from_config(modules: &[ModuleConfig]) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for module in modules {
        registry.register(ConfiguredModule::from_config(module));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::routing::route::HostQuery;

    fn config(name: &str) -> ModuleConfig {
        ModuleConfig {
            name: name.into(),
            conditions: MatchConfig {
                page: Some("registration-checkout".into()),
                ..MatchConfig::default()
            },
            view: Some("reg_checkout.html".into()),
            plugin_page: true,
            set: [("step".to_string(), "attendee_information".to_string())].into(),
            fail_with: None,
        }
    }

    #[test]
    fn test_configured_module_outcome() {
        let module = ConfiguredModule::from_config(&config("checkout"));
        let route = Route::new(HostQuery::main().with_var("page", "registration-checkout"));

        assert!(module.can_handle(&route));
        let outcome = module.handle(&route).unwrap();
        assert_eq!(outcome.view.as_deref(), Some("reg_checkout.html"));
        assert!(outcome.plugin_page);
        assert_eq!(
            outcome.query_updates,
            vec![("step".to_string(), "attendee_information".to_string())]
        );
    }

    #[test]
    fn test_configured_module_failure() {
        let mut cfg = config("checkout");
        cfg.fail_with = Some("no active checkout session".into());
        let module = ConfiguredModule::from_config(&cfg);
        let route = Route::new(HostQuery::main().with_var("page", "registration-checkout"));

        let err = module.handle(&route).unwrap_err();
        assert_eq!(err, ModuleError::new("checkout", "no active checkout session"));
    }
}
