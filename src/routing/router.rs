//! Module registry and route resolution.
//!
//! # Responsibilities
//! - Store registered modules in registration order
//! - Resolve the next route of a request to the module that claims it
//! - Return a resolution or an explicit "no more routes"
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - First match wins, lowest registration index first
//! - Every pass scans from the first registered module; a per-request
//!   [`RouteCursor`] remembers which modules already claimed, so each module
//!   claims at most once per request and the dispatcher's loop terminates
//! - Handler errors are returned untouched; the dispatcher decides what to do

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::routing::module::{ModuleError, ModuleHandler, ModuleOutcome, ModuleRef};
use crate::routing::route::Route;

/// Modules known to the router, in registration order.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleRef>,
    names: HashSet<String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. A second module with an already registered name is ignored.
    pub fn register<H: ModuleHandler + 'static>(&mut self, handler: H) -> &mut Self {
        self.register_shared(Arc::new(handler))
    }

    pub fn register_shared(&mut self, handler: Arc<dyn ModuleHandler>) -> &mut Self {
        let module = ModuleRef::new(handler);
        if !self.names.insert(module.name().to_string()) {
            tracing::warn!(module = %module.name(), "Module already registered, ignoring duplicate");
            return self;
        }
        tracing::debug!(module = %module.name(), index = self.modules.len(), "Module registered");
        self.modules.push(module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleRef> {
        self.modules.iter()
    }
}

/// Registry indices that already claimed a route in this request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteCursor {
    claimed: BTreeSet<usize>,
}

impl RouteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_claimed(&self, index: usize) -> bool {
        self.claimed.contains(&index)
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}

/// A route claimed by a module.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub module: ModuleRef,
    pub outcome: ModuleOutcome,
}

impl Resolution {
    pub fn view_name(&self) -> Option<&str> {
        self.outcome.view.as_deref()
    }
}

/// Resolves routes against the frozen module registry.
#[derive(Debug)]
pub struct ModuleRequestRouter {
    registry: ModuleRegistry,
}

impl ModuleRequestRouter {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleRef> {
        self.registry.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Resolve the next route of a request.
    ///
    /// The lowest-index module that has not claimed yet and whose predicate
    /// holds wins. Returns `Ok(None)` when there is none.
    pub fn resolve_next_route(
        &self,
        route: &Route,
        cursor: &mut RouteCursor,
    ) -> Result<Option<Resolution>, ModuleError> {
        let claimed = self
            .registry
            .modules
            .iter()
            .enumerate()
            .filter(|(index, _)| !cursor.has_claimed(*index))
            .find(|(_, module)| module.handler().can_handle(route));

        let Some((index, module)) = claimed else {
            return Ok(None);
        };

        cursor.claimed.insert(index);
        let outcome = module.handler().handle(route)?;
        Ok(Some(Resolution {
            module: module.clone(),
            outcome,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::route::HostQuery;

    #[derive(Debug)]
    struct Fixed {
        name: &'static str,
        claims: bool,
        view: Option<&'static str>,
    }

    impl ModuleHandler for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn can_handle(&self, _route: &Route) -> bool {
            self.claims
        }

        fn handle(&self, _route: &Route) -> Result<ModuleOutcome, ModuleError> {
            Ok(ModuleOutcome {
                view: self.view.map(String::from),
                ..ModuleOutcome::default()
            })
        }
    }

    fn fixed(name: &'static str, claims: bool, view: Option<&'static str>) -> Fixed {
        Fixed { name, claims, view }
    }

    fn registration_route() -> Route {
        Route::new(
            HostQuery::main()
                .with_var("page", "registration")
                .with_var("id", "42"),
        )
    }

    #[test]
    fn test_first_claiming_module_wins() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(fixed("A", false, None))
            .register(fixed("B", true, Some("reg_checkout")));
        let router = ModuleRequestRouter::new(registry);

        let mut cursor = RouteCursor::new();
        let resolution = router
            .resolve_next_route(&registration_route(), &mut cursor)
            .unwrap()
            .unwrap();
        assert_eq!(resolution.module.name(), "B");
        assert_eq!(resolution.view_name(), Some("reg_checkout"));

        assert!(router
            .resolve_next_route(&registration_route(), &mut cursor)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_lowest_index_breaks_ties() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(fixed("A", false, None))
            .register(fixed("B", true, Some("b")))
            .register(fixed("C", true, Some("c")));
        let router = ModuleRequestRouter::new(registry);

        for _ in 0..3 {
            let mut cursor = RouteCursor::new();
            let first = router
                .resolve_next_route(&registration_route(), &mut cursor)
                .unwrap()
                .unwrap();
            assert_eq!(first.module.name(), "B");
        }

        let mut cursor = RouteCursor::new();
        let names: Vec<String> = std::iter::from_fn(|| {
            router
                .resolve_next_route(&registration_route(), &mut cursor)
                .unwrap()
                .map(|r| r.module.name().to_string())
        })
        .collect();
        assert_eq!(names, ["B", "C"]);
    }

    /// Claims once `key` is present, then asks for `then` to be set.
    #[derive(Debug)]
    struct Chained {
        name: &'static str,
        key: &'static str,
        then: Option<&'static str>,
    }

    impl ModuleHandler for Chained {
        fn name(&self) -> &str {
            self.name
        }

        fn can_handle(&self, route: &Route) -> bool {
            route.query().contains(self.key)
        }

        fn handle(&self, _route: &Route) -> Result<ModuleOutcome, ModuleError> {
            let outcome = ModuleOutcome::view(self.name);
            Ok(match self.then {
                Some(key) => outcome.with_query_update(key, "1"),
                None => outcome.marking_plugin_page(),
            })
        }
    }

    #[test]
    fn test_earlier_module_claims_on_second_pass() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(Chained {
                name: "checkout",
                key: "step",
                then: None,
            })
            .register(Chained {
                name: "selector",
                key: "page",
                then: Some("step"),
            });
        let router = ModuleRequestRouter::new(registry);
        let mut cursor = RouteCursor::new();

        let mut query = HostQuery::main().with_var("page", "events");
        let first = router
            .resolve_next_route(&Route::new(query.clone()), &mut cursor)
            .unwrap()
            .unwrap();
        assert_eq!(first.module.name(), "selector");
        assert_eq!(first.outcome.query_updates, [("step".to_string(), "1".to_string())]);
        for (key, value) in &first.outcome.query_updates {
            query.set(key.clone(), value.clone());
        }

        let second = router
            .resolve_next_route(&Route::new(query.clone()), &mut cursor)
            .unwrap()
            .unwrap();
        assert_eq!(second.module.name(), "checkout");
        assert_eq!(second.view_name(), Some("checkout"));
        assert!(second.outcome.plugin_page);
        assert_eq!(cursor.claimed_count(), 2);

        assert!(router
            .resolve_next_route(&Route::new(query), &mut cursor)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_empty_registry_has_no_route() {
        let router = ModuleRequestRouter::new(ModuleRegistry::new());
        let mut cursor = RouteCursor::new();
        assert!(router
            .resolve_next_route(&registration_route(), &mut cursor)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_duplicate_names_ignored() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(fixed("A", true, Some("first")))
            .register(fixed("A", true, Some("second")));
        assert_eq!(registry.len(), 1);
    }

    #[derive(Debug)]
    struct Broken;

    impl ModuleHandler for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn can_handle(&self, _route: &Route) -> bool {
            true
        }

        fn handle(&self, _route: &Route) -> Result<ModuleOutcome, ModuleError> {
            Err(ModuleError::new("broken", "boom"))
        }
    }

    #[test]
    fn test_handler_error_propagates() {
        let mut registry = ModuleRegistry::new();
        registry.register(Broken);
        let router = ModuleRequestRouter::new(registry);

        let mut cursor = RouteCursor::new();
        let err = router
            .resolve_next_route(&registration_route(), &mut cursor)
            .unwrap_err();
        assert_eq!(err.module, "broken");
    }
}
