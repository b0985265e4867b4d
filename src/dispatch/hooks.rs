//! Named extension points attached to lifecycle phases.
//!
//! Other plugin components register callbacks before or after any phase.
//! Callbacks at one point run by ascending priority, then registration order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::phase::Phase;
use crate::notices::ErrorNotices;
use crate::request::RequestState;

/// When a callback runs relative to its phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timing {
    Before,
    After,
}

/// An orderable hook identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookPoint {
    pub phase: Phase,
    pub timing: Timing,
}

impl HookPoint {
    pub fn before(phase: Phase) -> Self {
        Self {
            phase,
            timing: Timing::Before,
        }
    }

    pub fn after(phase: Phase) -> Self {
        Self {
            phase,
            timing: Timing::After,
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timing {
            Timing::Before => write!(f, "{}:before", self.phase),
            Timing::After => write!(f, "{}:after", self.phase),
        }
    }
}

/// What a callback may see and do.
pub struct HookContext<'a> {
    pub point: HookPoint,
    pub request_id: &'a str,
    pub state: &'a RequestState,
    pub notices: &'a mut ErrorNotices,
}

pub type HookCallback = Arc<dyn Fn(&mut HookContext<'_>) + Send + Sync>;

struct HookEntry {
    name: String,
    priority: i32,
    callback: HookCallback,
}

/// Ordered callbacks per hook point, frozen once the controller is built.
#[derive(Default)]
pub struct HookTable {
    entries: BTreeMap<HookPoint, Vec<HookEntry>>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `callback` at `point`. Lower priority runs first.
    pub fn add<F>(&mut self, point: HookPoint, name: impl Into<String>, priority: i32, callback: F)
    where
        F: Fn(&mut HookContext<'_>) + Send + Sync + 'static,
    {
        let list = self.entries.entry(point).or_default();
        let at = list.partition_point(|e| e.priority <= priority);
        list.insert(
            at,
            HookEntry {
                name: name.into(),
                priority,
                callback: Arc::new(callback),
            },
        );
    }

    pub fn names(&self, point: HookPoint) -> Vec<&str> {
        self.entries
            .get(&point)
            .map(|list| list.iter().map(|e| e.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn run(&self, ctx: &mut HookContext<'_>) {
        let Some(list) = self.entries.get(&ctx.point) else {
            return;
        };
        for entry in list {
            tracing::trace!(hook = %entry.name, point = %ctx.point, "Running hook");
            (entry.callback)(ctx);
        }
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (point, list) in &self.entries {
            map.entry(
                &point.to_string(),
                &list.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            );
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_priority_then_registration_order() {
        let mut table = HookTable::new();
        let point = HookPoint::after(Phase::RequestParse);
        table.add(point, "late", 20, |_| {});
        table.add(point, "first", 5, |_| {});
        table.add(point, "second", 5, |_| {});
        table.add(point, "default", 10, |_| {});
        assert_eq!(table.names(point), ["first", "second", "default", "late"]);
        assert!(table.names(HookPoint::before(Phase::RequestParse)).is_empty());
    }

    #[test]
    fn test_run_invokes_callbacks() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut table = HookTable::new();
        let point = HookPoint::before(Phase::ErrorDisplay);
        for name in ["a", "b"] {
            let calls = calls.clone();
            table.add(point, name, 10, move |ctx| {
                calls.lock().unwrap().push(name);
                ctx.notices.add_success(name, "test");
            });
        }

        let state = RequestState::new();
        let mut notices = ErrorNotices::new();
        let mut ctx = HookContext {
            point,
            request_id: "req-1",
            state: &state,
            notices: &mut notices,
        };
        table.run(&mut ctx);

        assert_eq!(*calls.lock().unwrap(), ["a", "b"]);
        assert_eq!(notices.len(), 2);
    }
}
