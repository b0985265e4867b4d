//! Plugin widgets placed in host sidebars.

use std::collections::BTreeMap;

/// Sidebar that holds widgets the site owner removed from view.
pub const INACTIVE_SIDEBAR: &str = "wp_inactive_widgets";

/// Read-only view of the host's widget placement.
pub trait WidgetRegistry {
    /// Id bases of the widgets the plugin owns.
    fn plugin_widget_ids(&self) -> &[String];

    /// Whether a widget with this id base is placed in any active sidebar.
    fn is_active_in_any_sidebar(&self, id_base: &str) -> bool;
}

/// Sidebar layout taken from host configuration.
#[derive(Debug, Clone, Default)]
pub struct SidebarWidgets {
    plugin_ids: Vec<String>,
    sidebars: BTreeMap<String, Vec<String>>,
}

impl SidebarWidgets {
    pub fn new(plugin_ids: Vec<String>, sidebars: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            plugin_ids,
            sidebars,
        }
    }

    fn active_sidebars(&self) -> impl Iterator<Item = &Vec<String>> {
        self.sidebars
            .iter()
            .filter(|(name, _)| name.as_str() != INACTIVE_SIDEBAR)
            .map(|(_, widgets)| widgets)
    }
}

impl WidgetRegistry for SidebarWidgets {
    fn plugin_widget_ids(&self) -> &[String] {
        &self.plugin_ids
    }

    // Instance ids carry a numeric suffix (`espresso_upcoming_events-2`),
    // so a substring test is enough.
    fn is_active_in_any_sidebar(&self, id_base: &str) -> bool {
        self.active_sidebars()
            .flatten()
            .any(|instance| instance.contains(id_base))
    }
}
