//! Template resolution with theme and upload overrides.
//!
//! # Search Order
//! ```text
//! explicit paths → theme override → upload override → plugin bundled
//!     → first readable candidate wins
//!     → none readable: host default template
//! ```
//!
//! # Design Decisions
//! - Only the file name of a view is used; directory components are dropped
//!   so a candidate can never leave its search root
//! - `.`/`..` and names with NUL bytes are rejected outright
//! - Read-only probing, so resolution is repeatable

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::TemplateConfig;
use crate::templates::storage::{FsTemplateStorage, TemplateStorage};

/// Configured search roots, in fallback order.
#[derive(Debug, Clone, Default)]
pub struct TemplateRoots {
    pub theme_dir: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
    pub plugin_dir: PathBuf,
}

impl TemplateRoots {
    pub fn from_config(config: &TemplateConfig) -> Self {
        Self {
            theme_dir: config.theme_dir.clone(),
            upload_dir: config.upload_dir.clone(),
            plugin_dir: config.plugin_dir.clone(),
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Path> {
        self.theme_dir
            .as_deref()
            .into_iter()
            .chain(self.upload_dir.as_deref())
            .chain(std::iter::once(self.plugin_dir.as_path()))
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSelection {
    pub requested_name: String,
    pub resolved_path: PathBuf,
    /// False when the host default was returned.
    pub found: bool,
}

/// Maps view names to template files.
#[derive(Debug)]
pub struct TemplateResolver<S = FsTemplateStorage> {
    roots: TemplateRoots,
    storage: S,
}

impl TemplateResolver<FsTemplateStorage> {
    pub fn new(roots: TemplateRoots) -> Self {
        Self::with_storage(roots, FsTemplateStorage)
    }
}

impl<S: TemplateStorage> TemplateResolver<S> {
    pub fn with_storage(roots: TemplateRoots, storage: S) -> Self {
        Self { roots, storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Resolve `view_name`, falling back to `host_default`.
    pub fn resolve(
        &self,
        view_name: &str,
        explicit: &[PathBuf],
        host_default: &Path,
    ) -> TemplateSelection {
        let fallback = || TemplateSelection {
            requested_name: view_name.to_string(),
            resolved_path: host_default.to_path_buf(),
            found: false,
        };

        let Some(file_name) = template_file_name(view_name) else {
            if !view_name.is_empty() {
                tracing::debug!(view = %view_name, "Rejected template name");
            }
            return fallback();
        };

        let candidate = explicit
            .iter()
            .map(PathBuf::as_path)
            .chain(self.roots.iter())
            .map(|root| root.join(file_name))
            .find(|path| self.storage.is_readable(path));

        match candidate {
            Some(resolved_path) => TemplateSelection {
                requested_name: view_name.to_string(),
                resolved_path,
                found: true,
            },
            None => {
                tracing::debug!(view = %view_name, "No template override found, using host default");
                fallback()
            }
        }
    }
}

/// Last path component of a view name, if it is a usable file name.
fn template_file_name(view_name: &str) -> Option<&str> {
    let name = view_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match name {
        "" | "." | ".." => None,
        n if n.contains('\0') => None,
        n => Some(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[derive(Debug, Default)]
    struct MemoryStorage(BTreeSet<PathBuf>);

    impl MemoryStorage {
        fn with(paths: &[&str]) -> Self {
            Self(paths.iter().map(PathBuf::from).collect())
        }
    }

    impl TemplateStorage for MemoryStorage {
        fn is_readable(&self, path: &Path) -> bool {
            self.0.contains(path)
        }
    }

    fn roots() -> TemplateRoots {
        TemplateRoots {
            theme_dir: Some("/theme".into()),
            upload_dir: Some("/uploads".into()),
            plugin_dir: "/plugin".into(),
        }
    }

    const HOST_DEFAULT: &str = "/host/index.html";

    #[test]
    fn test_fallback_order() {
        let storage = MemoryStorage::with(&["/uploads/checkout.html", "/plugin/checkout.html"]);
        let resolver = TemplateResolver::with_storage(roots(), storage);

        let selection = resolver.resolve("checkout.html", &[], Path::new(HOST_DEFAULT));
        assert_eq!(selection.resolved_path, PathBuf::from("/uploads/checkout.html"));
        assert!(selection.found);

        let selection = resolver.resolve("checkout.html", &["/explicit".into()], Path::new(HOST_DEFAULT));
        assert_eq!(selection.resolved_path, PathBuf::from("/uploads/checkout.html"));

        let storage = MemoryStorage::with(&["/explicit/checkout.html", "/theme/checkout.html"]);
        let resolver = TemplateResolver::with_storage(roots(), storage);
        let selection = resolver.resolve("checkout.html", &["/explicit".into()], Path::new(HOST_DEFAULT));
        assert_eq!(selection.resolved_path, PathBuf::from("/explicit/checkout.html"));
    }

    #[test]
    fn test_empty_and_missing_fall_back() {
        let resolver = TemplateResolver::with_storage(roots(), MemoryStorage::default());

        let selection = resolver.resolve("", &[], Path::new(HOST_DEFAULT));
        assert_eq!(selection.resolved_path, PathBuf::from(HOST_DEFAULT));
        assert!(!selection.found);

        let selection = resolver.resolve("missing.html", &[], Path::new(HOST_DEFAULT));
        assert_eq!(selection.resolved_path, PathBuf::from(HOST_DEFAULT));
    }

    #[test]
    fn test_traversal_stays_inside_roots() {
        let storage = MemoryStorage::with(&["/secret", "/plugin/secret"]);
        let resolver = TemplateResolver::with_storage(roots(), storage);

        let selection = resolver.resolve("../../secret", &[], Path::new(HOST_DEFAULT));
        assert_eq!(selection.resolved_path, PathBuf::from("/plugin/secret"));

        for name in ["..", "../..", "/", "a/..", "..\\..\\"] {
            let selection = resolver.resolve(name, &[], Path::new(HOST_DEFAULT));
            assert_eq!(selection.resolved_path, PathBuf::from(HOST_DEFAULT), "{name}");
        }
    }

    #[test]
    fn test_resolved_paths_within_roots() {
        let storage = MemoryStorage::with(&["/theme/x.html", "/plugin/y.html"]);
        let resolver = TemplateResolver::with_storage(roots(), storage);
        let allowed = ["/theme", "/uploads", "/plugin"];

        for view in ["../x.html", "/etc/../y.html", "theme/../../x.html", "..\\y.html", "z/../../"] {
            let path = resolver.resolve(view, &[], Path::new(HOST_DEFAULT)).resolved_path;
            let inside = allowed.iter().any(|root| path.parent() == Some(Path::new(root)));
            assert!(inside || path == Path::new(HOST_DEFAULT), "{view} -> {path:?}");
        }
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let storage = MemoryStorage::with(&["/theme/checkout.html"]);
        let resolver = TemplateResolver::with_storage(roots(), storage);

        let first = resolver.resolve("checkout.html", &[], Path::new(HOST_DEFAULT));
        let second = resolver.resolve("checkout.html", &[], Path::new(HOST_DEFAULT));
        assert_eq!(first, second);
    }
}
