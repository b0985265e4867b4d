//! Read-only access to template files.

use std::fs::File;
use std::path::Path;

/// Existence and readability checks used by the resolver.
pub trait TemplateStorage: Send + Sync + std::fmt::Debug {
    /// True if `path` is a regular file that can be opened for reading.
    fn is_readable(&self, path: &Path) -> bool;
}

/// Probes the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTemplateStorage;

impl TemplateStorage for FsTemplateStorage {
    fn is_readable(&self, path: &Path) -> bool {
        path.is_file() && File::open(path).is_ok()
    }
}
