//! Template resolution subsystem.

pub mod resolver;
pub mod storage;

pub use resolver::{TemplateResolver, TemplateRoots, TemplateSelection};
pub use storage::{FsTemplateStorage, TemplateStorage};
