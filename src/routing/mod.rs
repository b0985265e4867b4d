//! Module routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed request (normalized HostQuery)
//!     → route.rs (fresh Route per pass)
//!     → router.rs (first claiming module after the cursor)
//!     → matcher.rs (evaluate declarative claim conditions)
//!     → Return: Resolution (module + outcome) or no more routes
//!
//! Registry Compilation (at startup):
//!     ModuleConfig[]
//!     → configured.rs (compile matchers)
//!     → register in declaration order
//!     → Freeze inside ModuleRequestRouter
//! ```
//!
//! # Design Decisions
//! - Modules registered at startup, immutable at runtime
//! - Deterministic: same route and registry always give the same module
//! - First match wins (registration order)

pub mod configured;
pub mod matcher;
pub mod module;
pub mod route;
pub mod router;

pub use configured::{registry_from_config, ConfiguredModule};
pub use module::{ModuleError, ModuleHandler, ModuleOutcome, ModuleRef};
pub use route::{HostQuery, Route};
pub use router::{ModuleRegistry, ModuleRequestRouter, Resolution, RouteCursor};
