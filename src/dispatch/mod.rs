//! Lifecycle dispatch: binds routing, templates and assets into host phases.
//!
//! # Data Flow
//! ```text
//! host fires phase
//!     → RequestLifecycle method (controller.rs)
//!         → PhaseTracker::enter (phase.rs), skip if repeated or backwards
//!         → before hooks (hooks.rs)
//!         → router / gate / resolver / pipeline
//!         → after hooks
//! ```

pub mod controller;
pub mod filters;
pub mod hooks;
pub mod phase;

pub use controller::{
    FrontController, FrontControllerBuilder, LoopContext, RequestLifecycle, RequestSummary,
};
pub use hooks::{HookContext, HookPoint, HookTable, Timing};
pub use phase::{Phase, PhaseSkip, PhaseTracker};
