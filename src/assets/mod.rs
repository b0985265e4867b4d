//! Asset subsystem.
//!
//! # Data Flow
//! ```text
//! PRE_RENDER:    gate.rs decides (plugin page | shortcode | widget)
//!                    → sets load_css / load_js on the request state
//! ASSET_ENQUEUE: controller reads the flags
//!                    → pipeline.rs registers and enqueues handles
//! HEAD_EMIT:     host prints the manifest
//! ```

pub mod gate;
pub mod pipeline;
pub mod widgets;

pub use gate::{AssetGate, ContentBlock, GateReason, ShortcodeScanner};
pub use pipeline::{Asset, AssetManifest, AssetPipeline};
pub use widgets::{SidebarWidgets, WidgetRegistry};
