//! HTTP protocol handling: the embedded host.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, https detection)
//!     → host.rs (path + params → HostQuery, posts, sidebars)
//!     → FrontController phases
//!     → server.rs (template read, layout, headers)
//!     → Send to client
//! ```

pub mod host;
pub mod request;
pub mod server;

pub use host::EmbeddedHost;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError, TEST_COOKIE, X_ESPRESSO_TEMPLATE};
