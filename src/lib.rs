//! Event-registration front controller and the embedded host that drives it.

pub mod admin;
pub mod assets;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod notices;
pub mod observability;
pub mod request;
pub mod routing;
pub mod templates;

pub use config::schema::FrontConfig;
pub use dispatch::{FrontController, RequestLifecycle};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
