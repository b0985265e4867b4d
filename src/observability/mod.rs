//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Controller phases and the host produce:
//!     → logging.rs (structured log events, request_id on every line)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
