//! Request parsing and request-scoped state.

pub mod handler;
pub mod state;

pub use handler::{ParsedRequest, QueryRequestHandler, RequestHandler};
pub use state::{RequestState, StateSnapshot};
