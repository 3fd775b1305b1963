//! # REST API Components
//!
//! Axum router, handlers and error mapping for the account API.

pub mod docs;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, ErrorBody};
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
