//! # api-adapters
//!
//! The HTTP surface of the case-tracking service (feature `web-axum`).
//!
//! Every `/api` route sits behind the staff gate in [`middleware`]; the
//! login, health, and metrics routes do not.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
mod routes;
#[cfg(feature = "web-axum")]
mod state;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
#[cfg(feature = "web-axum")]
pub use routes::{router, ApiConfig};
#[cfg(feature = "web-axum")]
pub use state::AppState;
