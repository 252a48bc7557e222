//! Cross-cutting middleware
//!
//! Applied outermost to innermost: logging → CORS → correlation → router.
//! CORS sits outside correlation on purpose: a preflight never reaches a
//! backend, so its response carries no correlation id.

mod correlation;
mod cors;
mod logging;

pub use correlation::correlation_middleware;
pub use cors::cors_layer;
pub use logging::http_logging_middleware;
