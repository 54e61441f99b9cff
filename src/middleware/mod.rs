//! Middleware module
//!
//! Request logging and response envelope normalisation shared by every route

pub mod envelope;
pub mod logging;

pub use envelope::json_envelope_middleware;
pub use logging::request_logging_middleware;
