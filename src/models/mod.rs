//! Data models module
//!
//! Request/response envelopes exchanged with the hosting layer

pub mod envelope;

pub use envelope::{ApiResponse, InvocationRequest, RESPONSE_HEADERS};
