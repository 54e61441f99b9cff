//! Service layer module
//!
//! Contains the upstream client, payload builders, and request dispatcher

pub mod client;
pub mod payload;
pub mod router;

pub use client::{CallOptions, UpstreamClient, UpstreamResponse, TRANSPORT_FAILURE_STATUS};
pub use payload::{Payload, PayloadBuilder};
pub use router::Dispatcher;
