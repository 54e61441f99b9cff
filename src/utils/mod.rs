//! Utilities module
//!
//! Contains error handling and log redaction helpers

pub mod error;
pub mod logging;
