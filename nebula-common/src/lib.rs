//! # nebula Common
//!
//! Shared utilities for the nebula tools.
//!
//! ## Logging
//!
//! ```rust,ignore
//! use nebula_common::init_logging;
//!
//! // RUST_LOG takes precedence over the level passed here
//! init_logging("info").unwrap();
//! tracing::info!(endpoint = "http://localhost:2633/RPC2", "Connecting");
//! ```

pub mod logging;

pub use logging::{init_logging, init_logging_json, parse_level};
