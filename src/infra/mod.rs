//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod http;
pub mod memory;
pub mod runtime;
pub mod telemetry;
