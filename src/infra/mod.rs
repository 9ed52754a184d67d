//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub(crate) mod lock;
pub mod staging;
pub mod telemetry;
