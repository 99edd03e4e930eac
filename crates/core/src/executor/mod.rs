//! Execution of one routed conversion.
//!
//! Each run gets a private [`StagingArea`]; the backend writes there, the
//! result is checked for a non-empty file, and only then moved to the
//! target. The source is removed (when not preserved) after the target has
//! been verified, never before.

mod config;
mod convert;
mod place;
mod staging;

pub use config::ExecutorConfig;
pub use convert::ConversionExecutor;
pub use staging::{StagingArea, STAGING_PREFIX};

pub(crate) use place::move_into_place;
