//! Conversion routing.
//!
//! Turns a [`ConversionRequest`] into a [`RoutingDecision`] by normalizing
//! both extensions and consulting the [`FormatRegistry`](crate::format::FormatRegistry).
//! Routing never touches the filesystem, so it can be used speculatively to
//! answer "can this be converted?".

mod resolve;
mod types;

pub use resolve::ConversionRouter;
pub use types::{ConversionRequest, RoutingDecision};
