//! Format capability model.
//!
//! The registry is a fixed table of [`FormatDescriptor`]s (one category per
//! extension) and [`CapabilityEntry`]s (which backend handles a category
//! pair). It is built once at process start and shared read-only.
//!
//! # Example
//!
//! ```ignore
//! use swissknife_core::format::{Category, FormatRegistry};
//!
//! let registry = FormatRegistry::global();
//! assert_eq!(registry.resolve_category("JPEG")?, Category::Image);
//! let backend = registry.find_backend("docx", "pdf")?;
//! println!("docx -> pdf handled by {}", backend);
//! ```

mod error;
mod registry;
mod table;
mod types;

pub use error::RoutingError;
pub use registry::FormatRegistry;
pub use types::{
    extension_of, normalize_extension, BackendId, CapabilityEntry, Category, FormatDescriptor,
    TargetFilter,
};
