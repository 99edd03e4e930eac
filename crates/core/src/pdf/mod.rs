//! PDF merge and split.
//!
//! Page ranges are parsed and checked against the document before any file
//! is produced. Parts are assembled in a staging directory and moved to
//! their destination only once every part has the expected page count.

mod error;
mod ops;
mod ranges;
mod tool;

pub use error::PdfError;
pub use ops::{MergeResult, PdfOperations, SplitResult};
pub use ranges::{parse_page_ranges, PageRange, PageRangeError};
pub use tool::{PdfTool, QpdfTool};
