//! File inspection and staging housekeeping.

mod cleanup;
mod info;

pub use cleanup::{cleanup_staging, CleanupReport};
pub use info::{sha256_file, FileInfo, Inspector};
