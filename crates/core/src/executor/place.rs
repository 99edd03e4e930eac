//! Moving finished files into their final location.

use std::path::Path;
use tokio::fs;

/// Attempts an atomic rename. Returns `Ok(false)` when source and
/// destination are on different filesystems.
async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(true),
        Err(e) => {
            // EXDEV is 18 on Linux
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                Ok(false)
            } else {
                Err(e)
            }
        }
    }
}

/// Moves `source` to `destination`, copying across filesystems.
///
/// On a failed copy the partial destination is removed.
pub(crate) async fn move_into_place(source: &Path, destination: &Path) -> Result<u64, std::io::Error> {
    if try_atomic_move(source, destination).await? {
        return Ok(fs::metadata(destination).await?.len());
    }

    match fs::copy(source, destination).await {
        Ok(bytes) => {
            fs::remove_file(source).await?;
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(destination).await;
            Err(e)
        }
    }
}
