//! Filesystem utilities

use std::fs;
use std::path::Path;

use log::info;

/// Create the parent directory of a file path if it doesn't exist yet
pub fn ensure_parent_dir(file_path: &str) -> std::io::Result<()> {
    match Path::new(file_path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent)?;
            info!("Created directory: {}", parent.display());
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Check if a path exists
pub fn path_exists(path: &str) -> bool {
    Path::new(path).exists()
}
