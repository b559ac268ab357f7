//! Utility functions for naming, string manipulation, and file system
//! checks.

use chrono::Utc;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// One UTC timestamp captured at startup and shared by every artifact of
/// the run, `%Y%m%d%H%M%S`.
pub fn session_timestamp() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// Uppercase a category label and replace spaces with underscores, for use
/// as a filename prefix.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(category_prefix("World News"), "WORLD_NEWS");
/// assert_eq!(category_prefix(""), "ALL");
/// ```
pub fn category_prefix(category: &str) -> String {
    if category.trim().is_empty() {
        return "ALL".to_string();
    }
    category.trim().to_uppercase().replace(' ', "_")
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes with an ellipsis and
/// byte count indicator appended. The cut always lands on a char boundary,
/// so multi-byte text never panics.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then performs a write test by creating
/// and immediately deleting a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Small sync write, simpler error surface
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
