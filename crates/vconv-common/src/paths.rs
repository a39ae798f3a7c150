//! Path utilities for the file selection boundary.
//!
//! The client that picks a source file only offers media with one of the
//! accepted extensions. The job controller itself does not re-check them.

use std::path::Path;

/// Media file extensions accepted for conversion.
const ACCEPTED_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "webm"];

/// Check if a path has an accepted media extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vconv_common::paths::is_accepted_media_file;
///
/// assert!(is_accepted_media_file(Path::new("movie.mkv")));
/// assert!(is_accepted_media_file(Path::new("/videos/clip.WEBM")));
/// assert!(!is_accepted_media_file(Path::new("movie.mov")));
/// ```
pub fn is_accepted_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Get the list of accepted media extensions.
#[must_use]
pub fn accepted_extensions() -> &'static [&'static str] {
    ACCEPTED_EXTENSIONS
}
