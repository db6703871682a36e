//! Path utility functions

/// Archive extensions recognised for firmware bundles, longest first
pub const ARCHIVE_EXTENSIONS: &[&str] = &[
    ".tar.gz", ".tar.xz", ".tar.bz2", ".tar.zst", ".tgz", ".zip",
];

/// Return the archive extension of `filename` (lowercase), if it has one
pub fn archive_ext(filename: &str) -> Option<&'static str> {
    let lower = filename.to_lowercase();
    ARCHIVE_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| lower.ends_with(ext))
}

/// Strip the archive extension from a filename
///
/// # Arguments
/// * `filename` - The filename to strip the extension from
///
/// # Returns
/// The filename without the archive extension, or the original if no match
pub fn strip_archive_ext(filename: &str) -> &str {
    match archive_ext(filename) {
        Some(ext) => &filename[..filename.len() - ext.len()],
        None => filename,
    }
}

/// Reduce an arbitrary string to something safe to use as one path component
pub fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "_".to_string(),
        s => s.to_string(),
    }
}
