//! Helpers for turning user-supplied names into file system paths.

/// Characters that are never valid in a file name on any supported platform.
fn is_invalid_file_char(c: char) -> bool {
    matches!(c, '/' | '\\' | ':') || is_invalid_path_char(c)
}

/// Characters that are never valid anywhere in a path.
fn is_invalid_path_char(c: char) -> bool {
    c == '\0' || c.is_control() || matches!(c, '*' | '?' | '"' | '<' | '>' | '|')
}

/// Reduce `name` to a bare file stem.
///
/// Everything from the first `.` onwards is dropped (the exporter adds its
/// own extensions), then characters that cannot appear in a file name are
/// removed.
pub fn sanitize_file_name(name: &str) -> String {
    let stem = name.split('.').next().unwrap_or_default();
    stem.chars().filter(|&c| !is_invalid_file_char(c)).collect()
}

/// Remove characters that cannot appear in a path, keeping separators.
pub fn sanitize_folder_path(path: &str) -> String {
    path.chars().filter(|&c| !is_invalid_path_char(c)).collect()
}
