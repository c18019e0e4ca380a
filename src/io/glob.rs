//! Input file discovery.

use crate::error::{LoadError, Result};
use crate::sink::Sink;
use glob::{MatchOptions, glob_with};
use std::error::Error;
use std::path::PathBuf;

/// Expand a glob pattern into a sorted vector of matching regular files.
///
/// Wildcards never match a leading dot, so files already renamed with the
/// completion marker are not picked up again. Directories are skipped, and
/// so are entries that cannot be read; those are reported to `sink`.
///
/// # Errors
///
/// Returns [`LoadError::Pattern`] if the pattern is invalid. No matches is an
/// empty vector, not an error.
pub fn expand_glob(pattern: &str, sink: &dyn Sink) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: true,
    };
    let paths = glob_with(pattern, options).map_err(|source| LoadError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut result = keep_files(paths, sink);
    // Deterministic order
    result.sort();
    Ok(result)
}

fn keep_files<I, E>(entries: I, sink: &dyn Sink) -> Vec<PathBuf>
where
    I: IntoIterator<Item = std::result::Result<PathBuf, E>>,
    E: Error + 'static,
{
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => path.is_file().then_some(path),
            Err(e) => {
                sink.exception("Skipping unreadable glob entry", &e);
                None
            }
        })
        .collect()
}
