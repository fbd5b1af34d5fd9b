//! Artifact writing.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::Result;

/// Atomically replace `path` with `contents`.
///
/// The text goes to a temporary file next to the destination which is then renamed
/// over it, so readers see either the old artifact or the complete new one.
pub fn commit(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.persist(path)?;
    debug!(path = %path.display(), bytes = contents.len(), "artifact committed");
    Ok(())
}
