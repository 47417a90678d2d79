use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

/// Copy the contents of `src` into `dest`, recreating the directory tree.
///
/// Existing files in `dest` are overwritten. Returns the number of files copied.
pub fn copy_dir(src: &Path, dest: &Path) -> io::Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            debug!(from = %entry.path().display(), to = %target.display(), "copied file");
            copied += 1;
        }
    }

    Ok(copied)
}
