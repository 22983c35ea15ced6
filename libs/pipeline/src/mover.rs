//! Best effort relocation of produced artifacts.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;

/// Move every `(source, destination directory)` pair: copy with
/// overwrite, then delete the source. Destinations that aren't
/// directories are skipped silently, and a failed relocation is logged
/// without aborting the remaining ones - unlike the rest of the
/// pipeline, relocation is not fail fast.
pub fn move_artifacts(moves: &[(PathBuf, PathBuf)]) {
    for (source, destination) in moves {
        if !destination.is_dir() {
            continue
        }
        if let Err(e) = move_artifact(source, destination) {
            warn!("Could not move {} to {}: {}", source.display(), destination.display(), e);
        }
    }
}

fn move_artifact(source: &Path, destination: &Path) -> io::Result<()> {
    let file_name = source.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "source has no file name")
    })?;
    fs::copy(source, destination.join(file_name))?;
    match fs::remove_file(source) {
        // Already gone is fine
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
