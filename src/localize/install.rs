//! Installing files into the destination tree.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use same_file::is_same_file;

/// Place `source` at `destination`, hard linking when `link` is set and copying otherwise.
///
/// Links that cannot be created (for example across devices) fall back to a copy.
pub fn install_file(source: &Path, destination: &Path, link: bool) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    if destination.exists() {
        if is_same_file(source, destination)? {
            return Ok(());
        }
        fs::remove_file(destination)?;
    }

    if !link {
        return fs::copy(source, destination).map(|_| ());
    }

    match fs::hard_link(source, destination) {
        Ok(_) => Ok(()),
        Err(err) => {
            if err.kind() == ErrorKind::AlreadyExists {
                Ok(())
            } else {
                fs::copy(source, destination).map(|_| ())
            }
        }
    }
}
