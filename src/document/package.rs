//! Read access to package containers: zip archives whose first entry is the root document.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::error::DocumentError;

fn open_archive(path: &Path) -> Result<ZipArchive<File>, DocumentError> {
    let file = File::open(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ZipArchive::new(file).map_err(|source| DocumentError::Package {
        location: path.display().to_string(),
        source,
    })
}

fn read_entry_text(entry: &mut impl Read, path: &Path) -> Result<String, DocumentError> {
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(text)
}

/// Name and contents of the package's root document.
pub fn read_package_root(path: &Path) -> Result<(String, String), DocumentError> {
    let mut archive = open_archive(path)?;
    if archive.is_empty() {
        return Err(DocumentError::EmptyPackage(path.display().to_string()));
    }
    let mut entry = archive
        .by_index(0)
        .map_err(|source| DocumentError::Package {
            location: path.display().to_string(),
            source,
        })?;
    let name = entry.name().to_string();
    let text = read_entry_text(&mut entry, path)?;
    Ok((name, text))
}

/// Contents of the entry `inner` inside the package at `path`.
pub fn read_package_entry(path: &Path, inner: &str) -> Result<String, DocumentError> {
    let mut archive = open_archive(path)?;
    let mut entry = archive
        .by_name(inner)
        .map_err(|source| DocumentError::Package {
            location: format!("{}[{}]", path.display(), inner),
            source,
        })?;
    read_entry_text(&mut entry, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_package(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn first_entry_is_the_root() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("set.pkgz");
        write_package(&path, &[("root.json", "{}"), ("props/lamp.json", "[]")]);

        let (name, text) = read_package_root(&path).unwrap();
        assert_eq!(name, "root.json");
        assert_eq!(text, "{}");
        assert_eq!(read_package_entry(&path, "props/lamp.json").unwrap(), "[]");
    }

    #[test]
    fn missing_entries_are_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("set.pkgz");
        write_package(&path, &[("root.json", "{}")]);

        let err = read_package_entry(&path, "absent.json").unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn empty_packages_have_no_root() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.pkgz");
        write_package(&path, &[]);

        assert!(matches!(
            read_package_root(&path),
            Err(DocumentError::EmptyPackage(_))
        ));
    }
}
