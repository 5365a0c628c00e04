//! Opening, inspecting and exporting scene documents on the local file system.

use std::fs;
use std::path::Path;

use crate::config::LocalizeConfig;
use crate::document::codec::DocumentFormat;
use crate::document::model::SceneDocument;
use crate::document::package::{read_package_entry, read_package_root};
use crate::error::DocumentError;
use crate::models::{Location, ReferenceSite, SiteRewrites};

/// Storage capability consumed by the localizer.
pub trait DocumentStore {
    /// Handle to an opened document.
    type Document;

    /// Open the document at `location`.
    fn open(&self, location: &Location) -> Result<Self::Document, DocumentError>;

    /// Outgoing asset-path references of `document`, in authored order.
    fn references(&self, document: &Self::Document) -> Vec<ReferenceSite>;

    /// Returns `true` when `location` names a file this store can open as a document.
    fn is_document(&self, location: &Location) -> bool;

    /// Returns `true` when `location` is a package container.
    fn is_package_container(&self, location: &Location) -> bool;

    /// Write `document` to `destination` with `rewrites` applied.
    fn export(
        &self,
        document: &Self::Document,
        destination: &Path,
        rewrites: &SiteRewrites,
    ) -> Result<(), DocumentError>;
}

/// A scene document opened from disk.
#[derive(Debug, Clone)]
pub struct Document {
    location: Location,
    format: DocumentFormat,
    scene: SceneDocument,
}

impl Document {
    /// Where the document was read from.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Encoding the document was read with.
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Parsed document contents.
    pub fn scene(&self) -> &SceneDocument {
        &self.scene
    }
}

/// [`DocumentStore`] reading JSON and YAML documents and zip package containers.
#[derive(Debug, Clone, Default)]
pub struct FsDocumentStore {
    config: LocalizeConfig,
}

impl FsDocumentStore {
    /// Create a store recognising the extensions listed in `config`.
    pub fn new(config: LocalizeConfig) -> Self {
        Self { config }
    }

    fn format_of(&self, name: &Location) -> Option<DocumentFormat> {
        name.extension()
            .and_then(|ext| self.config.document_format(&ext))
    }

    fn require_format(&self, location: &Location) -> Result<DocumentFormat, DocumentError> {
        self.format_of(location)
            .ok_or_else(|| DocumentError::UnsupportedFormat(location.to_string()))
    }
}

impl DocumentStore for FsDocumentStore {
    type Document = Document;

    fn open(&self, location: &Location) -> Result<Document, DocumentError> {
        let (format, text) = match location.inner() {
            Some(inner) => {
                let format = self.require_format(location)?;
                (format, read_package_entry(location.path(), inner)?)
            }
            None if self.is_package_container(location) => {
                let (root, text) = read_package_root(location.path())?;
                let root = Location::packaged(location.path(), root);
                (self.require_format(&root)?, text)
            }
            None => {
                let format = self.require_format(location)?;
                let text = fs::read_to_string(location.path()).map_err(|source| {
                    DocumentError::Io {
                        path: location.path().to_path_buf(),
                        source,
                    }
                })?;
                (format, text)
            }
        };

        let scene = format.decode(&text, &location.to_string())?;
        Ok(Document {
            location: location.clone(),
            format,
            scene,
        })
    }

    fn references(&self, document: &Document) -> Vec<ReferenceSite> {
        document.scene.reference_sites()
    }

    fn is_document(&self, location: &Location) -> bool {
        self.format_of(location).is_some() || self.is_package_container(location)
    }

    fn is_package_container(&self, location: &Location) -> bool {
        !location.is_package_relative()
            && location
                .extension()
                .is_some_and(|ext| self.config.is_package_extension(&ext))
    }

    fn export(
        &self,
        document: &Document,
        destination: &Path,
        rewrites: &SiteRewrites,
    ) -> Result<(), DocumentError> {
        let format = self
            .format_of(&Location::file(destination))
            .unwrap_or(document.format);
        let scene = document.scene.rewrite(rewrites);
        let text = format.encode(&scene, &destination.display().to_string())?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source| DocumentError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(destination, text).map_err(|source| DocumentError::Io {
            path: destination.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SiteLocator;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn opens_json_and_yaml_documents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"sublayers": ["b.yaml"]}"#).unwrap();
        fs::write(dir.path().join("b.yaml"), "sublayers: [c.json]\n").unwrap();
        let store = FsDocumentStore::default();

        let a = store.open(&Location::file(dir.path().join("a.json"))).unwrap();
        let b = store.open(&Location::file(dir.path().join("b.yaml"))).unwrap();
        assert_eq!(a.format(), DocumentFormat::Json);
        assert_eq!(b.format(), DocumentFormat::Yaml);
        assert_eq!(store.references(&b)[0].asset_path, "c.json");
    }

    #[test]
    fn rejects_unknown_extensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("texture.png");
        fs::write(&path, b"png").unwrap();
        let store = FsDocumentStore::default();

        let location = Location::file(&path);
        assert!(!store.is_document(&location));
        assert!(matches!(
            store.open(&location),
            Err(DocumentError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn opens_package_roots_and_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("set.pkgz");
        let mut writer = zip::ZipWriter::new(fs::File::create(&path).unwrap());
        writer
            .start_file("root.json", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(br#"{"sublayers": ["lamp.yaml"]}"#).unwrap();
        writer
            .start_file("lamp.yaml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"metadata: {icon: lamp.png}\n").unwrap();
        writer.finish().unwrap();

        let store = FsDocumentStore::default();
        let package = Location::file(&path);
        assert!(store.is_package_container(&package));
        let root = store.open(&package).unwrap();
        assert_eq!(store.references(&root)[0].asset_path, "lamp.yaml");

        let lamp = store.open(&Location::packaged(&path, "lamp.yaml")).unwrap();
        assert_eq!(lamp.format(), DocumentFormat::Yaml);
        assert!(!store.is_package_container(lamp.location()));
    }

    #[test]
    fn export_converts_by_destination_extension() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"sublayers": ["b.json", "c.json"]}"#,
        )
        .unwrap();
        let store = FsDocumentStore::default();
        let document = store.open(&Location::file(dir.path().join("a.json"))).unwrap();

        let mut rewrites = SiteRewrites::new();
        rewrites.insert(SiteLocator::Sublayer(0), None);
        let destination = dir.path().join("out/nested/a.yaml");
        store.export(&document, &destination, &rewrites).unwrap();

        let text = fs::read_to_string(&destination).unwrap();
        let exported = DocumentFormat::Yaml.decode(&text, "a.yaml").unwrap();
        assert_eq!(exported.sublayers, vec!["c.json".to_string()]);
    }
}
