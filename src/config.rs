//! Localization settings, discovered next to the root document.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::DocumentFormat;

const DEFAULT_CONFIG_FILE: &str = "localize.config.json";

/// Settings controlling how documents are recognised and how files are installed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalizeConfig {
    /// Extensions read and written as JSON scene documents.
    pub json_extensions: Vec<String>,
    /// Extensions read and written as YAML scene documents.
    pub yaml_extensions: Vec<String>,
    /// Extension of package containers (zip archives of documents).
    pub package_extension: String,
    /// Never place or copy URL-like asset paths; processors still see them.
    pub skip_url_paths: bool,
    /// Hard link opaque assets into the destination when possible.
    pub link_assets: bool,
    /// Prefix for directories holding files that cannot keep their relative location.
    pub remap_dir_prefix: String,
}

impl Default for LocalizeConfig {
    fn default() -> Self {
        Self {
            json_extensions: vec!["json".into(), "sdj".into()],
            yaml_extensions: vec!["yaml".into(), "yml".into()],
            package_extension: "pkgz".into(),
            skip_url_paths: true,
            link_assets: false,
            remap_dir_prefix: String::new(),
        }
    }
}

impl LocalizeConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// Missing or malformed files fall back to the defaults.
    pub fn discover(dir: &Path) -> Self {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        Self::from_path(&candidate).unwrap_or_default()
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("ignoring {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Encoding used for files with the given extension.
    pub fn document_format(&self, extension: &str) -> Option<DocumentFormat> {
        let matches = |list: &[String]| list.iter().any(|ext| ext.eq_ignore_ascii_case(extension));
        if matches(&self.json_extensions) {
            Some(DocumentFormat::Json)
        } else if matches(&self.yaml_extensions) {
            Some(DocumentFormat::Yaml)
        } else {
            None
        }
    }

    /// Returns `true` when the extension denotes a package container.
    pub fn is_package_extension(&self, extension: &str) -> bool {
        self.package_extension.eq_ignore_ascii_case(extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn maps_extensions_to_formats() {
        let config = LocalizeConfig::default();
        assert_eq!(config.document_format("JSON"), Some(DocumentFormat::Json));
        assert_eq!(config.document_format("yml"), Some(DocumentFormat::Yaml));
        assert_eq!(config.document_format("png"), None);
        assert!(config.is_package_extension("PKGZ"));
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = LocalizeConfig::discover(dir.path());
        assert_eq!(config.package_extension, "pkgz");
        assert!(config.skip_url_paths);
    }

    #[test]
    fn discover_merges_partial_files_with_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{"package_extension": "scnz", "link_assets": true}"#,
        )
        .unwrap();

        let config = LocalizeConfig::discover(dir.path());
        assert_eq!(config.package_extension, "scnz");
        assert!(config.link_assets);
        assert_eq!(config.document_format("json"), Some(DocumentFormat::Json));
    }

    #[test]
    fn malformed_files_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(LocalizeConfig::from_path(&path).is_none());
    }
}
