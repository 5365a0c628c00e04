//! Error types raised while reading documents and localizing assets.

use std::path::PathBuf;

use crate::models::Location;

/// Result type used by the localization engine.
pub type LocalizeResult<T> = Result<T, LocalizeError>;

/// Failures reading, decoding or writing a scene document.
#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    /// Reading or writing a file failed.
    #[error("failed to access {}", .path.display())]
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON content could not be decoded or encoded.
    #[error("invalid JSON document {location}")]
    Json {
        /// Document that caused the error.
        location: String,
        /// Source parse error.
        #[source]
        source: serde_json::Error,
    },

    /// YAML content could not be decoded or encoded.
    #[error("invalid YAML document {location}")]
    Yaml {
        /// Document that caused the error.
        location: String,
        /// Source parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The package archive could not be read.
    #[error("failed to read package {location}")]
    Package {
        /// Package that caused the error.
        location: String,
        /// Source archive error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The package archive has no entries.
    #[error("package {0} holds no documents")]
    EmptyPackage(String),

    /// The file extension maps to no known encoding.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// Failures that abort a localization run.
#[derive(thiserror::Error, Debug)]
pub enum LocalizeError {
    /// A referenced document could not be opened.
    #[error("failed to open {location}")]
    Open {
        /// Document that failed to open.
        location: Location,
        /// Underlying document error.
        #[source]
        source: DocumentError,
    },

    /// A processor tried to change a path fixed by a package container.
    #[error(
        "cannot change asset path '{original}' to {} in {owner}: paths governed by a package are immutable",
        .proposed.as_deref().map_or_else(|| "nothing".to_string(), |path| format!("'{path}'"))
    )]
    PackageMutation {
        /// Document owning the reference.
        owner: Location,
        /// Path as authored.
        original: String,
        /// Path returned by the processor, `None` for a removal.
        proposed: Option<String>,
    },

    /// A file reached from a package cannot sit where the package's unchanged path points.
    #[error(
        "cannot place '{asset_path}' referenced from {owner}: its location is taken, so it would land at {} and the package cannot be rewritten",
        .destination.display()
    )]
    PackageLayout {
        /// Package-governed document owning the reference.
        owner: Location,
        /// Path as authored inside the package.
        asset_path: String,
        /// Destination the file was moved to instead.
        destination: PathBuf,
    },

    /// Writing a rewritten document failed.
    #[error("failed to export {}", .destination.display())]
    Export {
        /// Destination file.
        destination: PathBuf,
        /// Underlying document error.
        #[source]
        source: DocumentError,
    },

    /// Copying a resolved file failed.
    #[error("failed to copy {from} to {}", .destination.display())]
    Copy {
        /// Source file.
        from: Location,
        /// Destination file.
        destination: PathBuf,
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A destination directory could not be created.
    #[error("failed to create directory {}", .path.display())]
    CreateDir {
        /// Directory that caused the error.
        path: PathBuf,
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The destination directory holds output from an earlier run.
    #[error("destination {} already has contents", .0.display())]
    DestinationExists(PathBuf),

    /// The root path does not name a scene document.
    #[error("root {0} is not a scene document")]
    InvalidRoot(String),

    /// The dependency processor failed.
    #[error(transparent)]
    Callback(anyhow::Error),
}

impl LocalizeError {
    /// Returns `true` for errors caused by misuse of the engine rather than the environment.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::PackageMutation { .. })
    }
}
