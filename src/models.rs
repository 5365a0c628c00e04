//! Data structures shared by the localization engine and its collaborators.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Result of processing a single dependency, and the unit exchanged with processors.
///
/// An absent or empty `asset_path` means the dependency is removed: the reference
/// site that produced it is omitted from the localized output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DependencyInfo {
  /// Asset path the dependency should point at.
  #[serde(default)]
  pub asset_path: Option<String>,
  /// Additional raw asset paths that arise from `asset_path` and must be localized too.
  #[serde(default)]
  pub dependencies: Vec<String>,
}

impl DependencyInfo {
  /// Dependency that should be dropped from the output.
  pub fn removed() -> Self {
    Self::default()
  }

  /// Dependency pointing at `asset_path` with no extra dependencies.
  pub fn new(asset_path: impl Into<String>) -> Self {
    Self {
      asset_path: Some(asset_path.into()),
      dependencies: Vec::new(),
    }
  }

  /// Dependency pointing at `asset_path` that also pulls in `dependencies`.
  pub fn with_dependencies<I, S>(asset_path: impl Into<String>, dependencies: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      asset_path: Some(asset_path.into()),
      dependencies: dependencies.into_iter().map(Into::into).collect(),
    }
  }

  /// Non-empty asset path, if any.
  pub fn asset_path(&self) -> Option<&str> {
    self.asset_path.as_deref().filter(|path| !path.is_empty())
  }

  /// Returns `true` when the dependency has been removed.
  pub fn is_removed(&self) -> bool {
    self.asset_path().is_none()
  }
}

/// Resolved identity of a file, optionally addressing an entry inside a package container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
  path: PathBuf,
  inner: Option<String>,
}

impl Location {
  /// Location of a plain file on disk.
  pub fn file(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      inner: None,
    }
  }

  /// Location of `inner` stored inside the package at `package`.
  pub fn packaged(package: impl Into<PathBuf>, inner: impl Into<String>) -> Self {
    Self {
      path: package.into(),
      inner: Some(inner.into()),
    }
  }

  /// File system path, which is the package file for package-relative locations.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Entry name within the package, for package-relative locations.
  pub fn inner(&self) -> Option<&str> {
    self.inner.as_deref()
  }

  /// Returns `true` when the location lives inside a package container.
  pub fn is_package_relative(&self) -> bool {
    self.inner.is_some()
  }

  /// Outermost file holding this location.
  pub fn package(&self) -> Location {
    Location::file(&self.path)
  }

  /// Final name component, looking through package entries.
  pub fn file_name(&self) -> Option<String> {
    match &self.inner {
      Some(inner) => inner.rsplit('/').next().map(str::to_string),
      None => self
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned()),
    }
  }

  /// Lower-cased extension of [`Location::file_name`].
  pub fn extension(&self) -> Option<String> {
    let name = self.file_name()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
      return None;
    }
    Some(ext.to_ascii_lowercase())
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.inner {
      Some(inner) => write!(f, "{}[{}]", self.path.display(), inner),
      None => write!(f, "{}", self.path.display()),
    }
  }
}

/// Split `archive.pkgz[inner/file.json]` into its outer path and entry name.
pub fn split_package_relative(raw: &str) -> (&str, Option<&str>) {
  if !raw.ends_with(']') {
    return (raw, None);
  }
  match raw.find('[') {
    Some(open) if open > 0 => (&raw[..open], Some(&raw[open + 1..raw.len() - 1])),
    _ => (raw, None),
  }
}

/// Document being walked, as seen by dependency processors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwningDocument {
  location: Location,
  is_package: bool,
}

impl OwningDocument {
  /// Describe the document at `location`.
  pub fn new(location: Location, is_package: bool) -> Self {
    Self {
      location,
      is_package,
    }
  }

  /// Resolved location of the document.
  pub fn location(&self) -> &Location {
    &self.location
  }

  /// Returns `true` when the document is itself a package container.
  pub fn is_package(&self) -> bool {
    self.is_package
  }

  /// Returns `true` when the document's asset paths are fixed by a package.
  pub fn is_package_governed(&self) -> bool {
    self.is_package || self.location.is_package_relative()
  }
}

/// Category of an outgoing asset-path reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
  /// Entry in the layer's sublayer stack.
  Sublayer,
  /// Composition reference on a prim.
  Reference,
  /// Payload on a prim.
  Payload,
  /// Explicit clip asset path.
  Clip,
  /// Clip template pattern naming a numbered set of files.
  ClipTemplate,
  /// Asset-valued property default.
  PropertyValue,
  /// Asset-valued property time sample.
  TimeSample,
  /// Asset-valued metadata field.
  Metadata,
}

impl ReferenceKind {
  /// Whether the target must be a document that gets opened and walked.
  pub fn requires_document(self) -> bool {
    matches!(self, Self::Sublayer | Self::Reference | Self::Payload)
  }

  /// Whether the reference is a pattern rather than the path of a single file.
  pub fn is_template(self) -> bool {
    matches!(self, Self::ClipTemplate)
  }
}

/// Position of a reference site inside a scene document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SiteLocator {
  /// Index into the sublayer stack.
  Sublayer(usize),
  /// Key of a layer metadata field.
  LayerMetadata(String),
  /// Reference `index` on prim `prim`.
  Reference {
    /// Prim index.
    prim: usize,
    /// Reference index.
    index: usize,
  },
  /// Payload `index` on prim `prim`.
  Payload {
    /// Prim index.
    prim: usize,
    /// Payload index.
    index: usize,
  },
  /// Clip asset path `index` on prim `prim`.
  ClipAsset {
    /// Prim index.
    prim: usize,
    /// Clip asset index.
    index: usize,
  },
  /// Clip template of prim `prim`.
  ClipTemplate {
    /// Prim index.
    prim: usize,
  },
  /// Metadata field `key` on prim `prim`.
  PrimMetadata {
    /// Prim index.
    prim: usize,
    /// Metadata key.
    key: String,
  },
  /// Default value of a property.
  PropertyDefault {
    /// Prim index.
    prim: usize,
    /// Property index.
    property: usize,
  },
  /// Time sample of a property.
  TimeSample {
    /// Prim index.
    prim: usize,
    /// Property index.
    property: usize,
    /// Time code key.
    time: String,
  },
  /// Metadata field `key` on a property.
  PropertyMetadata {
    /// Prim index.
    prim: usize,
    /// Property index.
    property: usize,
    /// Metadata key.
    key: String,
  },
}

/// Single outgoing asset-path occurrence inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
  /// Category of the reference.
  pub kind: ReferenceKind,
  /// Raw asset path as authored.
  pub asset_path: String,
  /// Where the path is stored, used to rewrite it in place.
  pub locator: SiteLocator,
}

/// Replacement values keyed by site; `None` removes the site, missing sites are untouched.
pub type SiteRewrites = BTreeMap<SiteLocator, Option<String>>;
