//! Ready-made dependency processors: path-scope selection and file-name prefix stripping.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::localize::DependencyProcessor;
use crate::models::{DependencyInfo, OwningDocument};

/// Default selection file name searched for next to the root document.
pub const DEFAULT_SELECTION_FILE: &str = "localize.selection.json";

/// Selection file layout: asset-path scopes to keep or drop.
#[derive(Debug, Default, Deserialize)]
struct DependencySelectionFile {
  #[serde(default)]
  include: Vec<String>,
  #[serde(default)]
  exclude: Vec<String>,
}

/// Processor dropping dependencies whose asset path falls outside the selected scopes.
///
/// Scopes match a whole path or any path below it, so `textures` covers
/// `textures/wood.png` but not `textures_old/wood.png`. Exclusions win over inclusions;
/// without inclusions every path not excluded is kept.
#[derive(Debug, Clone, Default)]
pub struct DependencySelection {
  include: Option<BTreeSet<String>>,
  exclude: BTreeSet<String>,
}

/// Errors that can occur while loading a selection file.
#[derive(Debug, Error)]
pub enum DependencySelectionError {
  /// Failed to read the selection file from disk.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the JSON selection file.
  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl DependencySelection {
  /// Load rules from the selection file if present.
  pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, DependencySelectionError> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Ok(Self::default());
      }
      Err(err) => {
        return Err(DependencySelectionError::Io {
          path: path.to_path_buf(),
          source: err,
        });
      }
    };

    let file: DependencySelectionFile =
      serde_json::from_str(&contents).map_err(|err| DependencySelectionError::Parse {
        path: path.to_path_buf(),
        source: err,
      })?;
    Ok(Self::from(file))
  }

  /// Build a selection from explicit scope lists.
  pub fn new(
    include: impl IntoIterator<Item = String>,
    exclude: impl IntoIterator<Item = String>,
  ) -> Self {
    Self::from(DependencySelectionFile {
      include: include.into_iter().collect(),
      exclude: exclude.into_iter().collect(),
    })
  }

  /// Determine whether an authored asset path should be localized.
  pub fn is_included(&self, asset_path: &str) -> bool {
    let candidate = normalise_path(asset_path);
    if self
      .exclude
      .iter()
      .any(|value| scope_matches(value, &candidate))
    {
      return false;
    }

    match &self.include {
      Some(include) => include.iter().any(|value| scope_matches(value, &candidate)),
      None => true,
    }
  }

  /// Returns true when no filtering rules are active.
  pub fn is_unfiltered(&self) -> bool {
    self.include.is_none() && self.exclude.is_empty()
  }
}

impl DependencyProcessor for DependencySelection {
  fn process(
    &mut self,
    owner: &OwningDocument,
    info: DependencyInfo,
  ) -> anyhow::Result<DependencyInfo> {
    if let Some(path) = info.asset_path().filter(|path| !self.is_included(path)) {
      tracing::debug!("excluding '{}' from {}", path, owner.location());
      return Ok(DependencyInfo::removed());
    }
    Ok(info)
  }
}

impl From<DependencySelectionFile> for DependencySelection {
  fn from(file: DependencySelectionFile) -> Self {
    let include = normalise_list(file.include);
    let exclude = normalise_list(file.exclude);

    Self {
      include: (!include.is_empty()).then_some(include),
      exclude,
    }
  }
}

/// Processor removing a prefix from the file name of every asset path.
///
/// Used when a pipeline publishes renamed copies of its working files, e.g. authoring
/// `test_chair.json` that ships as `chair.json`. Transient dependencies are renamed the
/// same way.
#[derive(Debug, Clone)]
pub struct StripPrefix {
  prefix: String,
}

impl StripPrefix {
  /// Strip `prefix` from file names.
  pub fn new(prefix: impl Into<String>) -> Self {
    Self {
      prefix: prefix.into(),
    }
  }

  /// `asset_path` with the prefix removed from its final component.
  pub fn apply(&self, asset_path: &str) -> String {
    let (dir, name) = match asset_path.rfind(['/', '\\']) {
      Some(index) => asset_path.split_at(index + 1),
      None => ("", asset_path),
    };
    match name.strip_prefix(&self.prefix) {
      Some(rest) if !rest.is_empty() && !self.prefix.is_empty() => format!("{dir}{rest}"),
      _ => asset_path.to_string(),
    }
  }
}

impl DependencyProcessor for StripPrefix {
  fn process(
    &mut self,
    _owner: &OwningDocument,
    info: DependencyInfo,
  ) -> anyhow::Result<DependencyInfo> {
    let Some(path) = info.asset_path().map(|path| self.apply(path)) else {
      return Ok(info);
    };
    Ok(DependencyInfo::with_dependencies(
      path,
      info.dependencies.iter().map(|dependency| self.apply(dependency)),
    ))
  }
}

/// Convert a list of raw scopes into a sorted, de-duplicated set.
fn normalise_list(values: impl IntoIterator<Item = String>) -> BTreeSet<String> {
  values
    .into_iter()
    .map(|value| normalise_path(&value))
    .filter(|value| !value.is_empty())
    .collect()
}

fn normalise_path(value: &str) -> String {
  let value = value.trim().replace('\\', "/");
  let mut value = value.as_str();
  while let Some(rest) = value.strip_prefix("./") {
    value = rest;
  }
  value.trim_matches('/').to_string()
}

fn scope_matches(rule: &str, candidate: &str) -> bool {
  if candidate == rule {
    return true;
  }

  candidate
    .strip_prefix(rule)
    .is_some_and(|suffix| suffix.starts_with('/'))
}
