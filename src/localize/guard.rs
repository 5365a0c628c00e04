//! Rejects rewrites of asset paths fixed by a package container.

use crate::error::{LocalizeError, LocalizeResult};
use crate::models::{DependencyInfo, OwningDocument};

/// Vetoes changes to paths authored in, or inside, a package container.
///
/// Any change, including removal, is a usage error that aborts the run. Leaving the path
/// untouched is always accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageGuard;

impl PackageGuard {
    /// Validate that `info` keeps `original` when `owner` is governed by a package.
    pub fn check(owner: &OwningDocument, original: &str, info: &DependencyInfo) -> LocalizeResult<()> {
        if !owner.is_package_governed() || info.asset_path() == Some(original) {
            return Ok(());
        }

        Err(LocalizeError::PackageMutation {
            owner: owner.location().clone(),
            original: original.to_string(),
            proposed: info.asset_path().map(str::to_string),
        })
    }
}
