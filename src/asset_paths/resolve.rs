use std::io;
use std::path::{Component, Path, PathBuf};

use crate::asset_paths::template::expand_clip_template;
use crate::config::LocalizeConfig;
use crate::models::{Location, split_package_relative};

/// Resolves authored asset paths against the document that owns them.
pub trait AssetPathResolver {
    /// Resolve `raw` relative to the document at `owner`.
    fn resolve(&self, owner: &Location, raw: &str) -> Location;

    /// Returns `true` when `location` lives inside a package container.
    fn is_package_relative(&self, location: &Location) -> bool {
        location.is_package_relative()
    }

    /// Expand a clip template into the raw paths of the files it currently matches.
    fn expand_template(&self, owner: &Location, template: &str) -> Vec<String>;
}

/// Resolver backed by the local file system.
#[derive(Debug, Clone, Default)]
pub struct FsAssetResolver {
    config: LocalizeConfig,
}

impl FsAssetResolver {
    /// Create a resolver recognising packages by the configured extension.
    pub fn new(config: LocalizeConfig) -> Self {
        Self { config }
    }

    fn is_package_file(&self, location: &Location) -> bool {
        !location.is_package_relative()
            && location
                .extension()
                .is_some_and(|ext| self.config.is_package_extension(&ext))
    }

    fn resolve_file(&self, owner: &Location, raw: &str) -> Location {
        let raw = raw.replace('\\', "/");
        if Path::new(&raw).is_absolute() {
            return Location::file(normalize_path(Path::new(&raw)));
        }

        let package_dir = match owner.inner() {
            Some(inner) => Some(inner.rsplit_once('/').map_or("", |(dir, _)| dir)),
            None if self.is_package_file(owner) => Some(""),
            None => None,
        };

        if let Some(dir) = package_dir {
            let joined = if dir.is_empty() {
                raw.clone()
            } else {
                format!("{dir}/{raw}")
            };
            if let Some(inner) = normalize_inner(&joined) {
                return Location::packaged(owner.path(), inner);
            }
        }

        let base = owner.path().parent().unwrap_or_else(|| Path::new(""));
        Location::file(normalize_path(&base.join(&raw)))
    }
}

impl AssetPathResolver for FsAssetResolver {
    fn resolve(&self, owner: &Location, raw: &str) -> Location {
        if let (outer, Some(inner)) = split_package_relative(raw) {
            let resolved = self.resolve_file(owner, outer);
            let names_package = resolved
                .extension()
                .is_some_and(|ext| self.config.is_package_extension(&ext));
            if names_package {
                return match normalize_inner(inner) {
                    Some(inner) if !resolved.is_package_relative() => {
                        Location::packaged(resolved.path(), inner)
                    }
                    _ => resolved,
                };
            }
        }
        self.resolve_file(owner, raw)
    }

    fn expand_template(&self, owner: &Location, template: &str) -> Vec<String> {
        if owner.is_package_relative() || self.is_package_file(owner) {
            return Vec::new();
        }
        let resolved = self.resolve_file(owner, template);
        expand_clip_template(template, resolved.path())
    }
}

/// Absolute, lexically normalized location of a root document given on the command line.
pub fn absolute_location(path: &Path) -> io::Result<Location> {
    let absolute = std::path::absolute(path)?;
    Ok(Location::file(normalize_path(&absolute)))
}

/// Remove `.` and `..` components without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// Normalize a `/`-separated package entry name, rejecting names that escape the package.
pub fn normalize_inner(inner: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in inner.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    (!segments.is_empty()).then(|| segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> FsAssetResolver {
        FsAssetResolver::new(LocalizeConfig::default())
    }

    #[test]
    fn resolves_relative_paths_against_owner_directory() {
        let owner = Location::file("/scenes/shot/root.json");
        let resolved = resolver().resolve(&owner, "./layers/../anim.json");
        assert_eq!(resolved, Location::file("/scenes/shot/anim.json"));
    }

    #[test]
    fn keeps_absolute_paths() {
        let owner = Location::file("/scenes/shot/root.json");
        let resolved = resolver().resolve(&owner, "/library/chair.json");
        assert_eq!(resolved, Location::file("/library/chair.json"));
    }

    #[test]
    fn resolves_inside_packages() {
        let package = Location::file("/scenes/set.pkgz");
        assert_eq!(
            resolver().resolve(&package, "props/lamp.json"),
            Location::packaged("/scenes/set.pkgz", "props/lamp.json")
        );

        let inside = Location::packaged("/scenes/set.pkgz", "props/lamp.json");
        assert_eq!(
            resolver().resolve(&inside, "bulb.json"),
            Location::packaged("/scenes/set.pkgz", "props/bulb.json")
        );
    }

    #[test]
    fn escaping_a_package_falls_back_to_its_directory() {
        let inside = Location::packaged("/scenes/set.pkgz", "lamp.json");
        assert_eq!(
            resolver().resolve(&inside, "../shared.json"),
            Location::file("/scenes/shared.json")
        );
    }

    #[test]
    fn resolves_explicit_package_relative_paths() {
        let owner = Location::file("/scenes/shot/root.json");
        assert_eq!(
            resolver().resolve(&owner, "../set.pkgz[./props/lamp.json]"),
            Location::packaged("/scenes/set.pkgz", "props/lamp.json")
        );
    }

    #[test]
    fn brackets_after_other_files_are_part_of_the_name() {
        let owner = Location::file("/scenes/shot/root.json");
        assert_eq!(
            resolver().resolve(&owner, "takes/take[1]"),
            Location::file("/scenes/shot/takes/take[1]")
        );
        assert_eq!(
            resolver().resolve(&owner, "lut.cube[linear]"),
            Location::file("/scenes/shot/lut.cube[linear]")
        );
    }

    #[test]
    fn normalize_inner_rejects_escapes() {
        assert_eq!(normalize_inner("a/./b/../c.json").as_deref(), Some("a/c.json"));
        assert_eq!(normalize_inner("../c.json"), None);
        assert_eq!(normalize_inner("./"), None);
    }

    #[test]
    fn normalize_path_keeps_leading_parents_of_relative_paths() {
        assert_eq!(normalize_path(Path::new("../a/./b/..")), PathBuf::from("../a"));
    }
}
