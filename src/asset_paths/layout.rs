use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::models::{Location, split_package_relative};

/// Destination of a dependency and the reference text that reaches it from its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Path of the file relative to the destination root.
    pub destination: PathBuf,
    /// Asset path to author in the owning document.
    pub reference: String,
}

/// Maps resolved source locations onto paths inside the destination directory.
///
/// Relative references keep their spelling whenever they stay inside the destination
/// root. Absolute references, and relative ones that climb above the root, are moved
/// into numbered directories, one per distinct source directory. The first placement
/// of a source wins; every other spelling of the same file points at it.
#[derive(Debug, Default)]
pub struct DestinationLayout {
    prefix: String,
    placed: HashMap<Location, PathBuf>,
    claimed: HashMap<PathBuf, Location>,
    remapped_dirs: HashMap<PathBuf, usize>,
    next_dir: usize,
}

impl DestinationLayout {
    /// Create a layout naming remapped directories `{prefix}{n}`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Place the root document directly under the destination root.
    pub fn place_root(&mut self, root: &Location) -> PathBuf {
        let target = root.package();
        let destination = target
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.remap(&target));
        self.claim(&target, &destination);
        destination
    }

    /// Destination already assigned to `source`, if any.
    pub fn destination(&self, source: &Location) -> Option<&Path> {
        self.placed.get(&source.package()).map(PathBuf::as_path)
    }

    /// Place the file `source`, referenced as `asset_path` from a document stored at `owner`.
    ///
    /// Package-relative sources are placed through their package; the returned reference
    /// keeps the `[entry]` suffix.
    pub fn place(&mut self, owner: &Path, asset_path: &str, source: &Location) -> Placement {
        let (outer, inner) = match source.inner() {
            Some(_) => split_package_relative(asset_path),
            None => (asset_path, None),
        };
        let target = source.package();
        let owner_dir = owner.parent().unwrap_or_else(|| Path::new(""));
        let natural = natural_destination(owner_dir, outer);

        let destination = match self.placed.get(&target) {
            Some(existing) => existing.clone(),
            None => {
                let destination = match &natural {
                    Some(path) if self.is_free(path, &target) => path.clone(),
                    _ => self.remap(&target),
                };
                self.claim(&target, &destination);
                destination
            }
        };

        let reference = if natural.as_ref() == Some(&destination) {
            outer.to_string()
        } else {
            relative_reference(owner_dir, &destination)
        };
        let reference = match inner {
            Some(inner) => format!("{reference}[{inner}]"),
            None => reference,
        };

        Placement {
            destination,
            reference,
        }
    }

    fn is_free(&self, destination: &Path, source: &Location) -> bool {
        self.claimed
            .get(destination)
            .is_none_or(|owner| owner == source)
    }

    fn claim(&mut self, source: &Location, destination: &Path) {
        self.placed.insert(source.clone(), destination.to_path_buf());
        self.claimed.insert(destination.to_path_buf(), source.clone());
    }

    fn remap(&mut self, source: &Location) -> PathBuf {
        let dir = source
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = source.file_name().unwrap_or_default();

        let mut number = match self.remapped_dirs.get(&dir) {
            Some(number) => *number,
            None => {
                let number = self.allocate_dir();
                self.remapped_dirs.insert(dir, number);
                number
            }
        };
        loop {
            let candidate = PathBuf::from(format!("{}{}", self.prefix, number)).join(&name);
            if self.is_free(&candidate, source) {
                return candidate;
            }
            number = self.allocate_dir();
        }
    }

    fn allocate_dir(&mut self) -> usize {
        let number = self.next_dir;
        self.next_dir += 1;
        number
    }
}

/// Join a relative asset path onto the owner's directory, if the result stays in the tree.
fn natural_destination(owner_dir: &Path, asset_path: &str) -> Option<PathBuf> {
    let asset_path = asset_path.replace('\\', "/");
    if asset_path.starts_with('/') || Path::new(&asset_path).is_absolute() {
        return None;
    }

    let mut segments: Vec<String> = owner_dir
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    for segment in asset_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other.to_string()),
        }
    }

    (!segments.is_empty()).then(|| segments.iter().collect())
}

/// Forward-slash path leading from `from_dir` to `to`, both relative to the destination root.
pub fn relative_reference(from_dir: &Path, to: &Path) -> String {
    let from: Vec<_> = from_dir.components().collect();
    let target: Vec<_> = to.components().collect();
    let shared = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = vec!["..".to_string(); from.len() - shared];
    segments.extend(
        target[shared..]
            .iter()
            .map(|component| component.as_os_str().to_string_lossy().into_owned()),
    );
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_keeps_its_file_name() {
        let mut layout = DestinationLayout::default();
        let root = Location::file("/src/shot/root.json");
        assert_eq!(layout.place_root(&root), PathBuf::from("root.json"));
        assert_eq!(layout.destination(&root), Some(Path::new("root.json")));
    }

    #[test]
    fn relative_paths_keep_their_structure_and_spelling() {
        let mut layout = DestinationLayout::default();
        layout.place_root(&Location::file("/src/root.json"));

        let placement = layout.place(
            Path::new("root.json"),
            "./layers/anim.json",
            &Location::file("/src/layers/anim.json"),
        );
        assert_eq!(placement.destination, PathBuf::from("layers/anim.json"));
        assert_eq!(placement.reference, "./layers/anim.json");

        let nested = layout.place(
            Path::new("layers/anim.json"),
            "../textures/wood.png",
            &Location::file("/src/textures/wood.png"),
        );
        assert_eq!(nested.destination, PathBuf::from("textures/wood.png"));
        assert_eq!(nested.reference, "../textures/wood.png");
    }

    #[test]
    fn absolute_paths_move_into_numbered_directories() {
        let mut layout = DestinationLayout::default();
        layout.place_root(&Location::file("/src/root.json"));

        let first = layout.place(
            Path::new("root.json"),
            "/library/chair.json",
            &Location::file("/library/chair.json"),
        );
        let second = layout.place(
            Path::new("root.json"),
            "/library/table.json",
            &Location::file("/library/table.json"),
        );
        let third = layout.place(
            Path::new("root.json"),
            "/elsewhere/lamp.json",
            &Location::file("/elsewhere/lamp.json"),
        );

        assert_eq!(first.destination, PathBuf::from("0/chair.json"));
        assert_eq!(first.reference, "0/chair.json");
        assert_eq!(second.destination, PathBuf::from("0/table.json"));
        assert_eq!(third.destination, PathBuf::from("1/lamp.json"));
    }

    #[test]
    fn paths_escaping_the_root_are_remapped() {
        let mut layout = DestinationLayout::new("ext");
        layout.place_root(&Location::file("/src/shot/root.json"));

        let placement = layout.place(
            Path::new("root.json"),
            "../shared/rig.json",
            &Location::file("/src/shared/rig.json"),
        );
        assert_eq!(placement.destination, PathBuf::from("ext0/rig.json"));
        assert_eq!(placement.reference, "ext0/rig.json");
    }

    #[test]
    fn first_spelling_wins_for_the_same_source() {
        let mut layout = DestinationLayout::default();
        layout.place_root(&Location::file("/src/root.json"));
        let source = Location::file("/src/sub/a.json");

        let relative = layout.place(Path::new("root.json"), "sub/a.json", &source);
        let absolute = layout.place(Path::new("root.json"), "/src/sub/a.json", &source);

        assert_eq!(relative.destination, absolute.destination);
        assert_eq!(absolute.reference, "sub/a.json");

        let from_remapped = layout.place(Path::new("0/b.json"), "/src/sub/a.json", &source);
        assert_eq!(from_remapped.reference, "../sub/a.json");
    }

    #[test]
    fn clashing_destinations_fall_back_to_remapping() {
        let mut layout = DestinationLayout::default();
        layout.place_root(&Location::file("/src/root.json"));
        layout.place(
            Path::new("root.json"),
            "a.json",
            &Location::file("/src/a.json"),
        );

        let clash = layout.place(
            Path::new("0/b.json"),
            "../a.json",
            &Location::file("/other/a.json"),
        );
        assert_eq!(clash.destination, PathBuf::from("0/a.json"));
        assert_eq!(clash.reference, "a.json");
    }

    #[test]
    fn package_entries_are_placed_through_their_package() {
        let mut layout = DestinationLayout::default();
        layout.place_root(&Location::file("/src/root.json"));

        let placement = layout.place(
            Path::new("root.json"),
            "props/set.pkgz[lamp.json]",
            &Location::packaged("/src/props/set.pkgz", "lamp.json"),
        );
        assert_eq!(placement.destination, PathBuf::from("props/set.pkgz"));
        assert_eq!(placement.reference, "props/set.pkgz[lamp.json]");
        assert_eq!(
            layout.destination(&Location::file("/src/props/set.pkgz")),
            Some(Path::new("props/set.pkgz"))
        );
    }

    #[test]
    fn bracketed_file_names_are_not_package_entries() {
        let mut layout = DestinationLayout::default();
        layout.place_root(&Location::file("/src/root.json"));

        let placement = layout.place(
            Path::new("root.json"),
            "takes/take[1]",
            &Location::file("/src/takes/take[1]"),
        );
        assert_eq!(placement.destination, PathBuf::from("takes/take[1]"));
        assert_eq!(placement.reference, "takes/take[1]");
    }

    #[test]
    fn relative_reference_climbs_out_of_directories() {
        assert_eq!(
            relative_reference(Path::new("a/b"), Path::new("a/c/d.json")),
            "../c/d.json"
        );
        assert_eq!(relative_reference(Path::new(""), Path::new("0/x.json")), "0/x.json");
    }
}
