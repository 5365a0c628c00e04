//! Localization orchestrator: walks the dependency graph and writes the destination tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::asset_paths::{
    AssetPathResolver, DestinationLayout, FsAssetResolver, absolute_location,
    should_skip_asset_path,
};
use crate::config::LocalizeConfig;
use crate::document::{DocumentStore, FsDocumentStore};
use crate::error::{LocalizeError, LocalizeResult};
use crate::localize::install::install_file;
use crate::localize::pipeline::{DependencyProcessor, Outcome, ProcessingPipeline};
use crate::localize::worklist::{DocId, LocalizationWorklist, Origin, Task, WorkItem};
use crate::models::{
    DependencyInfo, Location, OwningDocument, ReferenceKind, ReferenceSite, SiteRewrites,
};

/// Totals reported by a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizeSummary {
    /// Path of the localized root document.
    pub root: PathBuf,
    /// Documents written, counting package containers.
    pub documents: usize,
    /// Opaque files copied.
    pub assets: usize,
    /// References removed by the processor.
    pub dropped: usize,
    /// Distinct dependencies processed.
    pub processed: usize,
}

/// Localize `root` into `destination` using the file-system store and resolver.
///
/// Settings are discovered next to the root document. `destination` must be absent or
/// empty. Without a processor every dependency is kept as authored.
pub fn localize(
    root: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    processor: Option<&mut dyn DependencyProcessor>,
) -> LocalizeResult<LocalizeSummary> {
    let root = root.as_ref();
    let config = LocalizeConfig::discover(root.parent().unwrap_or_else(|| Path::new(".")));
    localize_with_config(root, destination.as_ref(), &config, processor)
}

/// Like [`localize`], with explicit settings.
pub fn localize_with_config(
    root: &Path,
    destination: &Path,
    config: &LocalizeConfig,
    processor: Option<&mut dyn DependencyProcessor>,
) -> LocalizeResult<LocalizeSummary> {
    let store = FsDocumentStore::new(config.clone());
    let resolver = FsAssetResolver::new(config.clone());
    Localizer::new(&store, &resolver, config).localize(root, destination, processor)
}

/// Drives a localization run over any store and resolver.
pub struct Localizer<'a, S, R> {
    store: &'a S,
    resolver: &'a R,
    config: &'a LocalizeConfig,
}

impl<'a, S, R> Localizer<'a, S, R>
where
    S: DocumentStore,
    R: AssetPathResolver,
{
    /// Create a localizer over the given capabilities.
    pub fn new(store: &'a S, resolver: &'a R, config: &'a LocalizeConfig) -> Self {
        Self {
            store,
            resolver,
            config,
        }
    }

    /// Copy `root` and everything it depends on into `destination`.
    ///
    /// The run stops at the first failure; files written before it are left in place
    /// and the destination should be discarded.
    pub fn localize(
        &self,
        root: &Path,
        destination: &Path,
        processor: Option<&mut dyn DependencyProcessor>,
    ) -> LocalizeResult<LocalizeSummary> {
        ensure_fresh_destination(destination)?;

        let root = absolute_location(root)
            .map_err(|_| LocalizeError::InvalidRoot(root.display().to_string()))?;
        if !self.store.is_document(&root) {
            return Err(LocalizeError::InvalidRoot(root.to_string()));
        }

        fs::create_dir_all(destination).map_err(|source| LocalizeError::CreateDir {
            path: destination.to_path_buf(),
            source,
        })?;

        tracing::info!("localizing {} into {}", root, destination.display());
        let mut run = Run {
            store: self.store,
            resolver: self.resolver,
            config: self.config,
            destination_root: destination,
            pipeline: ProcessingPipeline::new(processor),
            worklist: LocalizationWorklist::new(),
            layout: DestinationLayout::new(self.config.remap_dir_prefix.clone()),
            rows: Vec::new(),
            index: HashMap::new(),
            documents: 0,
            assets: 0,
            dropped: 0,
        };

        let root_destination = run.seed(root);
        run.drain()?;

        let summary = LocalizeSummary {
            root: destination.join(root_destination),
            documents: run.documents,
            assets: run.assets,
            dropped: run.dropped,
            processed: run.pipeline.processed(),
        };
        tracing::info!(
            "localized {} documents and {} assets ({} references dropped, {} tasks)",
            summary.documents,
            summary.assets,
            summary.dropped,
            run.worklist.completed()
        );
        Ok(summary)
    }
}

fn ensure_fresh_destination(destination: &Path) -> LocalizeResult<()> {
    if !destination.exists() {
        return Ok(());
    }
    let has_contents = fs::read_dir(destination)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(true);
    if has_contents {
        return Err(LocalizeError::DestinationExists(destination.to_path_buf()));
    }
    Ok(())
}

/// One row per file reached by the walk, keyed by resolved location.
struct DocumentRow<D> {
    owner: OwningDocument,
    /// Path relative to the destination root; `None` for files carried inside a package.
    destination: Option<PathBuf>,
    document: Option<D>,
    sites: Vec<ReferenceSite>,
    rewrites: SiteRewrites,
}

struct Run<'r, 'p, S: DocumentStore, R> {
    store: &'r S,
    resolver: &'r R,
    config: &'r LocalizeConfig,
    destination_root: &'r Path,
    pipeline: ProcessingPipeline<'p>,
    worklist: LocalizationWorklist,
    layout: DestinationLayout,
    rows: Vec<DocumentRow<S::Document>>,
    index: HashMap<Location, DocId>,
    documents: usize,
    assets: usize,
    dropped: usize,
}

impl<S, R> Run<'_, '_, S, R>
where
    S: DocumentStore,
    R: AssetPathResolver,
{
    fn seed(&mut self, root: Location) -> PathBuf {
        let destination = self.layout.place_root(&root);
        let id = self.insert_row(root, Some(destination.clone()));
        self.worklist.push(Task::Walk(id));
        destination
    }

    fn drain(&mut self) -> LocalizeResult<()> {
        while let Some(task) = self.worklist.pop() {
            match task {
                Task::Walk(id) => self.walk(id)?,
                Task::Resolve(item) => self.resolve(item)?,
                Task::Export(id) => self.export(id)?,
                Task::Copy(id) => self.copy(id)?,
            }
        }
        Ok(())
    }

    fn insert_row(&mut self, location: Location, destination: Option<PathBuf>) -> DocId {
        let is_package = self.store.is_package_container(&location);
        let id = DocId(self.rows.len());
        self.rows.push(DocumentRow {
            owner: OwningDocument::new(location.clone(), is_package),
            destination,
            document: None,
            sites: Vec::new(),
            rewrites: SiteRewrites::new(),
        });
        self.index.insert(location, id);
        id
    }

    fn walk(&mut self, id: DocId) -> LocalizeResult<()> {
        let row = &mut self.rows[id.0];
        let location = row.owner.location().clone();
        tracing::debug!("walking {}", location);

        let document = self
            .store
            .open(&location)
            .map_err(|source| LocalizeError::Open { location, source })?;
        let sites = self.store.references(&document);
        for (index, site) in sites.iter().enumerate() {
            self.worklist.push(Task::Resolve(WorkItem {
                owner: id,
                raw_path: site.asset_path.clone(),
                origin: Origin::Site(index),
            }));
        }
        self.worklist.push(Task::Export(id));

        row.document = Some(document);
        row.sites = sites;
        Ok(())
    }

    fn resolve(&mut self, item: WorkItem) -> LocalizeResult<()> {
        let row = &self.rows[item.owner.0];
        let owner = row.owner.clone();
        let site = match item.origin {
            Origin::Site(index) => Some(row.sites[index].clone()),
            Origin::Transient => None,
        };
        let kind = site.as_ref().map(|site| site.kind);
        let raw = item.raw_path;

        if raw.trim().is_empty() {
            return Ok(());
        }

        let resolver = self.resolver;
        let default = || {
            if kind.is_some_and(ReferenceKind::is_template) {
                let files = resolver.expand_template(owner.location(), &raw);
                DependencyInfo::with_dependencies(raw.clone(), files)
            } else {
                DependencyInfo::new(raw.clone())
            }
        };
        let processed = self.pipeline.process(&owner, &raw, default)?;

        for dependency in processed.transients {
            tracing::debug!("'{}' in {} brings in '{}'", raw, owner.location(), dependency);
            self.worklist.push(Task::Resolve(WorkItem {
                owner: item.owner,
                raw_path: dependency,
                origin: Origin::Transient,
            }));
        }

        let rewrite = match processed.outcome {
            Outcome::Dropped => {
                tracing::debug!("dropping '{}' from {}", raw, owner.location());
                self.dropped += 1;
                Some(None)
            }
            Outcome::Resolved {
                asset_path,
                changed,
            } => {
                if changed {
                    tracing::debug!("redirecting '{}' to '{}'", raw, asset_path);
                }
                if self.config.skip_url_paths && should_skip_asset_path(&asset_path) {
                    tracing::debug!("leaving '{}' in {} unplaced", asset_path, owner.location());
                    changed.then_some(Some(asset_path))
                } else {
                    let target = self.resolver.resolve(owner.location(), &asset_path);
                    match self.schedule(item.owner, &owner, &asset_path, target, kind)? {
                        Some(reference) if reference != raw => Some(Some(reference)),
                        _ => None,
                    }
                }
            }
        };

        if let (Some(site), Some(rewrite)) = (site, rewrite) {
            self.rows[item.owner.0]
                .rewrites
                .insert(site.locator, rewrite);
        }
        Ok(())
    }

    /// Place `target` and queue it for walking or copying; returns the reference to author.
    fn schedule(
        &mut self,
        owner_id: DocId,
        owner: &OwningDocument,
        asset_path: &str,
        target: Location,
        kind: Option<ReferenceKind>,
    ) -> LocalizeResult<Option<String>> {
        let template = kind.is_some_and(ReferenceKind::is_template);

        // Entries of the owner's own package travel inside the package file.
        if owner.is_package_governed()
            && target.is_package_relative()
            && target.path() == owner.location().path()
        {
            if !template {
                self.ensure_row(target, None, kind);
            }
            return Ok(None);
        }

        let owner_destination = self.owner_destination(owner_id);
        let placement = self.layout.place(&owner_destination, asset_path, &target);
        // Package contents cannot be rewritten, so the target must land where the path points.
        if owner.is_package_governed() && placement.reference != asset_path {
            return Err(LocalizeError::PackageLayout {
                owner: owner.location().clone(),
                asset_path: asset_path.to_string(),
                destination: placement.destination,
            });
        }
        if !template {
            if target.is_package_relative() {
                self.ensure_row(target.package(), Some(placement.destination.clone()), None);
                self.ensure_row(target, None, kind);
            } else {
                self.ensure_row(target, Some(placement.destination.clone()), kind);
            }
        }

        Ok((!owner.is_package_governed()).then_some(placement.reference))
    }

    fn owner_destination(&self, id: DocId) -> PathBuf {
        let row = &self.rows[id.0];
        row.destination
            .clone()
            .or_else(|| {
                self.layout
                    .destination(row.owner.location())
                    .map(Path::to_path_buf)
            })
            .unwrap_or_default()
    }

    fn ensure_row(
        &mut self,
        location: Location,
        destination: Option<PathBuf>,
        kind: Option<ReferenceKind>,
    ) {
        if self.index.contains_key(&location) {
            return;
        }

        let walk =
            kind.is_some_and(ReferenceKind::requires_document) || self.store.is_document(&location);
        let id = self.insert_row(location, destination);
        self.worklist
            .push(if walk { Task::Walk(id) } else { Task::Copy(id) });
    }

    fn export(&mut self, id: DocId) -> LocalizeResult<()> {
        let row = &mut self.rows[id.0];
        let document = row.document.take();
        let Some(destination) = &row.destination else {
            return Ok(());
        };
        let target = self.destination_root.join(destination);
        let location = row.owner.location();

        if row.owner.is_package() {
            tracing::debug!("copying package {} to {}", location, target.display());
            install_file(location.path(), &target, self.config.link_assets).map_err(
                |source| LocalizeError::Copy {
                    from: location.clone(),
                    destination: target.clone(),
                    source,
                },
            )?;
        } else if let Some(document) = document {
            tracing::debug!("exporting {} to {}", location, target.display());
            self.store
                .export(&document, &target, &row.rewrites)
                .map_err(|source| LocalizeError::Export {
                    destination: target.clone(),
                    source,
                })?;
        }

        self.documents += 1;
        Ok(())
    }

    fn copy(&mut self, id: DocId) -> LocalizeResult<()> {
        let row = &self.rows[id.0];
        let Some(destination) = &row.destination else {
            return Ok(());
        };
        let target = self.destination_root.join(destination);
        let location = row.owner.location();

        tracing::debug!("copying {} to {}", location, target.display());
        install_file(location.path(), &target, self.config.link_assets).map_err(|source| {
            LocalizeError::Copy {
                from: location.clone(),
                destination: target.clone(),
                source,
            }
        })?;

        self.assets += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::DocumentError;
    use std::cell::RefCell;
    use tempfile::tempdir;

    /// Store wrapper counting how often each document is opened.
    struct CountingStore {
        inner: FsDocumentStore,
        opened: RefCell<HashMap<Location, usize>>,
    }

    impl DocumentStore for CountingStore {
        type Document = Document;

        fn open(&self, location: &Location) -> Result<Document, DocumentError> {
            *self.opened.borrow_mut().entry(location.clone()).or_default() += 1;
            self.inner.open(location)
        }

        fn references(&self, document: &Document) -> Vec<ReferenceSite> {
            self.inner.references(document)
        }

        fn is_document(&self, location: &Location) -> bool {
            self.inner.is_document(location)
        }

        fn is_package_container(&self, location: &Location) -> bool {
            self.inner.is_package_container(location)
        }

        fn export(
            &self,
            document: &Document,
            destination: &Path,
            rewrites: &SiteRewrites,
        ) -> Result<(), DocumentError> {
            self.inner.export(document, destination, rewrites)
        }
    }

    #[test]
    fn diamonds_and_cycles_open_each_document_once() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("root.json"), r#"{"sublayers": ["a.json", "b.json"]}"#).unwrap();
        fs::write(src.join("a.json"), r#"{"sublayers": ["shared.json"]}"#).unwrap();
        fs::write(src.join("b.json"), r#"{"sublayers": ["./shared.json"]}"#).unwrap();
        fs::write(src.join("shared.json"), r#"{"sublayers": ["root.json"]}"#).unwrap();

        let config = LocalizeConfig::default();
        let store = CountingStore {
            inner: FsDocumentStore::new(config.clone()),
            opened: RefCell::new(HashMap::new()),
        };
        let resolver = FsAssetResolver::new(config.clone());
        let summary = Localizer::new(&store, &resolver, &config)
            .localize(&src.join("root.json"), &temp.path().join("out"), None)
            .unwrap();

        assert_eq!(summary.documents, 4);
        assert_eq!(store.opened.borrow().len(), 4);
        assert!(store.opened.borrow().values().all(|count| *count == 1));
    }

    #[test]
    fn rejects_stale_destinations() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("root.json");
        fs::write(&src, "{}").unwrap();
        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.json"), "{}").unwrap();

        let err = localize(&src, &out, None).unwrap_err();
        assert!(matches!(err, LocalizeError::DestinationExists(_)));
    }

    #[test]
    fn rejects_roots_that_are_not_documents() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("texture.png");
        fs::write(&src, b"png").unwrap();

        let err = localize(&src, temp.path().join("out"), None).unwrap_err();
        assert!(matches!(err, LocalizeError::InvalidRoot(_)));
    }

    #[test]
    fn empty_destination_directories_are_accepted() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("root.json");
        fs::write(&src, "{}").unwrap();
        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let summary = localize(&src, &out, None).unwrap();
        assert_eq!(summary.root, out.join("root.json"));
        assert!(summary.root.exists());
    }
}
