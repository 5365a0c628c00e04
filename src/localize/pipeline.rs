//! Applies the dependency processor to discovered references.

use crate::error::LocalizeResult;
use crate::localize::cache::PathCache;
use crate::localize::guard::PackageGuard;
use crate::models::{DependencyInfo, OwningDocument};

/// User extension point consulted once for every distinct dependency.
///
/// Returning [`DependencyInfo::removed`] drops the dependency, returning a different path
/// redirects it, and any `dependencies` are localized as well. A processor that converts
/// files should write the converted file itself and return its path.
pub trait DependencyProcessor {
    /// Transform `info`, found in `owner`.
    fn process(&mut self, owner: &OwningDocument, info: DependencyInfo) -> anyhow::Result<DependencyInfo>;
}

impl<F> DependencyProcessor for F
where
    F: FnMut(&OwningDocument, DependencyInfo) -> anyhow::Result<DependencyInfo>,
{
    fn process(&mut self, owner: &OwningDocument, info: DependencyInfo) -> anyhow::Result<DependencyInfo> {
        self(owner, info)
    }
}

/// Effect of a processed dependency on the reference that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The reference is omitted from the output.
    Dropped,
    /// The reference points at `asset_path`.
    Resolved {
        /// Accepted asset path.
        asset_path: String,
        /// Whether the processor changed the authored path.
        changed: bool,
    },
}

/// Outcome of a dependency plus the transient dependencies it introduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    /// What happens to the reference.
    pub outcome: Outcome,
    /// Raw paths to localize against the same owning document.
    pub transients: Vec<String>,
}

/// Cache, processor and package guard applied in order to each dependency.
pub struct ProcessingPipeline<'p> {
    cache: PathCache,
    processor: Option<&'p mut dyn DependencyProcessor>,
}

impl<'p> ProcessingPipeline<'p> {
    /// Create a pipeline with a fresh cache.
    pub fn new(processor: Option<&'p mut dyn DependencyProcessor>) -> Self {
        Self {
            cache: PathCache::new(),
            processor,
        }
    }

    /// Process `raw`, authored in `owner`.
    ///
    /// Transient dependencies are only reported the first time a key is processed, so
    /// repeated references never enqueue the same work twice.
    pub fn process(
        &mut self,
        owner: &OwningDocument,
        raw: &str,
        default: impl FnOnce() -> DependencyInfo,
    ) -> LocalizeResult<Processed> {
        let resolution = self
            .cache
            .resolve(owner, raw, default, self.processor.as_deref_mut())?;
        PackageGuard::check(owner, raw, &resolution.info)?;

        let transients = if resolution.fresh {
            resolution.info.dependencies.clone()
        } else {
            Vec::new()
        };

        let outcome = match resolution.info.asset_path() {
            None => Outcome::Dropped,
            Some(path) => Outcome::Resolved {
                asset_path: path.to_string(),
                changed: path != raw,
            },
        };

        Ok(Processed {
            outcome,
            transients,
        })
    }

    /// Number of distinct dependencies processed.
    pub fn processed(&self) -> usize {
        self.cache.len()
    }
}
