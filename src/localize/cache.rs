//! Run-scoped memo of processed dependencies.

use std::collections::HashMap;

use crate::error::{LocalizeError, LocalizeResult};
use crate::localize::pipeline::DependencyProcessor;
use crate::models::{DependencyInfo, Location, OwningDocument};

/// Identity of a dependency: the owning document and the path as authored in it.
pub type CacheKey = (Location, String);

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Processed dependency.
    pub info: DependencyInfo,
    /// `true` only for the lookup that ran the processor.
    pub fresh: bool,
}

/// Memoizes processed dependencies so the processor runs once per [`CacheKey`].
#[derive(Debug, Default)]
pub struct PathCache {
    entries: HashMap<CacheKey, DependencyInfo>,
}

impl PathCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Processed form of `raw` as authored in `owner`.
    ///
    /// On a miss `default` builds the unprocessed info, the processor (if any) transforms
    /// it, and the result is stored. Hits return the stored info without calling either.
    pub fn resolve<P>(
        &mut self,
        owner: &OwningDocument,
        raw: &str,
        default: impl FnOnce() -> DependencyInfo,
        processor: Option<&mut P>,
    ) -> LocalizeResult<Resolution>
    where
        P: DependencyProcessor + ?Sized,
    {
        let key = (owner.location().clone(), raw.to_string());
        if let Some(info) = self.entries.get(&key) {
            return Ok(Resolution {
                info: info.clone(),
                fresh: false,
            });
        }

        let info = default();
        let info = match processor {
            Some(processor) => processor
                .process(owner, info)
                .map_err(LocalizeError::Callback)?,
            None => info,
        };
        tracing::debug!("processed '{}' in {} -> {:?}", raw, owner.location(), info.asset_path);

        self.entries.insert(key, info.clone());
        Ok(Resolution { info, fresh: true })
    }

    /// Number of distinct keys processed so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been processed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
