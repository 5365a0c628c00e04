//! The localization engine.
//!
//! A run walks the dependency graph of a root document through a FIFO worklist. Every
//! reference is passed once through the [`ProcessingPipeline`] (path cache, user
//! processor, package guard) before its target is placed, walked or copied, and each
//! document is exported after its own references are settled.

mod cache;
mod guard;
mod install;
mod localizer;
mod pipeline;
mod worklist;

pub use cache::{CacheKey, PathCache, Resolution};
pub use guard::PackageGuard;
pub use install::install_file;
pub use localizer::{LocalizeSummary, Localizer, localize, localize_with_config};
pub use pipeline::{DependencyProcessor, Outcome, Processed, ProcessingPipeline};
pub use worklist::{DocId, LocalizationWorklist, Origin, Task, WorkItem};
