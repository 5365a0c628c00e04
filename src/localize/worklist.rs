//! Pending work of a localization run.

use std::collections::VecDeque;

/// Index of a document row in the localizer's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(pub usize);

/// Where a work item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Reference site with the given index in the owner's site list.
    Site(usize),
    /// Declared by the processor as a dependency of another path.
    Transient,
}

/// A raw asset path waiting to be processed against its owning document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Document the path was found in or declared against.
    pub owner: DocId,
    /// Path as authored or declared.
    pub raw_path: String,
    /// Reference site or transient declaration that produced the item.
    pub origin: Origin,
}

/// Unit of scheduled work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Open a document and enqueue its reference sites.
    Walk(DocId),
    /// Process one dependency.
    Resolve(WorkItem),
    /// Write a walked document with its references rewritten.
    Export(DocId),
    /// Copy a file that is not walked.
    Copy(DocId),
}

/// First-in first-out queue of tasks.
///
/// Walking a document enqueues its `Resolve` items followed by its `Export`, so every
/// site of a document is settled before the document is written.
#[derive(Debug, Default)]
pub struct LocalizationWorklist {
    queue: VecDeque<Task>,
    completed: usize,
}

impl LocalizationWorklist {
    /// Create an empty worklist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` after everything already queued.
    pub fn push(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    /// Take the next task.
    pub fn pop(&mut self) -> Option<Task> {
        let task = self.queue.pop_front()?;
        self.completed += 1;
        Some(task)
    }

    /// Tasks still queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Tasks taken so far.
    pub fn completed(&self) -> usize {
        self.completed
    }
}
