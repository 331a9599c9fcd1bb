//! Explicit-stack subtree traversal
//!
//! Produces a flattened, pre-order sequence of every node below (and
//! including) a directory. The work list lives on the heap, so arbitrarily
//! deep trees are fine.

use crate::error::StorageError;
use crate::storage::filesystem::{DirectoryHandle, StorageHandle};

/// One node produced by the walker.
///
/// `parent` is only kept so the node can later be removed through it.
#[derive(Debug, Clone)]
pub struct TraversalEntry {
    pub handle: StorageHandle,
    pub path: String,
    pub parent: Option<DirectoryHandle>,
    pub depth: usize,
}

/// Lazy, single-pass pre-order traversal. Start a new walker to go again.
pub struct TreeWalker {
    stack: Vec<(StorageHandle, String, Option<DirectoryHandle>, usize)>,
}

impl TreeWalker {
    pub fn new(root: DirectoryHandle) -> Self {
        Self {
            stack: vec![(StorageHandle::Directory(root), String::new(), None, 0)],
        }
    }

    /// Yields the next node, enumerating a directory's children as it is emitted
    pub async fn next_entry(&mut self) -> Result<Option<TraversalEntry>, StorageError> {
        let Some((handle, prefix, parent, depth)) = self.stack.pop() else {
            return Ok(None);
        };
        let path = format!("{}{}", prefix, handle.name());

        if let StorageHandle::Directory(dir) = &handle {
            let mut children = dir.entries().await?;
            while let Some(child) = children.next_entry().await? {
                self.stack
                    .push((child, format!("{}/", path), Some(dir.clone()), depth + 1));
            }
        }

        Ok(Some(TraversalEntry {
            handle,
            path,
            parent,
            depth,
        }))
    }

    /// Drains the walker into a vector
    pub async fn collect_entries(mut self) -> Result<Vec<TraversalEntry>, StorageError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry().await? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// Lists every path below `dir`, one line per node with a trailing `/` on
/// directories. Used when reporting a failed copy.
pub async fn describe_subtree(dir: &DirectoryHandle) -> Result<Vec<String>, StorageError> {
    let mut walker = TreeWalker::new(dir.clone());
    let mut lines = Vec::new();
    while let Some(entry) = walker.next_entry().await? {
        if entry.depth == 0 {
            continue;
        }
        match entry.handle {
            StorageHandle::Directory(_) => lines.push(format!("{}/", entry.path)),
            StorageHandle::File(_) => lines.push(entry.path),
        }
    }
    lines.sort();
    Ok(lines)
}
