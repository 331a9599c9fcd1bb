//! Batched subtree deletion
//!
//! The backend caps how many entries a single recursive removal may take, so
//! a subtree is removed in passes. Every node is first collected with its
//! depth and parent, then nodes are removed level by level from the deepest
//! level upwards, `batch_step` levels apart, finishing with the direct
//! children of the directory. Each removal takes at most the `batch_step`
//! levels below it that earlier passes have not already cleared.

use log::{debug, info};
use std::collections::BTreeMap;

use crate::error::StorageError;
use crate::storage::filesystem::DirectoryHandle;
use crate::storage::walker::TreeWalker;

/// Depth distance between deletion passes
pub const DELETION_BATCH_STEP: usize = 500;

/// Depths visited by the deletion passes, deepest first, always ending at 1
pub fn deletion_levels(max_depth: usize, batch_step: usize) -> Vec<usize> {
    let step = batch_step.max(1);
    let mut levels = Vec::new();
    let mut level = max_depth;
    while level > 1 {
        levels.push(level);
        level = level.saturating_sub(step);
    }
    if max_depth >= 1 {
        levels.push(1);
    }
    levels
}

/// Deletes every descendant of `dir`. Removing `dir` itself is left to the
/// caller, which holds its parent.
pub async fn remove_subtree(dir: &DirectoryHandle, batch_step: usize) -> Result<(), StorageError> {
    let entries = TreeWalker::new(dir.clone()).collect_entries().await?;

    let mut by_depth: BTreeMap<usize, Vec<(DirectoryHandle, String)>> = BTreeMap::new();
    for entry in entries {
        if let Some(parent) = entry.parent {
            by_depth
                .entry(entry.depth)
                .or_default()
                .push((parent, entry.handle.name().to_string()));
        }
    }

    let max_depth = by_depth.keys().next_back().copied().unwrap_or(0);
    let levels = deletion_levels(max_depth, batch_step);
    debug!(
        "Removing subtree of {:?}: max depth {}, passes at {:?}",
        dir.name(),
        max_depth,
        levels
    );

    let mut removed = 0;
    for level in levels {
        let Some(nodes) = by_depth.get(&level) else {
            continue;
        };
        for (parent, name) in nodes {
            parent.remove_entry(name, true).await?;
            removed += 1;
        }
    }

    info!(
        "Cleared directory {:?} with {} removal calls",
        dir.name(),
        removed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::filesystem::{StorageLimits, StorageRoot};
    use crate::storage::resolver::ensure_directory;

    #[test]
    fn levels_step_down_and_end_at_one() {
        assert_eq!(deletion_levels(1200, 500), vec![1200, 700, 200, 1]);
        assert_eq!(deletion_levels(501, 500), vec![501, 1]);
        assert_eq!(deletion_levels(3, 500), vec![3, 1]);
        assert_eq!(deletion_levels(1, 500), vec![1]);
        assert!(deletion_levels(0, 500).is_empty());
    }

    #[test]
    fn levels_do_not_repeat_depth_one() {
        assert_eq!(deletion_levels(5, 2), vec![5, 3, 1]);
        assert_eq!(deletion_levels(4, 2), vec![4, 2, 1]);
    }

    #[tokio::test]
    async fn wide_and_deep_tree_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::open(dir.path(), StorageLimits::default())
            .await
            .unwrap();
        let target = ensure_directory(&root, &["target"]).await.unwrap();
        for branch in ["a", "b", "c"] {
            let leaf = ensure_directory(&root, &["target", branch, "x", "y"])
                .await
                .unwrap();
            leaf.get_file_handle("f.txt", true).await.unwrap();
        }
        target.get_file_handle("top.txt", true).await.unwrap();

        remove_subtree(&target, 2).await.unwrap();

        assert!(target.children().await.unwrap().is_empty());
        root.directory().remove_entry("target", false).await.unwrap();
    }

    #[tokio::test]
    async fn passes_keep_each_removal_under_the_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let limits = StorageLimits {
            max_removal_entries: Some(4),
        };
        let root = StorageRoot::open(dir.path(), limits).await.unwrap();
        let segments = vec!["n"; 10];
        ensure_directory(&root, &segments).await.unwrap();

        let top = root.directory().get_directory_handle("n", false).await.unwrap();
        assert!(matches!(
            root.directory().remove_entry("n", true).await,
            Err(StorageError::RemovalLimitExceeded { .. })
        ));

        remove_subtree(&top, 3).await.unwrap();
        assert!(top.children().await.unwrap().is_empty());
    }
}
