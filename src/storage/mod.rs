//! Sandboxed storage
//!
//! Handle-based primitives plus the tree-wide operations built on them:
//! path resolution, traversal, recursive copy, batched deletion and listing.

pub mod copy;
pub mod deletion;
pub mod filesystem;
pub mod listing;
pub mod operations;
pub mod resolver;
pub mod validation;
pub mod walker;

// Re-export commonly used types
pub use deletion::{DELETION_BATCH_STEP, remove_subtree};
pub use filesystem::{
    DirectoryHandle, EntryKind, FileHandle, FileSnapshot, StorageHandle, StorageLimits,
    StorageRoot,
};
pub use listing::{Entry, MAX_LISTING_DEPTH, list_entries, render_tree};
pub use resolver::{resolve_directory, resolve_file, resolve_parent_directory};
pub use walker::{TraversalEntry, TreeWalker};
