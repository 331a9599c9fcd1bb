//! Directory listings for presentation
//!
//! Builds a nested, sorted metadata snapshot of a subtree. Recursion is
//! bounded: past `max_depth` a directory reports no children instead of
//! failing, so pathological trees still produce a usable (partial) listing.

use serde::Serialize;
use std::cmp::Ordering;

use crate::error::StorageError;
use crate::storage::copy::BoxFuture;
use crate::storage::filesystem::{DirectoryHandle, EntryKind, StorageHandle};

/// Recursion ceiling for listings
pub const MAX_LISTING_DEPTH: usize = 100;

/// Metadata projection of a storage node
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<u64>,
    pub relative_path: String,
    /// Children ordered directories first, then by name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Entry>>,
}

impl Entry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Looks up a direct child by name
    pub fn child(&self, name: &str) -> Option<&Entry> {
        self.children
            .as_ref()
            .and_then(|children| children.iter().find(|child| child.name == name))
    }
}

/// Directories before files, then case-insensitive name order. Names equal
/// up to case put the lowercase spelling first.
pub fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    match (a.is_directory(), b.is_directory()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| b.name.cmp(&a.name)),
    }
}

/// Lists the children of `dir`. `depth` is the level of `dir` itself and
/// `relative_path` its logical path (empty for the root).
pub fn list_entries<'a>(
    dir: &'a DirectoryHandle,
    depth: usize,
    relative_path: &'a str,
    max_depth: usize,
) -> BoxFuture<'a, Result<Vec<Entry>, StorageError>> {
    Box::pin(async move {
        if depth >= max_depth {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut children = dir.entries().await?;
        while let Some(child) = children.next_entry().await? {
            let nested_path = format!("{}/{}", relative_path, child.name());
            let entry = match child {
                StorageHandle::File(file) => {
                    let snapshot = file.get_file().await?;
                    Entry {
                        name: snapshot.name,
                        kind: EntryKind::File,
                        size: Some(snapshot.size),
                        mime_type: snapshot.mime_type,
                        modified_at: snapshot.last_modified,
                        relative_path: nested_path,
                        children: None,
                    }
                }
                StorageHandle::Directory(sub) => {
                    let nested = list_entries(&sub, depth + 1, &nested_path, max_depth).await?;
                    Entry {
                        name: sub.name().to_string(),
                        kind: EntryKind::Directory,
                        size: None,
                        mime_type: None,
                        modified_at: None,
                        relative_path: nested_path,
                        children: Some(nested),
                    }
                }
            };
            entries.push(entry);
        }

        entries.sort_by(compare_entries);
        Ok(entries)
    })
}

/// Plain-text tree dump, four spaces of indent per level and a trailing `/`
/// on directories
pub fn render_tree(entries: &[Entry]) -> String {
    fn render(entries: &[Entry], level: usize, out: &mut String) {
        for entry in entries {
            let indent = "    ".repeat(level);
            if entry.is_directory() {
                out.push_str(&format!("{}{}/\n", indent, entry.name));
                if let Some(children) = &entry.children {
                    render(children, level + 1, out);
                }
            } else {
                out.push_str(&format!("{}{}\n", indent, entry.name));
            }
        }
    }

    let mut out = String::new();
    render(entries, 1, &mut out);
    out
}
