//! Path resolution
//!
//! Turns slash-delimited logical paths into handles by walking from the
//! storage root one segment at a time. A missing segment is reported as
//! `None`, which callers are expected to branch on. Lookups here never
//! create anything; `ensure_directory` is the creating walk used by
//! mutations.

use log::debug;

use crate::error::StorageError;
use crate::storage::filesystem::{DirectoryHandle, FileHandle, StorageRoot};

/// Splits a logical path into its non-empty segments
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Canonical `/a/b` form of a logical path; the root is `/`
pub fn normalize_path(path: &str) -> String {
    format!("/{}", split_path(path).join("/"))
}

/// Splits a path into its parent segments and final name.
/// Returns `None` for the root.
pub fn split_parent(path: &str) -> Option<(Vec<&str>, &str)> {
    let mut segments = split_path(path);
    let name = segments.pop()?;
    Some((segments, name))
}

/// Whether `candidate` is `ancestor` itself or lies below it
pub fn is_within(ancestor: &str, candidate: &str) -> bool {
    let ancestor = split_path(ancestor);
    let candidate = split_path(candidate);
    candidate.len() >= ancestor.len() && candidate[..ancestor.len()] == ancestor[..]
}

/// Lookup outcomes that mean "nothing usable at this path"
fn is_absent(err: &StorageError) -> bool {
    matches!(
        err,
        StorageError::NotFound(_) | StorageError::TypeMismatch(_) | StorageError::InvalidName(_)
    )
}

/// Walks the given segments from `start` without creating anything
async fn walk_directories(
    start: &DirectoryHandle,
    segments: &[&str],
) -> Result<Option<DirectoryHandle>, StorageError> {
    let mut current = start.clone();
    for segment in segments {
        match current.get_directory_handle(segment, false).await {
            Ok(next) => current = next,
            Err(e) if is_absent(&e) => {
                debug!("Path segment {} not found: {}", segment, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(Some(current))
}

/// Resolves a directory path. The empty path and `/` resolve to the root.
pub async fn resolve_directory(
    root: &StorageRoot,
    path: &str,
) -> Result<Option<DirectoryHandle>, StorageError> {
    walk_directories(root.directory(), &split_path(path)).await
}

/// Resolves the directory that contains the entry named by `path`
pub async fn resolve_parent_directory(
    root: &StorageRoot,
    path: &str,
) -> Result<Option<DirectoryHandle>, StorageError> {
    match split_parent(path) {
        Some((parents, _)) => walk_directories(root.directory(), &parents).await,
        None => Ok(None),
    }
}

/// Resolves a file path
pub async fn resolve_file(
    root: &StorageRoot,
    path: &str,
) -> Result<Option<FileHandle>, StorageError> {
    let Some((parents, name)) = split_parent(path) else {
        return Ok(None);
    };
    let Some(parent) = walk_directories(root.directory(), &parents).await? else {
        return Ok(None);
    };

    match parent.get_file_handle(name, false).await {
        Ok(file) => Ok(Some(file)),
        Err(e) if is_absent(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Whether a file exists at `path`
pub async fn file_exists(root: &StorageRoot, path: &str) -> Result<bool, StorageError> {
    Ok(resolve_file(root, path).await?.is_some())
}

/// Walks the given segments from the root, creating missing directories
pub async fn ensure_directory(
    root: &StorageRoot,
    segments: &[&str],
) -> Result<DirectoryHandle, StorageError> {
    let mut current = root.directory().clone();
    for segment in segments {
        current = current.get_directory_handle(segment, true).await?;
    }
    Ok(current)
}
