//! Storage operations
//!
//! The mutations run by the background worker: upload, save text, move and
//! delete for files and folders.
//!
//! Moves are copy-then-delete because the backend has no rename across
//! directories. They are not atomic: if the process stops, or a removal
//! fails, after the copy has been written, both the source and the copy
//! remain.

use log::{info, warn};

use crate::error::{BrokerError, StorageError, VfsError};
use crate::storage::copy::copy_recursive;
use crate::storage::deletion::remove_subtree;
use crate::storage::filesystem::StorageRoot;
use crate::storage::resolver::{
    ensure_directory, resolve_file, resolve_parent_directory, split_parent, split_path,
};
use crate::storage::validation::{validate_folder_move, validate_move, validate_target};
use crate::storage::walker::describe_subtree;

/// Creates parent directories as needed and replaces the file's content
pub async fn write_file(
    root: &StorageRoot,
    filepath: &str,
    content: &[u8],
) -> Result<(), VfsError> {
    let Some((parents, name)) = split_parent(filepath) else {
        let reason = format!("Invalid file path: {:?}", filepath);
        return Err(BrokerError::InvalidRequest(reason).into());
    };

    let dir = ensure_directory(root, &parents).await?;
    let file = dir.get_file_handle(name, true).await?;
    file.write(content).await?;

    info!("Stored {} ({} bytes)", filepath, content.len());
    Ok(())
}

/// Stores uploaded bytes at `filepath`
pub async fn upload_file(root: &StorageRoot, file: &[u8], filepath: &str) -> Result<(), VfsError> {
    write_file(root, filepath, file).await
}

/// Stores text at `filepath`
pub async fn save_text_file(
    root: &StorageRoot,
    text: &str,
    filepath: &str,
) -> Result<(), VfsError> {
    write_file(root, filepath, text.as_bytes()).await
}

/// Moves a file by copying its content and removing the source
pub async fn move_file(
    root: &StorageRoot,
    source: &str,
    destination: &str,
) -> Result<(), VfsError> {
    validate_move(source, destination)?;

    let Some(file) = resolve_file(root, source).await? else {
        return Err(StorageError::NotFound(source.to_string()).into());
    };
    let content = file.read_bytes().await?;

    write_file(root, destination, &content).await?;

    if let (Some(parent), Some((_, name))) = (
        resolve_parent_directory(root, source).await?,
        split_parent(source),
    ) {
        parent.remove_entry(name, false).await?;
    }

    info!("Moved file {} -> {}", source, destination);
    Ok(())
}

/// Moves a folder by copying its subtree, clearing it and removing it
pub async fn move_folder(
    root: &StorageRoot,
    source: &str,
    destination: &str,
    batch_step: usize,
) -> Result<(), VfsError> {
    validate_folder_move(source, destination)?;

    let Some((_, name)) = split_parent(source) else {
        return Err(BrokerError::InvalidRequest("Cannot move the storage root".into()).into());
    };
    let Some(parent) = resolve_parent_directory(root, source).await? else {
        return Err(StorageError::NotFound(source.to_string()).into());
    };
    let source_dir = parent.get_directory_handle(name, false).await?;
    let destination_dir = ensure_directory(root, &split_path(destination)).await?;

    if let Err(e) = copy_recursive(&source_dir, &destination_dir).await {
        match describe_subtree(&destination_dir).await {
            Ok(copied) => warn!(
                "Copy {} -> {} failed with {} entries at the destination: {}",
                source,
                destination,
                copied.len(),
                e
            ),
            Err(_) => warn!("Copy {} -> {} failed: {}", source, destination, e),
        }
        return Err(e.into());
    }

    remove_subtree(&source_dir, batch_step).await?;
    parent.remove_entry(name, false).await?;

    info!("Moved folder {} -> {}", source, destination);
    Ok(())
}

/// Removes a single entry from its parent
pub async fn delete_file(root: &StorageRoot, path: &str) -> Result<(), VfsError> {
    validate_target(path)?;

    let Some(parent) = resolve_parent_directory(root, path).await? else {
        return Err(StorageError::NotFound(format!("parent of {}", path)).into());
    };
    if let Some((_, name)) = split_parent(path) {
        parent.remove_entry(name, false).await?;
    }

    info!("Deleted file {}", path);
    Ok(())
}

/// Removes a folder and everything below it
pub async fn delete_folder(
    root: &StorageRoot,
    path: &str,
    batch_step: usize,
) -> Result<(), VfsError> {
    let Some((_, name)) = split_parent(path) else {
        return Err(BrokerError::InvalidRequest("Cannot delete the storage root".into()).into());
    };
    let Some(parent) = resolve_parent_directory(root, path).await? else {
        return Err(StorageError::NotFound(path.to_string()).into());
    };
    let dir = parent.get_directory_handle(name, false).await?;

    remove_subtree(&dir, batch_step).await?;
    parent.remove_entry(name, false).await?;

    info!("Deleted folder {}", path);
    Ok(())
}
