//! Recursive copy between two directory handles

use log::debug;
use std::future::Future;
use std::pin::Pin;

use crate::error::StorageError;
use crate::storage::filesystem::{DirectoryHandle, StorageHandle};

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Copies every descendant of `source` into `destination`.
///
/// Directories are created on demand and files of the same name are
/// overwritten. The first failure aborts the copy; whatever was already
/// written stays in place.
pub fn copy_recursive<'a>(
    source: &'a DirectoryHandle,
    destination: &'a DirectoryHandle,
) -> BoxFuture<'a, Result<(), StorageError>> {
    Box::pin(async move {
        let mut children = source.entries().await?;
        while let Some(child) = children.next_entry().await? {
            match child {
                StorageHandle::File(file) => {
                    let content = file.read_bytes().await?;
                    let target = destination.get_file_handle(file.name(), true).await?;
                    target.write(&content).await?;
                    debug!("Copied file {} ({} bytes)", file.name(), content.len());
                }
                StorageHandle::Directory(dir) => {
                    let target = destination.get_directory_handle(dir.name(), true).await?;
                    copy_recursive(&dir, &target).await?;
                }
            }
        }
        Ok(())
    })
}
