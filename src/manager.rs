//! Storage manager
//!
//! Path-addressed front door to the sandboxed storage. Mutations are
//! validated here and then dispatched to the background worker; reads go
//! straight to the resolver and listing builder on the caller's task and may
//! observe a tree that a queued mutation is about to change.

use log::info;

use crate::broker::{
    DeletePayload, ExecutionBroker, FileWorker, MovePayload, Operation, SaveTextPayload,
    UploadPayload,
};
use crate::config::VfsConfig;
use crate::error::VfsError;
use crate::storage::resolver::{file_exists, normalize_path};
use crate::storage::validation::{validate_folder_move, validate_move, validate_target};
use crate::storage::{
    DirectoryHandle, Entry, FileHandle, StorageRoot, list_entries, render_tree, resolve_directory,
    resolve_file,
};

/// Owns the storage root and the broker in front of its worker
pub struct StorageManager {
    root: StorageRoot,
    broker: ExecutionBroker,
    listing_max_depth: usize,
}

impl StorageManager {
    /// Opens the configured storage root and starts the background worker
    pub async fn open(config: &VfsConfig) -> Result<Self, VfsError> {
        let root = StorageRoot::open(config.storage_root_path(), config.storage_limits()).await?;
        let worker = FileWorker::new(root.clone(), config.deletion_batch_step);
        let broker = ExecutionBroker::spawn(worker, config.request_timeout());

        info!(
            "Storage manager ready (timeout {:?}, batch step {}, listing depth {})",
            config.request_timeout(),
            config.deletion_batch_step,
            config.listing_max_depth
        );

        Ok(Self {
            root,
            broker,
            listing_max_depth: config.listing_max_depth,
        })
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    pub fn broker(&self) -> &ExecutionBroker {
        &self.broker
    }

    // --------------------
    // Mutations
    // --------------------

    /// Stores `file` at `filepath`, creating parent directories
    pub async fn upload(&self, file: Vec<u8>, filepath: &str) -> Result<(), VfsError> {
        validate_target(filepath)?;
        self.dispatch(Operation::Upload(UploadPayload {
            file,
            filepath: filepath.to_string(),
        }))
        .await
    }

    /// Stores `text` at `filepath`, creating parent directories
    pub async fn save_text(&self, text: &str, filepath: &str) -> Result<(), VfsError> {
        validate_target(filepath)?;
        self.dispatch(Operation::SaveText(SaveTextPayload {
            text: text.to_string(),
            filepath: filepath.to_string(),
        }))
        .await
    }

    /// Moves a file. Not atomic: an interruption can leave both copies.
    pub async fn move_file(&self, source: &str, destination: &str) -> Result<(), VfsError> {
        validate_move(source, destination)?;
        self.dispatch(Operation::MoveFile(MovePayload {
            source_path: source.to_string(),
            destination_path: destination.to_string(),
        }))
        .await
    }

    /// Moves a folder, merging it into `destination`. Not atomic: an
    /// interruption can leave both copies.
    pub async fn move_folder(&self, source: &str, destination: &str) -> Result<(), VfsError> {
        validate_folder_move(source, destination)?;
        self.dispatch(Operation::MoveFolder(MovePayload {
            source_path: source.to_string(),
            destination_path: destination.to_string(),
        }))
        .await
    }

    pub async fn delete_file(&self, path: &str) -> Result<(), VfsError> {
        validate_target(path)?;
        self.dispatch(Operation::DeleteFile(DeletePayload {
            path: path.to_string(),
        }))
        .await
    }

    /// Deletes a folder and everything below it. The root cannot be deleted.
    pub async fn delete_folder(&self, path: &str) -> Result<(), VfsError> {
        validate_target(path)?;
        self.dispatch(Operation::DeleteFolder(DeletePayload {
            path: path.to_string(),
        }))
        .await
    }

    async fn dispatch(&self, operation: Operation) -> Result<(), VfsError> {
        Ok(self.broker.dispatch(operation).await?)
    }

    // --------------------
    // Reads
    // --------------------

    pub async fn resolve_file(&self, path: &str) -> Result<Option<FileHandle>, VfsError> {
        Ok(resolve_file(&self.root, path).await?)
    }

    pub async fn resolve_directory(&self, path: &str) -> Result<Option<DirectoryHandle>, VfsError> {
        Ok(resolve_directory(&self.root, path).await?)
    }

    pub async fn file_exists(&self, path: &str) -> Result<bool, VfsError> {
        Ok(file_exists(&self.root, path).await?)
    }

    /// Whole content of the file at `path`, `None` if there is no such file
    pub async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, VfsError> {
        match self.resolve_file(path).await? {
            Some(file) => Ok(Some(file.read_bytes().await?)),
            None => Ok(None),
        }
    }

    pub async fn read_text(&self, path: &str) -> Result<Option<String>, VfsError> {
        match self.resolve_file(path).await? {
            Some(file) => Ok(Some(file.read_text().await?)),
            None => Ok(None),
        }
    }

    /// Sorted, nested listing of the directory at `path`
    pub async fn list(&self, path: &str) -> Result<Option<Vec<Entry>>, VfsError> {
        let Some(dir) = self.resolve_directory(path).await? else {
            return Ok(None);
        };
        let relative_path = normalize_path(path);
        let relative_path = relative_path.trim_end_matches('/');
        Ok(Some(
            list_entries(&dir, 0, relative_path, self.listing_max_depth).await?,
        ))
    }

    /// Indented plain-text tree of the directory at `path`
    pub async fn render_tree(&self, path: &str) -> Result<Option<String>, VfsError> {
        Ok(self.list(path).await?.map(|entries| render_tree(&entries)))
    }

    /// Rejects outstanding requests and stops the worker
    pub async fn shutdown(&self) {
        self.broker.shutdown().await;
    }
}
