//! Handle-based storage primitives
//!
//! The sandboxed storage root only understands one level at a time: a
//! directory handle can enumerate its immediate children, look up or create
//! a child by name and remove a child by name. File handles read and
//! overwrite whole contents. Everything tree-wide is built on top of these
//! calls elsewhere in the crate.
//!
//! Handles never expose where they live on disk. Child names are validated
//! on every lookup, so no handle can reach outside the root.

use log::{debug, info};
use serde::Serialize;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs::{self, OpenOptions, ReadDir};

use crate::error::StorageError;

/// Suffix of the sibling file a write goes through before it replaces the target
const SWAP_SUFFIX: &str = ".crswap";

/// Limits imposed by the backend on individual primitive calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageLimits {
    /// Maximum number of entries (the entry itself plus descendants) a single
    /// recursive `remove_entry` call may take
    pub max_removal_entries: Option<usize>,
}

/// Kind of a node in the storage tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// The single entry point into the sandboxed hierarchy
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: DirectoryHandle,
}

impl StorageRoot {
    /// Opens the storage root backed by `path`, creating the directory if needed
    pub async fn open(path: impl AsRef<Path>, limits: StorageLimits) -> Result<Self, StorageError> {
        let path = path.as_ref();
        fs::create_dir_all(path).await?;
        let real = fs::canonicalize(path).await?;

        info!(
            "Opened storage root at {} (removal limit: {:?})",
            real.display(),
            limits.max_removal_entries
        );

        Ok(Self {
            root: DirectoryHandle {
                name: String::new(),
                real,
                limits,
            },
        })
    }

    /// Handle to the root directory
    pub fn directory(&self) -> &DirectoryHandle {
        &self.root
    }
}

/// Opaque reference to a directory node
#[derive(Debug, Clone)]
pub struct DirectoryHandle {
    name: String,
    real: PathBuf,
    limits: StorageLimits,
}

/// Opaque reference to a file node
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    real: PathBuf,
}

/// Either kind of handle, as yielded by directory enumeration
#[derive(Debug, Clone)]
pub enum StorageHandle {
    File(FileHandle),
    Directory(DirectoryHandle),
}

impl StorageHandle {
    pub fn name(&self) -> &str {
        match self {
            StorageHandle::File(file) => file.name(),
            StorageHandle::Directory(dir) => dir.name(),
        }
    }
}

/// Metadata snapshot of a file, read without touching its content
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub name: String,
    pub size: u64,
    pub mime_type: Option<String>,
    /// Milliseconds since the Unix epoch
    pub last_modified: Option<u64>,
}

/// Validates a single child name
fn validate_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
        || name.ends_with(SWAP_SUFFIX);

    if invalid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Entries that enumeration never yields
fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_none_or(|name| name.ends_with(SWAP_SUFFIX))
}

fn is_not_found(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound
}

impl DirectoryHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn child_directory(&self, name: &str) -> DirectoryHandle {
        DirectoryHandle {
            name: name.to_string(),
            real: self.real.join(name),
            limits: self.limits,
        }
    }

    fn child_file(&self, name: &str) -> FileHandle {
        FileHandle {
            name: name.to_string(),
            real: self.real.join(name),
        }
    }

    /// Looks up a child directory, creating it when `create` is set
    pub async fn get_directory_handle(
        &self,
        name: &str,
        create: bool,
    ) -> Result<DirectoryHandle, StorageError> {
        validate_name(name)?;
        let real = self.real.join(name);

        match fs::symlink_metadata(&real).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StorageError::TypeMismatch(name.to_string())),
            Err(e) if is_not_found(&e) => {
                if !create {
                    return Err(StorageError::NotFound(name.to_string()));
                }
                match fs::create_dir(&real).await {
                    Ok(()) => debug!("Created directory {}", name),
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        }

        Ok(self.child_directory(name))
    }

    /// Looks up a child file, creating an empty one when `create` is set
    pub async fn get_file_handle(
        &self,
        name: &str,
        create: bool,
    ) -> Result<FileHandle, StorageError> {
        validate_name(name)?;
        let real = self.real.join(name);

        match fs::symlink_metadata(&real).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(StorageError::TypeMismatch(name.to_string())),
            Err(e) if is_not_found(&e) => {
                if !create {
                    return Err(StorageError::NotFound(name.to_string()));
                }
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&real)
                    .await?;
                debug!("Created file {}", name);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(self.child_file(name))
    }

    /// Removes a child entry. Non-empty directories need `recursive`.
    pub async fn remove_entry(&self, name: &str, recursive: bool) -> Result<(), StorageError> {
        validate_name(name)?;
        let real = self.real.join(name);

        let meta = match fs::symlink_metadata(&real).await {
            Ok(meta) => meta,
            Err(e) if is_not_found(&e) => return Err(StorageError::NotFound(name.to_string())),
            Err(e) => return Err(e.into()),
        };

        if !meta.is_dir() {
            fs::remove_file(&real).await?;
            return Ok(());
        }

        if !recursive {
            // Hidden leftovers (stale swap files, undecodable names) never
            // block removal since no handle can reach them
            let mut children = fs::read_dir(&real).await?;
            let mut hidden = 0;
            while let Some(child) = children.next_entry().await? {
                if !is_hidden(&child.file_name()) {
                    return Err(StorageError::NotEmpty(name.to_string()));
                }
                hidden += 1;
            }
            if hidden > 0 {
                debug!("Discarding {} hidden entries in {}", hidden, name);
                fs::remove_dir_all(&real).await?;
            } else {
                fs::remove_dir(&real).await?;
            }
            return Ok(());
        }

        if let Some(limit) = self.limits.max_removal_entries {
            let entries = count_entries(&real, limit).await?;
            if entries > limit {
                return Err(StorageError::RemovalLimitExceeded {
                    name: name.to_string(),
                    entries,
                    limit,
                });
            }
        }

        fs::remove_dir_all(&real).await?;
        Ok(())
    }

    /// Starts an enumeration of the immediate children
    pub async fn entries(&self) -> Result<DirectoryEntries, StorageError> {
        let read_dir = fs::read_dir(&self.real).await?;
        Ok(DirectoryEntries {
            read_dir,
            limits: self.limits,
        })
    }

    /// Collects the immediate children into a vector
    pub async fn children(&self) -> Result<Vec<StorageHandle>, StorageError> {
        let mut entries = self.entries().await?;
        let mut children = Vec::new();
        while let Some(handle) = entries.next_entry().await? {
            children.push(handle);
        }
        Ok(children)
    }
}

/// Counts a directory and its descendants, giving up once `limit` is exceeded
async fn count_entries(real: &Path, limit: usize) -> Result<usize, StorageError> {
    let mut count = 1;
    let mut stack = vec![real.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut read_dir = fs::read_dir(&dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            count += 1;
            if count > limit {
                return Ok(count);
            }
            if entry.file_type().await?.is_dir() {
                stack.push(entry.path());
            }
        }
    }

    Ok(count)
}

/// Async, single-pass enumeration of one directory's children
pub struct DirectoryEntries {
    read_dir: ReadDir,
    limits: StorageLimits,
}

impl DirectoryEntries {
    /// Yields the next child, skipping swap files and anything that is
    /// neither a plain file nor a directory
    pub async fn next_entry(&mut self) -> Result<Option<StorageHandle>, StorageError> {
        while let Some(entry) = self.read_dir.next_entry().await? {
            let raw = entry.file_name();
            if is_hidden(&raw) {
                debug!("Skipping hidden entry {:?}", raw);
                continue;
            }
            let Some(name) = raw.to_str().map(str::to_string) else {
                continue;
            };

            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                return Ok(Some(StorageHandle::Directory(DirectoryHandle {
                    name,
                    real: entry.path(),
                    limits: self.limits,
                })));
            }
            if file_type.is_file() {
                return Ok(Some(StorageHandle::File(FileHandle {
                    name,
                    real: entry.path(),
                })));
            }
        }
        Ok(None)
    }
}

impl FileHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads metadata only
    pub async fn get_file(&self) -> Result<FileSnapshot, StorageError> {
        let meta = fs::symlink_metadata(&self.real).await?;

        let last_modified = meta
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|dur| dur.as_millis() as u64);

        Ok(FileSnapshot {
            name: self.name.clone(),
            size: meta.len(),
            mime_type: mime_guess::from_path(&self.name)
                .first()
                .map(|mime| mime.to_string()),
            last_modified,
        })
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(&self.real).await?)
    }

    pub async fn read_text(&self) -> Result<String, StorageError> {
        let bytes = self.read_bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Replaces the whole content. Data goes to a swap sibling first and is
    /// renamed over the target, so readers see either the old or the new
    /// content.
    pub async fn write(&self, content: &[u8]) -> Result<(), StorageError> {
        let swap = self
            .real
            .with_file_name(format!(".{}{}", self.name, SWAP_SUFFIX));

        if let Err(e) = fs::write(&swap, content).await {
            let _ = fs::remove_file(&swap).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&swap, &self.real).await {
            let _ = fs::remove_file(&swap).await;
            return Err(e.into());
        }

        debug!("Wrote {} bytes to {}", content.len(), self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_root(limits: StorageLimits) -> (tempfile::TempDir, StorageRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::open(dir.path(), limits).await.unwrap();
        (dir, root)
    }

    #[test]
    fn names_that_escape_or_collide_are_rejected() {
        for name in ["", ".", "..", "a/b", "a\\b", "nul\0", "x.crswap"] {
            assert!(validate_name(name).is_err(), "{:?} should be invalid", name);
        }
        assert!(validate_name("notes.txt").is_ok());
        assert!(validate_name(".hidden").is_ok());
    }

    #[tokio::test]
    async fn lookup_without_create_reports_not_found() {
        let (_dir, root) = temp_root(StorageLimits::default()).await;
        let result = root.directory().get_directory_handle("missing", false).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn lookup_of_wrong_kind_is_a_type_mismatch() {
        let (_dir, root) = temp_root(StorageLimits::default()).await;
        root.directory().get_file_handle("a", true).await.unwrap();
        let result = root.directory().get_directory_handle("a", false).await;
        assert!(matches!(result, Err(StorageError::TypeMismatch(_))));
    }

    #[tokio::test]
    async fn write_replaces_content_and_hides_swap_file() {
        let (_dir, root) = temp_root(StorageLimits::default()).await;
        let file = root.directory().get_file_handle("notes.txt", true).await.unwrap();
        file.write(b"first version, longer").await.unwrap();
        file.write(b"second").await.unwrap();

        assert_eq!(file.read_text().await.unwrap(), "second");
        let snapshot = file.get_file().await.unwrap();
        assert_eq!(snapshot.size, 6);
        assert_eq!(snapshot.mime_type.as_deref(), Some("text/plain"));

        let children = root.directory().children().await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "notes.txt");
    }

    #[tokio::test]
    async fn non_recursive_removal_refuses_full_directory() {
        let (_dir, root) = temp_root(StorageLimits::default()).await;
        let sub = root.directory().get_directory_handle("sub", true).await.unwrap();
        sub.get_file_handle("f", true).await.unwrap();

        let result = root.directory().remove_entry("sub", false).await;
        assert!(matches!(result, Err(StorageError::NotEmpty(_))));

        root.directory().remove_entry("sub", true).await.unwrap();
        assert!(root.directory().children().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_swap_file_does_not_block_removal() {
        let (dir, root) = temp_root(StorageLimits::default()).await;
        root.directory().get_directory_handle("sub", true).await.unwrap();
        std::fs::write(dir.path().join("sub").join(".f.crswap"), b"partial").unwrap();

        let sub = root.directory().get_directory_handle("sub", false).await.unwrap();
        assert!(sub.children().await.unwrap().is_empty());

        root.directory().remove_entry("sub", false).await.unwrap();
        assert!(!dir.path().join("sub").exists());
    }

    #[tokio::test]
    async fn recursive_removal_honours_entry_ceiling() {
        let limits = StorageLimits {
            max_removal_entries: Some(3),
        };
        let (_dir, root) = temp_root(limits).await;
        let sub = root.directory().get_directory_handle("sub", true).await.unwrap();
        for name in ["a", "b", "c"] {
            sub.get_file_handle(name, true).await.unwrap();
        }

        let result = root.directory().remove_entry("sub", true).await;
        assert!(matches!(
            result,
            Err(StorageError::RemovalLimitExceeded { limit: 3, .. })
        ));
        assert_eq!(sub.children().await.unwrap().len(), 3);

        sub.remove_entry("a", false).await.unwrap();
        sub.remove_entry("b", false).await.unwrap();
        root.directory().remove_entry("sub", true).await.unwrap();
    }
}
