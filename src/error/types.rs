//! Error types
//!
//! Defines domain-specific error types for each layer of the storage manager.

use std::fmt;
use std::io;
use std::time::Duration;

/// Storage primitive errors
#[derive(Debug)]
pub enum StorageError {
    InvalidName(String),
    NotFound(String),
    TypeMismatch(String),
    NotEmpty(String),
    RemovalLimitExceeded {
        name: String,
        entries: usize,
        limit: usize,
    },
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidName(n) => write!(f, "Invalid entry name: {:?}", n),
            StorageError::NotFound(n) => write!(f, "Entry not found: {}", n),
            StorageError::TypeMismatch(n) => write!(f, "Entry has the wrong kind: {}", n),
            StorageError::NotEmpty(n) => write!(f, "Directory not empty: {}", n),
            StorageError::RemovalLimitExceeded {
                name,
                entries,
                limit,
            } => write!(
                f,
                "Cannot remove {}: {} entries exceed the removal limit of {}",
                name, entries, limit
            ),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// Execution broker errors
#[derive(Debug)]
pub enum BrokerError {
    InvalidRequest(String),
    OperationFailed(String),
    Timeout { id: String, waited: Duration },
    Disconnected,
    ShuttingDown,
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            BrokerError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            BrokerError::Timeout { id, waited } => write!(
                f,
                "Request {} timed out after {:.1}s",
                id,
                waited.as_secs_f64()
            ),
            BrokerError::Disconnected => write!(f, "Background worker is not running"),
            BrokerError::ShuttingDown => write!(f, "Broker is shutting down"),
        }
    }
}

impl std::error::Error for BrokerError {}

/// General error that encompasses all error types
#[derive(Debug)]
pub enum VfsError {
    Storage(StorageError),
    Broker(BrokerError),
    Config(String),
    IoError(io::Error),
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::Storage(e) => write!(f, "Storage error: {}", e),
            VfsError::Broker(e) => write!(f, "{}", e),
            VfsError::Config(e) => write!(f, "Configuration error: {}", e),
            VfsError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for VfsError {}

impl From<StorageError> for VfsError {
    fn from(error: StorageError) -> Self {
        VfsError::Storage(error)
    }
}

impl From<BrokerError> for VfsError {
    fn from(error: BrokerError) -> Self {
        VfsError::Broker(error)
    }
}

impl From<config::ConfigError> for VfsError {
    fn from(error: config::ConfigError) -> Self {
        VfsError::Config(error.to_string())
    }
}

impl From<io::Error> for VfsError {
    fn from(error: io::Error) -> Self {
        VfsError::IoError(error)
    }
}
