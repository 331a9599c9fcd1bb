pub mod broker;
pub mod config;
pub mod error;
pub mod manager;
pub mod shell;
pub mod storage;
pub mod utils;

pub use config::VfsConfig;
pub use manager::StorageManager;
