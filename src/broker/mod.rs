//! Execution broker
//!
//! Moves storage mutations off the caller's task onto a single background
//! worker and reports their outcome through correlation ids.

pub mod dispatch;
pub mod protocol;
pub mod registry;
pub mod worker;

// Re-export key types
pub use dispatch::{DEFAULT_REQUEST_TIMEOUT, ExecutionBroker};
pub use protocol::{
    DeletePayload, MovePayload, Operation, Request, Response, SaveTextPayload, UploadPayload,
};
pub use registry::PendingRegistry;
pub use worker::FileWorker;
