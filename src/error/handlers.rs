//! Error handlers
//!
//! Provides error reporting helpers for the shell front end.

use crate::error::types::{BrokerError, VfsError};
use log::{error, warn};

/// Log a storage manager error at a level matching its severity
pub fn handle_error(err: &VfsError) {
    match err {
        VfsError::Broker(BrokerError::InvalidRequest(_)) => warn!("Rejected request: {}", err),
        _ => error!("Storage manager error: {}", err),
    }
}

/// Convert error to a short status label shown by the shell
pub fn error_to_status(err: &VfsError) -> &'static str {
    match err {
        VfsError::Storage(_) => "ERR-STORAGE",
        VfsError::Broker(BrokerError::InvalidRequest(_)) => "ERR-INVALID",
        VfsError::Broker(BrokerError::OperationFailed(_)) => "ERR-FAILED",
        VfsError::Broker(BrokerError::Timeout { .. }) => "ERR-TIMEOUT",
        VfsError::Broker(BrokerError::Disconnected | BrokerError::ShuttingDown) => "ERR-WORKER",
        VfsError::Config(_) => "ERR-CONFIG",
        VfsError::IoError(_) => "ERR-IO",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn timeout_maps_to_its_own_status() {
        let err = VfsError::Broker(BrokerError::Timeout {
            id: "7".into(),
            waited: Duration::from_secs(30),
        });
        assert_eq!(error_to_status(&err), "ERR-TIMEOUT");
    }
}
