//! Request validation
//!
//! Guards that reject a mutation before any storage call is issued.

use crate::error::BrokerError;
use crate::storage::resolver::{is_within, normalize_path, split_path};

/// A write or delete target must name an entry below the root
pub fn validate_target(path: &str) -> Result<(), BrokerError> {
    if split_path(path).is_empty() {
        return Err(BrokerError::InvalidRequest(format!(
            "Path does not name an entry: {:?}",
            path
        )));
    }
    Ok(())
}

/// Checks shared by file and folder moves
pub fn validate_move(source: &str, destination: &str) -> Result<(), BrokerError> {
    if source.trim().is_empty() {
        return Err(BrokerError::InvalidRequest("Source path is blank".into()));
    }
    if normalize_path(source) == normalize_path(destination) {
        return Err(BrokerError::InvalidRequest(format!(
            "Paths are the same: {} not moved",
            source
        )));
    }
    validate_target(source)?;
    validate_target(destination)
}

/// Folder moves additionally may not nest source and destination, since the
/// copy would then read what it writes or the final delete would remove the
/// copy.
pub fn validate_folder_move(source: &str, destination: &str) -> Result<(), BrokerError> {
    validate_move(source, destination)?;
    if is_within(source, destination) || is_within(destination, source) {
        return Err(BrokerError::InvalidRequest(format!(
            "Cannot move {} into {}: the paths overlap",
            source, destination
        )));
    }
    Ok(())
}
