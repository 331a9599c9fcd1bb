//! Line-oriented shell over the storage manager
//!
//! Handles command parsing, execution, and the read loop.

pub mod commands;
pub mod handlers;
pub mod session;

pub use commands::{Command, CommandResult, CommandStatus, parse_command};
pub use handlers::handle_command;
pub use session::run_session;
