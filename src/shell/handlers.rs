//! Module `handlers`
//!
//! Executes parsed shell commands against the storage manager.

use log::info;

use crate::error::VfsError;
use crate::error::handlers::{error_to_status, handle_error};
use crate::manager::StorageManager;
use crate::shell::commands::{Command, CommandResult, CommandStatus};

const HELP_TEXT: &str = "\
Commands:
  UPLOAD <local-file> <path>   copy a local file into storage
  SAVE <path> <text...>        store text at path
  CAT <path>                   print a file
  EXISTS <path>                check whether a file exists
  LIST [path]                  JSON listing of a directory
  TREE [path]                  indented listing of a directory
  MVFILE <source> <dest>       move a file
  MVDIR <source> <dest>        move a folder, merging into dest
  DEL <path>                   delete a file
  RMDIR <path>                 delete a folder and its contents
  HELP                         show this text
  QUIT                         leave the shell
";

/// Runs one command and renders its outcome as shell output
pub async fn handle_command(manager: &StorageManager, command: &Command) -> CommandResult {
    match command {
        Command::QUIT => CommandResult {
            status: CommandStatus::CloseSession,
            message: Some("Bye\n".into()),
        },
        Command::HELP => CommandResult::success(HELP_TEXT),
        Command::UNKNOWN => {
            CommandResult::failure("unknown", "ERR-SYNTAX Unknown command, try HELP\n")
        }
        Command::LIST(path) => handle_list(manager, path).await,
        Command::TREE(path) => match manager.render_tree(path).await {
            Ok(Some(tree)) if tree.is_empty() => CommandResult::success("(empty)\n"),
            Ok(Some(tree)) => CommandResult::success(tree),
            Ok(None) => not_a_directory(path),
            Err(e) => report(e),
        },
        Command::CAT(path) => match manager.read_text(path).await {
            Ok(Some(mut text)) => {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                CommandResult::success(text)
            }
            Ok(None) => {
                CommandResult::failure("missing", format!("ERR-MISSING No file at {}\n", path))
            }
            Err(e) => report(e),
        },
        Command::EXISTS(path) => match manager.file_exists(path).await {
            Ok(exists) => CommandResult::success(format!("{}\n", exists)),
            Err(e) => report(e),
        },
        Command::UPLOAD { local, path } => {
            let bytes = match tokio::fs::read(local).await {
                Ok(bytes) => bytes,
                Err(e) => return report(VfsError::IoError(e)),
            };
            let size = bytes.len();
            outcome(
                manager.upload(bytes, path).await,
                format!("Uploaded {} bytes to {}", size, path),
            )
        }
        Command::SAVE { path, text } => outcome(
            manager.save_text(text, path).await,
            format!("Saved {}", path),
        ),
        Command::MVFILE { source, dest } => outcome(
            manager.move_file(source, dest).await,
            format!("Moved {} to {}", source, dest),
        ),
        Command::MVDIR { source, dest } => outcome(
            manager.move_folder(source, dest).await,
            format!("Moved {} to {}", source, dest),
        ),
        Command::DEL(path) => outcome(manager.delete_file(path).await, format!("Deleted {}", path)),
        Command::RMDIR(path) => outcome(
            manager.delete_folder(path).await,
            format!("Deleted {}", path),
        ),
    }
}

async fn handle_list(manager: &StorageManager, path: &str) -> CommandResult {
    let entries = match manager.list(path).await {
        Ok(Some(entries)) => entries,
        Ok(None) => return not_a_directory(path),
        Err(e) => return report(e),
    };

    match serde_json::to_string_pretty(&entries) {
        Ok(json) => CommandResult::success(json + "\n"),
        Err(e) => CommandResult::failure("encode", format!("ERR-ENCODE {}\n", e)),
    }
}

fn outcome(result: Result<(), VfsError>, done: String) -> CommandResult {
    match result {
        Ok(()) => {
            info!("{}", done);
            CommandResult::success(format!("OK {}\n", done))
        }
        Err(e) => report(e),
    }
}

fn report(err: VfsError) -> CommandResult {
    handle_error(&err);
    let status = error_to_status(&err);
    CommandResult::failure(status, format!("{} {}\n", status, err))
}

fn not_a_directory(path: &str) -> CommandResult {
    CommandResult::failure("missing", format!("ERR-MISSING No directory at {}\n", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VfsConfig;

    async fn manager() -> (tempfile::TempDir, StorageManager) {
        let dir = tempfile::tempdir().unwrap();
        let config = VfsConfig {
            storage_root: dir.path().to_string_lossy().into_owned(),
            ..VfsConfig::default()
        };
        let manager = StorageManager::open(&config).await.unwrap();
        (dir, manager)
    }

    #[tokio::test]
    async fn save_then_cat() {
        let (_dir, manager) = manager().await;
        let saved = handle_command(
            &manager,
            &Command::SAVE {
                path: "/docs/a.txt".into(),
                text: "hello".into(),
            },
        )
        .await;
        assert_eq!(saved.status, CommandStatus::Success);

        let cat = handle_command(&manager, &Command::CAT("/docs/a.txt".into())).await;
        assert_eq!(cat.message.as_deref(), Some("hello\n"));
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_move_reports_status_label() {
        let (_dir, manager) = manager().await;
        let result = handle_command(
            &manager,
            &Command::MVFILE {
                source: "/a.txt".into(),
                dest: "/a.txt".into(),
            },
        )
        .await;
        assert_eq!(result.status, CommandStatus::Failure("ERR-INVALID".into()));
        assert!(result.message.unwrap().starts_with("ERR-INVALID "));
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn list_of_missing_directory_fails() {
        let (_dir, manager) = manager().await;
        let result = handle_command(&manager, &Command::LIST("/nope".into())).await;
        assert_eq!(result.status, CommandStatus::Failure("missing".into()));
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn list_renders_json() {
        let (_dir, manager) = manager().await;
        manager.save_text("x", "/a.txt").await.unwrap();
        let result = handle_command(&manager, &Command::LIST("/".into())).await;
        let json = result.message.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["name"], "a.txt");
        assert_eq!(parsed[0]["kind"], "file");
        manager.shutdown().await;
    }
}
