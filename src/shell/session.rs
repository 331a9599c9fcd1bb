use log::{error, info};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::manager::StorageManager;
use crate::shell::commands::{CommandStatus, parse_command};
use crate::shell::handlers::handle_command;

const MAX_COMMAND_LENGTH: usize = 64 * 1024;

const GREETING: &[u8] = b"sandbox-vfs ready, type HELP for commands\n";

/// Runs an interactive session until QUIT or end of input.
///
/// - Reads one command per line from `reader`.
/// - Dispatches commands using `handle_command`.
/// - Writes every command's output to `writer`.
pub async fn run_session<R, W>(
    manager: &StorageManager,
    mut reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    writer.write_all(GREETING).await?;
    writer.flush().await?;

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("End of input, closing session");
                break;
            }
            Ok(_) => {
                if line.len() > MAX_COMMAND_LENGTH {
                    writer.write_all(b"ERR-SYNTAX Command too long\n").await?;
                    writer.flush().await?;
                    continue;
                }

                let trimmed = line.trim_end_matches(['\r', '\n']);
                if trimmed.trim().is_empty() {
                    continue;
                }

                let command = parse_command(trimmed);
                info!("Received: {:?}", &command);

                let result = handle_command(manager, &command).await;
                if let Some(msg) = &result.message {
                    writer.write_all(msg.as_bytes()).await?;
                    writer.flush().await?;
                }

                if result.status == CommandStatus::CloseSession {
                    info!("Session closed by QUIT");
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read command: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
