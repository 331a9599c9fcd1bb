//! Module `commands`
//!
//! Shell command definitions and parsing. Every command is one line: a
//! keyword followed by whitespace-separated arguments; `SAVE` takes the rest
//! of the line as text.

/// Represents a shell command parsed from an input line.
///
/// Commands that require arguments carry them; a command with missing
/// arguments parses as `UNKNOWN`.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    HELP,
    LIST(String),                               // JSON listing, defaults to the root
    TREE(String),                               // Indented plain-text listing
    CAT(String),                                // Print file content
    EXISTS(String),                             // Whether a file exists
    UPLOAD { local: String, path: String },     // Copy a local file in
    SAVE { path: String, text: String },        // Store text
    MVFILE { source: String, dest: String },    // Move a file
    MVDIR { source: String, dest: String },     // Move a folder
    DEL(String),                                // Delete a file
    RMDIR(String),                              // Delete a folder
    UNKNOWN,
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseSession,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message.into()),
        }
    }

    pub fn failure(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: Some(message.into()),
        }
    }
}

/// Parses a raw input line into the `Command` enum.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let rest = parts.next().unwrap_or("").trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let path_or_root = || args.first().copied().unwrap_or("/").to_string();

    match (cmd.as_str(), args.as_slice()) {
        ("QUIT" | "EXIT" | "Q", _) => Command::QUIT,
        ("HELP" | "?", _) => Command::HELP,
        ("LIST" | "LS", _) => Command::LIST(path_or_root()),
        ("TREE", _) => Command::TREE(path_or_root()),
        ("CAT", [path]) => Command::CAT(path.to_string()),
        ("EXISTS", [path]) => Command::EXISTS(path.to_string()),
        ("UPLOAD", [local, path]) => Command::UPLOAD {
            local: local.to_string(),
            path: path.to_string(),
        },
        ("SAVE", [path, ..]) => {
            let text = rest[path.len()..].trim_start();
            Command::SAVE {
                path: path.to_string(),
                text: text.to_string(),
            }
        }
        ("MVFILE", [source, dest]) => Command::MVFILE {
            source: source.to_string(),
            dest: dest.to_string(),
        },
        ("MVDIR", [source, dest]) => Command::MVDIR {
            source: source.to_string(),
            dest: dest.to_string(),
        },
        ("DEL" | "RM", [path]) => Command::DEL(path.to_string()),
        ("RMDIR", [path]) => Command::RMDIR(path.to_string()),
        _ => Command::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(parse_command("quit\r\n"), Command::QUIT);
        assert_eq!(parse_command("ls"), Command::LIST("/".into()));
        assert_eq!(parse_command("Tree /src"), Command::TREE("/src".into()));
    }

    #[test]
    fn save_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse_command("SAVE /notes.txt  hello   world "),
            Command::SAVE {
                path: "/notes.txt".into(),
                text: "hello   world".into(),
            }
        );
        assert_eq!(
            parse_command("SAVE /empty.txt"),
            Command::SAVE {
                path: "/empty.txt".into(),
                text: String::new(),
            }
        );
    }

    #[test]
    fn wrong_argument_counts_are_unknown() {
        assert_eq!(parse_command("MVFILE /a"), Command::UNKNOWN);
        assert_eq!(parse_command("DEL"), Command::UNKNOWN);
        assert_eq!(parse_command("CAT /a /b"), Command::UNKNOWN);
        assert_eq!(parse_command("FROB /a"), Command::UNKNOWN);
    }
}
