//! Console input parsing.
//!
//! A console line is `COMMAND rest of line`; everything after the first
//! space is sent verbatim as the command content.

use sharecast_shared::protocol::Command;

/// Parse one console line into a command and its content.
///
/// Returns `None` for blank lines and unknown commands.
pub fn parse_console_line(line: &str) -> Option<(Command, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (token, content) = line.split_once(' ').unwrap_or((line, ""));
    let command = token.parse::<Command>().ok()?;
    Some((command, content.to_string()))
}

/// One-line usage hint listing every command.
pub fn usage() -> String {
    let names: Vec<&str> = Command::ALL.iter().map(|command| command.as_str()).collect();
    format!("Commands: {}", names.join(", "))
}
