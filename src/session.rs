//! Commands for the interactive session, one per input line
//!
//! ```text
//! drop <path> [<path>...]   replace the file list (files, globs or directories)
//! text [<watermark text>]   set the text; no argument clears it
//! font <name>               choose a standard font
//! size <points>             set the font size (clamped to 10-100)
//! reset                     clear the text and the file list
//! generate                  write the archive
//! quit                      leave the session
//! ```

use crate::error::{Error, Result};
use crate::font::StandardFont;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Drop(Vec<String>),
    Text(String),
    Font(StandardFont),
    Size(u16),
    Reset,
    Generate,
    Quit,
}

impl Command {
    /// Parse one line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.trim_end().is_empty() {
            return Ok(None);
        }

        let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest),
            None => (trimmed, ""),
        };

        let command = match keyword.to_ascii_lowercase().as_str() {
            // Spaces after the keyword are separators; inner and trailing ones are text
            "text" => Command::Text(rest.trim_start().to_string()),
            "drop" => {
                let paths: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
                if paths.is_empty() {
                    return Err(Error::General("drop needs at least one path".to_string()));
                }
                Command::Drop(paths)
            }
            "font" => Command::Font(rest.trim().parse()?),
            "size" => {
                let size = rest
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| Error::General(format!("Invalid font size: {}", rest.trim())))?;
                Command::Size(size)
            }
            "reset" => Command::Reset,
            "generate" => Command::Generate,
            "quit" | "exit" => Command::Quit,
            other => return Err(Error::General(format!("Unknown command: {}", other))),
        };

        Ok(Some(command))
    }
}
