//! Line protocol definitions
//!
//! Client input is `\n`-delimited bytes; a line is either the exit command
//! or chat text. Bytes that are not UTF-8 are relayed lossily. Server
//! output lines are rendered here and terminated with `\n\r` by the
//! session writer.

/// Literal line that ends a session
pub const EXIT_COMMAND: &str = "Exit";

/// Terminator appended to every server → client line
pub const LINE_TERMINATOR: &str = "\n\r";

/// Reply sent to a client that issued the exit command
pub const GOODBYE: &str = "Bye!";

/// Greeting sent to a freshly accepted client
pub fn welcome(label: &str) -> String {
    format!("Welcome to the chat, {}!", label)
}

/// Client → Server command
///
/// Parsed from one input line. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Leave the chat
    Exit,
    /// Broadcast a line of text
    Say(String),
}

impl ClientCommand {
    /// Interpret a line with its `\n` already removed
    ///
    /// One trailing `\r` is part of the line boundary and is dropped.
    pub fn parse(line: &[u8]) -> Self {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line == EXIT_COMMAND.as_bytes() {
            ClientCommand::Exit
        } else {
            ClientCommand::Say(String::from_utf8_lossy(line).into_owned())
        }
    }
}

/// Event fanned out to the other members of the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A client has registered
    Joined { label: String },
    /// A client has left, for whatever reason
    Left { label: String },
    /// A chat line from a client
    Chat { from: String, text: String },
}

impl ChatEvent {
    /// Render the event as the text of one server line
    pub fn render(&self) -> String {
        match self {
            ChatEvent::Joined { label } => format!("{} has joined the chat", label),
            ChatEvent::Left { label } => format!("{} has left the chat", label),
            ChatEvent::Chat { from, text } => format!("[{}]: {}", from, text),
        }
    }
}
