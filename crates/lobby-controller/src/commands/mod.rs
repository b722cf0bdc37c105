//! Chat command surface.
//!
//! Parses prefixed chat messages into [`Command`]s, gates them on the
//! configured commands channel, and turns controller results into
//! [`Reply`] texts. The author's display name is the participant identity.

mod console;
mod dispatcher;

pub use console::ConsoleLine;
pub use dispatcher::CommandDispatcher;

use crate::registry::{LobbyId, LobbySummary, ParticipantId};
use std::fmt;

/// Command table used by `help`: (invocation, description).
pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("open_lobby", "Opens a new lobby."),
    ("close_lobby <lobby_id>", "Closes a specific lobby."),
    ("sign_up <lobby_id>", "Signs up for a specific lobby."),
    ("sign_out", "Signs out from your current lobby or queue."),
    ("list_lobbies", "Lists all active lobbies."),
];

/// A parsed chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    OpenLobby,
    CloseLobby(LobbyId),
    SignUp(LobbyId),
    SignOut,
    ListLobbies,
}

/// Why a message did not parse into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Plain chat; not addressed to the bot.
    NotACommand,
    /// Prefixed, but no such command.
    Unknown(String),
    /// Known command with missing or malformed arguments.
    Usage(&'static str),
}

impl Command {
    /// Parse `text` if it starts with `prefix`.
    ///
    /// Commands with no arguments ignore trailing words.
    pub fn parse(prefix: &str, text: &str) -> Result<Self, ParseError> {
        let body = text
            .trim_start()
            .strip_prefix(prefix)
            .ok_or(ParseError::NotACommand)?;

        let mut words = body.split_whitespace();
        let name = match words.next() {
            Some(name) if !body.starts_with(char::is_whitespace) => name,
            _ => return Err(ParseError::NotACommand),
        };

        match name {
            "help" => Ok(Command::Help),
            "open_lobby" => Ok(Command::OpenLobby),
            "sign_out" => Ok(Command::SignOut),
            "list_lobbies" => Ok(Command::ListLobbies),
            "close_lobby" => lobby_argument(words.next())
                .map(Command::CloseLobby)
                .ok_or(ParseError::Usage("close_lobby <lobby_id>")),
            "sign_up" => lobby_argument(words.next())
                .map(Command::SignUp)
                .ok_or(ParseError::Usage("sign_up <lobby_id>")),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }

    /// Bounded label for metrics and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::OpenLobby => "open_lobby",
            Command::CloseLobby(_) => "close_lobby",
            Command::SignUp(_) => "sign_up",
            Command::SignOut => "sign_out",
            Command::ListLobbies => "list_lobbies",
        }
    }
}

fn lobby_argument(word: Option<&str>) -> Option<LobbyId> {
    word.and_then(|w| w.parse().ok())
}

/// A message sent back to the channel a command came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    WrongChannel {
        channel: String,
    },
    Help {
        prefix: String,
    },
    LobbyOpened(LobbyId),
    LobbyClosed(LobbyId),
    Joined {
        participant: ParticipantId,
        lobby_id: LobbyId,
    },
    Queued {
        participant: ParticipantId,
        lobby_id: LobbyId,
        position: usize,
    },
    Promoted {
        participant: ParticipantId,
        lobby_id: LobbyId,
    },
    Left {
        participant: ParticipantId,
        lobby_id: LobbyId,
    },
    NoLobbies,
    Lobby(LobbySummary),
    Usage {
        prefix: String,
        usage: &'static str,
    },
    UnknownCommand {
        prefix: String,
        name: String,
    },
    /// Participant-safe error text.
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::WrongChannel { channel } => {
                write!(f, "Commands must be used in the `{channel}` channel.")
            }
            Reply::Help { prefix } => {
                write!(f, "Custom Bot Commands")?;
                for (invocation, description) in COMMAND_HELP {
                    write!(f, "\n`{prefix}{invocation}` - {description}")?;
                }
                Ok(())
            }
            Reply::LobbyOpened(id) => write!(f, "Lobby {id} created!"),
            Reply::LobbyClosed(id) => write!(f, "Lobby {id} closed!"),
            Reply::Joined {
                participant,
                lobby_id,
            } => write!(f, "{participant} joined Lobby {lobby_id}!"),
            Reply::Queued {
                participant,
                lobby_id,
                position,
            } => write!(
                f,
                "Lobby {lobby_id} is full. {participant} added to the queue (position {position})."
            ),
            Reply::Promoted {
                participant,
                lobby_id,
            } => write!(f, "{participant} moved from queue to Lobby {lobby_id}!"),
            Reply::Left {
                participant,
                lobby_id,
            } => write!(f, "{participant} left Lobby {lobby_id}."),
            Reply::NoLobbies => write!(f, "No active lobbies."),
            Reply::Lobby(summary) => write!(
                f,
                "Lobby {}: Players: {}, Queue: {}",
                summary.id, summary.player_count, summary.queue_count
            ),
            Reply::Usage { prefix, usage } => write!(f, "Usage: `{prefix}{usage}`"),
            Reply::UnknownCommand { prefix, name } => write!(
                f,
                "Unknown command `{prefix}{name}`. Use `{prefix}help` to list commands."
            ),
            Reply::Error(message) => f.write_str(message),
        }
    }
}
