use super::{Command, ParseError, Reply};
use crate::actors::LobbyControllerActorHandle;
use crate::config::Config;
use crate::effects::EffectWorkerHandle;
use crate::errors::LcError;
use crate::observability::metrics;
use crate::registry::{Effects, ParticipantId, Placement};

use tracing::{debug, instrument, warn};

/// Routes chat messages to the controller and forwards resulting effects to
/// the effect worker.
#[derive(Clone, Debug)]
pub struct CommandDispatcher {
    controller: LobbyControllerActorHandle,
    effects: EffectWorkerHandle,
    commands_channel: String,
    prefix: String,
}

impl CommandDispatcher {
    #[must_use]
    pub fn new(
        config: &Config,
        controller: LobbyControllerActorHandle,
        effects: EffectWorkerHandle,
    ) -> Self {
        Self {
            controller,
            effects,
            commands_channel: config.commands_channel.clone(),
            prefix: config.command_prefix.clone(),
        }
    }

    /// Handle one chat message. Returns the replies to post, in order;
    /// plain chat yields none.
    #[instrument(skip_all, name = "lc.commands", fields(channel = %channel, author = %author))]
    pub async fn dispatch(&self, channel: &str, author: &str, text: &str) -> Vec<Reply> {
        let in_commands_channel = channel == self.commands_channel;

        let command = match Command::parse(&self.prefix, text) {
            Ok(command) => command,
            Err(ParseError::NotACommand) => return Vec::new(),
            // Malformed input is only answered where commands belong.
            Err(_) if !in_commands_channel => return Vec::new(),
            Err(ParseError::Usage(usage)) => {
                return vec![Reply::Usage {
                    prefix: self.prefix.clone(),
                    usage,
                }]
            }
            Err(ParseError::Unknown(name)) => {
                return vec![Reply::UnknownCommand {
                    prefix: self.prefix.clone(),
                    name,
                }]
            }
        };

        if !in_commands_channel {
            debug!(target: "lc.commands", command = command.name(), "Command outside commands channel");
            return vec![Reply::WrongChannel {
                channel: self.commands_channel.clone(),
            }];
        }

        let participant = ParticipantId::from(author);
        let result = self.execute(command, participant).await;
        metrics::record_command(command.name(), result.is_ok());

        match result {
            Ok((replies, effects)) => {
                if let Err(e) = self.effects.submit(effects).await {
                    warn!(
                        target: "lc.commands",
                        command = command.name(),
                        error = %e,
                        "Failed to queue effects"
                    );
                }
                replies
            }
            Err(e) => {
                debug!(
                    target: "lc.commands",
                    command = command.name(),
                    error_code = %e.error_code(),
                    error = %e,
                    "Command rejected"
                );
                vec![Reply::Error(e.client_message())]
            }
        }
    }

    async fn execute(
        &self,
        command: Command,
        participant: ParticipantId,
    ) -> Result<(Vec<Reply>, Effects), LcError> {
        match command {
            Command::Help => Ok((
                vec![Reply::Help {
                    prefix: self.prefix.clone(),
                }],
                Vec::new(),
            )),

            Command::OpenLobby => {
                let (lobby_id, effects) = self.controller.open_lobby().await?;
                Ok((vec![Reply::LobbyOpened(lobby_id)], effects))
            }

            Command::CloseLobby(lobby_id) => {
                let effects = self.controller.close_lobby(lobby_id).await?;
                Ok((vec![Reply::LobbyClosed(lobby_id)], effects))
            }

            Command::SignUp(lobby_id) => {
                let (placement, effects) =
                    self.controller.sign_up(lobby_id, participant.clone()).await?;
                let reply = match placement {
                    Placement::Player => Reply::Joined {
                        participant,
                        lobby_id,
                    },
                    Placement::Queued { position } => Reply::Queued {
                        participant,
                        lobby_id,
                        position,
                    },
                };
                Ok((vec![reply], effects))
            }

            Command::SignOut => {
                let (outcome, effects) = self.controller.sign_out(participant.clone()).await?;
                let mut replies = Vec::with_capacity(2);
                if let Some(promoted) = outcome.promoted {
                    replies.push(Reply::Promoted {
                        participant: promoted,
                        lobby_id: outcome.lobby_id,
                    });
                }
                replies.push(Reply::Left {
                    participant,
                    lobby_id: outcome.lobby_id,
                });
                Ok((replies, effects))
            }

            Command::ListLobbies => {
                let lobbies = self.controller.list_lobbies().await?;
                let replies = if lobbies.is_empty() {
                    vec![Reply::NoLobbies]
                } else {
                    lobbies.into_iter().map(Reply::Lobby).collect()
                };
                Ok((replies, Vec::new()))
            }
        }
    }
}
