//! Effect requests returned by registry operations.
//!
//! The registry never talks to the chat platform. Each mutation hands back
//! the side effects it needs and the caller forwards them to the
//! [`EffectWorkerHandle`](crate::effects::EffectWorkerHandle), which runs them against a
//! [`ResourceProvider`](crate::resources::ResourceProvider).

use super::lobby::LobbyStatus;
use super::types::{LobbyId, ParticipantId};
use std::fmt;

/// Opaque handle to a lobby's voice channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceChannelHandle(pub String);

/// Opaque handle to a lobby's status display (e.g. a pinned message).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusDisplayHandle(pub String);

impl fmt::Display for VoiceChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StatusDisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A handle produced by the provider, written back into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceHandle {
    VoiceChannel(VoiceChannelHandle),
    StatusDisplay(StatusDisplayHandle),
}

/// External resources currently bound to a lobby.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResourceBinding {
    pub voice_channel: Option<VoiceChannelHandle>,
    pub status_display: Option<StatusDisplayHandle>,
}

/// Everything a provider needs to draw one lobby's status display.
///
/// `existing` selects update over create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDisplayRequest {
    pub lobby_id: LobbyId,
    pub players: Vec<ParticipantId>,
    pub queue: Vec<ParticipantId>,
    pub status: LobbyStatus,
    pub existing: Option<StatusDisplayHandle>,
}

/// A side effect the registry requires but does not perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateVoiceChannel {
        lobby_id: LobbyId,
    },
    DeleteVoiceChannel {
        lobby_id: LobbyId,
        handle: VoiceChannelHandle,
    },
    RenderStatusDisplay(StatusDisplayRequest),
    DeleteStatusDisplay {
        lobby_id: LobbyId,
        handle: StatusDisplayHandle,
    },
}

impl Effect {
    /// Lobby this effect belongs to.
    #[must_use]
    pub fn lobby_id(&self) -> LobbyId {
        match self {
            Effect::CreateVoiceChannel { lobby_id }
            | Effect::DeleteVoiceChannel { lobby_id, .. }
            | Effect::DeleteStatusDisplay { lobby_id, .. } => *lobby_id,
            Effect::RenderStatusDisplay(request) => request.lobby_id,
        }
    }

    /// Bounded label for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Effect::CreateVoiceChannel { .. } => "create_voice_channel",
            Effect::DeleteVoiceChannel { .. } => "delete_voice_channel",
            Effect::RenderStatusDisplay(_) => "render_status_display",
            Effect::DeleteStatusDisplay { .. } => "delete_status_display",
        }
    }
}

/// Ordered effects produced by a single registry operation.
pub type Effects = Vec<Effect>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_lobby_id_and_kind() {
        let effect = Effect::DeleteVoiceChannel {
            lobby_id: LobbyId(3),
            handle: VoiceChannelHandle("vc-3".to_string()),
        };
        assert_eq!(effect.lobby_id(), LobbyId(3));
        assert_eq!(effect.kind(), "delete_voice_channel");

        let render = Effect::RenderStatusDisplay(StatusDisplayRequest {
            lobby_id: LobbyId(1),
            players: vec![],
            queue: vec![],
            status: LobbyStatus::Open,
            existing: None,
        });
        assert_eq!(render.lobby_id(), LobbyId(1));
        assert_eq!(render.kind(), "render_status_display");
    }
}
