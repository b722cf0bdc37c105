//! Message types for the controller actor.
//!
//! All access to the registry goes through these messages over one
//! `tokio::sync::mpsc` mailbox. Replies use `tokio::sync::oneshot`.

use crate::errors::LcError;
use crate::registry::{
    Effects, LobbyId, LobbySummary, ParticipantId, Placement, ResourceHandle, SignOutOutcome,
};
use tokio::sync::oneshot;

/// Messages sent to `LobbyControllerActor`.
#[derive(Debug)]
pub enum ControllerMessage {
    /// Open a lobby under the smallest free id.
    OpenLobby {
        respond_to: oneshot::Sender<Result<(LobbyId, Effects), LcError>>,
    },

    /// Close a lobby and release its members.
    CloseLobby {
        lobby_id: LobbyId,
        respond_to: oneshot::Sender<Result<Effects, LcError>>,
    },

    /// Sign a participant up for a lobby (roster or queue).
    SignUp {
        lobby_id: LobbyId,
        participant: ParticipantId,
        respond_to: oneshot::Sender<Result<(Placement, Effects), LcError>>,
    },

    /// Sign a participant out of whatever lobby it is in.
    SignOut {
        participant: ParticipantId,
        respond_to: oneshot::Sender<Result<(SignOutOutcome, Effects), LcError>>,
    },

    /// Read-only lobby summaries ordered by id.
    ListLobbies {
        respond_to: oneshot::Sender<Vec<LobbySummary>>,
    },

    /// Write back a handle the resource provider created.
    BindResource {
        lobby_id: LobbyId,
        handle: ResourceHandle,
        respond_to: oneshot::Sender<Effects>,
    },

    /// Get current controller status (for health checks).
    GetStatus {
        respond_to: oneshot::Sender<ControllerStatus>,
    },

    /// Close every lobby and stop opening new ones (shutdown path).
    DrainAll {
        respond_to: oneshot::Sender<Vec<(LobbyId, Effects)>>,
    },
}

impl ControllerMessage {
    /// Bounded label for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            ControllerMessage::OpenLobby { .. } => "open_lobby",
            ControllerMessage::CloseLobby { .. } => "close_lobby",
            ControllerMessage::SignUp { .. } => "sign_up",
            ControllerMessage::SignOut { .. } => "sign_out",
            ControllerMessage::ListLobbies { .. } => "list_lobbies",
            ControllerMessage::BindResource { .. } => "bind_resource",
            ControllerMessage::GetStatus { .. } => "get_status",
            ControllerMessage::DrainAll { .. } => "drain_all",
        }
    }
}

/// Controller status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    /// Number of open lobbies.
    pub lobby_count: usize,
    /// Players plus queued participants across all lobbies.
    pub participant_count: usize,
    /// Whether the controller has drained and refuses new lobbies.
    pub is_draining: bool,
    /// Messages handled since start.
    pub messages_processed: u64,
}
