//! A single lobby: bounded player roster plus FIFO overflow queue.
//!
//! Roster mutations are crate-private and only reached through
//! [`SessionRegistry`](super::SessionRegistry), which keeps the membership
//! index in step with them.

use super::effects::{ResourceBinding, StatusDisplayRequest};
use super::types::{LobbyId, ParticipantId};
use std::collections::VecDeque;
use std::fmt;

/// Lobby lifecycle state. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyStatus {
    Open,
    Closed,
}

impl fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LobbyStatus::Open => write!(f, "Open"),
            LobbyStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// Where a sign-up landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Took a roster seat.
    Player,
    /// Roster full; 1-based position in the queue.
    Queued { position: usize },
}

/// What a removal did to the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Departure {
    /// Left the roster. `promoted` is the queue head that took the seat.
    Player { promoted: Option<ParticipantId> },
    /// Left the queue; nobody moves.
    Queued,
}

/// Read-only counts for `list_lobbies`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbySummary {
    pub id: LobbyId,
    pub player_count: usize,
    pub queue_count: usize,
    /// Unix timestamp (seconds) the lobby was opened.
    pub opened_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lobby {
    id: LobbyId,
    players: Vec<ParticipantId>,
    queue: VecDeque<ParticipantId>,
    status: LobbyStatus,
    resources: ResourceBinding,
    opened_at: i64,
}

impl Lobby {
    pub(crate) fn open(id: LobbyId, opened_at: i64) -> Self {
        Self {
            id,
            players: Vec::new(),
            queue: VecDeque::new(),
            status: LobbyStatus::Open,
            resources: ResourceBinding::default(),
            opened_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> LobbyId {
        self.id
    }

    #[must_use]
    pub fn players(&self) -> &[ParticipantId] {
        &self.players
    }

    #[must_use]
    pub fn queue(&self) -> &VecDeque<ParticipantId> {
        &self.queue
    }

    #[must_use]
    pub fn status(&self) -> LobbyStatus {
        self.status
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceBinding {
        &self.resources
    }

    #[must_use]
    pub fn opened_at(&self) -> i64 {
        self.opened_at
    }

    /// Players followed by queued participants, in order.
    pub fn members(&self) -> impl Iterator<Item = &ParticipantId> {
        self.players.iter().chain(self.queue.iter())
    }

    #[must_use]
    pub fn summary(&self) -> LobbySummary {
        LobbySummary {
            id: self.id,
            player_count: self.players.len(),
            queue_count: self.queue.len(),
            opened_at: self.opened_at,
        }
    }

    /// Snapshot of the lobby for a create-or-update of its status display.
    #[must_use]
    pub fn display_request(&self) -> StatusDisplayRequest {
        StatusDisplayRequest {
            lobby_id: self.id,
            players: self.players.clone(),
            queue: self.queue.iter().cloned().collect(),
            status: self.status,
            existing: self.resources.status_display.clone(),
        }
    }

    /// First come into the roster, overflow to the back of the queue.
    pub(crate) fn admit(&mut self, participant: ParticipantId, max_players: usize) -> Placement {
        if self.players.len() < max_players {
            self.players.push(participant);
            Placement::Player
        } else {
            self.queue.push_back(participant);
            Placement::Queued {
                position: self.queue.len(),
            }
        }
    }

    /// Remove `participant` from wherever it sits.
    ///
    /// A roster departure promotes at most one queued participant, the head.
    /// Returns `None` if the participant is in neither list.
    pub(crate) fn remove(&mut self, participant: &ParticipantId) -> Option<Departure> {
        if let Some(pos) = self.players.iter().position(|p| p == participant) {
            self.players.remove(pos);
            let promoted = self.queue.pop_front();
            if let Some(next) = &promoted {
                self.players.push(next.clone());
            }
            return Some(Departure::Player { promoted });
        }

        let pos = self.queue.iter().position(|p| p == participant)?;
        self.queue.remove(pos);
        Some(Departure::Queued)
    }

    pub(crate) fn resources_mut(&mut self) -> &mut ResourceBinding {
        &mut self.resources
    }

    /// Mark closed and hand back the resources to release.
    pub(crate) fn close(&mut self) -> ResourceBinding {
        self.status = LobbyStatus::Closed;
        std::mem::take(&mut self.resources)
    }
}
