//! Participant -> lobby lookup index.
//!
//! The index is derived from the lobby rosters and is never authoritative on
//! its own: `SessionRegistry` pairs every roster insert with exactly one
//! [`MembershipIndex::bind`] and every roster removal with exactly one
//! [`MembershipIndex::unbind`], inside the same `&mut self` call.

use super::types::{LobbyId, ParticipantId};
use std::collections::HashMap;
use thiserror::Error;

/// Bookkeeping faults. Unreachable while bind/unbind stay paired with roster
/// mutations, so the registry treats them as invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// Participant already has a lobby binding.
    #[error("{participant} is already bound to lobby {lobby_id}")]
    AlreadyBound {
        participant: ParticipantId,
        lobby_id: LobbyId,
    },

    /// Participant has no lobby binding.
    #[error("{0} is not bound to any lobby")]
    NotBound(ParticipantId),
}

/// Single-lobby-per-participant mapping.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MembershipIndex {
    member_of: HashMap<ParticipantId, LobbyId>,
}

impl MembershipIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `participant` now belongs to `lobby_id`.
    pub fn bind(
        &mut self,
        participant: ParticipantId,
        lobby_id: LobbyId,
    ) -> Result<(), MembershipError> {
        if let Some(existing) = self.member_of.get(&participant) {
            return Err(MembershipError::AlreadyBound {
                participant,
                lobby_id: *existing,
            });
        }
        self.member_of.insert(participant, lobby_id);
        Ok(())
    }

    /// Drop the binding for `participant`, returning the lobby it pointed at.
    pub fn unbind(&mut self, participant: &ParticipantId) -> Result<LobbyId, MembershipError> {
        self.member_of
            .remove(participant)
            .ok_or_else(|| MembershipError::NotBound(participant.clone()))
    }

    #[must_use]
    pub fn lookup(&self, participant: &ParticipantId) -> Option<LobbyId> {
        self.member_of.get(participant).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.member_of.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.member_of.is_empty()
    }

    /// Iterate all `(participant, lobby)` bindings in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &LobbyId)> {
        self.member_of.iter()
    }
}
