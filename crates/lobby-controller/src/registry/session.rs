//! `SessionRegistry` - owns every open lobby and the membership index.
//!
//! All state transitions are synchronous `&mut self` calls that return the
//! effects they require. Roster changes and their matching index updates
//! happen inside the same call, so no caller can observe one without the
//! other.

use super::effects::{Effect, Effects, ResourceHandle};
use super::lobby::{Departure, Lobby, LobbySummary, Placement};
use super::membership::{MembershipError, MembershipIndex};
use super::types::{LobbyId, ParticipantId};

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, error, info};

/// Capacity limits for a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Maximum concurrently open lobbies; ids run `1..=max_lobbies`.
    pub max_lobbies: u32,
    /// Roster seats per lobby.
    pub max_players: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_lobbies: 5,
            max_players: 8,
        }
    }
}

/// Registry operation errors.
///
/// Everything except `Invariant` is caller-triggerable and leaves state
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Maximum number of lobbies reached ({max})")]
    CapacityExceeded { max: u32 },

    #[error("Lobby {0} does not exist")]
    LobbyNotFound(LobbyId),

    #[error("{participant} is already signed up for lobby {lobby_id}")]
    AlreadyMember {
        participant: ParticipantId,
        lobby_id: LobbyId,
    },

    #[error("{0} is not in any lobby or queue")]
    NotMember(ParticipantId),

    #[error("Registry invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Disagreement between rosters, index and limits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("membership index fault: {0}")]
    Membership(#[from] MembershipError),

    #[error("{participant} appears more than once across lobby rosters")]
    DuplicateMember { participant: ParticipantId },

    #[error("{participant} is indexed to lobby {indexed:?} but sits in lobby {actual:?}")]
    IndexMismatch {
        participant: ParticipantId,
        indexed: Option<LobbyId>,
        actual: Option<LobbyId>,
    },

    #[error("lobby {lobby_id} has {players} players, limit is {max}")]
    RosterOverflow {
        lobby_id: LobbyId,
        players: usize,
        max: usize,
    },

    #[error("{open} lobbies open, limit is {max}")]
    TooManyLobbies { open: usize, max: u32 },

    #[error("lobby {0} has an id outside the allocatable range")]
    IdOutOfRange(LobbyId),
}

/// Result of a successful sign-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutOutcome {
    /// Lobby the participant left.
    pub lobby_id: LobbyId,
    /// Queued participant moved into the freed roster seat, if any.
    pub promoted: Option<ParticipantId>,
}

/// Owns all lobbies, id allocation and the membership index.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    limits: RegistryLimits,
    lobbies: BTreeMap<LobbyId, Lobby>,
    membership: MembershipIndex,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(limits: RegistryLimits) -> Self {
        Self {
            limits,
            lobbies: BTreeMap::new(),
            membership: MembershipIndex::new(),
        }
    }

    #[must_use]
    pub fn limits(&self) -> RegistryLimits {
        self.limits
    }

    #[must_use]
    pub fn lobby(&self, id: LobbyId) -> Option<&Lobby> {
        self.lobbies.get(&id)
    }

    #[must_use]
    pub fn membership(&self) -> &MembershipIndex {
        &self.membership
    }

    #[must_use]
    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    /// Total players and queued participants across all lobbies.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.membership.len()
    }

    /// Open a lobby under the smallest free id.
    pub fn open_lobby(&mut self) -> Result<(LobbyId, Effects), RegistryError> {
        self.open_lobby_at(chrono::Utc::now().timestamp())
    }

    /// [`open_lobby`](Self::open_lobby) with an explicit open timestamp.
    pub fn open_lobby_at(&mut self, opened_at: i64) -> Result<(LobbyId, Effects), RegistryError> {
        let id = (1..=self.limits.max_lobbies)
            .map(LobbyId)
            .find(|id| !self.lobbies.contains_key(id))
            .ok_or(RegistryError::CapacityExceeded {
                max: self.limits.max_lobbies,
            })?;

        let lobby = Lobby::open(id, opened_at);
        let effects = vec![
            Effect::CreateVoiceChannel { lobby_id: id },
            Effect::RenderStatusDisplay(lobby.display_request()),
        ];
        self.lobbies.insert(id, lobby);

        info!(
            target: "lc.registry",
            lobby_id = %id,
            open_lobbies = self.lobbies.len(),
            "Lobby opened"
        );

        Ok((id, effects))
    }

    /// Close a lobby, releasing every player and queued participant.
    ///
    /// A member missing from the index is an invariant violation. Every other
    /// member is still released and the lobby stays closed.
    pub fn close_lobby(&mut self, id: LobbyId) -> Result<Effects, RegistryError> {
        let mut lobby = self
            .lobbies
            .remove(&id)
            .ok_or(RegistryError::LobbyNotFound(id))?;

        let mut fault = None;
        for member in lobby.members() {
            if let Err(e) = self.membership.unbind(member) {
                error!(
                    target: "lc.registry",
                    lobby_id = %id,
                    error = %e,
                    "Membership index out of step with closing lobby"
                );
                fault.get_or_insert(e);
            }
        }
        if let Some(e) = fault {
            return Err(InvariantViolation::from(e).into());
        }

        let released = lobby.close();
        let mut effects = Vec::with_capacity(2);
        if let Some(handle) = released.voice_channel {
            effects.push(Effect::DeleteVoiceChannel { lobby_id: id, handle });
        }
        if let Some(handle) = released.status_display {
            effects.push(Effect::DeleteStatusDisplay { lobby_id: id, handle });
        }

        info!(
            target: "lc.registry",
            lobby_id = %id,
            released_members = lobby.players().len() + lobby.queue().len(),
            open_lobbies = self.lobbies.len(),
            "Lobby closed"
        );

        Ok(effects)
    }

    /// Read-only snapshot ordered by lobby id.
    #[must_use]
    pub fn list_lobbies(&self) -> Vec<LobbySummary> {
        self.lobbies.values().map(Lobby::summary).collect()
    }

    /// Admit `participant` to `lobby_id`, as a player if a seat is free and
    /// otherwise at the back of the queue.
    pub fn sign_up(
        &mut self,
        lobby_id: LobbyId,
        participant: ParticipantId,
    ) -> Result<(Placement, Effects), RegistryError> {
        if let Some(current) = self.membership.lookup(&participant) {
            return Err(RegistryError::AlreadyMember {
                participant,
                lobby_id: current,
            });
        }

        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or(RegistryError::LobbyNotFound(lobby_id))?;

        self.membership
            .bind(participant.clone(), lobby_id)
            .map_err(InvariantViolation::from)?;
        let placement = lobby.admit(participant.clone(), self.limits.max_players);

        debug!(
            target: "lc.registry",
            lobby_id = %lobby_id,
            participant = %participant,
            placement = ?placement,
            "Participant signed up"
        );

        Ok((
            placement,
            vec![Effect::RenderStatusDisplay(lobby.display_request())],
        ))
    }

    /// Remove `participant` from its lobby, promoting the queue head into a
    /// freed roster seat.
    pub fn sign_out(
        &mut self,
        participant: &ParticipantId,
    ) -> Result<(SignOutOutcome, Effects), RegistryError> {
        let lobby_id = self
            .membership
            .lookup(participant)
            .ok_or_else(|| RegistryError::NotMember(participant.clone()))?;

        let lobby = self.lobbies.get_mut(&lobby_id).ok_or_else(|| {
            InvariantViolation::IndexMismatch {
                participant: participant.clone(),
                indexed: Some(lobby_id),
                actual: None,
            }
        })?;

        let departure =
            lobby
                .remove(participant)
                .ok_or_else(|| InvariantViolation::IndexMismatch {
                    participant: participant.clone(),
                    indexed: Some(lobby_id),
                    actual: None,
                })?;

        // Cannot fail: lookup above found the binding and nothing ran since.
        self.membership
            .unbind(participant)
            .map_err(InvariantViolation::from)?;

        // A promoted participant stays bound to the same lobby.
        let promoted = match departure {
            Departure::Player { promoted } => promoted,
            Departure::Queued => None,
        };

        debug!(
            target: "lc.registry",
            lobby_id = %lobby_id,
            participant = %participant,
            promoted = ?promoted.as_ref().map(ParticipantId::as_str),
            "Participant signed out"
        );

        Ok((
            SignOutOutcome { lobby_id, promoted },
            vec![Effect::RenderStatusDisplay(lobby.display_request())],
        ))
    }

    /// Record a handle the provider created for `lobby_id`.
    ///
    /// If the lobby closed while the provider was working, the handle is
    /// orphaned and the returned effects delete it. A replaced handle of the
    /// same kind is deleted as well.
    pub fn bind_resource(&mut self, lobby_id: LobbyId, handle: ResourceHandle) -> Effects {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            debug!(
                target: "lc.registry",
                lobby_id = %lobby_id,
                "Resource created for a lobby that is already closed"
            );
            return vec![delete_effect(lobby_id, handle)];
        };

        let resources = lobby.resources_mut();
        let replaced = match handle {
            ResourceHandle::VoiceChannel(h) => resources
                .voice_channel
                .replace(h.clone())
                .filter(|old| *old != h)
                .map(ResourceHandle::VoiceChannel),
            ResourceHandle::StatusDisplay(h) => resources
                .status_display
                .replace(h.clone())
                .filter(|old| *old != h)
                .map(ResourceHandle::StatusDisplay),
        };

        replaced
            .map(|old| delete_effect(lobby_id, old))
            .into_iter()
            .collect()
    }

    /// Close every lobby, one effect batch per lobby, in id order.
    pub fn drain_all(&mut self) -> Vec<(LobbyId, Effects)> {
        let ids: Vec<LobbyId> = self.lobbies.keys().copied().collect();
        let mut batches = Vec::with_capacity(ids.len());

        for id in ids {
            match self.close_lobby(id) {
                Ok(effects) => batches.push((id, effects)),
                Err(e) => error!(
                    target: "lc.registry",
                    lobby_id = %id,
                    error = %e,
                    "Failed to close lobby during drain"
                ),
            }
        }

        info!(
            target: "lc.registry",
            closed = batches.len(),
            "All lobbies drained"
        );

        batches
    }

    /// Recompute membership from the rosters and compare against the index
    /// and the capacity limits.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.lobbies.len() > self.limits.max_lobbies as usize {
            return Err(InvariantViolation::TooManyLobbies {
                open: self.lobbies.len(),
                max: self.limits.max_lobbies,
            });
        }

        let mut derived: HashMap<&ParticipantId, LobbyId> = HashMap::new();
        for (id, lobby) in &self.lobbies {
            if id.0 == 0 || id.0 > self.limits.max_lobbies {
                return Err(InvariantViolation::IdOutOfRange(*id));
            }
            if lobby.players().len() > self.limits.max_players {
                return Err(InvariantViolation::RosterOverflow {
                    lobby_id: *id,
                    players: lobby.players().len(),
                    max: self.limits.max_players,
                });
            }
            for member in lobby.members() {
                if derived.insert(member, *id).is_some() {
                    return Err(InvariantViolation::DuplicateMember {
                        participant: member.clone(),
                    });
                }
            }
        }

        for (participant, indexed) in self.membership.iter() {
            let actual = derived.get(participant).copied();
            if actual != Some(*indexed) {
                return Err(InvariantViolation::IndexMismatch {
                    participant: participant.clone(),
                    indexed: Some(*indexed),
                    actual,
                });
            }
        }

        if let Some((participant, actual)) = derived
            .iter()
            .find(|(p, _)| self.membership.lookup(p).is_none())
        {
            return Err(InvariantViolation::IndexMismatch {
                participant: (*participant).clone(),
                indexed: None,
                actual: Some(*actual),
            });
        }

        Ok(())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistryLimits::default())
    }
}

fn delete_effect(lobby_id: LobbyId, handle: ResourceHandle) -> Effect {
    match handle {
        ResourceHandle::VoiceChannel(handle) => Effect::DeleteVoiceChannel { lobby_id, handle },
        ResourceHandle::StatusDisplay(handle) => Effect::DeleteStatusDisplay { lobby_id, handle },
    }
}
