//! Lobby registry: the synchronous state machine behind the controller actor.
//!
//! ```text
//! SessionRegistry
//! ├── lobbies: BTreeMap<LobbyId, Lobby>
//! │   └── Lobby (players: Vec, queue: VecDeque, status, resources)
//! └── membership: MembershipIndex (participant -> lobby)
//! ```
//!
//! Nothing here performs I/O. Every mutation returns the [`Effect`]s the
//! caller must run against a resource provider.
//!
//! # Modules
//!
//! - [`session`] - `SessionRegistry`, id allocation and cross-lobby invariants
//! - [`lobby`] - roster/queue admission and FIFO promotion
//! - [`membership`] - single-lobby-per-participant index
//! - [`effects`] - effect requests and resource handles
//! - [`types`] - `LobbyId` and `ParticipantId`

pub mod effects;
pub mod lobby;
pub mod membership;
pub mod session;
pub mod types;

pub use effects::{
    Effect, Effects, ResourceBinding, ResourceHandle, StatusDisplayHandle, StatusDisplayRequest,
    VoiceChannelHandle,
};
pub use lobby::{Lobby, LobbyStatus, LobbySummary, Placement};
pub use membership::{MembershipError, MembershipIndex};
pub use session::{
    InvariantViolation, RegistryError, RegistryLimits, SessionRegistry, SignOutOutcome,
};
pub use types::{LobbyId, ParticipantId};
