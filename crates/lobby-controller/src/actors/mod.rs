//! Actor layer for the Lobby Controller.
//!
//! ```text
//! LobbyControllerActor (singleton)
//! └── owns SessionRegistry (lobbies + membership index)
//! ```
//!
//! The controller is the single serialization point for registry
//! mutations. Side effects leave the actor as data and are executed by the
//! [`EffectWorkerHandle`](crate::effects::EffectWorkerHandle).

pub mod controller;
pub mod messages;

pub use controller::{LobbyControllerActor, LobbyControllerActorHandle};
pub use messages::{ControllerMessage, ControllerStatus};
