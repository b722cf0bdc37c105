//! Lobby Controller Service Library
//!
//! Bounded game lobbies with FIFO overflow queues, driven by chat commands:
//!
//! - Open and close numbered lobbies up to a configured maximum
//! - Sign participants up; full rosters overflow into a per-lobby queue
//! - Promote the queue head when a player signs out
//! - Keep one voice channel and one status display per lobby in step
//!
//! # Architecture
//!
//! ```text
//! CommandDispatcher ──> LobbyControllerActor (singleton, owns SessionRegistry)
//!        │                        ▲
//!        │ effects                │ bind_resource
//!        ▼                        │
//!   EffectWorker ──> ResourceProvider (voice channels, status displays)
//! ```
//!
//! # Key Design Decisions
//!
//! - **One participant, one lobby**: a membership index spans every roster and queue
//! - **Effects as data**: registry mutations return the resource work they need;
//!   the actor never awaits the platform
//! - **Serialized mutations**: the controller mailbox is the only write path
//!
//! # Modules
//!
//! - [`registry`] - Lobby and membership state machine
//! - [`actors`] - Controller actor and handle
//! - [`effects`] - Effect worker
//! - [`resources`] - Resource provider trait and implementations
//! - [`commands`] - Chat command parsing and dispatch
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types with appropriate error codes
//! - [`observability`] - Metrics and health endpoints

pub mod actors;
pub mod commands;
pub mod config;
pub mod effects;
pub mod errors;
pub mod observability;
pub mod registry;
pub mod resources;
