//! External resource provider (voice channels and status displays).
//!
//! The registry only stores opaque handles. Creating and deleting the
//! resources behind them is delegated to a [`ResourceProvider`], driven by
//! the [`EffectWorkerHandle`](crate::effects::EffectWorkerHandle).
//!
//! - [`TracingResourceProvider`] - logs each call and fabricates handles;
//!   used by the binary when no chat platform is attached
//! - [`mock::MockResourceProvider`] - records calls, can be told to fail
//!
//! Besides per-lobby resources, a provider owns two shared containers: the
//! status channel that holds every lobby's display, and the category the
//! voice channels are created in. [`ResourceProvider::ensure_containers`]
//! creates them at startup and [`ResourceProvider::teardown`] removes them,
//! with anything left inside, at shutdown.

pub mod mock;
mod tracing_provider;

pub use tracing_provider::TracingResourceProvider;

use crate::registry::{LobbyId, StatusDisplayHandle, StatusDisplayRequest, VoiceChannelHandle};
use thiserror::Error;

/// Resource provider failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The platform rejected or failed the request.
    #[error("Resource provider unavailable: {0}")]
    Unavailable(String),

    /// The handle was never issued by this provider, or is already gone.
    #[error("Unknown resource handle: {0}")]
    UnknownHandle(String),
}

/// Trait for resource provider operations (enables mocking).
#[async_trait::async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Create the status channel and lobby category if they are missing.
    async fn ensure_containers(&self) -> Result<(), ResourceError>;

    /// Delete the status channel and lobby category together with
    /// everything still in them.
    async fn teardown(&self) -> Result<(), ResourceError>;

    /// Create the voice channel for a newly opened lobby.
    async fn create_voice_channel(
        &self,
        lobby_id: LobbyId,
    ) -> Result<VoiceChannelHandle, ResourceError>;

    /// Delete a lobby's voice channel.
    async fn delete_voice_channel(&self, handle: &VoiceChannelHandle) -> Result<(), ResourceError>;

    /// Create the status display, or update it in place when
    /// `request.existing` is set. Returns the handle now showing the lobby.
    async fn render_status_display(
        &self,
        request: &StatusDisplayRequest,
    ) -> Result<StatusDisplayHandle, ResourceError>;

    /// Delete a lobby's status display.
    async fn delete_status_display(&self, handle: &StatusDisplayHandle)
        -> Result<(), ResourceError>;
}
