use super::{ResourceError, ResourceProvider};
use crate::registry::{LobbyId, StatusDisplayHandle, StatusDisplayRequest, VoiceChannelHandle};

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Provider that only logs. Handles embed the configured channel/category
/// names so log lines read like the real thing.
#[derive(Debug)]
pub struct TracingResourceProvider {
    category_name: String,
    status_channel: String,
    next_display: AtomicU64,
}

impl TracingResourceProvider {
    #[must_use]
    pub fn new(category_name: impl Into<String>, status_channel: impl Into<String>) -> Self {
        Self {
            category_name: category_name.into(),
            status_channel: status_channel.into(),
            next_display: AtomicU64::new(1),
        }
    }
}

#[async_trait::async_trait]
impl ResourceProvider for TracingResourceProvider {
    async fn ensure_containers(&self) -> Result<(), ResourceError> {
        info!(
            target: "lc.resources",
            status_channel = %self.status_channel,
            category = %self.category_name,
            "Status channel and lobby category ready"
        );
        Ok(())
    }

    async fn teardown(&self) -> Result<(), ResourceError> {
        info!(
            target: "lc.resources",
            status_channel = %self.status_channel,
            "Status channel messages purged, channel deleted"
        );
        info!(
            target: "lc.resources",
            category = %self.category_name,
            "Lobby category channels deleted, category deleted"
        );
        Ok(())
    }

    async fn create_voice_channel(
        &self,
        lobby_id: LobbyId,
    ) -> Result<VoiceChannelHandle, ResourceError> {
        let handle = VoiceChannelHandle(format!("{}/Lobby {lobby_id}", self.category_name));
        info!(
            target: "lc.resources",
            lobby_id = %lobby_id,
            handle = %handle,
            "Voice channel created"
        );
        Ok(handle)
    }

    async fn delete_voice_channel(&self, handle: &VoiceChannelHandle) -> Result<(), ResourceError> {
        info!(target: "lc.resources", handle = %handle, "Voice channel deleted");
        Ok(())
    }

    async fn render_status_display(
        &self,
        request: &StatusDisplayRequest,
    ) -> Result<StatusDisplayHandle, ResourceError> {
        let handle = match &request.existing {
            Some(existing) => existing.clone(),
            None => StatusDisplayHandle(format!(
                "{}#{}",
                self.status_channel,
                self.next_display.fetch_add(1, Ordering::Relaxed)
            )),
        };

        let players: Vec<&str> = request.players.iter().map(|p| p.as_str()).collect();
        let queue: Vec<&str> = request.queue.iter().map(|p| p.as_str()).collect();
        info!(
            target: "lc.resources",
            lobby_id = %request.lobby_id,
            handle = %handle,
            status = %request.status,
            players = ?players,
            queue = ?queue,
            updated = request.existing.is_some(),
            "Status display rendered"
        );
        Ok(handle)
    }

    async fn delete_status_display(
        &self,
        handle: &StatusDisplayHandle,
    ) -> Result<(), ResourceError> {
        info!(target: "lc.resources", handle = %handle, "Status display deleted");
        Ok(())
    }
}
