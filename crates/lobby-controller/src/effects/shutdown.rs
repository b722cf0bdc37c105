//! Shutdown release: every lobby first, then the shared containers.

use super::EffectWorkerHandle;
use crate::actors::LobbyControllerActorHandle;
use crate::errors::LcError;

use std::time::Duration;
use tracing::{info, warn};

/// Drain the controller, run the resulting cleanup, then tear down the
/// status channel and lobby category.
///
/// Teardown is attempted even when the drain fails, since the containers
/// still hold whatever the lobbies left behind.
///
/// # Errors
///
/// Returns the worker or provider error, or `LcError::Internal` when the
/// cleanup does not finish within `timeout`.
pub async fn release_all(
    controller: &LobbyControllerActorHandle,
    effects: &EffectWorkerHandle,
    timeout: Duration,
) -> Result<(), LcError> {
    match controller.drain_all().await {
        Ok(batches) => {
            info!(target: "lc.effects", lobbies = batches.len(), "Lobbies drained");
            for (lobby_id, batch) in batches {
                if let Err(e) = effects.submit(batch).await {
                    warn!(
                        target: "lc.effects",
                        lobby_id = %lobby_id,
                        error = %e,
                        "Failed to queue cleanup effects"
                    );
                }
            }
        }
        Err(e) => warn!(target: "lc.effects", error = %e, "Drain failed"),
    }

    tokio::time::timeout(timeout, async {
        effects.flush().await?;
        effects.teardown().await
    })
    .await
    .map_err(|_| {
        LcError::Internal(format!(
            "resource release timed out after {}s",
            timeout.as_secs()
        ))
    })?
}
