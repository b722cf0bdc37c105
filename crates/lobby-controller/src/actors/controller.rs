//! `LobbyControllerActor` - singleton owner of the lobby registry.
//!
//! The actor is the only synchronization boundary in the service:
//!
//! - Owns the `SessionRegistry` (lobbies + membership index)
//! - Applies one message at a time, so every multi-step registry update is
//!   atomic with respect to other participants' requests
//! - Never awaits the resource provider; effects go back to the caller
//! - Owns the root `CancellationToken` for shutdown
//!
//! # Graceful Shutdown
//!
//! On SIGTERM the binary sends `DrainAll`, which:
//! 1. Sets `accepting_new = false`
//! 2. Closes every lobby, one effect batch per lobby
//! 3. Returns the batches so the caller can release resources

use crate::errors::LcError;
use crate::observability::metrics;
use crate::registry::{
    Effects, LobbyId, LobbySummary, ParticipantId, Placement, RegistryLimits, ResourceHandle,
    SessionRegistry, SignOutOutcome,
};

use super::messages::{ControllerMessage, ControllerStatus};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

/// Default channel buffer size for the controller mailbox.
const CONTROLLER_CHANNEL_BUFFER: usize = 1000;

/// Handle to the `LobbyControllerActor`.
///
/// Cheap to clone. All methods are async and return results via oneshot
/// channels.
#[derive(Clone, Debug)]
pub struct LobbyControllerActorHandle {
    sender: mpsc::Sender<ControllerMessage>,
    cancel_token: CancellationToken,
}

impl LobbyControllerActorHandle {
    /// Create a new `LobbyControllerActor` and return a handle to it.
    ///
    /// This spawns the actor task and returns immediately.
    #[must_use]
    pub fn new(lc_id: String, limits: RegistryLimits) -> Self {
        let (sender, receiver) = mpsc::channel(CONTROLLER_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = LobbyControllerActor::new(lc_id, receiver, cancel_token.clone(), limits);
        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> ControllerMessage,
    ) -> Result<T, LcError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(message(tx))
            .await
            .map_err(|e| LcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| LcError::Internal(format!("response receive failed: {e}")))
    }

    /// Open a lobby. Returns its id and the effects that create its resources.
    pub async fn open_lobby(&self) -> Result<(LobbyId, Effects), LcError> {
        self.request(|respond_to| ControllerMessage::OpenLobby { respond_to })
            .await?
    }

    /// Close a lobby, freeing its members to join elsewhere.
    pub async fn close_lobby(&self, lobby_id: LobbyId) -> Result<Effects, LcError> {
        self.request(|respond_to| ControllerMessage::CloseLobby {
            lobby_id,
            respond_to,
        })
        .await?
    }

    /// Sign `participant` up for `lobby_id`.
    pub async fn sign_up(
        &self,
        lobby_id: LobbyId,
        participant: ParticipantId,
    ) -> Result<(Placement, Effects), LcError> {
        self.request(|respond_to| ControllerMessage::SignUp {
            lobby_id,
            participant,
            respond_to,
        })
        .await?
    }

    /// Sign `participant` out of its lobby or queue.
    pub async fn sign_out(
        &self,
        participant: ParticipantId,
    ) -> Result<(SignOutOutcome, Effects), LcError> {
        self.request(|respond_to| ControllerMessage::SignOut {
            participant,
            respond_to,
        })
        .await?
    }

    /// List open lobbies.
    pub async fn list_lobbies(&self) -> Result<Vec<LobbySummary>, LcError> {
        self.request(|respond_to| ControllerMessage::ListLobbies { respond_to })
            .await
    }

    /// Record a handle created by the resource provider.
    ///
    /// Returns delete effects when the handle turned out to be orphaned.
    pub async fn bind_resource(
        &self,
        lobby_id: LobbyId,
        handle: ResourceHandle,
    ) -> Result<Effects, LcError> {
        self.request(|respond_to| ControllerMessage::BindResource {
            lobby_id,
            handle,
            respond_to,
        })
        .await
    }

    /// Get the current controller status.
    pub async fn get_status(&self) -> Result<ControllerStatus, LcError> {
        self.request(|respond_to| ControllerMessage::GetStatus { respond_to })
            .await
    }

    /// Close every lobby and refuse new ones.
    pub async fn drain_all(&self) -> Result<Vec<(LobbyId, Effects)>, LcError> {
        self.request(|respond_to| ControllerMessage::DrainAll { respond_to })
            .await
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token for tasks that should stop with the controller.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

/// The `LobbyControllerActor` implementation.
///
/// This struct owns the registry and runs the message loop.
pub struct LobbyControllerActor {
    /// Lobby controller instance ID.
    lc_id: String,
    /// Message receiver.
    receiver: mpsc::Receiver<ControllerMessage>,
    /// Cancellation token (root).
    cancel_token: CancellationToken,
    /// Lobbies and membership.
    registry: SessionRegistry,
    /// Whether new lobbies may be opened.
    accepting_new: bool,
    /// Messages handled since start.
    messages_processed: u64,
}

impl LobbyControllerActor {
    fn new(
        lc_id: String,
        receiver: mpsc::Receiver<ControllerMessage>,
        cancel_token: CancellationToken,
        limits: RegistryLimits,
    ) -> Self {
        Self {
            lc_id,
            receiver,
            cancel_token,
            registry: SessionRegistry::new(limits),
            accepting_new: true,
            messages_processed: 0,
        }
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "lc.actor.controller", fields(lc_id = %self.lc_id))]
    async fn run(mut self) {
        info!(
            target: "lc.actor.controller",
            lc_id = %self.lc_id,
            max_lobbies = self.registry.limits().max_lobbies,
            max_players = self.registry.limits().max_players,
            "LobbyControllerActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "lc.actor.controller",
                        lc_id = %self.lc_id,
                        "LobbyControllerActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            metrics::set_actor_mailbox_depth("controller", self.receiver.len());
                            self.handle_message(message);
                            self.messages_processed += 1;
                        }
                        None => {
                            info!(
                                target: "lc.actor.controller",
                                lc_id = %self.lc_id,
                                "LobbyControllerActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "lc.actor.controller",
            lc_id = %self.lc_id,
            lobbies_remaining = self.registry.lobby_count(),
            messages_processed = self.messages_processed,
            "LobbyControllerActor stopped"
        );
    }

    /// Handle a single message. Synchronous: nothing here awaits.
    fn handle_message(&mut self, message: ControllerMessage) {
        let kind = message.kind();
        debug!(target: "lc.actor.controller", message = kind, "Handling message");

        match message {
            ControllerMessage::OpenLobby { respond_to } => {
                let result = self.open_lobby();
                let _ = respond_to.send(result);
            }

            ControllerMessage::CloseLobby {
                lobby_id,
                respond_to,
            } => {
                let result = self.registry.close_lobby(lobby_id).map_err(LcError::from);
                let result = self.observe(kind, result);
                let _ = respond_to.send(result);
            }

            ControllerMessage::SignUp {
                lobby_id,
                participant,
                respond_to,
            } => {
                let result = self
                    .registry
                    .sign_up(lobby_id, participant)
                    .map_err(LcError::from);
                if let Ok((placement, _)) = &result {
                    metrics::record_sign_up(*placement);
                }
                let result = self.observe(kind, result);
                let _ = respond_to.send(result);
            }

            ControllerMessage::SignOut {
                participant,
                respond_to,
            } => {
                let result = self.registry.sign_out(&participant).map_err(LcError::from);
                if let Ok((SignOutOutcome { promoted: Some(_), .. }, _)) = &result {
                    metrics::record_promotion();
                }
                let result = self.observe(kind, result);
                let _ = respond_to.send(result);
            }

            ControllerMessage::ListLobbies { respond_to } => {
                let _ = respond_to.send(self.registry.list_lobbies());
            }

            ControllerMessage::BindResource {
                lobby_id,
                handle,
                respond_to,
            } => {
                let effects = self.registry.bind_resource(lobby_id, handle);
                let _ = respond_to.send(effects);
            }

            ControllerMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.get_status());
            }

            ControllerMessage::DrainAll { respond_to } => {
                let batches = self.drain_all();
                let _ = respond_to.send(batches);
            }
        }
    }

    fn open_lobby(&mut self) -> Result<(LobbyId, Effects), LcError> {
        if !self.accepting_new {
            return Err(LcError::Draining);
        }
        let result = self.registry.open_lobby().map_err(LcError::from);
        self.observe("open_lobby", result)
    }

    fn drain_all(&mut self) -> Vec<(LobbyId, Effects)> {
        info!(
            target: "lc.actor.controller",
            lc_id = %self.lc_id,
            lobby_count = self.registry.lobby_count(),
            "Draining all lobbies"
        );

        self.accepting_new = false;
        let batches = self.registry.drain_all();
        self.publish_gauges();
        batches
    }

    /// Common bookkeeping after a mutation: gauges, and fatal handling of
    /// invariant faults.
    fn observe<T>(
        &mut self,
        kind: &'static str,
        result: Result<T, LcError>,
    ) -> Result<T, LcError> {
        self.publish_gauges();

        match &result {
            Err(e) if e.is_invariant_violation() => {
                error!(
                    target: "lc.actor.controller",
                    lc_id = %self.lc_id,
                    operation = kind,
                    error = %e,
                    "Registry invariant violated, stopping controller"
                );
                metrics::record_invariant_violation();
                self.cancel_token.cancel();
            }
            Err(e) => {
                debug!(
                    target: "lc.actor.controller",
                    operation = kind,
                    error = %e,
                    "Operation rejected"
                );
            }
            Ok(_) => {
                if let Err(violation) = self.registry.check_invariants() {
                    error!(
                        target: "lc.actor.controller",
                        lc_id = %self.lc_id,
                        operation = kind,
                        error = %violation,
                        "Registry invariant violated after successful operation"
                    );
                    metrics::record_invariant_violation();
                    self.cancel_token.cancel();
                    return Err(violation.into());
                }
            }
        }

        result
    }

    fn publish_gauges(&self) {
        metrics::set_lobbies_active(self.registry.lobby_count());
        metrics::set_participants_active(self.registry.participant_count());
    }

    fn get_status(&self) -> ControllerStatus {
        ControllerStatus {
            lobby_count: self.registry.lobby_count(),
            participant_count: self.registry.participant_count(),
            is_draining: !self.accepting_new,
            messages_processed: self.messages_processed,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::registry::{Effect, RegistryError};
    use std::time::Duration;

    fn handle(max_lobbies: u32, max_players: usize) -> LobbyControllerActorHandle {
        LobbyControllerActorHandle::new(
            "lc-test".to_string(),
            RegistryLimits {
                max_lobbies,
                max_players,
            },
        )
    }

    fn p(name: &str) -> ParticipantId {
        ParticipantId::from(name)
    }

    #[tokio::test]
    async fn test_controller_handle_open_and_list() {
        let handle = handle(2, 2);

        let (id, effects) = handle.open_lobby().await.unwrap();
        assert_eq!(id, LobbyId(1));
        assert!(matches!(
            effects.first(),
            Some(Effect::CreateVoiceChannel { lobby_id }) if *lobby_id == id
        ));

        let lobbies = handle.list_lobbies().await.unwrap();
        assert_eq!(lobbies.len(), 1);
        assert_eq!(lobbies.first().unwrap().id, id);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_handle_capacity_exceeded() {
        let handle = handle(1, 2);
        handle.open_lobby().await.unwrap();

        let result = handle.open_lobby().await;
        assert!(matches!(
            result,
            Err(LcError::Registry(RegistryError::CapacityExceeded { max: 1 }))
        ));

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_handle_sign_up_sign_out() {
        let handle = handle(1, 1);
        let (id, _) = handle.open_lobby().await.unwrap();

        let (placement, _) = handle.sign_up(id, p("a")).await.unwrap();
        assert_eq!(placement, Placement::Player);
        let (placement, _) = handle.sign_up(id, p("b")).await.unwrap();
        assert_eq!(placement, Placement::Queued { position: 1 });

        let (outcome, _) = handle.sign_out(p("a")).await.unwrap();
        assert_eq!(outcome.promoted, Some(p("b")));

        let status = handle.get_status().await.unwrap();
        assert_eq!(status.lobby_count, 1);
        assert_eq!(status.participant_count, 1);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_handle_not_member() {
        let handle = handle(1, 1);

        let result = handle.sign_out(p("ghost")).await;
        assert!(matches!(
            result,
            Err(LcError::Registry(RegistryError::NotMember(_)))
        ));

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_drain_refuses_new_lobbies() {
        let handle = handle(3, 2);
        handle.open_lobby().await.unwrap();
        handle.open_lobby().await.unwrap();
        handle.sign_up(LobbyId(2), p("a")).await.unwrap();

        let batches = handle.drain_all().await.unwrap();
        assert_eq!(batches.len(), 2);

        let status = handle.get_status().await.unwrap();
        assert!(status.is_draining);
        assert_eq!(status.lobby_count, 0);
        assert_eq!(status.participant_count, 0);

        assert!(matches!(handle.open_lobby().await, Err(LcError::Draining)));

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_serializes_concurrent_sign_ups() {
        let handle = handle(1, 3);
        let (id, _) = handle.open_lobby().await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let h = handle.clone();
            tasks.push(tokio::spawn(async move {
                h.sign_up(id, ParticipantId::new(format!("user{i}"))).await
            }));
        }

        let mut players = 0;
        let mut queued = 0;
        for task in tasks {
            match task.await.unwrap().unwrap().0 {
                Placement::Player => players += 1,
                Placement::Queued { .. } => queued += 1,
            }
        }
        assert_eq!(players, 3);
        assert_eq!(queued, 17);

        let summary = handle.list_lobbies().await.unwrap();
        assert_eq!(summary.first().unwrap().player_count, 3);
        assert_eq!(summary.first().unwrap().queue_count, 17);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_cancellation_token() {
        let handle = handle(1, 1);

        assert!(!handle.is_cancelled());
        let child = handle.child_token();
        assert!(!child.is_cancelled());

        handle.cancel();

        // Give time for cancellation to propagate
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(handle.is_cancelled());
        assert!(child.is_cancelled());
        assert!(matches!(
            handle.list_lobbies().await,
            Err(LcError::Internal(_))
        ));
    }
}
