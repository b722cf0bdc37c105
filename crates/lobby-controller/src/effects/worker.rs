//! `EffectWorker` - runs registry effects against a resource provider.
//!
//! One worker task consumes batches in submission order, so effects for a
//! lobby are applied in the order the controller produced them. Created
//! handles are written back through the controller; any delete effects it
//! answers with (orphaned or replaced handles) run before the next effect of
//! the batch. Teardown of the shared containers is queued like a batch, so it
//! runs only after every effect submitted before it.

use crate::actors::LobbyControllerActorHandle;
use crate::errors::LcError;
use crate::observability::metrics;
use crate::registry::{Effect, Effects, LobbyId, ResourceHandle, StatusDisplayHandle};
use crate::resources::{ResourceError, ResourceProvider};

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default channel buffer size for the worker mailbox.
const EFFECT_CHANNEL_BUFFER: usize = 256;

/// A failed effect, reported on the optional failure channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectFailure {
    pub lobby_id: LobbyId,
    pub kind: &'static str,
    pub error: ResourceError,
}

#[derive(Debug)]
enum WorkerMessage {
    Run(Effects),
    Flush { respond_to: oneshot::Sender<()> },
    Teardown {
        respond_to: oneshot::Sender<Result<(), ResourceError>>,
    },
}

/// Handle to the effect worker task.
#[derive(Clone, Debug)]
pub struct EffectWorkerHandle {
    sender: mpsc::Sender<WorkerMessage>,
    cancel_token: CancellationToken,
}

impl EffectWorkerHandle {
    /// Spawn the worker.
    ///
    /// `failures`, when set, receives every effect the provider rejected.
    /// Reports are dropped if that channel is full.
    pub fn spawn(
        provider: Arc<dyn ResourceProvider>,
        controller: LobbyControllerActorHandle,
        failures: Option<mpsc::Sender<EffectFailure>>,
        cancel_token: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(EFFECT_CHANNEL_BUFFER);

        let worker = EffectWorker {
            receiver,
            provider,
            controller,
            failures,
            cancel_token: cancel_token.clone(),
            displays: HashMap::new(),
        };
        let task = tokio::spawn(worker.run());

        (
            Self {
                sender,
                cancel_token,
            },
            task,
        )
    }

    /// Queue a batch. Empty batches are accepted without waking the worker.
    pub async fn submit(&self, effects: Effects) -> Result<(), LcError> {
        if effects.is_empty() {
            return Ok(());
        }

        self.sender
            .send(WorkerMessage::Run(effects))
            .await
            .map_err(|e| LcError::Internal(format!("channel send failed: {e}")))
    }

    /// Wait until every batch submitted before this call has been executed.
    pub async fn flush(&self) -> Result<(), LcError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(WorkerMessage::Flush { respond_to: tx })
            .await
            .map_err(|e| LcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| LcError::Internal(format!("response receive failed: {e}")))
    }

    /// Remove the status channel and lobby category once every batch
    /// submitted before this call has run.
    pub async fn teardown(&self) -> Result<(), LcError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(WorkerMessage::Teardown { respond_to: tx })
            .await
            .map_err(|e| LcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| LcError::Internal(format!("response receive failed: {e}")))?
            .map_err(LcError::from)
    }

    /// Stop the worker. Queued batches are abandoned.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

struct EffectWorker {
    receiver: mpsc::Receiver<WorkerMessage>,
    provider: Arc<dyn ResourceProvider>,
    controller: LobbyControllerActorHandle,
    failures: Option<mpsc::Sender<EffectFailure>>,
    cancel_token: CancellationToken,
    /// Last display handle rendered per lobby, so renders issued before the
    /// handle was bound still update in place.
    displays: HashMap<LobbyId, StatusDisplayHandle>,
}

impl EffectWorker {
    #[instrument(skip_all, name = "lc.effects")]
    async fn run(mut self) {
        info!(target: "lc.effects", "EffectWorker started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "lc.effects",
                        pending = self.receiver.len(),
                        "EffectWorker received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(WorkerMessage::Run(effects)) => {
                            metrics::set_actor_mailbox_depth("effects", self.receiver.len());
                            self.run_batch(effects).await;
                        }
                        Some(WorkerMessage::Flush { respond_to }) => {
                            let _ = respond_to.send(());
                        }
                        Some(WorkerMessage::Teardown { respond_to }) => {
                            let _ = respond_to.send(self.teardown().await);
                        }
                        None => {
                            info!(target: "lc.effects", "EffectWorker channel closed, exiting");
                            break;
                        }
                    }
                }
            }
        }

        info!(target: "lc.effects", "EffectWorker stopped");
    }

    async fn teardown(&mut self) -> Result<(), ResourceError> {
        let started = Instant::now();
        let result = self.provider.teardown().await;
        metrics::record_effect("teardown", result.is_ok(), started.elapsed());

        match &result {
            Ok(()) => {
                self.displays.clear();
                info!(target: "lc.effects", "Shared containers removed");
            }
            Err(error) => {
                warn!(target: "lc.effects", error = %error, "Teardown failed");
            }
        }
        result
    }

    async fn run_batch(&mut self, effects: Effects) {
        let mut pending: VecDeque<Effect> = effects.into();

        while let Some(effect) = pending.pop_front() {
            let follow_ups = self.execute(effect).await;
            for follow_up in follow_ups.into_iter().rev() {
                pending.push_front(follow_up);
            }
        }
    }

    /// Run one effect. Returns effects the controller asked for in response
    /// to a handle write-back.
    async fn execute(&mut self, effect: Effect) -> Effects {
        let kind = effect.kind();
        let lobby_id = effect.lobby_id();
        let started = Instant::now();

        let result = match effect {
            Effect::CreateVoiceChannel { lobby_id } => self
                .provider
                .create_voice_channel(lobby_id)
                .await
                .map(|handle| Some(ResourceHandle::VoiceChannel(handle))),

            Effect::DeleteVoiceChannel { handle, .. } => self
                .provider
                .delete_voice_channel(&handle)
                .await
                .map(|()| None),

            Effect::RenderStatusDisplay(mut request) => {
                if request.existing.is_none() {
                    request.existing = self.displays.get(&request.lobby_id).cloned();
                }

                self.provider
                    .render_status_display(&request)
                    .await
                    .map(|handle| {
                        self.displays.insert(lobby_id, handle.clone());
                        (request.existing.as_ref() != Some(&handle))
                            .then_some(ResourceHandle::StatusDisplay(handle))
                    })
            }

            Effect::DeleteStatusDisplay { handle, .. } => {
                if self.displays.get(&lobby_id) == Some(&handle) {
                    self.displays.remove(&lobby_id);
                }
                self.provider
                    .delete_status_display(&handle)
                    .await
                    .map(|()| None)
            }
        };

        metrics::record_effect(kind, result.is_ok(), started.elapsed());

        match result {
            Ok(Some(handle)) => self.bind(lobby_id, handle).await,
            Ok(None) => {
                debug!(target: "lc.effects", lobby_id = %lobby_id, kind, "Effect applied");
                Vec::new()
            }
            Err(error) => {
                warn!(
                    target: "lc.effects",
                    lobby_id = %lobby_id,
                    kind,
                    error = %error,
                    "Effect failed"
                );
                self.report(EffectFailure {
                    lobby_id,
                    kind,
                    error,
                });
                Vec::new()
            }
        }
    }

    async fn bind(&mut self, lobby_id: LobbyId, handle: ResourceHandle) -> Effects {
        debug!(target: "lc.effects", lobby_id = %lobby_id, handle = ?handle, "Binding handle");

        match self.controller.bind_resource(lobby_id, handle).await {
            Ok(follow_ups) => {
                // Lobby closed, or the handle replaced an older one.
                if !follow_ups.is_empty() {
                    debug!(
                        target: "lc.effects",
                        lobby_id = %lobby_id,
                        count = follow_ups.len(),
                        "Controller returned cleanup effects"
                    );
                }
                follow_ups
            }
            Err(e) => {
                warn!(
                    target: "lc.effects",
                    lobby_id = %lobby_id,
                    error = %e,
                    "Failed to bind handle, controller unavailable"
                );
                Vec::new()
            }
        }
    }

    fn report(&self, failure: EffectFailure) {
        if let Some(failures) = &self.failures {
            if failures.try_send(failure).is_err() {
                debug!(target: "lc.effects", "Failure report dropped");
            }
        }
    }
}
