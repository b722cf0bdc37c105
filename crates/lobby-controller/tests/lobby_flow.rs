//! End-to-end command flows.
//!
//! Drives the command dispatcher, controller actor and effect worker
//! together against `MockResourceProvider`:
//! - Sign-up, queueing and promotion as seen by participants
//! - Channel gating and usage replies
//! - Resource lifecycle across open, update and close
//! - Shutdown drain

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lobby_controller::actors::LobbyControllerActorHandle;
use lobby_controller::commands::CommandDispatcher;
use lobby_controller::config::Config;
use lobby_controller::effects::{release_all, EffectWorkerHandle};
use lobby_controller::errors::LcError;
use lobby_controller::registry::{LobbyId, ParticipantId, StatusDisplayHandle};
use lobby_controller::resources::mock::{MockResourceProvider, ProviderCall};
use lobby_controller::resources::ResourceProvider;

const COMMANDS: &str = "customs_bot_commands";

struct Harness {
    controller: LobbyControllerActorHandle,
    effects: EffectWorkerHandle,
    dispatcher: CommandDispatcher,
    provider: Arc<MockResourceProvider>,
}

impl Harness {
    fn new(max_lobbies: u32, max_players: usize) -> Self {
        let vars = HashMap::from([
            ("LC_MAX_LOBBIES".to_string(), max_lobbies.to_string()),
            ("LC_MAX_PLAYERS".to_string(), max_players.to_string()),
            ("LC_ID".to_string(), "lc-integration".to_string()),
        ]);
        let config = Config::from_vars(&vars).expect("Config should load successfully");

        let provider = Arc::new(MockResourceProvider::new());
        let controller =
            LobbyControllerActorHandle::new(config.lc_id.clone(), config.registry_limits());
        let shared: Arc<dyn ResourceProvider> = provider.clone();
        let (effects, _task) = EffectWorkerHandle::spawn(
            shared,
            controller.clone(),
            None,
            controller.child_token(),
        );
        let dispatcher = CommandDispatcher::new(&config, controller.clone(), effects.clone());

        Self {
            controller,
            effects,
            dispatcher,
            provider,
        }
    }

    /// Send a message in the commands channel and render the replies.
    async fn say(&self, author: &str, text: &str) -> Vec<String> {
        self.say_in(COMMANDS, author, text).await
    }

    async fn say_in(&self, channel: &str, author: &str, text: &str) -> Vec<String> {
        self.dispatcher
            .dispatch(channel, author, text)
            .await
            .into_iter()
            .map(|reply| reply.to_string())
            .collect()
    }

    async fn settle(&self) {
        self.effects.flush().await.unwrap();
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.controller.cancel();
    }
}

// ============================================================================
// Participant-facing flows
// ============================================================================

#[tokio::test]
async fn test_full_lobby_queues_and_promotes() {
    let h = Harness::new(1, 2);

    assert_eq!(h.say("host", "!open_lobby").await, vec!["Lobby 1 created!"]);
    assert_eq!(h.say("x", "!sign_up 1").await, vec!["x joined Lobby 1!"]);
    assert_eq!(h.say("y", "!sign_up 1").await, vec!["y joined Lobby 1!"]);
    assert_eq!(
        h.say("z", "!sign_up 1").await,
        vec!["Lobby 1 is full. z added to the queue (position 1)."]
    );
    assert_eq!(
        h.say("host", "!list_lobbies").await,
        vec!["Lobby 1: Players: 2, Queue: 1"]
    );

    assert_eq!(
        h.say("x", "!sign_out").await,
        vec!["z moved from queue to Lobby 1!", "x left Lobby 1."]
    );
    assert_eq!(
        h.say("host", "!list_lobbies").await,
        vec!["Lobby 1: Players: 2, Queue: 0"]
    );
}

#[tokio::test]
async fn test_user_errors_are_replies() {
    let h = Harness::new(1, 2);

    assert_eq!(
        h.say("x", "!sign_up 1").await,
        vec!["Lobby 1 does not exist!"]
    );
    assert_eq!(
        h.say("x", "!sign_out").await,
        vec!["x, you are not in any lobby or queue!"]
    );

    h.say("host", "!open_lobby").await;
    assert_eq!(
        h.say("host", "!open_lobby").await,
        vec!["Maximum number of lobbies reached!"]
    );

    h.say("x", "!sign_up 1").await;
    assert_eq!(
        h.say("x", "!sign_up 1").await,
        vec!["x, you are already signed up for a lobby or queue!"]
    );
    assert_eq!(
        h.say("host", "!close_lobby 9").await,
        vec!["Lobby 9 does not exist!"]
    );
}

#[tokio::test]
async fn test_already_member_checked_before_lobby_exists() {
    let h = Harness::new(2, 2);
    h.say("host", "!open_lobby").await;
    h.say("x", "!sign_up 1").await;

    assert_eq!(
        h.say("x", "!sign_up 7").await,
        vec!["x, you are already signed up for a lobby or queue!"]
    );
}

#[tokio::test]
async fn test_close_releases_members() {
    let h = Harness::new(2, 1);
    h.say("host", "!open_lobby").await;
    h.say("host", "!open_lobby").await;
    h.say("x", "!sign_up 1").await;
    h.say("y", "!sign_up 1").await;

    assert_eq!(h.say("host", "!close_lobby 1").await, vec!["Lobby 1 closed!"]);
    assert_eq!(h.say("x", "!sign_up 2").await, vec!["x joined Lobby 2!"]);
    assert_eq!(
        h.say("y", "!sign_up 2").await,
        vec!["Lobby 2 is full. y added to the queue (position 1)."]
    );

    // The freed id is reused.
    assert_eq!(h.say("host", "!open_lobby").await, vec!["Lobby 1 created!"]);
    assert_eq!(
        h.say("host", "!list_lobbies").await,
        vec!["Lobby 1: Players: 0, Queue: 0", "Lobby 2: Players: 1, Queue: 1"]
    );
}

#[tokio::test]
async fn test_no_lobbies_reply() {
    let h = Harness::new(1, 1);
    assert_eq!(h.say("x", "!list_lobbies").await, vec!["No active lobbies."]);
}

// ============================================================================
// Command surface
// ============================================================================

#[tokio::test]
async fn test_commands_outside_commands_channel() {
    let h = Harness::new(1, 1);

    assert_eq!(
        h.say_in("general", "x", "!open_lobby").await,
        vec!["Commands must be used in the `customs_bot_commands` channel."]
    );
    // Nothing was opened.
    assert!(h.controller.list_lobbies().await.unwrap().is_empty());

    // Chatter and malformed commands elsewhere are ignored.
    assert!(h.say_in("general", "x", "hello").await.is_empty());
    assert!(h.say_in("general", "x", "!dance").await.is_empty());
}

#[tokio::test]
async fn test_usage_and_unknown_replies() {
    let h = Harness::new(1, 1);

    assert_eq!(
        h.say("x", "!sign_up").await,
        vec!["Usage: `!sign_up <lobby_id>`"]
    );
    assert_eq!(
        h.say("x", "!close_lobby one").await,
        vec!["Usage: `!close_lobby <lobby_id>`"]
    );
    assert_eq!(
        h.say("x", "!dance").await,
        vec!["Unknown command `!dance`. Use `!help` to list commands."]
    );
    assert!(h.say("x", "just chatting").await.is_empty());

    let help = h.say("x", "!help").await;
    assert_eq!(help.len(), 1);
    assert!(help[0].contains("`!sign_up <lobby_id>`"));
}

// ============================================================================
// Resource lifecycle
// ============================================================================

#[tokio::test]
async fn test_resource_lifecycle() {
    let h = Harness::new(1, 1);

    for (author, text) in [
        ("host", "!open_lobby"),
        ("x", "!sign_up 1"),
        ("y", "!sign_up 1"),
        ("host", "!close_lobby 1"),
    ] {
        h.say(author, text).await;
        h.settle().await;
    }

    let calls = h.provider.calls();
    assert_eq!(calls[0], ProviderCall::CreateVoiceChannel(LobbyId(1)));

    let renders: Vec<_> = calls
        .iter()
        .filter_map(|call| match call {
            ProviderCall::RenderStatusDisplay(request) => Some(request),
            _ => None,
        })
        .collect();
    assert_eq!(renders.len(), 3);
    assert_eq!(renders[0].existing, None);
    // Later renders update the same display in place.
    let display = StatusDisplayHandle("display-2".to_string());
    assert_eq!(renders[1].existing.as_ref(), Some(&display));
    assert_eq!(renders[2].existing.as_ref(), Some(&display));
    assert_eq!(renders[2].players, vec![ParticipantId::from("x")]);
    assert_eq!(renders[2].queue, vec![ParticipantId::from("y")]);

    // Both resources are deleted on close.
    assert!(calls
        .iter()
        .any(|call| matches!(call, ProviderCall::DeleteVoiceChannel(_))));
    assert_eq!(
        calls.last(),
        Some(&ProviderCall::DeleteStatusDisplay(display))
    );
}

#[tokio::test]
async fn test_provider_failures_do_not_block_commands() {
    let h = Harness::new(1, 2);
    h.provider.set_fail_renders(true);

    assert_eq!(h.say("host", "!open_lobby").await, vec!["Lobby 1 created!"]);
    assert_eq!(h.say("x", "!sign_up 1").await, vec!["x joined Lobby 1!"]);
    h.settle().await;

    assert_eq!(
        h.say("host", "!list_lobbies").await,
        vec!["Lobby 1: Players: 1, Queue: 0"]
    );
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_drain_releases_everything() {
    let h = Harness::new(3, 2);
    h.say("host", "!open_lobby").await;
    h.say("host", "!open_lobby").await;
    h.say("x", "!sign_up 2").await;
    h.settle().await;

    let batches = h.controller.drain_all().await.unwrap();
    assert_eq!(
        batches.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
        vec![LobbyId(1), LobbyId(2)]
    );
    for (_, batch) in batches {
        h.effects.submit(batch).await.unwrap();
    }
    h.settle().await;

    let deletes = h
        .provider
        .calls()
        .into_iter()
        .filter(|call| {
            matches!(
                call,
                ProviderCall::DeleteVoiceChannel(_) | ProviderCall::DeleteStatusDisplay(_)
            )
        })
        .count();
    assert_eq!(deletes, 4);

    assert!(matches!(
        h.controller.open_lobby().await,
        Err(LcError::Draining)
    ));
    assert_eq!(
        h.say("host", "!open_lobby").await,
        vec!["Lobbies are shutting down, no new lobbies can be opened"]
    );
}

#[tokio::test]
async fn test_shutdown_tears_down_containers_after_drain() {
    let h = Harness::new(2, 1);
    h.provider.ensure_containers().await.unwrap();
    h.say("host", "!open_lobby").await;
    h.say("host", "!open_lobby").await;
    h.say("x", "!sign_up 1").await;
    h.say("y", "!sign_up 1").await;
    h.settle().await;

    release_all(&h.controller, &h.effects, Duration::from_secs(5))
        .await
        .unwrap();

    let calls = h.provider.calls();
    assert_eq!(calls.first(), Some(&ProviderCall::EnsureContainers));
    assert_eq!(calls.last(), Some(&ProviderCall::Teardown));
    assert_eq!(
        calls.iter().filter(|call| **call == ProviderCall::Teardown).count(),
        1
    );

    // Every lobby resource was deleted before the containers went.
    let teardown_at = calls.len() - 1;
    let deletes: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, call)| {
            matches!(
                call,
                ProviderCall::DeleteVoiceChannel(_) | ProviderCall::DeleteStatusDisplay(_)
            )
        })
        .map(|(index, _)| index)
        .collect();
    assert_eq!(deletes.len(), 4);
    assert!(deletes.iter().all(|index| *index < teardown_at));
    assert_eq!(h.provider.live_handles(), 0);

    assert!(h.controller.list_lobbies().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_shutdown_reports_teardown_failure() {
    let h = Harness::new(1, 1);
    h.say("host", "!open_lobby").await;
    h.settle().await;
    h.provider.set_fail_all(true);

    let err = release_all(&h.controller, &h.effects, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, LcError::Resource(_)));
    assert_eq!(h.provider.calls().last(), Some(&ProviderCall::Teardown));
}
