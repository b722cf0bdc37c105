//! Mock resource provider module for testing.
//!
//! Records every call in order and hands out sequential handles. Deleting a
//! handle the mock never issued (or already deleted) fails with
//! [`ResourceError::UnknownHandle`].

use super::{ResourceError, ResourceProvider};
use crate::registry::{LobbyId, StatusDisplayHandle, StatusDisplayRequest, VoiceChannelHandle};

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    EnsureContainers,
    Teardown,
    CreateVoiceChannel(LobbyId),
    DeleteVoiceChannel(VoiceChannelHandle),
    RenderStatusDisplay(StatusDisplayRequest),
    DeleteStatusDisplay(StatusDisplayHandle),
}

/// Mock resource provider for unit and integration tests.
#[derive(Debug, Default)]
pub struct MockResourceProvider {
    calls: Mutex<Vec<ProviderCall>>,
    issued: Mutex<HashSet<String>>,
    next_handle: AtomicUsize,
    fail_all: AtomicBool,
    fail_renders: AtomicBool,
}

impl MockResourceProvider {
    /// Create a mock that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails every call.
    #[must_use]
    pub fn failing() -> Self {
        let mock = Self::default();
        mock.fail_all.store(true, Ordering::SeqCst);
        mock
    }

    /// Toggle failure of every call.
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Toggle failure of status display renders only.
    pub fn set_fail_renders(&self, fail: bool) {
        self.fail_renders.store(fail, Ordering::SeqCst);
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of issued handles not yet deleted.
    pub fn live_handles(&self) -> usize {
        self.issued.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn record(&self, call: ProviderCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn check(&self, render: bool) -> Result<(), ResourceError> {
        if self.fail_all.load(Ordering::SeqCst) || (render && self.fail_renders.load(Ordering::SeqCst))
        {
            return Err(ResourceError::Unavailable(
                "Mock resource provider error".to_string(),
            ));
        }
        Ok(())
    }

    fn issue(&self, prefix: &str) -> String {
        let handle = format!(
            "{prefix}-{}",
            self.next_handle.fetch_add(1, Ordering::SeqCst) + 1
        );
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.clone());
        handle
    }

    fn revoke(&self, handle: &str) -> Result<(), ResourceError> {
        if self
            .issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle)
        {
            Ok(())
        } else {
            Err(ResourceError::UnknownHandle(handle.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl ResourceProvider for MockResourceProvider {
    async fn ensure_containers(&self) -> Result<(), ResourceError> {
        self.record(ProviderCall::EnsureContainers);
        self.check(false)
    }

    async fn teardown(&self) -> Result<(), ResourceError> {
        self.record(ProviderCall::Teardown);
        self.check(false)?;
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }

    async fn create_voice_channel(
        &self,
        lobby_id: LobbyId,
    ) -> Result<VoiceChannelHandle, ResourceError> {
        self.record(ProviderCall::CreateVoiceChannel(lobby_id));
        self.check(false)?;
        Ok(VoiceChannelHandle(self.issue("vc")))
    }

    async fn delete_voice_channel(&self, handle: &VoiceChannelHandle) -> Result<(), ResourceError> {
        self.record(ProviderCall::DeleteVoiceChannel(handle.clone()));
        self.check(false)?;
        self.revoke(&handle.0)
    }

    async fn render_status_display(
        &self,
        request: &StatusDisplayRequest,
    ) -> Result<StatusDisplayHandle, ResourceError> {
        self.record(ProviderCall::RenderStatusDisplay(request.clone()));
        self.check(true)?;
        Ok(request
            .existing
            .clone()
            .unwrap_or_else(|| StatusDisplayHandle(self.issue("display"))))
    }

    async fn delete_status_display(
        &self,
        handle: &StatusDisplayHandle,
    ) -> Result<(), ResourceError> {
        self.record(ProviderCall::DeleteStatusDisplay(handle.clone()));
        self.check(false)?;
        self.revoke(&handle.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_unknown_handle_fails() {
        let mock = MockResourceProvider::new();

        let err = mock
            .delete_voice_channel(&VoiceChannelHandle("vc-99".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, ResourceError::UnknownHandle("vc-99".to_string()));

        let err = mock
            .delete_status_display(&StatusDisplayHandle("display-1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::UnknownHandle(_)));
    }

    #[tokio::test]
    async fn test_handles_delete_once() {
        let mock = MockResourceProvider::new();
        let handle = mock.create_voice_channel(LobbyId(1)).await.unwrap();
        assert_eq!(mock.live_handles(), 1);

        mock.delete_voice_channel(&handle).await.unwrap();
        assert_eq!(mock.live_handles(), 0);
        assert_eq!(
            mock.delete_voice_channel(&handle).await,
            Err(ResourceError::UnknownHandle(handle.0.clone()))
        );
    }

    #[tokio::test]
    async fn test_teardown_releases_remaining_handles() {
        let mock = MockResourceProvider::new();
        mock.ensure_containers().await.unwrap();
        mock.create_voice_channel(LobbyId(1)).await.unwrap();

        mock.teardown().await.unwrap();

        assert_eq!(mock.live_handles(), 0);
        assert_eq!(mock.calls().first(), Some(&ProviderCall::EnsureContainers));
        assert_eq!(mock.calls().last(), Some(&ProviderCall::Teardown));
    }

    #[tokio::test]
    async fn test_failing_mock_fails_container_calls() {
        let mock = MockResourceProvider::failing();
        assert!(mock.ensure_containers().await.is_err());
        assert!(mock.teardown().await.is_err());
    }
}
