//! Lobby Controller error types.
//!
//! Every error maps to an [`ErrorCode`] class for logs and metrics.
//! Invariant faults are logged server-side and never shown to participants.

use crate::registry::{InvariantViolation, RegistryError};
use crate::resources::ResourceError;
use std::fmt;
use thiserror::Error;

/// Coarse error classes reported alongside rejected commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Conflict,
    Internal,
    CapacityExceeded,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::Internal => "INTERNAL_ERROR",
            ErrorCode::CapacityExceeded => "CAPACITY_EXCEEDED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lobby Controller error type.
///
/// Maps to [`ErrorCode`]:
/// - `LobbyNotFound`, `NotMember`: `NotFound`
/// - `AlreadyMember`: `Conflict`
/// - Invariant, Resource, Internal: `Internal`
/// - `CapacityExceeded`, `Draining`: `CapacityExceeded`
#[derive(Debug, Error)]
pub enum LcError {
    /// Registry rejected the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Controller is shutting down and no longer opens lobbies.
    #[error("Lobby controller is draining")]
    Draining,

    /// Resource provider failed a container operation.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Internal error (actor channel failures and the like).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LcError {
    /// Returns the error class for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            LcError::Registry(RegistryError::LobbyNotFound(_) | RegistryError::NotMember(_)) => {
                ErrorCode::NotFound
            }
            LcError::Registry(RegistryError::AlreadyMember { .. }) => ErrorCode::Conflict,
            LcError::Registry(RegistryError::Invariant(_))
            | LcError::Resource(_)
            | LcError::Internal(_) => ErrorCode::Internal,
            LcError::Registry(RegistryError::CapacityExceeded { .. }) | LcError::Draining => {
                ErrorCode::CapacityExceeded
            }
        }
    }

    /// Whether this error signals a broken registry rather than a bad request.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, LcError::Registry(RegistryError::Invariant(_)))
    }

    /// Returns a participant-safe message (no internal details).
    pub fn client_message(&self) -> String {
        match self {
            LcError::Registry(RegistryError::Invariant(_))
            | LcError::Resource(_)
            | LcError::Internal(_) => "An internal error occurred".to_string(),
            LcError::Registry(RegistryError::CapacityExceeded { .. }) => {
                "Maximum number of lobbies reached!".to_string()
            }
            LcError::Registry(RegistryError::LobbyNotFound(id)) => {
                format!("Lobby {id} does not exist!")
            }
            LcError::Registry(RegistryError::AlreadyMember { participant, .. }) => {
                format!("{participant}, you are already signed up for a lobby or queue!")
            }
            LcError::Registry(RegistryError::NotMember(participant)) => {
                format!("{participant}, you are not in any lobby or queue!")
            }
            LcError::Draining => "Lobbies are shutting down, no new lobbies can be opened".to_string(),
        }
    }
}

impl From<InvariantViolation> for LcError {
    fn from(err: InvariantViolation) -> Self {
        LcError::Registry(RegistryError::Invariant(err))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::registry::{LobbyId, MembershipError, ParticipantId};

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            LcError::from(RegistryError::LobbyNotFound(LobbyId(1))).error_code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            LcError::from(RegistryError::NotMember(ParticipantId::from("a"))).error_code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            LcError::from(RegistryError::AlreadyMember {
                participant: ParticipantId::from("a"),
                lobby_id: LobbyId(2),
            })
            .error_code(),
            ErrorCode::Conflict
        );
        assert_eq!(
            LcError::Internal("boom".to_string()).error_code(),
            ErrorCode::Internal
        );
        assert_eq!(
            LcError::from(ResourceError::Unavailable("down".to_string())).error_code(),
            ErrorCode::Internal
        );
        assert_eq!(
            LcError::from(RegistryError::CapacityExceeded { max: 5 }).error_code(),
            ErrorCode::CapacityExceeded
        );
        assert_eq!(LcError::Draining.error_code(), ErrorCode::CapacityExceeded);
        assert_eq!(LcError::Draining.error_code().to_string(), "CAPACITY_EXCEEDED");
    }

    #[test]
    fn test_client_messages_hide_internal_details() {
        let err = LcError::from(InvariantViolation::Membership(MembershipError::NotBound(
            ParticipantId::from("mallory"),
        )));
        assert!(err.is_invariant_violation());
        assert_eq!(err.client_message(), "An internal error occurred");
        assert!(!err.client_message().contains("mallory"));

        let err = LcError::Internal("channel send failed: closed".to_string());
        assert!(!err.client_message().contains("channel"));
    }

    #[test]
    fn test_client_messages_for_user_errors() {
        assert_eq!(
            LcError::from(RegistryError::LobbyNotFound(LobbyId(4))).client_message(),
            "Lobby 4 does not exist!"
        );
        assert_eq!(
            LcError::from(RegistryError::NotMember(ParticipantId::from("zoe"))).client_message(),
            "zoe, you are not in any lobby or queue!"
        );
        assert_eq!(
            LcError::from(RegistryError::CapacityExceeded { max: 5 }).client_message(),
            "Maximum number of lobbies reached!"
        );
    }

    #[test]
    fn test_display_is_transparent_for_registry_errors() {
        assert_eq!(
            format!("{}", LcError::from(RegistryError::LobbyNotFound(LobbyId(9)))),
            "Lobby 9 does not exist"
        );
    }
}
