//! Why a chain was not authorized

use super::stage::IllegalTransition;
use super::target::IdParam;
use idf_store::StoreError;

/// Broad class of a rejection, used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// A path id is malformed
    Format,
    /// Something in the chain does not exist
    NotFound,
    /// The chain exists but belongs to someone else
    NotOwned,
    /// No principal to check against
    Unauthenticated,
}

/// A request-level refusal, reported to the caller as-is
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("{param} must be an integer")]
    Format { param: IdParam, value: String },

    #[error("Workspace does not exist")]
    WorkspaceNotFound,

    #[error("Invalid combination of workspaceId and viewId")]
    ViewMismatch,

    #[error("Invalid combination of workspaceId, viewId and userVisId")]
    UserVisMismatch,

    #[error("Measurement does not exist")]
    MeasurementNotFound,

    #[error("Location with id '{location_id}' does not exist")]
    LocationNotFound { location_id: String },

    #[error("User does not own this workspace")]
    NotOwned,

    #[error("No user found in request")]
    MissingPrincipal,
}

impl Rejection {
    #[must_use]
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::Format { .. } => RejectionKind::Format,
            Rejection::WorkspaceNotFound
            | Rejection::ViewMismatch
            | Rejection::UserVisMismatch
            | Rejection::MeasurementNotFound
            | Rejection::LocationNotFound { .. } => RejectionKind::NotFound,
            Rejection::NotOwned => RejectionKind::NotOwned,
            Rejection::MissingPrincipal => RejectionKind::Unauthenticated,
        }
    }
}

/// Outcome of a chain validation that did not authorize
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Storage failed; not the caller's fault
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stage(#[from] IllegalTransition),

    /// Pipeline finished without resolving what the target asks for
    #[error("chain for {0} resolved nothing")]
    Unresolved(&'static str),
}

impl ChainError {
    /// The caller-facing rejection, if this is one
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ChainError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}
