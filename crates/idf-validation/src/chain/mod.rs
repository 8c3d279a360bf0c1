//! Workspace → view → visualisation ownership chain
//!
//! For a request naming `workspaceId`, optionally `viewId` and optionally
//! `userVisId`, the chain either resolves the deepest entity owned by the
//! principal or produces exactly one [`Rejection`].
//!
//! # Stages
//!
//! ```text
//! Unvalidated ──▶ FormatChecked ──▶ OwnershipChecked ──▶ Authorized
//!      │                │
//!      └───────┬────────┘
//!              ▼
//!           Rejected
//! ```
//!
//! Malformed ids are rejected before any storage query is issued.

mod context;
mod pipeline;
mod rejection;
mod stage;
mod steps;
mod target;

pub use context::{Resolved, ValidationContext};
pub use pipeline::{
    authorize_user_vis, authorize_user_vis_list, authorize_view, authorize_view_list,
    authorize_workspace, validate_chain, Pipeline,
};
pub use rejection::{ChainError, Rejection, RejectionKind};
pub use stage::{allowed_transitions, validate_transition, IllegalTransition, Stage};
pub use steps::{CheckIdFormat, RequirePrincipal, ResolveOwnership, StepOutcome, ValidationStep};
pub use target::{ChainTarget, IdParam, ParsedIds, PathIds};
