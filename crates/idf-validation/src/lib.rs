//! Identifire request validation
//!
//! Two concerns, both run before a handler touches storage for writing:
//!
//! - [`chain`]: resolves workspace → view → visualisation and confirms the
//!   principal owns it, short-circuiting on the first failure
//! - [`body`]: sanitises and checks create / update payloads, collecting
//!   every field error
//!
//! [`reference`] covers the unowned measurement and location ids.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod body;
pub mod chain;
pub mod reference;

pub use body::{FieldError, FieldErrors, FieldLocation};
pub use chain::{
    authorize_user_vis, authorize_user_vis_list, authorize_view, authorize_view_list,
    authorize_workspace, validate_chain, ChainError, ChainTarget, PathIds, Rejection,
    RejectionKind, Resolved,
};
pub use reference::{resolve_location, resolve_measurement};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
