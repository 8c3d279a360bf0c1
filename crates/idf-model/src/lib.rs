//! Identifire data model
//!
//! Typed records shared by the storage layer, the ownership chain validator
//! and the REST handlers.
//!
//! # Core Concepts
//!
//! - [`Principal`]: the authenticated caller, identified by email
//! - [`Workspace`] → [`UserView`] → [`UserVisualisation`]: the ownership chain
//! - [`Measurement`] / [`Location`]: read-only reference data the charts bind to
//!
//! All records serialize with camelCase keys, which is the shape the
//! frontend consumes. Snake-case column names never leave the storage crate
//! except through [`camel_case_keys`] for subtype columns that are not known
//! statically.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod case;
mod entities;
mod ids;
mod principal;
mod reference;

pub use case::{camel_case_keys, to_camel_case};
pub use entities::{
    NewUserView, NewUserVisualisation, NewWorkspace, UserView, UserViewPatch, UserVisualisation,
    UserVisualisationPatch, Workspace, WorkspacePatch,
};
pub use ids::{IdParseError, LocationId, MeasurementId, UserVisId, ViewId, WorkspaceId};
pub use principal::Principal;
pub use reference::{
    Location, LocationDetail, LocationType, LocationTypeError, Measurement, MeasurementRecord,
    VisualisationKind,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
