//! Identifire REST backend
//!
//! Serves workspaces, views and visualisations under `/api`, each scoped to
//! the caller named by a verified identity token, plus read-only measurement
//! and location reference data.
//!
//! # Request flow
//!
//! 1. [`CurrentUser`] verifies the bearer token (401 otherwise)
//! 2. the handler runs the ownership chain for its path ids
//! 3. the request body is sanitised and checked
//! 4. storage is written and the entity returned
//!
//! Failures map to responses through [`ApiError`].

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod extract;
pub mod identity;
pub mod logging;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ConfigError, DatabaseConfig, IdentityConfig, LogFormat, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use identity::CurrentUser;
pub use routes::{api_router, app};
pub use server::serve;
pub use state::AppState;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
