use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated caller
///
/// Resolved from a verified identity token before any handler runs. Never
/// persisted; workspaces refer to it by email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    email: String,
}

impl Principal {
    /// Create principal from a verified email
    #[inline]
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// Email the principal was verified as
    #[inline]
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Whether this principal is the given owner
    #[inline]
    #[must_use]
    pub fn owns(&self, owner_email: &str) -> bool {
        self.email == owner_email
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}
