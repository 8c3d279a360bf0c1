use idf_auth::IdentityVerifier;
use idf_store::Store;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Create new state
    #[must_use]
    pub fn new(store: Arc<dyn Store>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { store, verifier }
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
