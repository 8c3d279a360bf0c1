//! Fixed runner over an ordered list of steps

use super::context::{Resolved, ValidationContext};
use super::rejection::ChainError;
use super::steps::{CheckIdFormat, RequirePrincipal, ResolveOwnership, StepOutcome, ValidationStep};
use super::target::{ChainTarget, PathIds};
use idf_model::{Principal, UserView, UserVisualisation, Workspace};
use idf_store::Store;
use tracing::debug;

/// Ordered validation steps
pub struct Pipeline {
    steps: Vec<Box<dyn ValidationStep>>,
}

impl Pipeline {
    /// Create new pipeline from explicit steps
    #[must_use]
    pub fn new(steps: Vec<Box<dyn ValidationStep>>) -> Self {
        Self { steps }
    }

    /// Principal, then id format, then ownership
    #[must_use]
    pub fn ownership_chain() -> Self {
        Self::new(vec![
            Box::new(RequirePrincipal),
            Box::new(CheckIdFormat),
            Box::new(ResolveOwnership),
        ])
    }

    /// Step names in run order
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step; the first rejection ends the run
    ///
    /// The returned context is terminal: either authorized or rejected with
    /// its reason.
    pub async fn run(
        &self,
        store: &dyn Store,
        ctx: ValidationContext,
    ) -> Result<ValidationContext, ChainError> {
        let mut current = ctx;
        for step in &self.steps {
            match step.apply(store, &current).await? {
                StepOutcome::Continue(next) => current = next,
                StepOutcome::Reject(rejection) => {
                    debug!(
                        step = step.name(),
                        target = %current.target(),
                        reason = %rejection,
                        "chain rejected"
                    );
                    return Ok(current.rejected(rejection)?);
                }
            }
        }
        debug!(target = %current.target(), "chain authorized");
        Ok(current.authorized()?)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::ownership_chain()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

/// Run the ownership chain for `target` and return what it resolved
pub async fn validate_chain(
    store: &dyn Store,
    principal: Option<&Principal>,
    target: ChainTarget,
    ids: PathIds,
) -> Result<Resolved, ChainError> {
    let ctx = ValidationContext::new(target, ids, principal.cloned());
    let done = Pipeline::ownership_chain().run(store, ctx).await?;

    if let Some(rejection) = done.rejection() {
        return Err(ChainError::Rejected(rejection.clone()));
    }
    done.resolved()
        .cloned()
        .ok_or(ChainError::Unresolved("authorized chain"))
}

/// Workspace the principal owns
pub async fn authorize_workspace(
    store: &dyn Store,
    principal: Option<&Principal>,
    ids: PathIds,
) -> Result<Workspace, ChainError> {
    match validate_chain(store, principal, ChainTarget::Workspace, ids).await? {
        Resolved::Workspace(w) => Ok(w),
        _ => Err(ChainError::Unresolved("workspace")),
    }
}

/// View within a workspace the principal owns
pub async fn authorize_view(
    store: &dyn Store,
    principal: Option<&Principal>,
    ids: PathIds,
) -> Result<UserView, ChainError> {
    match validate_chain(store, principal, ChainTarget::View, ids).await? {
        Resolved::View(v) => Ok(v),
        _ => Err(ChainError::Unresolved("view")),
    }
}

/// Visualisation within a view within a workspace the principal owns
pub async fn authorize_user_vis(
    store: &dyn Store,
    principal: Option<&Principal>,
    ids: PathIds,
) -> Result<UserVisualisation, ChainError> {
    match validate_chain(store, principal, ChainTarget::UserVis, ids).await? {
        Resolved::UserVis(v) => Ok(v),
        _ => Err(ChainError::Unresolved("user vis")),
    }
}

/// Views of a workspace the principal owns; empty if it has none
pub async fn authorize_view_list(
    store: &dyn Store,
    principal: Option<&Principal>,
    ids: PathIds,
) -> Result<Vec<UserView>, ChainError> {
    match validate_chain(store, principal, ChainTarget::ViewList, ids).await? {
        Resolved::Views(v) => Ok(v),
        _ => Err(ChainError::Unresolved("view list")),
    }
}

/// Visualisations of a view the principal owns; empty if it has none
pub async fn authorize_user_vis_list(
    store: &dyn Store,
    principal: Option<&Principal>,
    ids: PathIds,
) -> Result<Vec<UserVisualisation>, ChainError> {
    match validate_chain(store, principal, ChainTarget::UserVisList, ids).await? {
        Resolved::UserVisualisations(v) => Ok(v),
        _ => Err(ChainError::Unresolved("user vis list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        assert_eq!(
            Pipeline::default().step_names(),
            vec!["require-principal", "check-id-format", "resolve-ownership"]
        );
    }
}
