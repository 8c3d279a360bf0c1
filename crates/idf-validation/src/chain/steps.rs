//! Individual validation steps
//!
//! Steps run strictly in order. Each one either continues with an updated
//! context or rejects; only storage failures escape as errors.

use super::context::{Resolved, ValidationContext};
use super::rejection::{ChainError, Rejection};
use super::target::{ChainTarget, ParsedIds};
use async_trait::async_trait;
use idf_model::Principal;
use idf_store::{ChainRow, Owned, Store};

/// Result of running one step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Continue(ValidationContext),
    Reject(Rejection),
}

/// One check in a validation pipeline
#[async_trait]
pub trait ValidationStep: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn apply(
        &self,
        store: &dyn Store,
        ctx: &ValidationContext,
    ) -> Result<StepOutcome, ChainError>;
}

/// Fails closed when identity verification supplied no principal
#[derive(Debug, Clone, Copy, Default)]
pub struct RequirePrincipal;

#[async_trait]
impl ValidationStep for RequirePrincipal {
    fn name(&self) -> &'static str {
        "require-principal"
    }

    async fn apply(
        &self,
        _store: &dyn Store,
        ctx: &ValidationContext,
    ) -> Result<StepOutcome, ChainError> {
        Ok(match ctx.principal() {
            Some(_) => StepOutcome::Continue(ctx.clone()),
            None => StepOutcome::Reject(Rejection::MissingPrincipal),
        })
    }
}

/// Parses every path id the target needs; never touches storage
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckIdFormat;

#[async_trait]
impl ValidationStep for CheckIdFormat {
    fn name(&self) -> &'static str {
        "check-id-format"
    }

    async fn apply(
        &self,
        _store: &dyn Store,
        ctx: &ValidationContext,
    ) -> Result<StepOutcome, ChainError> {
        match ParsedIds::parse(ctx.target(), ctx.raw()) {
            Ok(ids) => Ok(StepOutcome::Continue(ctx.format_checked(ids)?)),
            Err((param, value)) => Ok(StepOutcome::Reject(Rejection::Format { param, value })),
        }
    }
}

/// Resolves the chain with one join and compares its owner to the principal
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOwnership;

fn owned_by<T>(
    principal: &Principal,
    row: Option<Owned<T>>,
    missing: Rejection,
) -> Result<T, Rejection> {
    let row = row.ok_or(missing)?;
    if principal.owns(&row.owner_email) {
        Ok(row.entity)
    } else {
        Err(Rejection::NotOwned)
    }
}

fn owned_list<T>(
    principal: &Principal,
    rows: Vec<ChainRow<T>>,
    missing: Rejection,
) -> Result<Vec<T>, Rejection> {
    let owner = rows.first().map(|r| r.owner_email.as_str()).ok_or(missing)?;
    if !principal.owns(owner) {
        return Err(Rejection::NotOwned);
    }
    Ok(rows.into_iter().filter_map(|r| r.child).collect())
}

#[async_trait]
impl ValidationStep for ResolveOwnership {
    fn name(&self) -> &'static str {
        "resolve-ownership"
    }

    async fn apply(
        &self,
        store: &dyn Store,
        ctx: &ValidationContext,
    ) -> Result<StepOutcome, ChainError> {
        let Some(principal) = ctx.principal() else {
            return Ok(StepOutcome::Reject(Rejection::MissingPrincipal));
        };
        let Some(ids) = ctx.ids() else {
            return Err(ChainError::Unresolved("unparsed ids"));
        };
        let view_id = ids.view_id.ok_or(ChainError::Unresolved("view id"));
        let user_vis_id = ids.user_vis_id.ok_or(ChainError::Unresolved("user vis id"));

        let resolved = match ctx.target() {
            ChainTarget::Workspace => {
                let row = store.workspace_chain(ids.workspace_id).await?;
                owned_by(principal, row, Rejection::WorkspaceNotFound).map(Resolved::Workspace)
            }
            ChainTarget::View => {
                let row = store.view_chain(ids.workspace_id, view_id?).await?;
                owned_by(principal, row, Rejection::ViewMismatch).map(Resolved::View)
            }
            ChainTarget::UserVis => {
                let row = store
                    .user_vis_chain(ids.workspace_id, view_id?, user_vis_id?)
                    .await?;
                owned_by(principal, row, Rejection::UserVisMismatch).map(Resolved::UserVis)
            }
            ChainTarget::ViewList => {
                let rows = store.view_list_chain(ids.workspace_id).await?;
                owned_list(principal, rows, Rejection::WorkspaceNotFound).map(Resolved::Views)
            }
            ChainTarget::UserVisList => {
                let rows = store.user_vis_list_chain(ids.workspace_id, view_id?).await?;
                owned_list(principal, rows, Rejection::ViewMismatch)
                    .map(Resolved::UserVisualisations)
            }
        };

        match resolved {
            Ok(resolved) => Ok(StepOutcome::Continue(ctx.ownership_checked(resolved)?)),
            Err(rejection) => Ok(StepOutcome::Reject(rejection)),
        }
    }
}
