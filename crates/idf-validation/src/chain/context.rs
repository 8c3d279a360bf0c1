//! The value threaded through validation steps
//!
//! Contexts are never mutated in place: each step receives one and hands
//! back an updated copy, so a step cannot observe another's partial writes.

use super::rejection::Rejection;
use super::stage::{validate_transition, IllegalTransition, Stage};
use super::target::{ChainTarget, ParsedIds, PathIds};
use idf_model::{Principal, UserView, UserVisualisation, Workspace};
use serde::Serialize;

/// Entity or entities a chain resolved to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolved {
    Workspace(Workspace),
    View(UserView),
    UserVis(UserVisualisation),
    Views(Vec<UserView>),
    UserVisualisations(Vec<UserVisualisation>),
}

/// Snapshot of one validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationContext {
    stage: Stage,
    target: ChainTarget,
    raw: PathIds,
    principal: Option<Principal>,
    ids: Option<ParsedIds>,
    resolved: Option<Resolved>,
    rejection: Option<Rejection>,
}

impl ValidationContext {
    /// Create new unvalidated context
    #[must_use]
    pub fn new(target: ChainTarget, raw: PathIds, principal: Option<Principal>) -> Self {
        Self {
            stage: Stage::Unvalidated,
            target,
            raw,
            principal,
            ids: None,
            resolved: None,
            rejection: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> ChainTarget {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn raw(&self) -> &PathIds {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Parsed ids, once the format check passed
    #[inline]
    #[must_use]
    pub fn ids(&self) -> Option<&ParsedIds> {
        self.ids.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn resolved(&self) -> Option<&Resolved> {
        self.resolved.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    fn advance(&self, to: Stage) -> Result<Self, IllegalTransition> {
        validate_transition(self.stage, to)?;
        Ok(Self {
            stage: to,
            ..self.clone()
        })
    }

    /// Copy with parsed ids, moved to [`Stage::FormatChecked`]
    pub fn format_checked(&self, ids: ParsedIds) -> Result<Self, IllegalTransition> {
        let mut next = self.advance(Stage::FormatChecked)?;
        next.ids = Some(ids);
        Ok(next)
    }

    /// Copy with the resolved chain, moved to [`Stage::OwnershipChecked`]
    pub fn ownership_checked(&self, resolved: Resolved) -> Result<Self, IllegalTransition> {
        let mut next = self.advance(Stage::OwnershipChecked)?;
        next.resolved = Some(resolved);
        Ok(next)
    }

    /// Copy moved to [`Stage::Authorized`]
    pub fn authorized(&self) -> Result<Self, IllegalTransition> {
        self.advance(Stage::Authorized)
    }

    /// Copy moved to [`Stage::Rejected`] with the reason
    pub fn rejected(&self, rejection: Rejection) -> Result<Self, IllegalTransition> {
        let mut next = self.advance(Stage::Rejected)?;
        next.rejection = Some(rejection);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idf_model::WorkspaceId;

    fn ctx() -> ValidationContext {
        ValidationContext::new(
            ChainTarget::Workspace,
            PathIds::workspace("1"),
            Some(Principal::new("a@x.com")),
        )
    }

    #[test]
    fn test_steps_return_copies() {
        let start = ctx();
        let ids = ParsedIds {
            workspace_id: WorkspaceId(1),
            view_id: None,
            user_vis_id: None,
        };
        let next = start.format_checked(ids).unwrap();

        assert_eq!(start.stage(), Stage::Unvalidated);
        assert!(start.ids().is_none());
        assert_eq!(next.stage(), Stage::FormatChecked);
        assert_eq!(next.ids(), Some(&ids));
    }

    #[test]
    fn test_cannot_skip_stages() {
        assert!(ctx().authorized().is_err());
        assert!(ctx()
            .ownership_checked(Resolved::Views(Vec::new()))
            .is_err());
    }

    #[test]
    fn test_rejected_is_terminal() {
        let rejected = ctx().rejected(Rejection::NotOwned).unwrap();
        assert_eq!(rejected.rejection(), Some(&Rejection::NotOwned));
        assert!(rejected.rejected(Rejection::NotOwned).is_err());
    }
}
