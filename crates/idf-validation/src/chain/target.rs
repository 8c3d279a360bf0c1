//! What a request asks the chain to resolve

use idf_model::{IdParseError, UserVisId, ViewId, WorkspaceId};
use serde::Deserialize;
use std::fmt;

/// Named id in a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdParam {
    WorkspaceId,
    ViewId,
    UserVisId,
    MeasurementId,
    LocationId,
}

impl IdParam {
    /// Name as it appears in routes and error payloads
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IdParam::WorkspaceId => "workspaceId",
            IdParam::ViewId => "viewId",
            IdParam::UserVisId => "userVisId",
            IdParam::MeasurementId => "measurementId",
            IdParam::LocationId => "locationId",
        }
    }
}

impl fmt::Display for IdParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deepest level a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainTarget {
    /// One workspace
    Workspace,
    /// One view within a workspace
    View,
    /// One visualisation within a view
    UserVis,
    /// All views of a workspace
    ViewList,
    /// All visualisations of a view
    UserVisList,
}

impl ChainTarget {
    /// Path ids this target needs, outermost first
    #[must_use]
    pub fn params(self) -> &'static [IdParam] {
        match self {
            ChainTarget::Workspace | ChainTarget::ViewList => &[IdParam::WorkspaceId],
            ChainTarget::View | ChainTarget::UserVisList => {
                &[IdParam::WorkspaceId, IdParam::ViewId]
            }
            ChainTarget::UserVis => &[IdParam::WorkspaceId, IdParam::ViewId, IdParam::UserVisId],
        }
    }

    #[inline]
    #[must_use]
    pub fn is_list(self) -> bool {
        matches!(self, ChainTarget::ViewList | ChainTarget::UserVisList)
    }
}

impl fmt::Display for ChainTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainTarget::Workspace => "workspace",
            ChainTarget::View => "view",
            ChainTarget::UserVis => "user-vis",
            ChainTarget::ViewList => "view-list",
            ChainTarget::UserVisList => "user-vis-list",
        };
        f.write_str(name)
    }
}

/// Path ids exactly as they arrived
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathIds {
    pub workspace_id: Option<String>,
    pub view_id: Option<String>,
    pub user_vis_id: Option<String>,
}

impl PathIds {
    /// Create new path ids for a workspace
    #[must_use]
    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: Some(workspace_id.into()),
            ..Self::default()
        }
    }

    /// Add a view id
    #[must_use]
    pub fn with_view(mut self, view_id: impl Into<String>) -> Self {
        self.view_id = Some(view_id.into());
        self
    }

    /// Add a visualisation id
    #[must_use]
    pub fn with_user_vis(mut self, user_vis_id: impl Into<String>) -> Self {
        self.user_vis_id = Some(user_vis_id.into());
        self
    }

    /// Raw value for a param, if present
    #[must_use]
    pub fn raw(&self, param: IdParam) -> Option<&str> {
        match param {
            IdParam::WorkspaceId => self.workspace_id.as_deref(),
            IdParam::ViewId => self.view_id.as_deref(),
            IdParam::UserVisId => self.user_vis_id.as_deref(),
            IdParam::MeasurementId | IdParam::LocationId => None,
        }
    }
}

/// Path ids after the format check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedIds {
    pub workspace_id: WorkspaceId,
    pub view_id: Option<ViewId>,
    pub user_vis_id: Option<UserVisId>,
}

impl ParsedIds {
    /// Parse the ids `target` needs, stopping at the first bad one
    pub fn parse(target: ChainTarget, raw: &PathIds) -> Result<Self, (IdParam, String)> {
        let mut workspace_id = None;
        let mut view_id = None;
        let mut user_vis_id = None;

        for &param in target.params() {
            let value = raw.raw(param).unwrap_or_default();
            let bad = |_: IdParseError| (param, value.to_string());
            match param {
                IdParam::WorkspaceId => workspace_id = Some(value.parse().map_err(bad)?),
                IdParam::ViewId => view_id = Some(value.parse().map_err(bad)?),
                IdParam::UserVisId => user_vis_id = Some(value.parse().map_err(bad)?),
                IdParam::MeasurementId | IdParam::LocationId => {}
            }
        }

        let workspace_id =
            workspace_id.ok_or_else(|| (IdParam::WorkspaceId, String::new()))?;
        Ok(Self {
            workspace_id,
            view_id,
            user_vis_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stops_at_first_bad_id() {
        let raw = PathIds::workspace("abc").with_view("also-bad");
        let err = ParsedIds::parse(ChainTarget::View, &raw).unwrap_err();
        assert_eq!(err, (IdParam::WorkspaceId, "abc".to_string()));

        let raw = PathIds::workspace("1").with_view("0");
        let err = ParsedIds::parse(ChainTarget::View, &raw).unwrap_err();
        assert_eq!(err.0, IdParam::ViewId);
    }

    #[test]
    fn test_parse_ignores_ids_beyond_target() {
        let raw = PathIds::workspace("4").with_view("junk");
        let ids = ParsedIds::parse(ChainTarget::Workspace, &raw).unwrap();
        assert_eq!(ids.workspace_id, WorkspaceId(4));
        assert_eq!(ids.view_id, None);
    }

    #[test]
    fn test_missing_id_is_a_format_error() {
        let err = ParsedIds::parse(ChainTarget::UserVis, &PathIds::workspace("1").with_view("2"))
            .unwrap_err();
        assert_eq!(err, (IdParam::UserVisId, String::new()));
    }

    #[test]
    fn test_params_outermost_first() {
        assert_eq!(
            ChainTarget::UserVis.params(),
            &[IdParam::WorkspaceId, IdParam::ViewId, IdParam::UserVisId]
        );
        assert!(ChainTarget::UserVisList.is_list());
        assert!(!ChainTarget::View.is_list());
    }
}
