//! Workspace, view and visualisation records plus their write payloads

use crate::ids::{LocationId, MeasurementId, UserVisId, ViewId, WorkspaceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level container owned by one principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub workspace_id: WorkspaceId,
    pub owner_email: String,
    /// Unique per owner
    pub workspace_name: String,
    pub workspace_colour: Option<String>,
}

/// A tab within a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub view_id: ViewId,
    pub workspace_id: WorkspaceId,
    /// Unique within the workspace
    pub view_name: String,
    /// Opaque layout blob owned by the frontend grid
    pub grid_layout: Option<Value>,
}

/// A chart binding a measurement and a location within a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVisualisation {
    pub user_vis_id: UserVisId,
    pub view_id: ViewId,
    pub measurement_id: MeasurementId,
    pub location_id: LocationId,
    /// Chart kind, e.g. `line`, `bar`, `scatter`
    pub visualisation_name: String,
    pub vis_filter: Option<Value>,
}

/// Validated create payload for a workspace
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewWorkspace {
    pub workspace_name: String,
    pub workspace_colour: Option<String>,
}

/// Validated partial update for a workspace
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkspacePatch {
    pub workspace_name: Option<String>,
    pub workspace_colour: Option<String>,
}

impl WorkspacePatch {
    /// No column would change
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workspace_name.is_none() && self.workspace_colour.is_none()
    }

    /// Apply onto an existing row
    pub fn apply(&self, workspace: &mut Workspace) {
        if let Some(name) = &self.workspace_name {
            workspace.workspace_name.clone_from(name);
        }
        if let Some(colour) = &self.workspace_colour {
            workspace.workspace_colour = Some(colour.clone());
        }
    }
}

/// Validated create payload for a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserView {
    pub view_name: String,
}

/// Validated partial update for a view
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserViewPatch {
    pub view_name: Option<String>,
    pub grid_layout: Option<Value>,
}

impl UserViewPatch {
    /// No column would change
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view_name.is_none() && self.grid_layout.is_none()
    }

    /// Apply onto an existing row
    pub fn apply(&self, view: &mut UserView) {
        if let Some(name) = &self.view_name {
            view.view_name.clone_from(name);
        }
        if let Some(layout) = &self.grid_layout {
            view.grid_layout = Some(layout.clone());
        }
    }
}

/// Validated create payload for a visualisation
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserVisualisation {
    pub location_id: LocationId,
    pub measurement_id: MeasurementId,
    pub visualisation_name: String,
    pub vis_filter: Option<Value>,
}

/// Validated partial update for a visualisation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserVisualisationPatch {
    pub location_id: Option<LocationId>,
    pub measurement_id: Option<MeasurementId>,
    pub visualisation_name: Option<String>,
    pub vis_filter: Option<Value>,
}

impl UserVisualisationPatch {
    /// No column would change
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.location_id.is_none()
            && self.measurement_id.is_none()
            && self.visualisation_name.is_none()
            && self.vis_filter.is_none()
    }

    /// Apply onto an existing row
    pub fn apply(&self, vis: &mut UserVisualisation) {
        if let Some(location_id) = self.location_id {
            vis.location_id = location_id;
        }
        if let Some(measurement_id) = self.measurement_id {
            vis.measurement_id = measurement_id;
        }
        if let Some(name) = &self.visualisation_name {
            vis.visualisation_name.clone_from(name);
        }
        if let Some(filter) = &self.vis_filter {
            vis.vis_filter = Some(filter.clone());
        }
    }
}
