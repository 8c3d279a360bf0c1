//! In-memory implementation of [`Store`]
//!
//! Mirrors the relational constraints of the schema: per-owner workspace
//! names, per-workspace view names, foreign keys on visualisations and
//! cascading deletes. Reference data is loaded with the `seed_*` methods.

use crate::error::{Result, StoreError};
use crate::interface::{ChainRow, Owned, Store};
use async_trait::async_trait;
use idf_model::{
    Location, LocationDetail, LocationId, LocationType, Measurement, MeasurementId,
    MeasurementRecord, NewUserView, NewUserVisualisation, NewWorkspace, UserVisId, UserView,
    UserViewPatch, UserVisualisation, UserVisualisationPatch, ViewId, VisualisationKind,
    Workspace, WorkspaceId, WorkspacePatch,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct Tables {
    last_workspace_id: i32,
    last_view_id: i32,
    last_user_vis_id: i32,
    workspaces: BTreeMap<WorkspaceId, Workspace>,
    views: BTreeMap<ViewId, UserView>,
    user_vis: BTreeMap<UserVisId, UserVisualisation>,
    measurements: BTreeMap<MeasurementId, Measurement>,
    locations: BTreeMap<LocationId, LocationDetail>,
    visualisations: BTreeMap<MeasurementId, Vec<VisualisationKind>>,
    measurement_locations: BTreeSet<(MeasurementId, LocationId)>,
    records: Vec<(MeasurementId, LocationId, MeasurementRecord)>,
}

impl Tables {
    fn workspace_name_taken(&self, owner: &str, name: &str, except: Option<WorkspaceId>) -> bool {
        self.workspaces.values().any(|w| {
            w.owner_email == owner && w.workspace_name == name && Some(w.workspace_id) != except
        })
    }

    fn view_name_taken(&self, workspace: WorkspaceId, name: &str, except: Option<ViewId>) -> bool {
        self.views.values().any(|v| {
            v.workspace_id == workspace && v.view_name == name && Some(v.view_id) != except
        })
    }

    fn check_vis_references(
        &self,
        location_id: Option<LocationId>,
        measurement_id: Option<MeasurementId>,
    ) -> Result<()> {
        if let Some(id) = location_id {
            if !self.locations.contains_key(&id) {
                return Err(foreign_key("user_visualisation_location_id_fkey"));
            }
        }
        if let Some(id) = measurement_id {
            if !self.measurements.contains_key(&id) {
                return Err(foreign_key("user_visualisation_measurement_id_fkey"));
            }
        }
        Ok(())
    }
}

fn foreign_key(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

/// [`Store`] holding every table in memory
#[derive(Debug, Default)]
pub struct MemStore {
    tables: RwLock<Tables>,
}

impl MemStore {
    /// Create new empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a measurement
    pub fn seed_measurement(&self, measurement: Measurement) {
        self.tables
            .write()
            .measurements
            .insert(measurement.measurement_id, measurement);
    }

    /// Insert or replace a location with its subtype attributes
    pub fn seed_location(&self, location: LocationDetail) {
        self.tables
            .write()
            .locations
            .insert(location.location.location_id, location);
    }

    /// Allow a chart kind for a measurement
    pub fn seed_visualisation(&self, measurement_id: MeasurementId, kind: VisualisationKind) {
        self.tables
            .write()
            .visualisations
            .entry(measurement_id)
            .or_default()
            .push(kind);
    }

    /// Mark a location as having records for a measurement
    pub fn seed_measurement_location(&self, measurement_id: MeasurementId, location_id: LocationId) {
        self.tables
            .write()
            .measurement_locations
            .insert((measurement_id, location_id));
    }

    /// Add a record of a measurement taken at a location
    ///
    /// `values` is expected to carry a `startTimestamp` used for ordering.
    pub fn seed_record(
        &self,
        measurement_id: MeasurementId,
        location_id: LocationId,
        record: MeasurementRecord,
    ) {
        self.tables
            .write()
            .records
            .push((measurement_id, location_id, record));
    }

    /// Number of workspaces across all owners
    #[must_use]
    pub fn workspace_count(&self) -> usize {
        self.tables.read().workspaces.len()
    }

    /// Number of views across all workspaces
    #[must_use]
    pub fn view_count(&self) -> usize {
        self.tables.read().views.len()
    }

    /// Number of visualisations across all views
    #[must_use]
    pub fn user_vis_count(&self) -> usize {
        self.tables.read().user_vis.len()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn workspace_chain(&self, workspace_id: WorkspaceId) -> Result<Option<Owned<Workspace>>> {
        let tables = self.tables.read();
        Ok(tables
            .workspaces
            .get(&workspace_id)
            .map(|w| Owned::new(w.owner_email.clone(), w.clone())))
    }

    async fn view_chain(
        &self,
        workspace_id: WorkspaceId,
        view_id: ViewId,
    ) -> Result<Option<Owned<UserView>>> {
        let tables = self.tables.read();
        let Some(workspace) = tables.workspaces.get(&workspace_id) else {
            return Ok(None);
        };
        Ok(tables
            .views
            .get(&view_id)
            .filter(|v| v.workspace_id == workspace_id)
            .map(|v| Owned::new(workspace.owner_email.clone(), v.clone())))
    }

    async fn user_vis_chain(
        &self,
        workspace_id: WorkspaceId,
        view_id: ViewId,
        user_vis_id: UserVisId,
    ) -> Result<Option<Owned<UserVisualisation>>> {
        let tables = self.tables.read();
        let Some(workspace) = tables.workspaces.get(&workspace_id) else {
            return Ok(None);
        };
        let view_matches = tables
            .views
            .get(&view_id)
            .is_some_and(|v| v.workspace_id == workspace_id);
        if !view_matches {
            return Ok(None);
        }
        Ok(tables
            .user_vis
            .get(&user_vis_id)
            .filter(|uv| uv.view_id == view_id)
            .map(|uv| Owned::new(workspace.owner_email.clone(), uv.clone())))
    }

    async fn view_list_chain(&self, workspace_id: WorkspaceId) -> Result<Vec<ChainRow<UserView>>> {
        let tables = self.tables.read();
        let Some(workspace) = tables.workspaces.get(&workspace_id) else {
            return Ok(Vec::new());
        };
        let children: Vec<_> = tables
            .views
            .values()
            .filter(|v| v.workspace_id == workspace_id)
            .cloned()
            .map(Some)
            .collect();

        Ok(outer_join(&workspace.owner_email, children))
    }

    async fn user_vis_list_chain(
        &self,
        workspace_id: WorkspaceId,
        view_id: ViewId,
    ) -> Result<Vec<ChainRow<UserVisualisation>>> {
        let tables = self.tables.read();
        let Some(workspace) = tables.workspaces.get(&workspace_id) else {
            return Ok(Vec::new());
        };
        let view_matches = tables
            .views
            .get(&view_id)
            .is_some_and(|v| v.workspace_id == workspace_id);
        if !view_matches {
            return Ok(Vec::new());
        }
        let children: Vec<_> = tables
            .user_vis
            .values()
            .filter(|uv| uv.view_id == view_id)
            .cloned()
            .map(Some)
            .collect();

        Ok(outer_join(&workspace.owner_email, children))
    }

    async fn list_workspaces(&self, owner_email: &str) -> Result<Vec<Workspace>> {
        let tables = self.tables.read();
        Ok(tables
            .workspaces
            .values()
            .filter(|w| w.owner_email == owner_email)
            .cloned()
            .collect())
    }

    async fn create_workspace(
        &self,
        owner_email: &str,
        workspace: NewWorkspace,
    ) -> Result<Option<Workspace>> {
        let mut tables = self.tables.write();
        if tables.workspace_name_taken(owner_email, &workspace.workspace_name, None) {
            return Ok(None);
        }
        tables.last_workspace_id += 1;
        let created = Workspace {
            workspace_id: WorkspaceId(tables.last_workspace_id),
            owner_email: owner_email.to_string(),
            workspace_name: workspace.workspace_name,
            workspace_colour: workspace.workspace_colour,
        };
        tables
            .workspaces
            .insert(created.workspace_id, created.clone());
        Ok(Some(created))
    }

    async fn update_workspace(
        &self,
        workspace_id: WorkspaceId,
        patch: WorkspacePatch,
    ) -> Result<Workspace> {
        let mut tables = self.tables.write();
        let Some(current) = tables.workspaces.get(&workspace_id) else {
            return Err(StoreError::NotFound(format!("workspace {workspace_id}")));
        };
        if let Some(name) = &patch.workspace_name {
            if tables.workspace_name_taken(&current.owner_email, name, Some(workspace_id)) {
                return Err(unique("workspace_owner_name_unique"));
            }
        }
        let workspace = tables
            .workspaces
            .get_mut(&workspace_id)
            .ok_or_else(|| StoreError::NotFound(format!("workspace {workspace_id}")))?;
        patch.apply(workspace);
        Ok(workspace.clone())
    }

    async fn delete_workspace(&self, workspace_id: WorkspaceId) -> Result<Option<Workspace>> {
        let mut tables = self.tables.write();
        let Some(removed) = tables.workspaces.remove(&workspace_id) else {
            return Ok(None);
        };
        let views: BTreeSet<ViewId> = tables
            .views
            .values()
            .filter(|v| v.workspace_id == workspace_id)
            .map(|v| v.view_id)
            .collect();
        tables.views.retain(|id, _| !views.contains(id));
        tables.user_vis.retain(|_, uv| !views.contains(&uv.view_id));
        Ok(Some(removed))
    }

    async fn create_view(
        &self,
        workspace_id: WorkspaceId,
        view: NewUserView,
    ) -> Result<Option<UserView>> {
        let mut tables = self.tables.write();
        if !tables.workspaces.contains_key(&workspace_id) {
            return Err(foreign_key("user_view_workspace_id_fkey"));
        }
        if tables.view_name_taken(workspace_id, &view.view_name, None) {
            return Ok(None);
        }
        tables.last_view_id += 1;
        let created = UserView {
            view_id: ViewId(tables.last_view_id),
            workspace_id,
            view_name: view.view_name,
            grid_layout: None,
        };
        tables.views.insert(created.view_id, created.clone());
        Ok(Some(created))
    }

    async fn update_view(&self, view_id: ViewId, patch: UserViewPatch) -> Result<UserView> {
        let mut tables = self.tables.write();
        let Some(current) = tables.views.get(&view_id) else {
            return Err(StoreError::NotFound(format!("view {view_id}")));
        };
        if let Some(name) = &patch.view_name {
            if tables.view_name_taken(current.workspace_id, name, Some(view_id)) {
                return Err(unique("user_view_workspace_name_unique"));
            }
        }
        let view = tables
            .views
            .get_mut(&view_id)
            .ok_or_else(|| StoreError::NotFound(format!("view {view_id}")))?;
        patch.apply(view);
        Ok(view.clone())
    }

    async fn delete_view(&self, view_id: ViewId) -> Result<Option<UserView>> {
        let mut tables = self.tables.write();
        let removed = tables.views.remove(&view_id);
        if removed.is_some() {
            tables.user_vis.retain(|_, uv| uv.view_id != view_id);
        }
        Ok(removed)
    }

    async fn create_user_vis(
        &self,
        view_id: ViewId,
        vis: NewUserVisualisation,
    ) -> Result<UserVisualisation> {
        let mut tables = self.tables.write();
        if !tables.views.contains_key(&view_id) {
            return Err(foreign_key("user_visualisation_view_id_fkey"));
        }
        tables.check_vis_references(Some(vis.location_id), Some(vis.measurement_id))?;

        tables.last_user_vis_id += 1;
        let created = UserVisualisation {
            user_vis_id: UserVisId(tables.last_user_vis_id),
            view_id,
            measurement_id: vis.measurement_id,
            location_id: vis.location_id,
            visualisation_name: vis.visualisation_name,
            vis_filter: vis.vis_filter,
        };
        tables.user_vis.insert(created.user_vis_id, created.clone());
        Ok(created)
    }

    async fn update_user_vis(
        &self,
        user_vis_id: UserVisId,
        patch: UserVisualisationPatch,
    ) -> Result<UserVisualisation> {
        let mut tables = self.tables.write();
        tables.check_vis_references(patch.location_id, patch.measurement_id)?;
        let vis = tables
            .user_vis
            .get_mut(&user_vis_id)
            .ok_or_else(|| StoreError::NotFound(format!("user visualisation {user_vis_id}")))?;
        patch.apply(vis);
        Ok(vis.clone())
    }

    async fn delete_user_vis(&self, user_vis_id: UserVisId) -> Result<Option<UserVisualisation>> {
        Ok(self.tables.write().user_vis.remove(&user_vis_id))
    }

    async fn get_measurement(&self, measurement_id: MeasurementId) -> Result<Option<Measurement>> {
        Ok(self.tables.read().measurements.get(&measurement_id).cloned())
    }

    async fn list_measurements(&self) -> Result<Vec<Measurement>> {
        Ok(self.tables.read().measurements.values().cloned().collect())
    }

    async fn list_measurement_visualisations(
        &self,
        measurement_id: MeasurementId,
    ) -> Result<Vec<VisualisationKind>> {
        let tables = self.tables.read();
        let mut kinds = tables
            .visualisations
            .get(&measurement_id)
            .cloned()
            .unwrap_or_default();
        kinds.sort_by(|a, b| a.visualisation_name.cmp(&b.visualisation_name));
        Ok(kinds)
    }

    async fn list_measurement_locations(
        &self,
        measurement_id: MeasurementId,
        location_type: LocationType,
    ) -> Result<Vec<LocationDetail>> {
        let tables = self.tables.read();
        Ok(tables
            .measurement_locations
            .iter()
            .filter(|(m, _)| *m == measurement_id)
            .filter_map(|(_, l)| tables.locations.get(l))
            .filter(|l| l.location.location_type == location_type)
            .cloned()
            .collect())
    }

    async fn get_location(&self, location_id: LocationId) -> Result<Option<Location>> {
        Ok(self
            .tables
            .read()
            .locations
            .get(&location_id)
            .map(|l| l.location.clone()))
    }

    async fn get_location_detail(&self, location: &Location) -> Result<Option<LocationDetail>> {
        Ok(self
            .tables
            .read()
            .locations
            .get(&location.location_id)
            .filter(|l| l.location.location_type == location.location_type)
            .cloned())
    }

    async fn list_locations(&self, location_type: LocationType) -> Result<Vec<LocationDetail>> {
        Ok(self
            .tables
            .read()
            .locations
            .values()
            .filter(|l| l.location.location_type == location_type)
            .cloned()
            .collect())
    }

    async fn fetch_records(
        &self,
        measurement: &Measurement,
        location_id: LocationId,
    ) -> Result<Vec<MeasurementRecord>> {
        let tables = self.tables.read();
        let mut records: Vec<MeasurementRecord> = tables
            .records
            .iter()
            .filter(|(m, l, _)| *m == measurement.measurement_id && *l == location_id)
            .map(|(_, _, r)| r.clone())
            .collect();
        records.sort_by(|a, b| start_timestamp(a).cmp(&start_timestamp(b)));
        Ok(records)
    }
}

fn start_timestamp(record: &MeasurementRecord) -> Option<&str> {
    record
        .values
        .get("startTimestamp")
        .and_then(serde_json::Value::as_str)
}

/// Left join result: one row per child, or one empty row for a childless parent
fn outer_join<T>(owner_email: &str, children: Vec<Option<T>>) -> Vec<ChainRow<T>> {
    let children = if children.is_empty() {
        vec![None]
    } else {
        children
    };
    children
        .into_iter()
        .map(|child| ChainRow {
            owner_email: owner_email.to_string(),
            child,
        })
        .collect()
}
