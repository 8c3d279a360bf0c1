//! The storage contract
//!
//! Chain queries return the workspace owner beside the row they resolve so
//! the validator can decide existence and ownership from one round trip.

use crate::error::Result;
use async_trait::async_trait;
use idf_model::{
    Location, LocationDetail, LocationId, LocationType, Measurement, MeasurementId,
    MeasurementRecord, NewUserView, NewUserVisualisation, NewWorkspace, UserVisId, UserView,
    UserViewPatch, UserVisualisation, UserVisualisationPatch, ViewId, VisualisationKind,
    Workspace, WorkspaceId, WorkspacePatch,
};

/// A resolved row together with the email of the workspace owner
#[derive(Debug, Clone, PartialEq)]
pub struct Owned<T> {
    pub owner_email: String,
    pub entity: T,
}

impl<T> Owned<T> {
    /// Create new owned row
    #[inline]
    #[must_use]
    pub fn new(owner_email: impl Into<String>, entity: T) -> Self {
        Self {
            owner_email: owner_email.into(),
            entity,
        }
    }
}

/// One row of an outer join: the parent always exists, the child may not
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRow<T> {
    pub owner_email: String,
    pub child: Option<T>,
}

/// Persistence operations used by the validator and the handlers
///
/// Implementations must be cheap to share across requests.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    // Ownership chain

    /// Workspace with its owner
    async fn workspace_chain(&self, workspace_id: WorkspaceId) -> Result<Option<Owned<Workspace>>>;

    /// View joined to its workspace; `None` if either is missing or unrelated
    async fn view_chain(
        &self,
        workspace_id: WorkspaceId,
        view_id: ViewId,
    ) -> Result<Option<Owned<UserView>>>;

    /// Visualisation joined through its view to the workspace
    async fn user_vis_chain(
        &self,
        workspace_id: WorkspaceId,
        view_id: ViewId,
        user_vis_id: UserVisId,
    ) -> Result<Option<Owned<UserVisualisation>>>;

    /// Workspace left-joined to its views, ordered by view id
    ///
    /// Empty when the workspace does not exist; a single row with no child
    /// when it exists but has no views.
    async fn view_list_chain(&self, workspace_id: WorkspaceId) -> Result<Vec<ChainRow<UserView>>>;

    /// View left-joined to its visualisations, ordered by visualisation id
    async fn user_vis_list_chain(
        &self,
        workspace_id: WorkspaceId,
        view_id: ViewId,
    ) -> Result<Vec<ChainRow<UserVisualisation>>>;

    // Workspaces

    /// Workspaces owned by `owner_email`, ordered by id
    async fn list_workspaces(&self, owner_email: &str) -> Result<Vec<Workspace>>;

    /// `None` when the owner already has a workspace with that name
    async fn create_workspace(
        &self,
        owner_email: &str,
        workspace: NewWorkspace,
    ) -> Result<Option<Workspace>>;

    async fn update_workspace(
        &self,
        workspace_id: WorkspaceId,
        patch: WorkspacePatch,
    ) -> Result<Workspace>;

    async fn delete_workspace(&self, workspace_id: WorkspaceId) -> Result<Option<Workspace>>;

    // Views

    /// `None` when the workspace already has a view with that name
    async fn create_view(
        &self,
        workspace_id: WorkspaceId,
        view: NewUserView,
    ) -> Result<Option<UserView>>;

    async fn update_view(&self, view_id: ViewId, patch: UserViewPatch) -> Result<UserView>;

    async fn delete_view(&self, view_id: ViewId) -> Result<Option<UserView>>;

    // Visualisations

    async fn create_user_vis(
        &self,
        view_id: ViewId,
        vis: NewUserVisualisation,
    ) -> Result<UserVisualisation>;

    async fn update_user_vis(
        &self,
        user_vis_id: UserVisId,
        patch: UserVisualisationPatch,
    ) -> Result<UserVisualisation>;

    async fn delete_user_vis(&self, user_vis_id: UserVisId) -> Result<Option<UserVisualisation>>;

    // Reference data

    async fn get_measurement(&self, measurement_id: MeasurementId) -> Result<Option<Measurement>>;

    /// All measurements, ordered by id
    async fn list_measurements(&self) -> Result<Vec<Measurement>>;

    /// Chart kinds that can render a measurement
    async fn list_measurement_visualisations(
        &self,
        measurement_id: MeasurementId,
    ) -> Result<Vec<VisualisationKind>>;

    /// Locations of one kind that have records for a measurement
    async fn list_measurement_locations(
        &self,
        measurement_id: MeasurementId,
        location_type: LocationType,
    ) -> Result<Vec<LocationDetail>>;

    async fn get_location(&self, location_id: LocationId) -> Result<Option<Location>>;

    /// Location joined with its subtype row
    async fn get_location_detail(&self, location: &Location) -> Result<Option<LocationDetail>>;

    async fn list_locations(&self, location_type: LocationType) -> Result<Vec<LocationDetail>>;

    /// Records of a measurement at a location, ordered by start timestamp
    async fn fetch_records(
        &self,
        measurement: &Measurement,
        location_id: LocationId,
    ) -> Result<Vec<MeasurementRecord>>;
}
