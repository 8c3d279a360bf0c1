//! PostgreSQL implementation of [`Store`]

use crate::error::{Result, StoreError};
use crate::interface::{ChainRow, Owned, Store};
use crate::rows::{self, quote_ident};
use async_trait::async_trait;
use idf_model::{
    Location, LocationDetail, LocationId, LocationType, Measurement, MeasurementId,
    MeasurementRecord, NewUserView, NewUserVisualisation, NewWorkspace, UserVisId, UserView,
    UserViewPatch, UserVisualisation, UserVisualisationPatch, ViewId, VisualisationKind,
    Workspace, WorkspaceId, WorkspacePatch,
};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for [`PgStore`]
#[derive(Debug, Clone)]
pub struct PgConnectionOptions {
    /// Reported to postgres as `application_name`
    pub app_name: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
    /// Maximum number of pooled connections
    pub max_conns: u32,
    /// How long to wait for a connection from the pool
    pub connect_timeout: Duration,
}

impl PgConnectionOptions {
    /// Default value for [`host`](Self::host)
    pub const DEFAULT_HOST: &'static str = "localhost";

    /// Default value for [`port`](Self::port)
    pub const DEFAULT_PORT: u16 = 5432;

    /// Default value for [`database`](Self::database)
    pub const DEFAULT_DATABASE: &'static str = "identifire";

    /// Default value for [`max_conns`](Self::max_conns)
    pub const DEFAULT_MAX_CONNS: u32 = 10;

    /// Default value for [`connect_timeout`](Self::connect_timeout)
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Driver options for these settings
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .application_name(&self.app_name);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

impl Default for PgConnectionOptions {
    fn default() -> Self {
        Self {
            app_name: String::from("identifire"),
            host: String::from(Self::DEFAULT_HOST),
            port: Self::DEFAULT_PORT,
            database: String::from(Self::DEFAULT_DATABASE),
            username: String::from("postgres"),
            password: None,
            max_conns: Self::DEFAULT_MAX_CONNS,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// [`Store`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool with the given options
    pub async fn connect(options: &PgConnectionOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_conns)
            .acquire_timeout(options.connect_timeout)
            .connect_with(options.connect_options())
            .await?;

        info!(
            host = %options.host,
            database = %options.database,
            application_name = %options.app_name,
            "connected to database"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    #[inline]
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        info!("schema migrations applied");
        Ok(())
    }

    /// Wait for in-flight queries and close every connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Underlying pool
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run a query selecting one JSON object per row
    async fn json_rows(
        &self,
        query: &str,
        binds: &[i32],
    ) -> Result<Vec<serde_json::Map<String, Value>>> {
        let mut q = sqlx::query_scalar::<_, Value>(query);
        for bind in binds {
            q = q.bind(*bind);
        }
        q.fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(rows::into_object)
            .collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WorkspaceRow {
    workspace_id: i32,
    owner_email: String,
    workspace_name: String,
    workspace_colour: Option<String>,
}

impl From<WorkspaceRow> for Workspace {
    fn from(row: WorkspaceRow) -> Self {
        Self {
            workspace_id: WorkspaceId(row.workspace_id),
            owner_email: row.owner_email,
            workspace_name: row.workspace_name,
            workspace_colour: row.workspace_colour,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ViewRow {
    view_id: i32,
    workspace_id: i32,
    view_name: String,
    grid_layout: Option<Value>,
}

impl From<ViewRow> for UserView {
    fn from(row: ViewRow) -> Self {
        Self {
            view_id: ViewId(row.view_id),
            workspace_id: WorkspaceId(row.workspace_id),
            view_name: row.view_name,
            grid_layout: row.grid_layout,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserVisRow {
    user_vis_id: i32,
    view_id: i32,
    location_id: i32,
    measurement_id: i32,
    visualisation_name: String,
    vis_filter: Option<Value>,
}

impl From<UserVisRow> for UserVisualisation {
    fn from(row: UserVisRow) -> Self {
        Self {
            user_vis_id: UserVisId(row.user_vis_id),
            view_id: ViewId(row.view_id),
            measurement_id: MeasurementId(row.measurement_id),
            location_id: LocationId(row.location_id),
            visualisation_name: row.visualisation_name,
            vis_filter: row.vis_filter,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ViewChainRow {
    owner_email: String,
    #[sqlx(flatten)]
    view: ViewRow,
}

#[derive(Debug, sqlx::FromRow)]
struct UserVisChainRow {
    owner_email: String,
    #[sqlx(flatten)]
    vis: UserVisRow,
}

/// Outer join row: the view columns are null when the workspace has none
#[derive(Debug, sqlx::FromRow)]
struct ViewListRow {
    owner_email: String,
    view_id: Option<i32>,
    workspace_id: i32,
    view_name: Option<String>,
    grid_layout: Option<Value>,
}

impl From<ViewListRow> for ChainRow<UserView> {
    fn from(row: ViewListRow) -> Self {
        let child = row.view_id.zip(row.view_name).map(|(view_id, view_name)| UserView {
            view_id: ViewId(view_id),
            workspace_id: WorkspaceId(row.workspace_id),
            view_name,
            grid_layout: row.grid_layout,
        });
        Self {
            owner_email: row.owner_email,
            child,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserVisListRow {
    owner_email: String,
    user_vis_id: Option<i32>,
    view_id: i32,
    location_id: Option<i32>,
    measurement_id: Option<i32>,
    visualisation_name: Option<String>,
    vis_filter: Option<Value>,
}

impl From<UserVisListRow> for ChainRow<UserVisualisation> {
    fn from(row: UserVisListRow) -> Self {
        let child = match (
            row.user_vis_id,
            row.location_id,
            row.measurement_id,
            row.visualisation_name,
        ) {
            (Some(user_vis_id), Some(location_id), Some(measurement_id), Some(name)) => {
                Some(UserVisualisation {
                    user_vis_id: UserVisId(user_vis_id),
                    view_id: ViewId(row.view_id),
                    measurement_id: MeasurementId(measurement_id),
                    location_id: LocationId(location_id),
                    visualisation_name: name,
                    vis_filter: row.vis_filter,
                })
            }
            _ => None,
        };
        Self {
            owner_email: row.owner_email,
            child,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MeasurementRow {
    measurement_id: i32,
    name: String,
    description: Option<String>,
    measurement_type: String,
}

impl From<MeasurementRow> for Measurement {
    fn from(row: MeasurementRow) -> Self {
        Self {
            measurement_id: MeasurementId(row.measurement_id),
            name: row.name,
            description: row.description,
            measurement_type: row.measurement_type,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    location_id: i32,
    name: String,
    description: Option<String>,
    location_type: String,
}

impl TryFrom<LocationRow> for Location {
    type Error = StoreError;

    fn try_from(row: LocationRow) -> Result<Self> {
        let location_type = row
            .location_type
            .parse::<LocationType>()
            .map_err(|e| StoreError::MalformedRow(e.to_string()))?;
        Ok(Self {
            location_id: LocationId(row.location_id),
            name: row.name,
            description: row.description,
            location_type,
        })
    }
}

const WORKSPACE_COLUMNS: &str = "workspace_id, owner_email, workspace_name, workspace_colour";
const VIEW_COLUMNS: &str = "view_id, workspace_id, view_name, grid_layout";
const USER_VIS_COLUMNS: &str =
    "user_vis_id, view_id, location_id, measurement_id, visualisation_name, vis_filter";

#[async_trait]
impl Store for PgStore {
    async fn workspace_chain(&self, workspace_id: WorkspaceId) -> Result<Option<Owned<Workspace>>> {
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspace WHERE workspace_id = $1"
        ))
        .bind(workspace_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let workspace = Workspace::from(row);
            Owned::new(workspace.owner_email.clone(), workspace)
        }))
    }

    async fn view_chain(
        &self,
        workspace_id: WorkspaceId,
        view_id: ViewId,
    ) -> Result<Option<Owned<UserView>>> {
        let row = sqlx::query_as::<_, ViewChainRow>(
            r#"
SELECT w.owner_email, v.view_id, v.workspace_id, v.view_name, v.grid_layout
FROM workspace w
    JOIN user_view v ON v.workspace_id = w.workspace_id
WHERE w.workspace_id = $1 AND v.view_id = $2
;
"#,
        )
        .bind(workspace_id.get())
        .bind(view_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Owned::new(row.owner_email, row.view.into())))
    }

    async fn user_vis_chain(
        &self,
        workspace_id: WorkspaceId,
        view_id: ViewId,
        user_vis_id: UserVisId,
    ) -> Result<Option<Owned<UserVisualisation>>> {
        let row = sqlx::query_as::<_, UserVisChainRow>(
            r#"
SELECT w.owner_email, uv.user_vis_id, uv.view_id, uv.location_id, uv.measurement_id,
       uv.visualisation_name, uv.vis_filter
FROM workspace w
    JOIN user_view v ON v.workspace_id = w.workspace_id
    JOIN user_visualisation uv ON uv.view_id = v.view_id
WHERE w.workspace_id = $1 AND v.view_id = $2 AND uv.user_vis_id = $3
;
"#,
        )
        .bind(workspace_id.get())
        .bind(view_id.get())
        .bind(user_vis_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Owned::new(row.owner_email, row.vis.into())))
    }

    async fn view_list_chain(&self, workspace_id: WorkspaceId) -> Result<Vec<ChainRow<UserView>>> {
        let rows = sqlx::query_as::<_, ViewListRow>(
            r#"
SELECT w.owner_email, w.workspace_id, v.view_id, v.view_name, v.grid_layout
FROM workspace w
    LEFT JOIN user_view v ON v.workspace_id = w.workspace_id
WHERE w.workspace_id = $1
ORDER BY v.view_id
;
"#,
        )
        .bind(workspace_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChainRow::from).collect())
    }

    async fn user_vis_list_chain(
        &self,
        workspace_id: WorkspaceId,
        view_id: ViewId,
    ) -> Result<Vec<ChainRow<UserVisualisation>>> {
        let rows = sqlx::query_as::<_, UserVisListRow>(
            r#"
SELECT w.owner_email, v.view_id, uv.user_vis_id, uv.location_id, uv.measurement_id,
       uv.visualisation_name, uv.vis_filter
FROM workspace w
    JOIN user_view v ON v.workspace_id = w.workspace_id
    LEFT JOIN user_visualisation uv ON uv.view_id = v.view_id
WHERE w.workspace_id = $1 AND v.view_id = $2
ORDER BY uv.user_vis_id
;
"#,
        )
        .bind(workspace_id.get())
        .bind(view_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChainRow::from).collect())
    }

    async fn list_workspaces(&self, owner_email: &str) -> Result<Vec<Workspace>> {
        let rows = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspace WHERE owner_email = $1 ORDER BY workspace_id"
        ))
        .bind(owner_email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Workspace::from).collect())
    }

    async fn create_workspace(
        &self,
        owner_email: &str,
        workspace: NewWorkspace,
    ) -> Result<Option<Workspace>> {
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            r#"
INSERT INTO workspace (owner_email, workspace_name, workspace_colour)
VALUES ($1, $2, $3)
ON CONFLICT ON CONSTRAINT workspace_owner_name_unique DO NOTHING
RETURNING {WORKSPACE_COLUMNS}
;
"#
        ))
        .bind(owner_email)
        .bind(&workspace.workspace_name)
        .bind(&workspace.workspace_colour)
        .fetch_optional(&self.pool)
        .await?;

        debug!(owner = owner_email, created = row.is_some(), "create workspace");
        Ok(row.map(Workspace::from))
    }

    async fn update_workspace(
        &self,
        workspace_id: WorkspaceId,
        patch: WorkspacePatch,
    ) -> Result<Workspace> {
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            r#"
UPDATE workspace
SET workspace_name = COALESCE($2, workspace_name),
    workspace_colour = COALESCE($3, workspace_colour)
WHERE workspace_id = $1
RETURNING {WORKSPACE_COLUMNS}
;
"#
        ))
        .bind(workspace_id.get())
        .bind(&patch.workspace_name)
        .bind(&patch.workspace_colour)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Workspace::from)
            .ok_or_else(|| StoreError::NotFound(format!("workspace {workspace_id}")))
    }

    async fn delete_workspace(&self, workspace_id: WorkspaceId) -> Result<Option<Workspace>> {
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "DELETE FROM workspace WHERE workspace_id = $1 RETURNING {WORKSPACE_COLUMNS}"
        ))
        .bind(workspace_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Workspace::from))
    }

    async fn create_view(
        &self,
        workspace_id: WorkspaceId,
        view: NewUserView,
    ) -> Result<Option<UserView>> {
        let row = sqlx::query_as::<_, ViewRow>(&format!(
            r#"
INSERT INTO user_view (workspace_id, view_name)
VALUES ($1, $2)
ON CONFLICT ON CONSTRAINT user_view_workspace_name_unique DO NOTHING
RETURNING {VIEW_COLUMNS}
;
"#
        ))
        .bind(workspace_id.get())
        .bind(&view.view_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserView::from))
    }

    async fn update_view(&self, view_id: ViewId, patch: UserViewPatch) -> Result<UserView> {
        let row = sqlx::query_as::<_, ViewRow>(&format!(
            r#"
UPDATE user_view
SET view_name = COALESCE($2, view_name),
    grid_layout = COALESCE($3, grid_layout)
WHERE view_id = $1
RETURNING {VIEW_COLUMNS}
;
"#
        ))
        .bind(view_id.get())
        .bind(&patch.view_name)
        .bind(&patch.grid_layout)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserView::from)
            .ok_or_else(|| StoreError::NotFound(format!("view {view_id}")))
    }

    async fn delete_view(&self, view_id: ViewId) -> Result<Option<UserView>> {
        let row = sqlx::query_as::<_, ViewRow>(&format!(
            "DELETE FROM user_view WHERE view_id = $1 RETURNING {VIEW_COLUMNS}"
        ))
        .bind(view_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserView::from))
    }

    async fn create_user_vis(
        &self,
        view_id: ViewId,
        vis: NewUserVisualisation,
    ) -> Result<UserVisualisation> {
        let row = sqlx::query_as::<_, UserVisRow>(&format!(
            r#"
INSERT INTO user_visualisation (view_id, location_id, measurement_id, visualisation_name, vis_filter)
VALUES ($1, $2, $3, $4, $5)
RETURNING {USER_VIS_COLUMNS}
;
"#
        ))
        .bind(view_id.get())
        .bind(vis.location_id.get())
        .bind(vis.measurement_id.get())
        .bind(&vis.visualisation_name)
        .bind(&vis.vis_filter)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_user_vis(
        &self,
        user_vis_id: UserVisId,
        patch: UserVisualisationPatch,
    ) -> Result<UserVisualisation> {
        let row = sqlx::query_as::<_, UserVisRow>(&format!(
            r#"
UPDATE user_visualisation
SET location_id = COALESCE($2, location_id),
    measurement_id = COALESCE($3, measurement_id),
    visualisation_name = COALESCE($4, visualisation_name),
    vis_filter = COALESCE($5, vis_filter)
WHERE user_vis_id = $1
RETURNING {USER_VIS_COLUMNS}
;
"#
        ))
        .bind(user_vis_id.get())
        .bind(patch.location_id.map(LocationId::get))
        .bind(patch.measurement_id.map(MeasurementId::get))
        .bind(&patch.visualisation_name)
        .bind(&patch.vis_filter)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserVisualisation::from)
            .ok_or_else(|| StoreError::NotFound(format!("user visualisation {user_vis_id}")))
    }

    async fn delete_user_vis(&self, user_vis_id: UserVisId) -> Result<Option<UserVisualisation>> {
        let row = sqlx::query_as::<_, UserVisRow>(&format!(
            "DELETE FROM user_visualisation WHERE user_vis_id = $1 RETURNING {USER_VIS_COLUMNS}"
        ))
        .bind(user_vis_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserVisualisation::from))
    }

    async fn get_measurement(&self, measurement_id: MeasurementId) -> Result<Option<Measurement>> {
        let row = sqlx::query_as::<_, MeasurementRow>(
            "SELECT measurement_id, name, description, measurement_type FROM measurement WHERE measurement_id = $1",
        )
        .bind(measurement_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Measurement::from))
    }

    async fn list_measurements(&self) -> Result<Vec<Measurement>> {
        let rows = sqlx::query_as::<_, MeasurementRow>(
            "SELECT measurement_id, name, description, measurement_type FROM measurement ORDER BY measurement_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Measurement::from).collect())
    }

    async fn list_measurement_visualisations(
        &self,
        measurement_id: MeasurementId,
    ) -> Result<Vec<VisualisationKind>> {
        self.json_rows(
            r#"
SELECT to_jsonb(mv) || to_jsonb(v) AS row
FROM measurement_visualisation mv
    JOIN visualisation v USING (visualisation_name)
WHERE mv.measurement_id = $1
ORDER BY mv.visualisation_name
;
"#,
            &[measurement_id.get()],
        )
        .await?
        .into_iter()
        .map(rows::visualisation_kind)
        .collect()
    }

    async fn list_measurement_locations(
        &self,
        measurement_id: MeasurementId,
        location_type: LocationType,
    ) -> Result<Vec<LocationDetail>> {
        let subtype = quote_ident(location_type.table_name())?;
        self.json_rows(
            &format!(
                r#"
SELECT to_jsonb(l) || to_jsonb(s) AS row
FROM measurement_location ml
    JOIN location l USING (location_id)
    JOIN {subtype} s USING (location_id)
WHERE ml.measurement_id = $1
ORDER BY l.location_id
;
"#
            ),
            &[measurement_id.get()],
        )
        .await?
        .into_iter()
        .map(rows::location_detail)
        .collect()
    }

    async fn get_location(&self, location_id: LocationId) -> Result<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(
            "SELECT location_id, name, description, location_type FROM location WHERE location_id = $1",
        )
        .bind(location_id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Location::try_from).transpose()
    }

    async fn get_location_detail(&self, location: &Location) -> Result<Option<LocationDetail>> {
        let subtype = quote_ident(location.location_type.table_name())?;
        self.json_rows(
            &format!(
                r#"
SELECT to_jsonb(l) || to_jsonb(s) AS row
FROM location l
    JOIN {subtype} s USING (location_id)
WHERE l.location_id = $1
;
"#
            ),
            &[location.location_id.get()],
        )
        .await?
        .into_iter()
        .next()
        .map(rows::location_detail)
        .transpose()
    }

    async fn list_locations(&self, location_type: LocationType) -> Result<Vec<LocationDetail>> {
        let subtype = quote_ident(location_type.table_name())?;
        self.json_rows(
            &format!(
                r#"
SELECT to_jsonb(l) || to_jsonb(s) AS row
FROM location l
    JOIN {subtype} s USING (location_id)
ORDER BY l.location_id
;
"#
            ),
            &[],
        )
        .await?
        .into_iter()
        .map(rows::location_detail)
        .collect()
    }

    async fn fetch_records(
        &self,
        measurement: &Measurement,
        location_id: LocationId,
    ) -> Result<Vec<MeasurementRecord>> {
        let subtype = quote_ident(&measurement.record_table())?;
        let records = self
            .json_rows(
                &format!(
                    r#"
SELECT to_jsonb(mr) || to_jsonb(s) AS row
FROM measurement_record mr
    JOIN record_location rl
        ON rl.measurement_record_id = mr.measurement_record_id AND rl.location_id = $2
    JOIN {subtype} s ON s.measurement_record_id = mr.measurement_record_id
WHERE mr.measurement_id = $1
ORDER BY mr.start_timestamp ASC
;
"#
                ),
                &[measurement.measurement_id.get(), location_id.get()],
            )
            .await?
            .into_iter()
            .map(rows::measurement_record)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            measurement = %measurement.name,
            location = %location_id,
            count = records.len(),
            "fetched measurement records"
        );
        Ok(records)
    }
}
