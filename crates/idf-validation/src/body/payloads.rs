//! Create and update payload rules
//!
//! Each validator checks every field and reports all failures at once. Text
//! fields are trimmed and HTML-escaped before they are checked, and the
//! escaped form is what gets stored.

use super::field::{FieldError, FieldErrors};
use super::sanitize::{clean_text, is_hex_colour, json_blob};
use idf_model::{
    LocationId, LocationType, MeasurementId, NewUserView, NewUserVisualisation, NewWorkspace,
    UserViewPatch, UserVisualisationPatch, WorkspacePatch,
};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Decoded JSON request body
pub type Body = Map<String, Value>;

const INVALID_VALUE: &str = "Invalid value";

/// Collects errors while reading fields out of one body
struct Reader<'a> {
    body: &'a Body,
    errors: FieldErrors,
}

impl<'a> Reader<'a> {
    fn new(body: &'a Body) -> Self {
        Self {
            body,
            errors: FieldErrors::new(),
        }
    }

    fn has(&self, field: &str) -> bool {
        self.body.contains_key(field)
    }

    /// At least one of `fields` must be present
    fn one_of(&mut self, fields: &[&str], msg: &str) {
        if !fields.iter().any(|f| self.has(f)) {
            self.errors.push(FieldError::whole_body(msg));
        }
    }

    fn fail(&mut self, field: &str, value: impl Into<Value>, msg: &str) {
        self.errors.push(FieldError::body(field, value, msg));
    }

    /// Required when `missing_msg` is given, otherwise optional
    fn text(&mut self, field: &str, missing_msg: Option<&str>, empty_msg: &str) -> Option<String> {
        let body = self.body;
        let Some(raw) = body.get(field) else {
            if let Some(msg) = missing_msg {
                self.fail(field, Value::Null, msg);
            }
            return None;
        };
        match clean_text(raw) {
            Some(text) if !text.is_empty() => Some(text),
            Some(text) => {
                self.fail(field, text, empty_msg);
                None
            }
            None => {
                self.fail(field, raw.clone(), empty_msg);
                None
            }
        }
    }

    fn colour(&mut self, field: &str, msg: &str) -> Option<String> {
        let body = self.body;
        let raw = body.get(field)?;
        match clean_text(raw) {
            Some(text) if is_hex_colour(&text) => Some(text),
            Some(text) => {
                self.fail(field, text, msg);
                None
            }
            None => {
                self.fail(field, raw.clone(), msg);
                None
            }
        }
    }

    fn id<T: FromStr>(&mut self, field: &str, required: bool) -> Option<T> {
        let body = self.body;
        let Some(raw) = body.get(field) else {
            if required {
                self.fail(field, Value::Null, &format!("{field} must be provided"));
            }
            return None;
        };
        let msg = format!("{field} must be an integer");
        match clean_text(raw) {
            Some(text) => match text.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    self.fail(field, text, &msg);
                    None
                }
            },
            None => {
                self.fail(field, raw.clone(), &msg);
                None
            }
        }
    }

    fn blob(&mut self, field: &str) -> Option<Value> {
        let body = self.body;
        let raw = body.get(field)?;
        let parsed = json_blob(raw);
        if parsed.is_none() {
            self.fail(field, raw.clone(), INVALID_VALUE);
        }
        parsed
    }

    fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        self.errors.finish(value)
    }
}

/// `POST /workspaces`
pub fn new_workspace(body: &Body) -> Result<NewWorkspace, FieldErrors> {
    let mut r = Reader::new(body);
    let name = r.text(
        "workspaceName",
        Some("workspaceName must be provided"),
        "workspaceName cannot be empty",
    );
    let colour = r.colour(
        "workspaceColour",
        "workspaceColour must be a valid HEX colour",
    );

    let workspace = NewWorkspace {
        workspace_name: name.unwrap_or_default(),
        workspace_colour: colour,
    };
    r.finish(workspace)
}

/// `PATCH /workspaces/:workspaceId`
pub fn workspace_patch(body: &Body) -> Result<WorkspacePatch, FieldErrors> {
    let mut r = Reader::new(body);
    r.one_of(
        &["workspaceName", "workspaceColour"],
        "One of workspaceName or workspaceColour must be provided",
    );
    let patch = WorkspacePatch {
        workspace_name: r.text("workspaceName", None, "workspaceName cannot be empty"),
        workspace_colour: r.colour(
            "workspaceColour",
            "workspaceColour must be a valid HEX colour",
        ),
    };
    r.finish(patch)
}

/// `POST /workspaces/:workspaceId/views`
pub fn new_view(body: &Body) -> Result<NewUserView, FieldErrors> {
    let mut r = Reader::new(body);
    let name = r.text(
        "viewName",
        Some("viewName must be provided"),
        "viewName must not be empty",
    );
    r.finish(NewUserView {
        view_name: name.unwrap_or_default(),
    })
}

/// `PATCH /workspaces/:workspaceId/views/:viewId`
pub fn view_patch(body: &Body) -> Result<UserViewPatch, FieldErrors> {
    let mut r = Reader::new(body);
    r.one_of(
        &["viewName", "gridLayout"],
        "One of viewName or gridLayout must be provided",
    );
    let patch = UserViewPatch {
        view_name: r.text("viewName", None, "viewName cannot be empty"),
        grid_layout: r.blob("gridLayout"),
    };
    r.finish(patch)
}

/// `POST …/views/:viewId/vis`
pub fn new_user_vis(body: &Body) -> Result<NewUserVisualisation, FieldErrors> {
    let mut r = Reader::new(body);
    let location_id: Option<LocationId> = r.id("locationId", true);
    let measurement_id: Option<MeasurementId> = r.id("measurementId", true);
    let name = r.text(
        "visualisationName",
        Some("visualisationName must be provided"),
        "visualisationName cannot be empty",
    );
    let vis_filter = r.blob("visFilter");

    match (location_id, measurement_id, name) {
        (Some(location_id), Some(measurement_id), Some(visualisation_name)) => {
            r.finish(NewUserVisualisation {
                location_id,
                measurement_id,
                visualisation_name,
                vis_filter,
            })
        }
        _ => Err(r.errors),
    }
}

/// `PATCH …/vis/:userVisId`
pub fn user_vis_patch(body: &Body) -> Result<UserVisualisationPatch, FieldErrors> {
    let mut r = Reader::new(body);
    r.one_of(
        &["measurementId", "visualisationName", "visFilter", "locationId"],
        "One of [measurementId, visualisationName, visFilter, locationId] must be provided",
    );
    let patch = UserVisualisationPatch {
        location_id: r.id("locationId", false),
        measurement_id: r.id("measurementId", false),
        visualisation_name: r.text("visualisationName", None, "visualisationName cannot be empty"),
        vis_filter: r.blob("visFilter"),
    };
    r.finish(patch)
}

/// `?type=` on location listings
pub fn location_type(query: Option<&str>) -> Result<LocationType, FieldErrors> {
    let text = query
        .map(|q| clean_text(&Value::String(q.to_string())).unwrap_or_default())
        .unwrap_or_default();
    if let Some(location_type) = LocationType::from_query_alias(&text) {
        return Ok(location_type);
    }

    let mut errors = FieldErrors::new();
    if text.is_empty() {
        errors.push(FieldError::query(
            "type",
            text.clone(),
            "Location type must be specified",
        ));
    }
    errors.push(FieldError::query(
        "type",
        text,
        format!(
            "Location type must be one of: [{}]",
            LocationType::query_aliases()
        ),
    ));
    Err(errors)
}
