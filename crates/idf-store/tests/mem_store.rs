use idf_model::{
    Location, LocationDetail, LocationId, LocationType, Measurement, MeasurementId,
    MeasurementRecord, NewUserView, NewUserVisualisation, NewWorkspace, UserViewPatch, ViewId,
    WorkspaceId, WorkspacePatch,
};
use idf_store::{MemStore, Store, StoreError};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

fn new_workspace(name: &str) -> NewWorkspace {
    NewWorkspace {
        workspace_name: name.to_string(),
        workspace_colour: Some("#00ff00".to_string()),
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

fn seeded() -> MemStore {
    let store = MemStore::new();
    store.seed_measurement(Measurement {
        measurement_id: MeasurementId(1),
        name: "Rainfall".to_string(),
        description: None,
        measurement_type: "weather".to_string(),
    });
    store.seed_location(LocationDetail {
        location: Location {
            location_id: LocationId(10),
            name: "Ballarat".to_string(),
            description: None,
            location_type: LocationType::WeatherStation,
        },
        attributes: object(json!({"lgaId": 3})),
    });
    store
}

#[tokio::test]
async fn test_workspace_names_unique_per_owner() {
    let store = MemStore::new();

    let first = store.create_workspace("a@x.com", new_workspace("Fires")).await.unwrap();
    assert!(first.is_some());

    let duplicate = store.create_workspace("a@x.com", new_workspace("Fires")).await.unwrap();
    assert!(duplicate.is_none());

    // same name, other owner
    let other = store.create_workspace("b@x.com", new_workspace("Fires")).await.unwrap();
    assert!(other.is_some());
    assert_eq!(store.workspace_count(), 2);
}

#[tokio::test]
async fn test_rename_onto_existing_name_is_unique_violation() {
    let store = MemStore::new();
    store.create_workspace("a@x.com", new_workspace("One")).await.unwrap();
    let two = store
        .create_workspace("a@x.com", new_workspace("Two"))
        .await
        .unwrap()
        .unwrap();

    let err = store
        .update_workspace(
            two.workspace_id,
            WorkspacePatch {
                workspace_name: Some("One".to_string()),
                workspace_colour: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation { .. }));

    let recoloured = store
        .update_workspace(
            two.workspace_id,
            WorkspacePatch {
                workspace_name: None,
                workspace_colour: Some("#123".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(recoloured.workspace_name, "Two");
    assert_eq!(recoloured.workspace_colour.as_deref(), Some("#123"));
}

#[tokio::test]
async fn test_view_chain_requires_matching_workspace() {
    let store = MemStore::new();
    let ws1 = store.create_workspace("a@x.com", new_workspace("One")).await.unwrap().unwrap();
    let ws2 = store.create_workspace("a@x.com", new_workspace("Two")).await.unwrap().unwrap();
    let view = store
        .create_view(ws1.workspace_id, NewUserView { view_name: "Rain".to_string() })
        .await
        .unwrap()
        .unwrap();

    let owned = store.view_chain(ws1.workspace_id, view.view_id).await.unwrap().unwrap();
    assert_eq!(owned.owner_email, "a@x.com");
    assert_eq!(owned.entity, view);

    assert!(store.view_chain(ws2.workspace_id, view.view_id).await.unwrap().is_none());
    assert!(store.view_chain(WorkspaceId(99), view.view_id).await.unwrap().is_none());
    assert!(store.view_chain(ws1.workspace_id, ViewId(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_chain_distinguishes_missing_and_empty() {
    let store = MemStore::new();
    let ws = store.create_workspace("a@x.com", new_workspace("One")).await.unwrap().unwrap();

    let missing = store.view_list_chain(WorkspaceId(42)).await.unwrap();
    assert!(missing.is_empty());

    let empty = store.view_list_chain(ws.workspace_id).await.unwrap();
    assert_eq!(empty.len(), 1);
    assert!(empty[0].child.is_none());

    for name in ["B", "A"] {
        store
            .create_view(ws.workspace_id, NewUserView { view_name: name.to_string() })
            .await
            .unwrap();
    }
    let rows = store.view_list_chain(ws.workspace_id).await.unwrap();
    let names: Vec<_> = rows
        .iter()
        .filter_map(|r| r.child.as_ref().map(|v| v.view_name.as_str()))
        .collect();
    // ordered by id, not name
    assert_eq!(names, vec!["B", "A"]);
}

#[tokio::test]
async fn test_delete_workspace_cascades() {
    let store = seeded();
    let ws = store.create_workspace("a@x.com", new_workspace("One")).await.unwrap().unwrap();
    let view = store
        .create_view(ws.workspace_id, NewUserView { view_name: "Rain".to_string() })
        .await
        .unwrap()
        .unwrap();
    store
        .create_user_vis(
            view.view_id,
            NewUserVisualisation {
                location_id: LocationId(10),
                measurement_id: MeasurementId(1),
                visualisation_name: "line".to_string(),
                vis_filter: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(store.user_vis_count(), 1);

    let deleted = store.delete_workspace(ws.workspace_id).await.unwrap();
    assert_eq!(deleted.map(|w| w.workspace_id), Some(ws.workspace_id));
    assert_eq!(store.view_count(), 0);
    assert_eq!(store.user_vis_count(), 0);

    assert!(store.delete_workspace(ws.workspace_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_visualisation_foreign_keys() {
    let store = seeded();
    let ws = store.create_workspace("a@x.com", new_workspace("One")).await.unwrap().unwrap();
    let view = store
        .create_view(ws.workspace_id, NewUserView { view_name: "Rain".to_string() })
        .await
        .unwrap()
        .unwrap();

    let err = store
        .create_user_vis(
            view.view_id,
            NewUserVisualisation {
                location_id: LocationId(999),
                measurement_id: MeasurementId(1),
                visualisation_name: "line".to_string(),
                vis_filter: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::ForeignKeyViolation { ref constraint } if constraint.contains("location_id")
    ));
    assert!(err.is_constraint_violation());
}

#[tokio::test]
async fn test_view_patch_keeps_untouched_columns() {
    let store = MemStore::new();
    let ws = store.create_workspace("a@x.com", new_workspace("One")).await.unwrap().unwrap();
    let view = store
        .create_view(ws.workspace_id, NewUserView { view_name: "Rain".to_string() })
        .await
        .unwrap()
        .unwrap();

    let updated = store
        .update_view(
            view.view_id,
            UserViewPatch {
                view_name: None,
                grid_layout: Some(json!([{"i": "1", "x": 0}])),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.view_name, "Rain");
    assert_eq!(updated.grid_layout, Some(json!([{"i": "1", "x": 0}])));
}

#[tokio::test]
async fn test_records_ordered_by_start_timestamp() {
    let store = seeded();
    let measurement = store.get_measurement(MeasurementId(1)).await.unwrap().unwrap();
    for (id, ts) in [(2, "2020-01-02T00:00:00Z"), (1, "2020-01-01T00:00:00Z")] {
        store.seed_record(
            MeasurementId(1),
            LocationId(10),
            MeasurementRecord {
                measurement_record_id: id,
                values: object(json!({"startTimestamp": ts, "avgValue": 1.0})),
            },
        );
    }
    store.seed_record(
        MeasurementId(1),
        LocationId(11),
        MeasurementRecord {
            measurement_record_id: 3,
            values: object(json!({"startTimestamp": "2019-01-01T00:00:00Z"})),
        },
    );

    let records = store.fetch_records(&measurement, LocationId(10)).await.unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.measurement_record_id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn test_locations_filtered_by_type() {
    let store = seeded();
    store.seed_measurement_location(MeasurementId(1), LocationId(10));

    let stations = store.list_locations(LocationType::WeatherStation).await.unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].attributes["lgaId"], 3);

    assert!(store.list_locations(LocationType::State).await.unwrap().is_empty());
    assert_eq!(
        store
            .list_measurement_locations(MeasurementId(1), LocationType::WeatherStation)
            .await
            .unwrap()
            .len(),
        1
    );

    let location = store.get_location(LocationId(10)).await.unwrap().unwrap();
    let detail = store.get_location_detail(&location).await.unwrap().unwrap();
    assert_eq!(detail.location, location);
}
