use idf_model::{
    NewUserView, NewWorkspace, Principal, UserView, UserVisId, ViewId, Workspace, WorkspaceId,
};
use idf_store::{ChainRow, MemStore, MockStore, Owned, Store, StoreError};
use idf_validation::chain::{
    ChainTarget, IdParam, Pipeline, Rejection, Stage, ValidationContext,
};
use idf_validation::{
    authorize_user_vis, authorize_view, authorize_view_list, authorize_workspace, ChainError,
    PathIds, Resolved,
};
use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use serde_json::json;

fn a() -> Principal {
    Principal::new("a@x.com")
}

fn b() -> Principal {
    Principal::new("b@x.com")
}

fn workspace(id: i32, owner: &str) -> Workspace {
    Workspace {
        workspace_id: WorkspaceId(id),
        owner_email: owner.to_string(),
        workspace_name: "Fires".to_string(),
        workspace_colour: None,
    }
}

fn view(id: i32, workspace_id: i32) -> UserView {
    UserView {
        view_id: ViewId(id),
        workspace_id: WorkspaceId(workspace_id),
        view_name: format!("view {id}"),
        grid_layout: None,
    }
}

fn rejection(err: ChainError) -> Rejection {
    match err {
        ChainError::Rejected(r) => r,
        other => panic!("expected a rejection, got {other}"),
    }
}

#[tokio::test]
async fn test_non_numeric_id_issues_no_queries() {
    let mut store = MockStore::new();
    store.expect_workspace_chain().never();
    store.expect_view_list_chain().never();

    let err = authorize_workspace(&store, Some(&a()), PathIds::workspace("abc"))
        .await
        .unwrap_err();
    assert_eq!(
        rejection(err),
        Rejection::Format {
            param: IdParam::WorkspaceId,
            value: "abc".to_string()
        }
    );

    let err = authorize_view_list(&store, Some(&a()), PathIds::workspace("-1"))
        .await
        .unwrap_err();
    assert_eq!(rejection(err).to_string(), "workspaceId must be an integer");
}

#[tokio::test]
async fn test_bad_inner_id_issues_no_queries() {
    let mut store = MockStore::new();
    store.expect_user_vis_chain().never();

    let ids = PathIds::workspace("1").with_view("2").with_user_vis("x");
    let err = authorize_user_vis(&store, Some(&a()), ids).await.unwrap_err();
    assert_eq!(rejection(err).to_string(), "userVisId must be an integer");
}

#[tokio::test]
async fn test_missing_principal_fails_closed() {
    let mut store = MockStore::new();
    store.expect_workspace_chain().never();

    let err = authorize_workspace(&store, None, PathIds::workspace("1"))
        .await
        .unwrap_err();
    assert_eq!(rejection(err), Rejection::MissingPrincipal);
}

#[tokio::test]
async fn test_absent_workspace_is_not_found() {
    let mut store = MockStore::new();
    store
        .expect_workspace_chain()
        .with(eq(WorkspaceId(7)))
        .times(1)
        .returning(|_| Ok(None));

    let err = authorize_workspace(&store, Some(&a()), PathIds::workspace("7"))
        .await
        .unwrap_err();
    assert_eq!(rejection(err).to_string(), "Workspace does not exist");
}

#[tokio::test]
async fn test_other_owner_is_not_authorized() {
    let mut store = MockStore::new();
    store
        .expect_workspace_chain()
        .times(1)
        .returning(|id| Ok(Some(Owned::new("a@x.com", workspace(id.get(), "a@x.com")))));

    let err = authorize_workspace(&store, Some(&b()), PathIds::workspace("1"))
        .await
        .unwrap_err();
    assert_eq!(rejection(err), Rejection::NotOwned);
}

#[tokio::test]
async fn test_owned_view_resolves_without_owner_email() {
    let mut store = MockStore::new();
    store
        .expect_view_chain()
        .with(eq(WorkspaceId(1)), eq(ViewId(3)))
        .times(1)
        .returning(|_, v| Ok(Some(Owned::new("a@x.com", view(v.get(), 1)))));

    let resolved = authorize_view(&store, Some(&a()), PathIds::workspace("1").with_view("3"))
        .await
        .unwrap();
    assert_eq!(resolved, view(3, 1));

    let value = serde_json::to_value(&resolved).unwrap();
    assert!(value.get("ownerEmail").is_none());
    assert_eq!(value["viewName"], "view 3");
}

#[tokio::test]
async fn test_unrelated_view_is_invalid_combination() {
    let mut store = MockStore::new();
    store.expect_view_chain().times(1).returning(|_, _| Ok(None));
    store
        .expect_user_vis_chain()
        .with(eq(WorkspaceId(1)), eq(ViewId(2)), eq(UserVisId(3)))
        .times(1)
        .returning(|_, _, _| Ok(None));

    let err = authorize_view(&store, Some(&a()), PathIds::workspace("1").with_view("9"))
        .await
        .unwrap_err();
    assert_eq!(
        rejection(err).to_string(),
        "Invalid combination of workspaceId and viewId"
    );

    let ids = PathIds::workspace("1").with_view("2").with_user_vis("3");
    let err = authorize_user_vis(&store, Some(&a()), ids).await.unwrap_err();
    assert_eq!(
        rejection(err).to_string(),
        "Invalid combination of workspaceId, viewId and userVisId"
    );
}

#[tokio::test]
async fn test_list_of_owned_empty_workspace_is_empty() {
    let mut store = MockStore::new();
    store.expect_view_list_chain().times(1).returning(|_| {
        Ok(vec![ChainRow {
            owner_email: "a@x.com".to_string(),
            child: None,
        }])
    });

    let views = authorize_view_list(&store, Some(&a()), PathIds::workspace("1"))
        .await
        .unwrap();
    assert!(views.is_empty());
}

#[tokio::test]
async fn test_list_of_foreign_workspace_rejected_despite_children() {
    let mut store = MockStore::new();
    store.expect_view_list_chain().times(1).returning(|_| {
        Ok(vec![
            ChainRow {
                owner_email: "a@x.com".to_string(),
                child: Some(view(1, 1)),
            },
            ChainRow {
                owner_email: "a@x.com".to_string(),
                child: Some(view(2, 1)),
            },
        ])
    });

    let err = authorize_view_list(&store, Some(&b()), PathIds::workspace("1"))
        .await
        .unwrap_err();
    assert_eq!(rejection(err), Rejection::NotOwned);
}

#[tokio::test]
async fn test_storage_failure_propagates() {
    let mut store = MockStore::new();
    store
        .expect_workspace_chain()
        .returning(|_| Err(StoreError::MalformedRow("owner_email".to_string())));

    let err = authorize_workspace(&store, Some(&a()), PathIds::workspace("1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::Store(_)));
    assert!(err.rejection().is_none());
}

#[tokio::test]
async fn test_revalidation_is_idempotent() {
    let store = MemStore::new();
    let ws = store
        .create_workspace(
            "a@x.com",
            NewWorkspace {
                workspace_name: "Fires".to_string(),
                workspace_colour: Some("#f00".to_string()),
            },
        )
        .await
        .unwrap()
        .unwrap();
    let ids = PathIds::workspace(ws.workspace_id.to_string());

    let first = authorize_workspace(&store, Some(&a()), ids.clone()).await.unwrap();
    let second = authorize_workspace(&store, Some(&a()), ids).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, ws);
}

#[tokio::test]
async fn test_views_scenario() {
    let store = MemStore::new();
    let ws = store
        .create_workspace(
            "a@x.com",
            NewWorkspace {
                workspace_name: "Fires".to_string(),
                workspace_colour: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ws.workspace_id, WorkspaceId(1));

    let err = authorize_view_list(&store, Some(&b()), PathIds::workspace("1"))
        .await
        .unwrap_err();
    assert_eq!(rejection(err).to_string(), "User does not own this workspace");

    let views = authorize_view_list(&store, Some(&a()), PathIds::workspace("1"))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(json!({ "userViews": views })).unwrap(),
        json!({ "userViews": [] })
    );

    store
        .create_view(WorkspaceId(1), NewUserView { view_name: "Rain".to_string() })
        .await
        .unwrap();
    let views = authorize_view_list(&store, Some(&a()), PathIds::workspace("1"))
        .await
        .unwrap();
    assert_eq!(views.len(), 1);
}

#[tokio::test]
async fn test_pipeline_ends_in_terminal_stage() {
    let store = MemStore::new();
    let pipeline = Pipeline::ownership_chain();

    let ctx = ValidationContext::new(ChainTarget::Workspace, PathIds::workspace("1"), Some(a()));
    let done = pipeline.run(&store, ctx).await.unwrap();
    assert_eq!(done.stage(), Stage::Rejected);
    assert_eq!(done.rejection(), Some(&Rejection::WorkspaceNotFound));
    assert!(done.resolved().is_none());

    store
        .create_workspace(
            "a@x.com",
            NewWorkspace {
                workspace_name: "Fires".to_string(),
                workspace_colour: None,
            },
        )
        .await
        .unwrap();
    let ctx = ValidationContext::new(ChainTarget::Workspace, PathIds::workspace("1"), Some(a()));
    let done = pipeline.run(&store, ctx).await.unwrap();
    assert_eq!(done.stage(), Stage::Authorized);
    assert!(matches!(done.resolved(), Some(Resolved::Workspace(_))));
}
