use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use nestegg::api::{MemoryRepository, router};
use nestegg::controller::{
    ControllerError, DeleteRequest, Mode, Notice, Phase, ScenarioController,
};
use nestegg::core::{ContributionFrequency, InvestmentInputs};
use nestegg::store::{
    DefaultStoreFactory, Identity, MemoryStorage, RemoteStore, Scenario, ScenarioStore,
    StoreError,
};
use serde_json::Value;
use tokio::net::TcpListener;

async fn spawn_router(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });
    format!("http://{addr}")
}

async fn spawn_server() -> String {
    spawn_router(router(Arc::new(MemoryRepository::default()))).await
}

/// Every scenario route answers with `status`.
async fn spawn_failing_service(status: StatusCode) -> String {
    spawn_router(
        Router::new()
            .route(
                "/scenarios",
                get(move || async move { status }).post(move || async move { status }),
            )
            .route("/scenarios/:id", delete(move || async move { status })),
    )
    .await
}

fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

fn annual_inputs() -> InvestmentInputs {
    InvestmentInputs {
        starting_amount: 5_000.0,
        contribution_amount: 2_400.0,
        contribution_frequency: ContributionFrequency::Annual,
        annual_growth_rate: 7.0,
        inflation_rate: 2.0,
        years_to_grow: 25,
    }
}

#[tokio::test]
async fn save_list_delete_round_trip() {
    let base = spawn_server().await;
    let store = RemoteStore::new(&base, Identity::new("alice"));

    let first = store
        .save("Baseline", &InvestmentInputs::default())
        .await
        .expect("save");
    let second = store.save("Annual", &annual_inputs()).await.expect("save");

    let listed = store.list().await.expect("list");
    assert_eq!(listed, vec![second.clone(), first.clone()]);
    assert_eq!(listed[0].name, "Annual");
    assert_eq!(listed[0].inputs, annual_inputs());

    store.delete(&second.id).await.expect("delete");
    assert_eq!(store.list().await.expect("list"), vec![first]);
}

#[tokio::test]
async fn identities_never_see_each_other() {
    let base = spawn_server().await;
    let alice = RemoteStore::new(&base, Identity::new("alice"));
    let bob = RemoteStore::new(&base, Identity::new("bob"));

    let saved = alice
        .save("Private", &InvestmentInputs::default())
        .await
        .expect("save");
    assert!(bob.list().await.expect("list").is_empty());

    let err = bob.delete(&saved.id).await.expect_err("must not delete");
    assert!(matches!(err, StoreError::NotFound { ref id } if *id == saved.id));
    assert_eq!(alice.list().await.expect("list").len(), 1);
}

#[tokio::test]
async fn blank_name_is_rejected_before_the_request() {
    let base = spawn_server().await;
    let store = RemoteStore::new(&base, Identity::new("alice"));

    let err = store
        .save("  ", &InvestmentInputs::default())
        .await
        .expect_err("must reject");
    assert!(matches!(err, StoreError::Invalid(_)));
    assert!(store.list().await.expect("list").is_empty());
}

#[tokio::test]
async fn server_validates_payloads_and_authentication() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/scenarios"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

    let response = client
        .post(format!("{base}/scenarios"))
        .bearer_auth("alice")
        .json(&serde_json::json!({ "name": "", "inputs": InvestmentInputs::default() }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("json");
    assert!(body["error"].as_str().is_some_and(|e| e.contains("name")));

    let mut inputs = serde_json::to_value(InvestmentInputs::default()).expect("encode");
    inputs["yearsToGrow"] = Value::from(0);
    let response = client
        .post(format!("{base}/scenarios"))
        .bearer_auth("alice")
        .json(&serde_json::json!({ "name": "Bad", "inputs": inputs }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = client
        .delete(format!("{base}/scenarios/missing"))
        .bearer_auth("alice")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_returns_201_with_the_canonical_record() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/scenarios"))
        .bearer_auth("alice")
        .json(&serde_json::json!({ "name": "  Trimmed  ", "inputs": annual_inputs() }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let body: Value = response.json().await.expect("json");
    assert_eq!(body["name"], "Trimmed");
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(body["createdAt"].is_string());
    assert_eq!(body["inputs"]["contributionFrequency"], "annual");
}

#[tokio::test]
async fn project_endpoint_merges_query_over_defaults() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!(
            "{base}/api/project?yearsToGrow=3&contributionFrequency=annual&inflationRate=0"
        ))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    let rows = body["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["contribution"], 500.0);
    assert_eq!(rows[2]["realBalance"], rows[2]["balance"]);

    let response = client
        .post(format!("{base}/api/project"))
        .json(&serde_json::json!({ "startingAmount": -1 }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("json");
    assert!(body["error"].as_str().is_some_and(|e| e.contains("startingAmount")));
}

#[tokio::test]
async fn controller_switches_between_guest_storage_and_remote_account() {
    let base = spawn_server().await;
    let factory = DefaultStoreFactory::new(Arc::new(MemoryStorage::default()), Some(base));
    let controller = ScenarioController::new(Arc::new(factory), InvestmentInputs::default());

    controller.set_identity(None).await.expect("guest load");
    controller.save("Guest plan").await.expect("guest save");

    let alice = Identity::new("alice");
    controller
        .set_identity(Some(alice.clone()))
        .await
        .expect("remote load");
    let view = controller.view();
    assert_eq!(view.mode, Mode::Authenticated(alice));
    assert!(view.scenarios.is_empty());

    controller.set_inputs(annual_inputs());
    let saved = controller.save("Remote plan").await.expect("remote save");
    assert_eq!(controller.view().scenarios, vec![saved.clone()]);

    controller.set_identity(None).await.expect("guest reload");
    let names: Vec<_> = controller
        .view()
        .scenarios
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Guest plan".to_string()]);

    controller
        .set_identity(Some(Identity::new("alice")))
        .await
        .expect("remote reload");
    assert!(controller.load_into_inputs(&saved.id).expect("lookup"));
    assert_eq!(controller.inputs(), annual_inputs());

    controller
        .delete(DeleteRequest::confirmed(saved.id))
        .await
        .expect("delete");
    assert!(controller.view().scenarios.is_empty());
}

#[tokio::test]
async fn unreachable_service_surfaces_a_load_error() {
    let factory = DefaultStoreFactory::new(
        Arc::new(MemoryStorage::default()),
        Some(unreachable_url()),
    );
    let controller = ScenarioController::new(Arc::new(factory), InvestmentInputs::default());

    let err = controller
        .set_identity(Some(Identity::new("alice")))
        .await
        .expect_err("must fail");
    assert!(matches!(err, ControllerError::Load(StoreError::Transport(_))));

    let view = controller.view();
    assert_eq!(view.phase, Phase::Ready);
    assert!(view.scenarios.is_empty());
    assert!(view.error.is_some());

    // The projection keeps working regardless of the store.
    assert_eq!(controller.summary().rows.len(), 20);
}

#[tokio::test]
async fn rejected_credentials_map_to_unauthorized() {
    let base = spawn_failing_service(StatusCode::UNAUTHORIZED).await;
    let store = RemoteStore::new(&base, Identity::new("expired"));

    let err = store.list().await.expect_err("list must fail");
    assert!(matches!(err, StoreError::Unauthorized));
    let err = store
        .save("Plan", &InvestmentInputs::default())
        .await
        .expect_err("save must fail");
    assert!(matches!(err, StoreError::Unauthorized));
    let err = store.delete("abc").await.expect_err("delete must fail");
    assert!(matches!(err, StoreError::Unauthorized));
}

#[tokio::test]
async fn server_errors_map_to_status() {
    let base = spawn_failing_service(StatusCode::INTERNAL_SERVER_ERROR).await;
    let store = RemoteStore::new(&base, Identity::new("alice"));

    let err = store.list().await.expect_err("list must fail");
    assert!(matches!(err, StoreError::Status { status: 500 }));
    let err = store.delete("abc").await.expect_err("delete must fail");
    assert!(matches!(err, StoreError::Status { status: 500 }));
}

#[tokio::test]
async fn out_of_range_inputs_are_rejected_by_the_server() {
    let base = spawn_server().await;
    let store = RemoteStore::new(&base, Identity::new("alice"));
    let mut inputs = InvestmentInputs::default();
    inputs.years_to_grow = 101;

    let err = store.save("Too long", &inputs).await.expect_err("must fail");
    assert!(matches!(err, StoreError::Status { status: 400 }));
    assert!(store.list().await.expect("list").is_empty());
}

#[tokio::test]
async fn ids_with_reserved_characters_stay_in_the_path() {
    let base = spawn_server().await;
    let store = RemoteStore::new(&base, Identity::new("alice"));
    let saved = store
        .save("Keep", &InvestmentInputs::default())
        .await
        .expect("save");

    let tricky = format!("{}?x=1", saved.id);
    let err = store.delete(&tricky).await.expect_err("must not match");
    assert!(matches!(err, StoreError::NotFound { ref id } if *id == tricky));
    assert_eq!(store.list().await.expect("list"), vec![saved]);
}

#[tokio::test]
async fn controller_reports_a_save_rejected_by_the_service() {
    let base = spawn_router(
        Router::new().route(
            "/scenarios",
            get(|| async { axum::Json(Vec::<Scenario>::new()) })
                .post(|| async { StatusCode::BAD_REQUEST }),
        ),
    )
    .await;
    let factory = DefaultStoreFactory::new(Arc::new(MemoryStorage::default()), Some(base));
    let controller = ScenarioController::new(Arc::new(factory), InvestmentInputs::default());
    controller
        .set_identity(Some(Identity::new("alice")))
        .await
        .expect("load");

    controller.set_inputs(annual_inputs());
    let err = controller.save("Rejected").await.expect_err("must fail");
    assert!(matches!(
        err,
        ControllerError::Save(StoreError::Status { status: 400 })
    ));

    let view = controller.view();
    assert!(view.scenarios.is_empty());
    assert!(!view.saving);
    assert_eq!(view.error, None);
    assert!(matches!(
        view.notice,
        Some(Notice::SaveFailed { ref message }) if message.contains("400")
    ));
    assert_eq!(controller.inputs(), annual_inputs());
}
