mod repository;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    ContributionFrequency, InvestmentInputs, project, validate_inputs, validate_scenario_name,
};

pub use repository::{MemoryRepository, ScenarioRepository};

#[derive(Clone)]
struct AppState {
    repository: Arc<dyn ScenarioRepository>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    starting_amount: Option<f64>,
    contribution_amount: Option<f64>,
    contribution_frequency: Option<ContributionFrequency>,
    annual_growth_rate: Option<f64>,
    inflation_rate: Option<f64>,
    years_to_grow: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct CreateScenarioPayload {
    name: String,
    inputs: InvestmentInputs,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(repository: Arc<dyn ScenarioRepository>) -> Router {
    Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/scenarios",
            get(list_scenarios_handler).post(create_scenario_handler),
        )
        .route("/scenarios/:id", delete(delete_scenario_handler))
        .fallback(not_found_handler)
        .with_state(AppState { repository })
}

pub async fn run_http_server(
    addr: SocketAddr,
    repository: Arc<dyn ScenarioRepository>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "scenario API listening");
    axum::serve(listener, router(repository)).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(payload: Result<Json<ProjectPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => project_handler_impl(payload),
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    }
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    match inputs_from_payload(payload) {
        Ok(inputs) => json_response(StatusCode::OK, project(&inputs)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn inputs_from_payload(payload: ProjectPayload) -> Result<InvestmentInputs, String> {
    let mut inputs = InvestmentInputs::default();

    if let Some(v) = payload.starting_amount {
        inputs.starting_amount = v;
    }
    if let Some(v) = payload.contribution_amount {
        inputs.contribution_amount = v;
    }
    if let Some(v) = payload.contribution_frequency {
        inputs.contribution_frequency = v;
    }
    if let Some(v) = payload.annual_growth_rate {
        inputs.annual_growth_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        inputs.inflation_rate = v;
    }
    if let Some(v) = payload.years_to_grow {
        inputs.years_to_grow = v;
    }

    validate_inputs(&inputs).map_err(|e| e.to_string())?;
    Ok(inputs)
}

// Session handling lives upstream; the bearer token is the owner id.
fn owner_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn unauthorized() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Not signed in")
}

async fn list_scenarios_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(owner) = owner_from_headers(&headers) else {
        return unauthorized();
    };
    json_response(StatusCode::OK, state.repository.list(&owner))
}

async fn create_scenario_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateScenarioPayload>, JsonRejection>,
) -> Response {
    let Some(owner) = owner_from_headers(&headers) else {
        return unauthorized();
    };
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    let name = match validate_scenario_name(&payload.name) {
        Ok(name) => name,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    if let Err(e) = validate_inputs(&payload.inputs) {
        return error_response(StatusCode::BAD_REQUEST, &e.to_string());
    }

    let scenario = state.repository.insert(&owner, name, payload.inputs);
    info!(id = %scenario.id, owner = %owner, "created scenario");
    json_response(StatusCode::CREATED, scenario)
}

async fn delete_scenario_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let Some(owner) = owner_from_headers(&headers) else {
        return unauthorized();
    };
    if !state.repository.delete(&owner, &id) {
        return error_response(StatusCode::NOT_FOUND, "Scenario not found");
    }
    info!(id = %id, owner = %owner, "deleted scenario");
    json_response(StatusCode::OK, DeletedResponse { id })
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
